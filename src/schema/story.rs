//! The authored story and its goals.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::spark::{EventId, SparkStage};

/// Identifier of a story.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(pub String);

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who the story is being written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryMode {
    Kid,
    Grownup,
}

impl StoryMode {
    pub fn from_kid_mode(is_kid: bool) -> Self {
        if is_kid {
            Self::Kid
        } else {
            Self::Grownup
        }
    }

    pub fn is_kid(&self) -> bool {
        matches!(self, Self::Kid)
    }
}

/// The emotional and skill goal pair a story works toward.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goals {
    pub emotional: String,
    pub skill: String,
}

impl Goals {
    pub fn new(emotional: impl Into<String>, skill: impl Into<String>) -> Self {
        Self {
            emotional: emotional.into(),
            skill: skill.into(),
        }
    }
}

/// The current authored work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    /// Always the full stage set, in order.
    pub sparks: Vec<SparkStage>,
    /// Ids of the beats linked to this story, in insertion order.
    pub events: Vec<EventId>,
    pub mode: StoryMode,
    pub goals: Goals,
}

impl Story {
    pub fn new(id: StoryId, title: impl Into<String>, mode: StoryMode, goals: Goals) -> Self {
        Self {
            id,
            title: title.into(),
            sparks: SparkStage::ALL.to_vec(),
            events: Vec::new(),
            mode,
            goals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_story_has_all_stages_and_no_events() {
        let story = Story::new(
            StoryId("story-1".to_string()),
            "Silo at the market",
            StoryMode::Kid,
            Goals::new("calm", "ask for a break"),
        );
        assert_eq!(story.sparks.len(), 5);
        assert_eq!(story.sparks[0], SparkStage::Hook);
        assert!(story.events.is_empty());
    }

    #[test]
    fn mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&StoryMode::Kid).unwrap(), "\"kid\"");
        assert_eq!(serde_json::to_string(&StoryMode::Grownup).unwrap(), "\"grownup\"");
        assert!(StoryMode::from_kid_mode(true).is_kid());
        assert!(!StoryMode::from_kid_mode(false).is_kid());
    }
}
