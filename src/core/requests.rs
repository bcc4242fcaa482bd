//! Requests to the text-generation collaborator and their local fallbacks.
//!
//! Every request type knows the deterministic text to use when the
//! collaborator fails, times out or is cancelled.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::budget::{CapReport, SensoryBudget, SensoryBudgetCaps};
use crate::schema::spark::SparkStage;
use crate::schema::story::{Goals, StoryMode};

pub const SCENE_FALLBACK: &str = "The story continues...";

pub const REFLECTION_FALLBACK: &str =
    "Great job! You tried really hard. Next time I can try something different. You're doing amazing!";

/// A request whose answer can be produced locally when the collaborator is unavailable.
pub trait Fallback {
    type Output;

    fn fallback(&self) -> Self::Output;
}

/// Scene prose for one beat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneRequest {
    pub stage: SparkStage,
    pub actors: Vec<String>,
    pub location: Option<String>,
    pub buggies: BTreeMap<String, u8>,
    pub props: Vec<String>,
    pub goals: Goals,
    pub budget: SensoryBudget,
    pub mode: StoryMode,
}

impl Fallback for SceneRequest {
    type Output = String;

    fn fallback(&self) -> String {
        SCENE_FALLBACK.to_string()
    }
}

/// A short coping step built around a prop and a Tiggie cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulationBeatRequest {
    pub prop: String,
    pub cue: String,
    pub feeling: String,
    pub mode: StoryMode,
}

impl Fallback for RegulationBeatRequest {
    type Output = String;

    fn fallback(&self) -> String {
        format!("Take a deep breath with your {}. {} You can do this!", self.prop, self.cue)
    }
}

/// Closing reflection for the Payoff stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionRequest {
    pub stage: SparkStage,
    pub changes: Vec<String>,
    pub effort: String,
    pub mode: StoryMode,
}

impl Fallback for ReflectionRequest {
    type Output = String;

    fn fallback(&self) -> String {
        REFLECTION_FALLBACK.to_string()
    }
}

/// A gentler rewrite of a scene that breaks the sensory caps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GentlerSceneRequest {
    pub original: String,
    pub budget: SensoryBudget,
    pub caps: SensoryBudgetCaps,
    pub report: CapReport,
}

impl GentlerSceneRequest {
    pub fn new(original: impl Into<String>, budget: SensoryBudget, caps: SensoryBudgetCaps) -> Self {
        Self {
            original: original.into(),
            report: caps.report(&budget),
            budget,
            caps,
        }
    }
}

impl Fallback for GentlerSceneRequest {
    type Output = String;

    fn fallback(&self) -> String {
        self.original.clone()
    }
}

/// Age-appropriateness check of a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyCheck {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyVerdict {
    pub is_safe: bool,
    pub filtered_text: String,
    pub issues: Vec<String>,
}

impl Fallback for SafetyCheck {
    type Output = SafetyVerdict;

    fn fallback(&self) -> SafetyVerdict {
        SafetyVerdict {
            is_safe: true,
            filtered_text: self.text.clone(),
            issues: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::sensory::{Axis, SensoryLoad};

    #[test]
    fn regulation_fallback_names_prop_and_cue() {
        let request = RegulationBeatRequest {
            prop: "Weighted Arms".to_string(),
            cue: "Take deep breaths".to_string(),
            feeling: "worried".to_string(),
            mode: StoryMode::Kid,
        };
        assert_eq!(
            request.fallback(),
            "Take a deep breath with your Weighted Arms. Take deep breaths You can do this!"
        );
    }

    #[test]
    fn gentler_fallback_keeps_original_text() {
        let request = GentlerSceneRequest::new(
            "The market roared.",
            SensoryLoad::new(4, 3, 2, 0, 2),
            SensoryBudgetCaps::default(),
        );
        assert_eq!(request.fallback(), "The market roared.");
        assert!(request.report.total_exceeded);
        assert_eq!(request.report.exceeded_axes, vec![Axis::Audio]);
    }

    #[test]
    fn safety_fallback_passes_text_through() {
        let verdict = SafetyCheck {
            text: "A calm walk.".to_string(),
        }
        .fallback();
        assert!(verdict.is_safe);
        assert_eq!(verdict.filtered_text, "A calm walk.");
        assert!(verdict.issues.is_empty());
    }

    #[test]
    fn safety_verdict_parses_collaborator_json() {
        let verdict: SafetyVerdict =
            serde_json::from_str(r#"{"isSafe": false, "filteredText": "A walk.", "issues": ["scary"]}"#).unwrap();
        assert!(!verdict.is_safe);
        assert_eq!(verdict.issues, vec!["scary".to_string()]);
    }

    #[test]
    fn fixed_fallbacks() {
        let scene = SceneRequest {
            stage: SparkStage::Hook,
            actors: Vec::new(),
            location: None,
            buggies: BTreeMap::new(),
            props: Vec::new(),
            goals: Goals::default(),
            budget: SensoryLoad::default(),
            mode: StoryMode::Kid,
        };
        assert_eq!(scene.fallback(), SCENE_FALLBACK);
        let reflection = ReflectionRequest {
            stage: SparkStage::Payoff,
            changes: vec!["moved to the grove".to_string()],
            effort: "kept trying".to_string(),
            mode: StoryMode::Grownup,
        };
        assert_eq!(reflection.fallback(), REFLECTION_FALLBACK);
    }
}
