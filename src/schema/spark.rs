//! Spark stages and the authored beats that fill them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::catalog::Buggie;

/// One of the five fixed narrative beats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum SparkStage {
    Hook = 1,
    Explore = 2,
    Challenge = 3,
    Support = 4,
    Payoff = 5,
}

impl SparkStage {
    pub const ALL: [SparkStage; 5] = [
        SparkStage::Hook,
        SparkStage::Explore,
        SparkStage::Challenge,
        SparkStage::Support,
        SparkStage::Payoff,
    ];

    /// Map any integer onto a stage, clamping into `1..=5`.
    pub fn clamped(n: i64) -> SparkStage {
        match n {
            i64::MIN..=1 => Self::Hook,
            2 => Self::Explore,
            3 => Self::Challenge,
            4 => Self::Support,
            _ => Self::Payoff,
        }
    }

    pub fn number(&self) -> u8 {
        *self as u8
    }

    /// The following stage, or `None` at Payoff.
    pub fn next(&self) -> Option<SparkStage> {
        match self {
            Self::Payoff => None,
            other => Some(Self::clamped(other.number() as i64 + 1)),
        }
    }

    /// The preceding stage, or `None` at Hook.
    pub fn previous(&self) -> Option<SparkStage> {
        match self {
            Self::Hook => None,
            other => Some(Self::clamped(other.number() as i64 - 1)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Hook => "Hook",
            Self::Explore => "Explore/Build",
            Self::Challenge => "Challenge",
            Self::Support => "Support/Tool",
            Self::Payoff => "Payoff/Reflection",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Hook => "Predictable opener that sets the scene",
            Self::Explore => "Gentle curiosity and world-building",
            Self::Challenge => "Clear, bounded problem to solve",
            Self::Support => "Prop + Tiggie guidance + regulation",
            Self::Payoff => "Success + self-labeling of feeling",
        }
    }
}

impl From<u8> for SparkStage {
    fn from(n: u8) -> Self {
        Self::clamped(n as i64)
    }
}

impl From<SparkStage> for u8 {
    fn from(stage: SparkStage) -> Self {
        stage.number()
    }
}

impl fmt::Display for SparkStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.name())
    }
}

/// Identifier of an authored beat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One authored narrative beat.
///
/// Actor, location, prop and buggie ids point into the catalog but are not
/// required to resolve; dangling ids are skipped by aggregate views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparkEvent {
    pub id: EventId,
    pub spark: SparkStage,
    pub title: String,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub buggies: BTreeMap<String, u8>,
    #[serde(default)]
    pub props: Vec<String>,
    #[serde(default)]
    pub text: String,
    /// Ordered child beats, exclusively owned by this beat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_beats: Option<Vec<SparkEvent>>,
}

impl SparkEvent {
    /// Build a beat from a draft under the given id. Nested sub-beat drafts
    /// take their ids from `mint`, in order.
    pub fn from_draft<F>(id: EventId, draft: EventDraft, mint: &mut F) -> Self
    where
        F: FnMut() -> EventId,
    {
        let sub_beats = draft.sub_beats.map(|drafts| {
            let mut children = Vec::with_capacity(drafts.len());
            for child in drafts {
                let child_id = mint();
                children.push(SparkEvent::from_draft(child_id, child, mint));
            }
            children
        });
        Self {
            id,
            spark: draft.spark,
            title: draft.title,
            actors: draft.actors,
            location: draft.location,
            buggies: clamp_intensities(draft.buggies),
            props: draft.props,
            text: draft.text,
            sub_beats,
        }
    }

    /// Merge the fields present in `patch`; absent fields stay unchanged.
    pub fn apply(&mut self, patch: EventPatch) {
        if let Some(spark) = patch.spark {
            self.spark = spark;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(actors) = patch.actors {
            self.actors = actors;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(buggies) = patch.buggies {
            self.buggies = clamp_intensities(buggies);
        }
        if let Some(props) = patch.props {
            self.props = props;
        }
        if let Some(text) = patch.text {
            self.text = text;
        }
        if let Some(sub_beats) = patch.sub_beats {
            self.sub_beats = sub_beats;
        }
    }
}

fn clamp_intensities(buggies: BTreeMap<String, i64>) -> BTreeMap<String, u8> {
    buggies
        .into_iter()
        .map(|(id, n)| (id, Buggie::clamp_intensity(n)))
        .collect()
}

/// The payload of a new beat; the engine assigns its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub spark: SparkStage,
    pub title: String,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Requested intensities; repaired into `0..=5` on insert.
    #[serde(default)]
    pub buggies: BTreeMap<String, i64>,
    #[serde(default)]
    pub props: Vec<String>,
    #[serde(default)]
    pub text: String,
    /// Child beats; the engine assigns their ids.
    #[serde(default)]
    pub sub_beats: Option<Vec<EventDraft>>,
}

impl EventDraft {
    pub fn new(spark: SparkStage, title: impl Into<String>) -> Self {
        Self {
            spark,
            title: title.into(),
            actors: Vec::new(),
            location: None,
            buggies: BTreeMap::new(),
            props: Vec::new(),
            text: String::new(),
            sub_beats: None,
        }
    }

    pub fn actor(mut self, id: impl Into<String>) -> Self {
        self.actors.push(id.into());
        self
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn buggie(mut self, id: impl Into<String>, intensity: i64) -> Self {
        self.buggies.insert(id.into(), intensity);
        self
    }

    pub fn prop(mut self, id: impl Into<String>) -> Self {
        self.props.push(id.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn sub_beat(mut self, child: EventDraft) -> Self {
        self.sub_beats.get_or_insert_with(Vec::new).push(child);
        self
    }
}

/// A partial update to an existing beat. `None` leaves a field untouched.
///
/// `location` and `sub_beats` are doubly optional so a patch can clear them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(default)]
    pub spark: Option<SparkStage>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub actors: Option<Vec<String>>,
    #[serde(default)]
    pub location: Option<Option<String>>,
    #[serde(default)]
    pub buggies: Option<BTreeMap<String, i64>>,
    #[serde(default)]
    pub props: Option<Vec<String>>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub sub_beats: Option<Option<Vec<SparkEvent>>>,
}
