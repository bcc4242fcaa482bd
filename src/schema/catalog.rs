//! Catalog entries: characters, coping guides, stressors, props and places.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::sensory::{Axis, SensoryLoad};

/// Highest intensity a Buggie can carry.
pub const MAX_INTENSITY: u8 = 5;

/// A story character ("Munchie").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Munchie {
    pub id: String,
    pub name: String,
    /// Neurotype descriptors, e.g. "Autism".
    #[serde(default)]
    pub profile: Vec<String>,
    /// Prop ids this character usually carries.
    #[serde(default)]
    pub accessories: Vec<String>,
    /// Buggie ids this character is prone to.
    #[serde(default)]
    pub buggies: Vec<String>,
    #[serde(default)]
    pub emoji: String,
}

/// A coping guide ("Tiggie") with short cue lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tiggie {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub emoji: String,
}

impl Tiggie {
    /// The cue used in regulation beats: the first tip, if any.
    pub fn cue(&self) -> Option<&str> {
        self.tips.first().map(String::as_str)
    }
}

/// A sensory trigger category ("Buggie") with its current intensity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buggie {
    pub id: String,
    pub label: String,
    pub intensity: u8,
    #[serde(default)]
    pub emoji: String,
}

impl Buggie {
    /// Repair an arbitrary requested intensity into `0..=MAX_INTENSITY`.
    pub fn clamp_intensity(requested: i64) -> u8 {
        requested.clamp(0, MAX_INTENSITY as i64) as u8
    }
}

/// A regulation aid with signed per-axis effects.
///
/// Effect keys are open-ended. Canonical axis keys feed the sensory budget,
/// anything else (e.g. `anxiety`) is carried for display and care notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub effect: BTreeMap<String, i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nfc: Option<String>,
    #[serde(default)]
    pub emoji: String,
}

impl Prop {
    /// Delta applied to a named effect key, zero when absent.
    pub fn delta(&self, key: &str) -> i32 {
        self.effect.get(key).copied().unwrap_or(0)
    }

    /// True if this prop lowers the named effect key.
    pub fn reduces(&self, key: &str) -> bool {
        self.delta(key) < 0
    }

    /// Effect entries whose keys are not canonical axes.
    pub fn extra_effects(&self) -> impl Iterator<Item = (&str, i32)> + '_ {
        self.effect
            .iter()
            .filter(|(key, _)| Axis::from_key(key).is_none())
            .map(|(key, delta)| (key.as_str(), *delta))
    }
}

/// A setting with an inherent sensory profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub sensory: SensoryLoad,
    #[serde(default)]
    pub emoji: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weighted_arms() -> Prop {
        Prop {
            id: "weighted-arms".to_string(),
            name: "Weighted Arms".to_string(),
            effect: BTreeMap::from([
                ("proprioceptive".to_string(), -2),
                ("anxiety".to_string(), -1),
            ]),
            nfc: Some("urn:nfc:weighted-arms".to_string()),
            emoji: String::new(),
        }
    }

    #[test]
    fn clamp_intensity_repairs_out_of_range() {
        assert_eq!(Buggie::clamp_intensity(-3), 0);
        assert_eq!(Buggie::clamp_intensity(0), 0);
        assert_eq!(Buggie::clamp_intensity(4), 4);
        assert_eq!(Buggie::clamp_intensity(5), 5);
        assert_eq!(Buggie::clamp_intensity(12), 5);
    }

    #[test]
    fn prop_deltas() {
        let prop = weighted_arms();
        assert_eq!(prop.delta("proprioceptive"), -2);
        assert_eq!(prop.delta("audio"), 0);
        assert!(prop.reduces("anxiety"));
        assert!(!prop.reduces("visual"));
    }

    #[test]
    fn extra_effects_skip_canonical_axes() {
        let prop = weighted_arms();
        let extras: Vec<_> = prop.extra_effects().collect();
        assert_eq!(extras, vec![("anxiety", -1)]);
    }

    #[test]
    fn tiggie_cue_is_first_tip() {
        let tiggie = Tiggie {
            id: "verbal-tiggie-01".to_string(),
            kind: "Verbal Thinker".to_string(),
            tips: vec!["Take deep breaths".to_string(), "Count to five".to_string()],
            emoji: String::new(),
        };
        assert_eq!(tiggie.cue(), Some("Take deep breaths"));
    }

    #[test]
    fn tiggie_kind_serializes_as_type() {
        let tiggie = Tiggie {
            id: "t".to_string(),
            kind: "Visual Thinker".to_string(),
            tips: Vec::new(),
            emoji: String::new(),
        };
        let json = serde_json::to_string(&tiggie).unwrap();
        assert!(json.contains("\"type\":\"Visual Thinker\""));
    }
}
