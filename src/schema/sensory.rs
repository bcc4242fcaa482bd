//! The five canonical sensory axes and a load measured across them.

use serde::{Deserialize, Serialize};

/// One of the five canonical sensory axes.
///
/// Prop effects may name other keys (e.g. `anxiety`); only these five take
/// part in budget aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Audio,
    Visual,
    Social,
    Proprioceptive,
    Cognitive,
}

impl Axis {
    /// All canonical axes in display order.
    pub const ALL: [Axis; 5] = [
        Axis::Audio,
        Axis::Visual,
        Axis::Social,
        Axis::Proprioceptive,
        Axis::Cognitive,
    ];

    /// The key used for this axis in prop effect mappings.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Visual => "visual",
            Self::Social => "social",
            Self::Proprioceptive => "proprioceptive",
            Self::Cognitive => "cognitive",
        }
    }

    /// Resolve an effect key to a canonical axis. Unknown keys yield `None`.
    pub fn from_key(key: &str) -> Option<Axis> {
        Self::ALL.into_iter().find(|axis| axis.key() == key)
    }
}

/// A non-negative load on each canonical axis.
///
/// Used both for a location's inherent profile and for the derived
/// sensory budget of the active scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensoryLoad {
    pub audio: u32,
    pub visual: u32,
    pub social: u32,
    pub proprioceptive: u32,
    pub cognitive: u32,
}

impl SensoryLoad {
    pub fn new(audio: u32, visual: u32, social: u32, proprioceptive: u32, cognitive: u32) -> Self {
        Self {
            audio,
            visual,
            social,
            proprioceptive,
            cognitive,
        }
    }

    pub fn get(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Audio => self.audio,
            Axis::Visual => self.visual,
            Axis::Social => self.social,
            Axis::Proprioceptive => self.proprioceptive,
            Axis::Cognitive => self.cognitive,
        }
    }

    fn slot(&mut self, axis: Axis) -> &mut u32 {
        match axis {
            Axis::Audio => &mut self.audio,
            Axis::Visual => &mut self.visual,
            Axis::Social => &mut self.social,
            Axis::Proprioceptive => &mut self.proprioceptive,
            Axis::Cognitive => &mut self.cognitive,
        }
    }

    pub fn set(&mut self, axis: Axis, value: u32) {
        *self.slot(axis) = value;
    }

    /// `(axis, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Axis, u32)> + '_ {
        Axis::ALL.into_iter().map(move |axis| (axis, self.get(axis)))
    }

    /// Sum over all five axes, saturating at `u32::MAX`.
    pub fn total(&self) -> u32 {
        self.iter().fold(0u32, |sum, (_, v)| sum.saturating_add(v))
    }

    /// A copy with every axis lowered to at most `max`.
    pub fn capped(&self, max: u32) -> Self {
        let mut load = *self;
        for axis in Axis::ALL {
            load.set(axis, self.get(axis).min(max));
        }
        load
    }
}
