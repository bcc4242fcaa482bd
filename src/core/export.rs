//! Export formatter: JSON snapshots and the care-note summary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::telemetry::Telemetry;
use crate::schema::catalog::{Buggie, Location, Munchie, Prop, Tiggie, MAX_INTENSITY};
use crate::schema::spark::SparkEvent;
use crate::schema::story::Story;

/// Effect key whose reduction marks a prop as helpful in care notes.
const CALMING_EFFECT: &str = "anxiety";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A full, order-preserving dump of one session's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// `null` when no story has been created yet.
    pub story: Option<Story>,
    pub events: Vec<SparkEvent>,
    pub munchies: Vec<Munchie>,
    pub tiggies: Vec<Tiggie>,
    /// Session copies, carrying the current intensities.
    pub buggies: Vec<Buggie>,
    pub props: Vec<Prop>,
    pub locations: Vec<Location>,
    pub telemetry: Telemetry,
}

impl Snapshot {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(input: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn care_note(&self) -> String {
        care_note(&self.buggies, &self.props, &self.telemetry)
    }
}

/// Render the caregiver summary.
///
/// ```text
/// Care Note Summary:
/// Buggie Trends: Overwhelm: 4/5, Loud Noises: 1/5
/// Successful Props: Weighted Arms, Noise Muffs
/// Regulation Triggers: 1
/// Time on Task: 3 minutes
/// ```
pub fn care_note(buggies: &[Buggie], props: &[Prop], telemetry: &Telemetry) -> String {
    let trends = buggies
        .iter()
        .map(|b| format!("{}: {}/{}", b.label, b.intensity, MAX_INTENSITY))
        .collect::<Vec<_>>()
        .join(", ");
    let helpful = props
        .iter()
        .filter(|p| p.reduces(CALMING_EFFECT))
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Care Note Summary:\nBuggie Trends: {trends}\nSuccessful Props: {helpful}\nRegulation Triggers: {}\nTime on Task: {} minutes",
        telemetry.regulation_triggers,
        telemetry.minutes_on_task()
    )
}
