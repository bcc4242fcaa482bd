//! Session counters. Values only grow until a full reset.

use serde::{Deserialize, Serialize};

/// A single telemetry counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TelemetryField {
    TimeOnTask,
    Edits,
    SbsOveragesMitigated,
    RegulationTriggers,
}

/// Session counters, exported with camelCase keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    /// Milliseconds spent authoring.
    pub time_on_task: u64,
    pub edits: u64,
    /// Times the budget went from exceeded back within caps.
    pub sbs_overages_mitigated: u64,
    /// Micro-beat triggers, one per trigger event.
    pub regulation_triggers: u64,
}

/// A partial increment; absent fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetryDelta {
    pub time_on_task: Option<u64>,
    pub edits: Option<u64>,
    pub sbs_overages_mitigated: Option<u64>,
    pub regulation_triggers: Option<u64>,
}

impl Telemetry {
    pub fn get(&self, field: TelemetryField) -> u64 {
        match field {
            TelemetryField::TimeOnTask => self.time_on_task,
            TelemetryField::Edits => self.edits,
            TelemetryField::SbsOveragesMitigated => self.sbs_overages_mitigated,
            TelemetryField::RegulationTriggers => self.regulation_triggers,
        }
    }

    pub fn increment(&mut self, field: TelemetryField, amount: u64) {
        let slot = match field {
            TelemetryField::TimeOnTask => &mut self.time_on_task,
            TelemetryField::Edits => &mut self.edits,
            TelemetryField::SbsOveragesMitigated => &mut self.sbs_overages_mitigated,
            TelemetryField::RegulationTriggers => &mut self.regulation_triggers,
        };
        *slot = slot.saturating_add(amount);
    }

    /// Apply several increments at once.
    pub fn apply(&mut self, delta: TelemetryDelta) {
        let pairs = [
            (TelemetryField::TimeOnTask, delta.time_on_task),
            (TelemetryField::Edits, delta.edits),
            (TelemetryField::SbsOveragesMitigated, delta.sbs_overages_mitigated),
            (TelemetryField::RegulationTriggers, delta.regulation_triggers),
        ];
        for (field, amount) in pairs {
            if let Some(amount) = amount {
                self.increment(field, amount);
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Time on task in whole minutes, rounded to nearest.
    pub fn minutes_on_task(&self) -> u64 {
        self.time_on_task.saturating_add(30_000) / 60_000
    }
}
