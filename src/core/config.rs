//! Session configuration, loadable from RON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::core::budget::SensoryBudgetCaps;
use crate::core::regulation::{MICRO_BEAT_AUTO_CLEAR, PAUSE_AND_BREATHE_AUTO_CLEAR};
use crate::schema::catalog::MAX_INTENSITY;

/// Intensities strictly above this raise the micro-beat alert.
pub const DEFAULT_MICRO_BEAT_THRESHOLD: u8 = 3;

/// Upper bound on any single text-generation call.
pub const DEFAULT_COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("micro-beat threshold {0} is above the maximum intensity")]
    ThresholdOutOfRange(u8),
    #[error("read-aloud speed must be positive")]
    ZeroReadAloudSpeed,
}

/// Presentation preferences that travel with requests and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeSettings {
    pub kid_mode: bool,
    pub read_aloud: bool,
    pub read_aloud_wpm: u32,
    pub pictogram_mode: bool,
}

impl Default for ModeSettings {
    fn default() -> Self {
        Self {
            kid_mode: true,
            read_aloud: true,
            read_aloud_wpm: 130,
            pictogram_mode: false,
        }
    }
}

/// Limits and timings for one authoring session.
///
/// Durations are written in milliseconds in RON files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub caps: SensoryBudgetCaps,
    pub micro_beat_threshold: u8,
    #[serde(with = "millis")]
    pub micro_beat_auto_clear: Duration,
    #[serde(with = "millis")]
    pub pause_auto_clear: Duration,
    #[serde(with = "millis")]
    pub collaborator_timeout: Duration,
    pub modes: ModeSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            caps: SensoryBudgetCaps::default(),
            micro_beat_threshold: DEFAULT_MICRO_BEAT_THRESHOLD,
            micro_beat_auto_clear: MICRO_BEAT_AUTO_CLEAR,
            pause_auto_clear: PAUSE_AND_BREATHE_AUTO_CLEAR,
            collaborator_timeout: DEFAULT_COLLABORATOR_TIMEOUT,
            modes: ModeSettings::default(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.micro_beat_threshold > MAX_INTENSITY {
            return Err(ConfigError::ThresholdOutOfRange(self.micro_beat_threshold));
        }
        if self.modes.read_aloud_wpm == 0 {
            return Err(ConfigError::ZeroReadAloudSpeed);
        }
        Ok(())
    }

    pub fn parse_ron(input: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_ron(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SessionConfig::default();
        assert_eq!(config.caps.total, 6);
        assert_eq!(config.caps.per_axis, 3);
        assert_eq!(config.micro_beat_threshold, 3);
        assert_eq!(config.micro_beat_auto_clear, Duration::from_secs(10));
        assert_eq!(config.pause_auto_clear, Duration::from_secs(5));
        assert!(config.modes.kid_mode);
        assert_eq!(config.modes.read_aloud_wpm, 130);
    }

    #[test]
    fn partial_ron_fills_defaults() {
        let config = SessionConfig::parse_ron(
            r#"(
                caps: (total: 8, per_axis: 4),
                micro_beat_auto_clear: 2500,
                modes: (kid_mode: false),
            )"#,
        )
        .unwrap();
        assert_eq!(config.caps.total, 8);
        assert_eq!(config.micro_beat_auto_clear, Duration::from_millis(2500));
        assert_eq!(config.pause_auto_clear, Duration::from_secs(5));
        assert!(!config.modes.kid_mode);
        assert!(config.modes.read_aloud);
    }

    #[test]
    fn ron_round_trip() {
        let config = SessionConfig::default();
        let text = ron::to_string(&config).unwrap();
        assert_eq!(SessionConfig::parse_ron(&text).unwrap(), config);
    }

    #[test]
    fn threshold_above_max_rejected() {
        assert!(matches!(
            SessionConfig::parse_ron("(micro_beat_threshold: 6)"),
            Err(ConfigError::ThresholdOutOfRange(6))
        ));
    }

    #[test]
    fn zero_wpm_rejected() {
        assert!(matches!(
            SessionConfig::parse_ron("(modes: (read_aloud_wpm: 0))"),
            Err(ConfigError::ZeroReadAloudSpeed)
        ));
    }
}
