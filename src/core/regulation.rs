//! Regulation controller: two independent alerts with auto-clear timers.
//!
//! Timers are deadlines on the session clock. A deadline is armed on the
//! rising edge of an alert and removed by any explicit clear, so a pending
//! auto-clear can never fire against a later trigger.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a micro-beat alert stays up without acknowledgement.
pub const MICRO_BEAT_AUTO_CLEAR: Duration = Duration::from_secs(10);

/// How long a pause-and-breathe alert stays up without acknowledgement.
pub const PAUSE_AND_BREATHE_AUTO_CLEAR: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alert {
    /// Raised when a stressor's intensity crosses the threshold, or on request.
    MicroBeat,
    /// Raised only by an explicit emergency control.
    PauseAndBreathe,
}

/// What a trigger call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The alert went from inactive to active and its timer was armed.
    Raised,
    /// The alert was already active; its timer keeps its original deadline.
    AlreadyActive,
}

/// Snapshot of both alert flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulationState {
    pub micro_beat: bool,
    pub pause_and_breathe: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct AlertSlot {
    active: bool,
    deadline: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct RegulationController {
    micro_beat: AlertSlot,
    pause_and_breathe: AlertSlot,
    micro_beat_timeout: Duration,
    pause_timeout: Duration,
}

impl Default for RegulationController {
    fn default() -> Self {
        Self::new(MICRO_BEAT_AUTO_CLEAR, PAUSE_AND_BREATHE_AUTO_CLEAR)
    }
}

impl RegulationController {
    pub fn new(micro_beat_timeout: Duration, pause_timeout: Duration) -> Self {
        Self {
            micro_beat: AlertSlot::default(),
            pause_and_breathe: AlertSlot::default(),
            micro_beat_timeout,
            pause_timeout,
        }
    }

    fn slot(&self, alert: Alert) -> &AlertSlot {
        match alert {
            Alert::MicroBeat => &self.micro_beat,
            Alert::PauseAndBreathe => &self.pause_and_breathe,
        }
    }

    fn slot_mut(&mut self, alert: Alert) -> &mut AlertSlot {
        match alert {
            Alert::MicroBeat => &mut self.micro_beat,
            Alert::PauseAndBreathe => &mut self.pause_and_breathe,
        }
    }

    pub fn timeout(&self, alert: Alert) -> Duration {
        match alert {
            Alert::MicroBeat => self.micro_beat_timeout,
            Alert::PauseAndBreathe => self.pause_timeout,
        }
    }

    /// Raise an alert at session time `now`.
    pub fn trigger(&mut self, alert: Alert, now: Duration) -> TriggerOutcome {
        let timeout = self.timeout(alert);
        let slot = self.slot_mut(alert);
        if slot.active {
            return TriggerOutcome::AlreadyActive;
        }
        slot.active = true;
        slot.deadline = Some(now.saturating_add(timeout));
        tracing::debug!(?alert, deadline = ?slot.deadline, "regulation alert raised");
        TriggerOutcome::Raised
    }

    /// Acknowledge one alert, cancelling its timer. Returns whether it was active.
    pub fn clear(&mut self, alert: Alert) -> bool {
        let slot = self.slot_mut(alert);
        let was_active = slot.active;
        *slot = AlertSlot::default();
        if was_active {
            tracing::debug!(?alert, "regulation alert acknowledged");
        }
        was_active
    }

    /// Acknowledge both alerts.
    pub fn clear_all(&mut self) {
        self.clear(Alert::MicroBeat);
        self.clear(Alert::PauseAndBreathe);
    }

    /// Fire every timer due at or before `now`. Returns the alerts cleared.
    pub fn expire(&mut self, now: Duration) -> Vec<Alert> {
        let mut expired = Vec::new();
        for alert in [Alert::MicroBeat, Alert::PauseAndBreathe] {
            let slot = self.slot_mut(alert);
            if matches!(slot.deadline, Some(due) if due <= now) {
                *slot = AlertSlot::default();
                tracing::debug!(?alert, ?now, "regulation alert auto-cleared");
                expired.push(alert);
            }
        }
        expired
    }

    pub fn is_active(&self, alert: Alert) -> bool {
        self.slot(alert).active
    }

    /// When the alert's pending auto-clear is due, if one is armed.
    pub fn deadline(&self, alert: Alert) -> Option<Duration> {
        self.slot(alert).deadline
    }

    pub fn state(&self) -> RegulationState {
        RegulationState {
            micro_beat: self.micro_beat.active,
            pause_and_breathe: self.pause_and_breathe.active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn trigger_arms_timer_on_rising_edge() {
        let mut regulation = RegulationController::default();
        assert_eq!(regulation.trigger(Alert::MicroBeat, secs(2)), TriggerOutcome::Raised);
        assert!(regulation.is_active(Alert::MicroBeat));
        assert_eq!(regulation.deadline(Alert::MicroBeat), Some(secs(12)));
    }

    #[test]
    fn retrigger_does_not_restart_timer() {
        let mut regulation = RegulationController::default();
        regulation.trigger(Alert::MicroBeat, secs(0));
        assert_eq!(
            regulation.trigger(Alert::MicroBeat, secs(7)),
            TriggerOutcome::AlreadyActive
        );
        assert_eq!(regulation.deadline(Alert::MicroBeat), Some(secs(10)));
        assert!(regulation.expire(secs(10)).contains(&Alert::MicroBeat));
    }

    #[test]
    fn alerts_are_independent() {
        let mut regulation = RegulationController::default();
        regulation.trigger(Alert::PauseAndBreathe, secs(0));
        assert_eq!(
            regulation.state(),
            RegulationState {
                micro_beat: false,
                pause_and_breathe: true
            }
        );
        regulation.trigger(Alert::MicroBeat, secs(1));
        regulation.clear(Alert::PauseAndBreathe);
        assert!(regulation.is_active(Alert::MicroBeat));
        assert!(!regulation.is_active(Alert::PauseAndBreathe));
    }

    #[test]
    fn each_alert_expires_on_its_own_timer() {
        let mut regulation = RegulationController::default();
        regulation.trigger(Alert::MicroBeat, secs(0));
        regulation.trigger(Alert::PauseAndBreathe, secs(0));

        assert!(regulation.expire(secs(4)).is_empty());
        assert_eq!(regulation.expire(secs(5)), vec![Alert::PauseAndBreathe]);
        assert!(regulation.is_active(Alert::MicroBeat));
        assert_eq!(regulation.expire(secs(10)), vec![Alert::MicroBeat]);
        assert_eq!(regulation.state(), RegulationState::default());
    }

    #[test]
    fn explicit_clear_cancels_pending_timer() {
        let mut regulation = RegulationController::default();
        regulation.trigger(Alert::MicroBeat, secs(0));
        assert!(regulation.clear(Alert::MicroBeat));
        assert_eq!(regulation.deadline(Alert::MicroBeat), None);

        // A new trigger after the clear gets a fresh deadline; the old one is gone.
        regulation.trigger(Alert::MicroBeat, secs(8));
        assert!(regulation.expire(secs(10)).is_empty());
        assert!(regulation.is_active(Alert::MicroBeat));
        assert_eq!(regulation.expire(secs(18)), vec![Alert::MicroBeat]);
    }

    #[test]
    fn clearing_inactive_alert_is_noop() {
        let mut regulation = RegulationController::default();
        assert!(!regulation.clear(Alert::PauseAndBreathe));
        regulation.clear_all();
        assert_eq!(regulation.state(), RegulationState::default());
    }

    #[test]
    fn expired_alerts_serialize_with_acknowledge_names() {
        let mut regulation = RegulationController::default();
        regulation.trigger(Alert::MicroBeat, secs(0));
        regulation.trigger(Alert::PauseAndBreathe, secs(0));
        let expired = regulation.expire(secs(10));
        let json = serde_json::to_string(&expired).unwrap();
        assert_eq!(json, r#"["micro_beat","pause_and_breathe"]"#);

        let names: Vec<String> = serde_json::from_str(&json).unwrap();
        for (name, alert) in names.iter().zip(expired) {
            let parsed: Alert = serde_json::from_value(serde_json::Value::String(name.clone())).unwrap();
            assert_eq!(parsed, alert);
        }
    }

    #[test]
    fn custom_timeouts() {
        let mut regulation = RegulationController::new(secs(3), secs(1));
        regulation.trigger(Alert::MicroBeat, secs(0));
        assert_eq!(regulation.expire(secs(3)), vec![Alert::MicroBeat]);
        assert_eq!(regulation.timeout(Alert::PauseAndBreathe), secs(1));
    }
}
