//! Event and state types shared by every sensor session adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a sensor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    NotStarted,
    Running,
    Paused,
    Ended,
}

impl SessionState {
    /// Whether a session is open (running or paused).
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Running | SessionState::Paused)
    }

    /// Whether `start()` is accepted from this state.
    pub fn can_start(self) -> bool {
        matches!(self, SessionState::NotStarted | SessionState::Ended)
    }
}

/// Errors an adapter reports for authorization or session start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// The heart-rate sensor does not exist on this device.
    NotAvailable,
    /// Permission to read heart rate was denied or revoked.
    NotAuthorized,
    /// The session could not be opened.
    StartFailed(String),
}

impl std::fmt::Display for SensorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorError::NotAvailable => write!(f, "Heart rate sensor not available"),
            SensorError::NotAuthorized => write!(f, "Heart rate access not authorized"),
            SensorError::StartFailed(e) => write!(f, "Failed to start session: {e}"),
        }
    }
}

impl std::error::Error for SensorError {}

/// What an adapter pushes to the view-model.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    /// A heart-rate reading. `None` means the sensor reported no sample.
    Reading(Reading),
    /// The adapter's session changed state.
    StateChanged(SessionState),
    /// Outcome of an `authorize` request.
    Authorization(Result<(), SensorError>),
}

impl SensorEvent {
    /// A reading carrying a sample taken now.
    pub fn sample(bpm: i32) -> Self {
        SensorEvent::Reading(Reading::new(Some(bpm)))
    }

    /// A reading without a sample.
    pub fn empty() -> Self {
        SensorEvent::Reading(Reading::new(None))
    }
}

/// A single heart-rate reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// When the reading was produced
    pub timestamp: DateTime<Utc>,
    /// Beats per minute, if the sensor had a value
    pub bpm: Option<i32>,
}

impl Reading {
    pub fn new(bpm: Option<i32>) -> Self {
        Self {
            timestamp: Utc::now(),
            bpm,
        }
    }
}

/// Convert a raw sensor measurement to an integer BPM.
///
/// Rounds to the nearest integer, halves away from zero. Values are not
/// clamped; non-finite measurements yield `None`.
pub fn round_bpm(measurement: f64) -> Option<i32> {
    if !measurement.is_finite() {
        return None;
    }
    let rounded = measurement.round();
    if rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
        return None;
    }
    Some(rounded as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_bpm() {
        assert_eq!(round_bpm(72.4), Some(72));
        assert_eq!(round_bpm(72.5), Some(73));
        assert_eq!(round_bpm(180.9), Some(181));
        assert_eq!(round_bpm(f64::NAN), None);
        assert_eq!(round_bpm(f64::INFINITY), None);
    }

    #[test]
    fn test_session_state_predicates() {
        assert!(SessionState::NotStarted.can_start());
        assert!(SessionState::Ended.can_start());
        assert!(!SessionState::Running.can_start());
        assert!(SessionState::Paused.is_active());
        assert!(!SessionState::Ended.is_active());
    }

    #[test]
    fn test_sensor_error_display() {
        assert!(SensorError::NotAvailable.to_string().contains("not available"));
        let err = SensorError::StartFailed("busy".into());
        assert!(err.to_string().contains("busy"));
    }
}
