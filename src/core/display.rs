//! UI-ready state published by the view-model.

use crate::sensor::types::{SensorError, SessionState};
use serde::{Deserialize, Serialize};

/// Text shown when there is no current reading.
pub const PLACEHOLDER: &str = "--";

/// Human status shown under the readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    NotStarted,
    Ready,
    Live,
    Paused,
    Ended,
    NotAuthorized,
    Unavailable,
    FailedToStart,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::NotStarted => "Not started",
            Status::Ready => "Ready",
            Status::Live => "Live",
            Status::Paused => "Paused",
            Status::Ended => "Ended",
            Status::NotAuthorized => "Not authorized",
            Status::Unavailable => "Heart rate unavailable",
            Status::FailedToStart => "Failed to start",
        }
    }

    /// The label for a session state.
    pub fn from_session(state: SessionState) -> Self {
        match state {
            SessionState::NotStarted => Status::NotStarted,
            SessionState::Running => Status::Live,
            SessionState::Paused => Status::Paused,
            SessionState::Ended => Status::Ended,
        }
    }

    /// The label for an adapter failure.
    pub fn from_error(error: &SensorError) -> Self {
        match error {
            SensorError::NotAvailable => Status::Unavailable,
            SensorError::NotAuthorized => Status::NotAuthorized,
            SensorError::StartFailed(_) => Status::FailedToStart,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of everything a UI renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayState {
    /// Current BPM as text, or [`PLACEHOLDER`]
    pub bpm_text: String,
    /// Status label
    pub status: String,
    /// Whether heart-rate access is granted
    pub authorized: bool,
    /// Recent samples, oldest first
    pub recent_bpm: Vec<i32>,
    /// Current session state
    pub session: SessionState,
}

/// Format a reading for display.
pub fn bpm_text(bpm: Option<i32>) -> String {
    match bpm {
        Some(v) => v.to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_labels() {
        assert_eq!(Status::from_session(SessionState::NotStarted).label(), "Not started");
        assert_eq!(Status::from_session(SessionState::Running).label(), "Live");
        assert_eq!(Status::from_session(SessionState::Paused).label(), "Paused");
        assert_eq!(Status::from_session(SessionState::Ended).label(), "Ended");
    }

    #[test]
    fn test_error_labels() {
        assert_eq!(Status::from_error(&SensorError::NotAvailable), Status::Unavailable);
        assert_eq!(Status::from_error(&SensorError::NotAuthorized), Status::NotAuthorized);
        assert_eq!(
            Status::from_error(&SensorError::StartFailed("x".into())),
            Status::FailedToStart
        );
    }

    #[test]
    fn test_bpm_text() {
        assert_eq!(bpm_text(None), "--");
        assert_eq!(bpm_text(Some(72)), "72");
    }
}
