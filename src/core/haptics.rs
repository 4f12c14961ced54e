//! Haptic feedback cues played on session transitions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// Session started or resumed
    Start,
    /// Session paused
    Stop,
    /// Session ended
    Success,
    /// Session reset
    Click,
}

/// Somewhere to play cues. Implementations must not block.
pub trait Haptics: Send {
    fn play(&mut self, cue: Cue);
}

/// Discards every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn play(&mut self, _cue: Cue) {}
}
