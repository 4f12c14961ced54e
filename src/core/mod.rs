//! Core functionality for heartlive.
//!
//! This module contains:
//! - The heart-rate view-model and its session state machine
//! - The bounded sample history
//! - Display state and status labels
//! - Trend line helpers
//! - Haptic cue definitions

pub mod display;
pub mod haptics;
pub mod history;
pub mod model;
pub mod sparkline;

// Re-export commonly used types
pub use display::{DisplayState, Status, PLACEHOLDER};
pub use haptics::{Cue, Haptics, NoHaptics};
pub use history::{summarize, History, HistorySummary, DEFAULT_CAPACITY};
pub use model::HeartRateModel;
