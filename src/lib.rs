//! heartlive - live heart-rate readout with a rolling trend line.
//!
//! This library reads (or simulates) beats-per-minute samples, keeps a short
//! rolling history, and publishes a display-ready state with start, pause,
//! resume and end controls.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          heartlive                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐  events  ┌─────────────┐  state  ┌──────┐  │
//! │  │    Sensor    │─────────▶│  HeartRate  │────────▶│  UI  │  │
//! │  │ mock/replay  │◀─────────│    Model    │◀────────│      │  │
//! │  └──────────────┘  control └─────────────┘ intents └──────┘  │
//! │         ▲                         │                          │
//! │  ┌──────────────┐          ┌─────────────┐                   │
//! │  │    Ticker    │          │   History   │                   │
//! │  │     (2s)     │          │ (24 slots)  │                   │
//! │  └──────────────┘          └─────────────┘                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! All model mutation happens on one thread, owned by [`runtime::Runtime`].
//!
//! # Example
//!
//! ```no_run
//! use heartlive::{config::MockConfig, HeartRateModel, Intent, MockGenerator, MockSensor, Runtime};
//! use std::time::Duration;
//!
//! let sensor = MockSensor::new(MockGenerator::new(MockConfig::default()), Duration::from_secs(2));
//! let runtime = Runtime::spawn(HeartRateModel::new(sensor, 24));
//! let updates = runtime.subscribe().expect("update loop running");
//!
//! runtime.send(Intent::RequestAuth).expect("update loop running");
//! runtime.send(Intent::Start).expect("update loop running");
//!
//! for state in updates.iter().take(5) {
//!     println!("{} bpm ({})", state.bpm_text, state.status);
//! }
//! ```

pub mod config;
pub mod core;
pub mod runtime;
pub mod sensor;
pub mod stats;

// Re-export key types at crate root for convenience
pub use crate::core::{Cue, DisplayState, Haptics, HeartRateModel, History, NoHaptics, Status};
pub use config::{Config, ConfigError, MockConfig, SourceKind};
pub use runtime::{Intent, Runtime, RuntimeError, RuntimeHandle};
pub use sensor::{
    MockGenerator, MockSensor, ReplaySensor, SensorError, SensorEvent, SensorSession,
    SessionState,
};
pub use stats::{create_shared_stats, SessionStats, SharedSessionStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
