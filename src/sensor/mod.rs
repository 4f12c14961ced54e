//! Sensor session adapters.
//!
//! An adapter owns authorization and the live session and pushes
//! [`SensorEvent`]s into a channel supplied by the view-model. Adapters never
//! touch view-model state; they only send.

pub mod mock;
pub mod replay;
pub mod ticker;
pub mod types;

use crossbeam_channel::Sender;

// Re-export commonly used types
pub use mock::{MockGenerator, MockHandle, MockSensor};
pub use replay::{parse_readings, ReplayHandle, ReplaySensor};
pub use ticker::Ticker;
pub use types::{round_bpm, Reading, SensorError, SensorEvent, SessionState};

/// The contract every heart-rate source implements.
pub trait SensorSession: Send {
    /// Short name for logs and status output.
    fn name(&self) -> &'static str;

    /// Request read access.
    ///
    /// The outcome is delivered as [`SensorEvent::Authorization`] on `reply`,
    /// possibly later and from another thread.
    fn authorize(&mut self, reply: Sender<SensorEvent>);

    /// Open a session and begin feeding events into `sink`.
    ///
    /// Adapters emit the first reading before returning when they have one.
    fn start(&mut self, sink: Sender<SensorEvent>) -> Result<(), SensorError>;

    /// Suspend the feed. Stopping an inactive feed is a no-op.
    fn pause(&mut self);

    /// Resume a paused feed.
    fn resume(&mut self);

    /// Close the session and release the sink.
    fn end(&mut self);
}
