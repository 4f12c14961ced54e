//! Recorded heart-rate source.
//!
//! Plays back raw measurements from a text file, one per tick. This is the
//! measured-data path: values are rounded to whole beats per minute and passed
//! through unclamped.
//!
//! File format, one reading per line:
//! - a number is a raw BPM measurement (`72`, `71.6`)
//! - an empty line or `-` is a reading without a sample
//! - lines starting with `#` are comments

use crate::sensor::ticker::Ticker;
use crate::sensor::types::{round_bpm, Reading, SensorError, SensorEvent, SessionState};
use crate::sensor::SensorSession;
use crossbeam_channel::Sender;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// Parse recorded readings. Unparsable lines are skipped.
pub fn parse_readings(content: &str) -> Vec<Option<i32>> {
    let mut readings = Vec::new();

    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        if line.is_empty() || line == "-" {
            readings.push(None);
            continue;
        }
        match line.parse::<f64>() {
            Ok(value) => match round_bpm(value) {
                Some(bpm) => readings.push(Some(bpm)),
                None => tracing::warn!(line = number + 1, "skipping non-finite reading"),
            },
            Err(_) => tracing::warn!(line = number + 1, text = line, "skipping unparsable reading"),
        }
    }

    readings
}

/// Map file access problems onto the sensor error kinds.
pub fn check_access(path: &Path) -> Result<(), SensorError> {
    match std::fs::File::open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => Err(SensorError::NotAuthorized),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "recording not readable");
            Err(SensorError::NotAvailable)
        }
    }
}

struct Feed {
    readings: Vec<Option<i32>>,
    cursor: usize,
    sink: Option<Sender<SensorEvent>>,
    live: bool,
}

impl Feed {
    fn emit(&mut self, event: SensorEvent) -> bool {
        match &self.sink {
            Some(sink) => sink.send(event).is_ok(),
            None => false,
        }
    }

    /// Emit the next recorded reading. Returns `false` once there is nothing
    /// left to emit.
    fn advance(&mut self) -> bool {
        if !self.live {
            return false;
        }
        let Some(bpm) = self.readings.get(self.cursor).copied() else {
            tracing::info!(readings = self.readings.len(), "recording exhausted");
            self.live = false;
            return false;
        };
        self.cursor += 1;
        if self.emit(SensorEvent::Reading(Reading::new(bpm))) {
            true
        } else {
            self.live = false;
            false
        }
    }
}

fn lock(feed: &Mutex<Feed>) -> MutexGuard<'_, Feed> {
    feed.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle for stepping a replay feed by hand.
#[derive(Clone)]
pub struct ReplayHandle {
    feed: Arc<Mutex<Feed>>,
}

impl ReplayHandle {
    /// Emit the next reading. Returns `false` when the feed is idle or done.
    pub fn tick(&self) -> bool {
        lock(&self.feed).advance()
    }

    /// Number of readings not yet played.
    pub fn remaining(&self) -> usize {
        let feed = lock(&self.feed);
        feed.readings.len().saturating_sub(feed.cursor)
    }
}

/// Sensor adapter that plays back a recording.
pub struct ReplaySensor {
    path: PathBuf,
    interval: Option<Duration>,
    feed: Arc<Mutex<Feed>>,
    ticker: Option<Ticker>,
}

impl ReplaySensor {
    /// Play `path` back, one reading every `interval`.
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self::build(path.into(), Some(interval))
    }

    /// Play `path` back only through [`ReplayHandle::tick`].
    pub fn manual(path: impl Into<PathBuf>) -> Self {
        Self::build(path.into(), None)
    }

    fn build(path: PathBuf, interval: Option<Duration>) -> Self {
        Self {
            path,
            interval,
            feed: Arc::new(Mutex::new(Feed {
                readings: Vec::new(),
                cursor: 0,
                sink: None,
                live: false,
            })),
            ticker: None,
        }
    }

    pub fn handle(&self) -> ReplayHandle {
        ReplayHandle {
            feed: self.feed.clone(),
        }
    }

    fn start_ticker(&mut self) {
        self.stop_ticker();
        if let Some(interval) = self.interval {
            let handle = self.handle();
            self.ticker = Some(Ticker::spawn(interval, move || handle.tick()));
        }
    }

    // Never call with the feed locked.
    fn stop_ticker(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
    }
}

impl SensorSession for ReplaySensor {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn authorize(&mut self, reply: Sender<SensorEvent>) {
        let path = self.path.clone();
        thread::spawn(move || {
            let result = check_access(&path);
            let _ = reply.send(SensorEvent::Authorization(result));
        });
    }

    fn start(&mut self, sink: Sender<SensorEvent>) -> Result<(), SensorError> {
        self.stop_ticker();

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| SensorError::StartFailed(format!("{}: {e}", self.path.display())))?;
        let readings = parse_readings(&content);
        if readings.is_empty() {
            return Err(SensorError::StartFailed(format!(
                "{}: no readings",
                self.path.display()
            )));
        }

        {
            let mut feed = lock(&self.feed);
            feed.readings = readings;
            feed.cursor = 0;
            feed.sink = Some(sink);
            feed.live = true;
            feed.emit(SensorEvent::StateChanged(SessionState::Running));
            feed.advance();
        }
        self.start_ticker();
        Ok(())
    }

    fn pause(&mut self) {
        self.stop_ticker();
        let mut feed = lock(&self.feed);
        feed.live = false;
        feed.emit(SensorEvent::StateChanged(SessionState::Paused));
    }

    fn resume(&mut self) {
        {
            let mut feed = lock(&self.feed);
            if feed.sink.is_none() {
                return;
            }
            feed.live = true;
            feed.emit(SensorEvent::StateChanged(SessionState::Running));
        }
        self.start_ticker();
    }

    fn end(&mut self) {
        self.stop_ticker();
        let mut feed = lock(&self.feed);
        feed.live = false;
        feed.emit(SensorEvent::StateChanged(SessionState::Ended));
        feed.sink = None;
    }
}

impl Drop for ReplaySensor {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
