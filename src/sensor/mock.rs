//! Synthetic heart-rate source.
//!
//! Used when no physical sensor is available. Produces a bounded random walk
//! with the same event shape as a real adapter.

use crate::config::MockConfig;
use crate::sensor::ticker::Ticker;
use crate::sensor::types::{SensorError, SensorEvent, SessionState};
use crate::sensor::SensorSession;
use crossbeam_channel::Sender;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Bounded random walk over heart-rate values.
pub struct MockGenerator {
    rng: StdRng,
    current: i32,
    config: MockConfig,
}

impl MockGenerator {
    /// Create a generator seeded from system entropy.
    pub fn new(config: MockConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a reproducible generator.
    pub fn seeded(config: MockConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: MockConfig, rng: StdRng) -> Self {
        Self {
            rng,
            current: 72,
            config,
        }
    }

    /// Pick a fresh starting value for a new session.
    pub fn begin(&mut self) -> i32 {
        let (lo, hi) = ordered(self.config.initial_min, self.config.initial_max);
        let start = self.rng.gen_range(lo..=hi);
        self.current = self.clamp(start);
        self.current
    }

    /// Advance by a random step.
    pub fn step(&mut self) -> i32 {
        let reach = self.config.max_step.saturating_abs();
        let delta = self.rng.gen_range(-reach..=reach);
        self.apply(delta)
    }

    /// Advance by `delta`, clamped to the configured bounds.
    pub fn apply(&mut self, delta: i32) -> i32 {
        self.current = self.clamp(self.current.saturating_add(delta));
        self.current
    }

    /// The most recent value.
    pub fn current(&self) -> i32 {
        self.current
    }

    fn clamp(&self, value: i32) -> i32 {
        let (lo, hi) = ordered(self.config.min_bpm, self.config.max_bpm);
        value.clamp(lo, hi)
    }
}

fn ordered(a: i32, b: i32) -> (i32, i32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Feed state shared between the adapter and its ticker thread.
struct Feed {
    generator: MockGenerator,
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

    fn tick(&mut self) -> Option<i32> {
        if !self.live {
            return None;
        }
        let bpm = self.generator.step();
        if self.emit(SensorEvent::sample(bpm)) {
            Some(bpm)
        } else {
            tracing::debug!("mock feed receiver gone, going idle");
            self.live = false;
            None
        }
    }
}

fn lock(feed: &Mutex<Feed>) -> MutexGuard<'_, Feed> {
    feed.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle for driving a mock feed by hand.
#[derive(Clone)]
pub struct MockHandle {
    feed: Arc<Mutex<Feed>>,
}

impl MockHandle {
    /// Produce one reading now. Returns `None` when the feed is not live.
    pub fn tick(&self) -> Option<i32> {
        lock(&self.feed).tick()
    }

    /// The generator's most recent value.
    pub fn current(&self) -> i32 {
        lock(&self.feed).generator.current()
    }
}

/// Sensor adapter backed by [`MockGenerator`].
pub struct MockSensor {
    feed: Arc<Mutex<Feed>>,
    interval: Option<Duration>,
    ticker: Option<Ticker>,
}

impl MockSensor {
    /// Create a mock sensor that ticks every `interval`.
    pub fn new(generator: MockGenerator, interval: Duration) -> Self {
        Self::build(generator, Some(interval))
    }

    /// Create a mock sensor without a background ticker; readings are
    /// produced only through [`MockHandle::tick`].
    pub fn manual(generator: MockGenerator) -> Self {
        Self::build(generator, None)
    }

    fn build(generator: MockGenerator, interval: Option<Duration>) -> Self {
        Self {
            feed: Arc::new(Mutex::new(Feed {
                generator,
                sink: None,
                live: false,
            })),
            interval,
            ticker: None,
        }
    }

    /// Get a handle that can tick this sensor's feed.
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            feed: self.feed.clone(),
        }
    }

    fn start_ticker(&mut self) {
        self.stop_ticker();
        if let Some(interval) = self.interval {
            let handle = self.handle();
            self.ticker = Some(Ticker::spawn(interval, move || handle.tick().is_some()));
        }
    }

    // Never call with the feed locked: the ticker thread may be waiting on it.
    fn stop_ticker(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
    }
}

impl SensorSession for MockSensor {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn authorize(&mut self, reply: Sender<SensorEvent>) {
        // Synthetic data needs no permission.
        let _ = reply.send(SensorEvent::Authorization(Ok(())));
    }

    fn start(&mut self, sink: Sender<SensorEvent>) -> Result<(), SensorError> {
        self.stop_ticker();
        {
            let mut feed = lock(&self.feed);
            feed.sink = Some(sink);
            feed.live = true;
            let first = feed.generator.begin();
            feed.emit(SensorEvent::StateChanged(SessionState::Running));
            feed.emit(SensorEvent::sample(first));
            tracing::debug!(bpm = first, "mock session started");
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

impl Drop for MockSensor {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
