//! The heart-rate view-model.
//!
//! Owns the session lifecycle, the bounded history and the derived display
//! state. Every mutation happens through `&mut self`, so whoever owns the model
//! is the single writer. Adapters reach the model only through its event
//! channel.
//!
//! ```text
//!   intents ──▶ ┌────────────────┐ ──▶ DisplayState subscribers
//!               │ HeartRateModel │
//!   adapter ──▶ └────────────────┘
//!   events          │       ▲
//!                   ▼       │
//!              SensorSession (start/pause/resume/end)
//! ```

use crate::core::display::{bpm_text, DisplayState, Status};
use crate::core::haptics::{Cue, Haptics, NoHaptics};
use crate::core::history::History;
use crate::sensor::types::{Reading, SensorEvent, SessionState};
use crate::sensor::SensorSession;
use crate::stats::{create_shared_stats, SharedSessionStats};
use crossbeam_channel::{unbounded, Receiver, Sender};
use uuid::Uuid;

pub struct HeartRateModel {
    sensor: Box<dyn SensorSession>,
    haptics: Box<dyn Haptics>,
    events_tx: Sender<SensorEvent>,
    events_rx: Receiver<SensorEvent>,
    history: History,
    session: SessionState,
    authorized: bool,
    status: Status,
    last_bpm: Option<i32>,
    session_id: Option<Uuid>,
    subscribers: Vec<Sender<DisplayState>>,
    stats: SharedSessionStats,
}

impl HeartRateModel {
    /// Create a model reading from `sensor` and keeping `capacity` samples.
    pub fn new(sensor: impl SensorSession + 'static, capacity: usize) -> Self {
        Self::from_boxed(Box::new(sensor), capacity)
    }

    /// Create a model from a sensor chosen at runtime.
    pub fn from_boxed(sensor: Box<dyn SensorSession>, capacity: usize) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            sensor,
            haptics: Box::new(NoHaptics),
            events_tx,
            events_rx,
            history: History::new(capacity),
            session: SessionState::NotStarted,
            authorized: false,
            status: Status::NotStarted,
            last_bpm: None,
            session_id: None,
            subscribers: Vec::new(),
            stats: create_shared_stats(),
        }
    }

    pub fn with_haptics(mut self, haptics: impl Haptics + 'static) -> Self {
        self.haptics = Box::new(haptics);
        self
    }

    pub fn with_stats(mut self, stats: SharedSessionStats) -> Self {
        self.stats = stats;
        self
    }

    /// Ask the adapter for read access. The result arrives as an event.
    pub fn request_auth(&mut self) {
        tracing::debug!(sensor = self.sensor.name(), "requesting authorization");
        self.sensor.authorize(self.events_tx.clone());
        self.settle();
    }

    /// Open a new session.
    pub fn start(&mut self) {
        if !self.session.can_start() {
            tracing::debug!(state = ?self.session, "start ignored");
            return;
        }
        if !self.authorized {
            tracing::info!("start refused: not authorized");
            self.status = Status::NotAuthorized;
            self.publish();
            return;
        }

        if let Err(e) = self.sensor.start(self.events_tx.clone()) {
            tracing::warn!(sensor = self.sensor.name(), error = %e, "session failed to start");
            self.status = Status::FailedToStart;
            self.publish();
            return;
        }

        // A new session starts with a fresh trend.
        self.history.clear();
        self.last_bpm = None;
        self.session = SessionState::Running;
        self.status = Status::Live;
        let id = Uuid::new_v4();
        self.session_id = Some(id);
        self.stats.record_session_started();
        self.haptics.play(Cue::Start);
        tracing::info!(session = %id, sensor = self.sensor.name(), "session started");

        self.settle();
    }

    pub fn pause(&mut self) {
        if self.session != SessionState::Running {
            tracing::debug!(state = ?self.session, "pause ignored");
            return;
        }
        // Readings queued while running still belong to the session.
        self.drain();
        self.sensor.pause();
        self.session = SessionState::Paused;
        self.status = Status::Paused;
        self.stats.record_pause();
        self.haptics.play(Cue::Stop);
        tracing::info!("session paused");
        self.settle();
    }

    pub fn resume(&mut self) {
        if self.session != SessionState::Paused {
            tracing::debug!(state = ?self.session, "resume ignored");
            return;
        }
        self.sensor.resume();
        self.session = SessionState::Running;
        self.status = Status::Live;
        self.haptics.play(Cue::Start);
        tracing::info!("session resumed");
        self.settle();
    }

    /// Close the session. The history stays visible until the next start or
    /// reset.
    pub fn end(&mut self) {
        if !self.session.is_active() {
            tracing::debug!(state = ?self.session, "end ignored");
            return;
        }
        self.drain();
        self.sensor.end();
        self.session = SessionState::Ended;
        self.status = Status::Ended;
        self.haptics.play(Cue::Success);
        if let Some(id) = self.session_id.take() {
            match self.history.summary() {
                Some(s) => tracing::info!(
                    session = %id,
                    samples = s.count,
                    min = s.min,
                    max = s.max,
                    mean = s.mean,
                    "session ended"
                ),
                None => tracing::info!(session = %id, "session ended without samples"),
            }
        }
        self.settle();
    }

    /// Return to the initial state from anywhere.
    pub fn reset(&mut self) {
        if self.session.is_active() {
            self.sensor.end();
        }
        self.discard_feed();

        self.history.clear();
        self.last_bpm = None;
        self.session = SessionState::NotStarted;
        self.status = Status::NotStarted;
        self.session_id = None;
        self.haptics.play(Cue::Click);
        tracing::info!("session reset");
        self.publish();
    }

    /// The UI came to the foreground: resume a paused session.
    pub fn on_foreground(&mut self) {
        if self.session == SessionState::Paused {
            self.resume();
        }
    }

    /// The UI went to the background: pause a running session.
    pub fn on_background(&mut self) {
        if self.session == SessionState::Running {
            self.pause();
        }
    }

    /// Close any open session without feedback. Used when the process exits.
    pub fn shutdown(&mut self) {
        if self.session.is_active() {
            self.drain();
            self.sensor.end();
            self.session = SessionState::Ended;
            self.status = Status::Ended;
            self.session_id = None;
            self.settle();
        }
    }

    /// Receiver the update loop waits on for adapter events.
    pub fn events(&self) -> Receiver<SensorEvent> {
        self.events_rx.clone()
    }

    /// Apply one adapter event and publish.
    pub fn ingest(&mut self, event: SensorEvent) {
        self.apply(event);
        self.publish();
    }

    /// Apply every event already queued. Returns how many were applied.
    pub fn process_pending(&mut self) -> usize {
        let applied = self.drain();
        if applied > 0 {
            self.publish();
        }
        applied
    }

    fn apply(&mut self, event: SensorEvent) {
        match event {
            SensorEvent::Reading(reading) => self.apply_reading(reading),
            SensorEvent::StateChanged(state) => {
                self.status = Status::from_session(state);
            }
            SensorEvent::Authorization(Ok(())) => {
                tracing::info!(sensor = self.sensor.name(), "authorized");
                self.authorized = true;
                // Never hide a live status behind "Ready".
                if !self.session.is_active() {
                    self.status = Status::Ready;
                }
            }
            SensorEvent::Authorization(Err(e)) => {
                tracing::warn!(sensor = self.sensor.name(), error = %e, "authorization failed");
                self.authorized = false;
                self.status = Status::from_error(&e);
            }
        }
    }

    fn apply_reading(&mut self, reading: Reading) {
        if self.session != SessionState::Running {
            tracing::debug!(state = ?self.session, "reading dropped");
            self.stats.record_dropped_reading();
            return;
        }
        match reading.bpm {
            Some(bpm) => {
                self.history.push(bpm);
                self.last_bpm = Some(bpm);
                self.stats.record_sample();
            }
            None => {
                self.last_bpm = None;
                self.stats.record_empty_reading();
            }
        }
    }

    fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Drop queued feed events but keep authorization outcomes.
    fn discard_feed(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            if let SensorEvent::Authorization(_) = event {
                self.apply(event);
            }
        }
    }

    /// Finish an intent: take in whatever the adapter produced synchronously,
    /// then publish once.
    fn settle(&mut self) {
        self.drain();
        self.publish();
    }

    pub fn display(&self) -> DisplayState {
        DisplayState {
            bpm_text: bpm_text(self.last_bpm),
            status: self.status.label().to_string(),
            authorized: self.authorized,
            recent_bpm: self.history.to_vec(),
            session: self.session,
        }
    }

    /// Subscribe to display updates. The current state is delivered first.
    pub fn subscribe(&mut self) -> Receiver<DisplayState> {
        let (tx, rx) = unbounded();
        self.add_subscriber(tx);
        rx
    }

    pub fn add_subscriber(&mut self, subscriber: Sender<DisplayState>) {
        if subscriber.send(self.display()).is_ok() {
            self.subscribers.push(subscriber);
        }
    }

    fn publish(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let state = self.display();
        self.subscribers.retain(|s| s.send(state.clone()).is_ok());
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn stats(&self) -> &SharedSessionStats {
        &self.stats
    }

    pub fn sensor_name(&self) -> &'static str {
        self.sensor.name()
    }
}

impl Drop for HeartRateModel {
    fn drop(&mut self) {
        if self.session.is_active() {
            self.sensor.end();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockConfig;
    use crate::sensor::{MockGenerator, MockHandle, MockSensor};

    fn mock_model(seed: u64) -> (HeartRateModel, MockHandle) {
        let sensor = MockSensor::manual(MockGenerator::seeded(MockConfig::default(), seed));
        let handle = sensor.handle();
        (HeartRateModel::new(sensor, 24), handle)
    }

    fn authorized_model(seed: u64) -> (HeartRateModel, MockHandle) {
        let (mut model, handle) = mock_model(seed);
        model.request_auth();
        (model, handle)
    }

    #[test]
    fn test_initial_state() {
        let (model, _) = mock_model(1);
        let display = model.display();
        assert_eq!(display.bpm_text, "--");
        assert_eq!(display.status, "Not started");
        assert!(!display.authorized);
        assert!(display.recent_bpm.is_empty());
        assert_eq!(display.session, SessionState::NotStarted);
    }

    #[test]
    fn test_request_auth_marks_ready() {
        let (model, _) = authorized_model(1);
        assert!(model.is_authorized());
        assert_eq!(model.status(), Status::Ready);
        assert_eq!(model.session(), SessionState::NotStarted);
    }

    #[test]
    fn test_start_requires_authorization() {
        let (mut model, handle) = mock_model(1);
        model.start();
        assert_eq!(model.session(), SessionState::NotStarted);
        assert_eq!(model.status(), Status::NotAuthorized);
        assert_eq!(handle.tick(), None);
    }

    #[test]
    fn test_start_shows_first_sample_immediately() {
        let (mut model, _) = authorized_model(11);
        model.start();

        let display = model.display();
        assert_eq!(display.session, SessionState::Running);
        assert_eq!(display.status, "Live");
        assert_eq!(display.recent_bpm.len(), 1);
        let v0 = display.recent_bpm[0];
        assert!((65..=85).contains(&v0));
        assert_eq!(display.bpm_text, v0.to_string());
        assert!(model.session_id().is_some());
    }

    #[test]
    fn test_ticks_fill_window_and_evict_oldest() {
        let (mut model, handle) = authorized_model(21);
        model.start();

        let mut ticked = Vec::new();
        for _ in 0..25 {
            ticked.push(handle.tick().unwrap());
            model.process_pending();
        }

        let recent = model.display().recent_bpm;
        assert_eq!(recent.len(), 24);
        assert_eq!(recent[0], ticked[1]);
        assert_eq!(recent, ticked[1..].to_vec());
        assert_eq!(model.display().bpm_text, ticked[24].to_string());
    }

    #[test]
    fn test_pause_resume_end_cycle() {
        let (mut model, handle) = authorized_model(3);
        model.start();

        model.pause();
        assert_eq!(model.session(), SessionState::Paused);
        assert_eq!(model.status(), Status::Paused);
        assert_eq!(handle.tick(), None);

        model.resume();
        assert_eq!(model.session(), SessionState::Running);
        assert_eq!(model.status(), Status::Live);
        assert!(handle.tick().is_some());
        model.process_pending();
        assert_eq!(model.history().len(), 2);

        model.end();
        assert_eq!(model.session(), SessionState::Ended);
        assert_eq!(model.status(), Status::Ended);
        assert_eq!(model.history().len(), 2);
        assert_ne!(model.display().bpm_text, "--");
    }

    #[test]
    fn test_pause_keeps_readings_queued_while_running() {
        let (mut model, handle) = authorized_model(15);
        model.start();
        let queued = handle.tick().unwrap();

        model.pause();
        assert_eq!(model.history().len(), 2);
        assert_eq!(model.history().latest(), Some(queued));
        assert_eq!(model.display().bpm_text, queued.to_string());
        assert_eq!(model.stats().snapshot().readings_dropped, 0);
    }

    #[test]
    fn test_end_keeps_readings_queued_while_running() {
        let (mut model, handle) = authorized_model(16);
        model.start();
        let first = handle.tick().unwrap();
        let second = handle.tick().unwrap();

        model.end();
        let recent = model.display().recent_bpm;
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[1..], [first, second]);
        assert_eq!(model.stats().snapshot().readings_dropped, 0);
    }

    #[test]
    fn test_invalid_intents_are_noops() {
        let (mut model, _) = authorized_model(4);

        model.pause();
        model.resume();
        model.end();
        assert_eq!(model.session(), SessionState::NotStarted);
        assert_eq!(model.status(), Status::Ready);

        model.start();
        let before = model.display();
        model.start();
        model.resume();
        assert_eq!(model.display(), before);

        model.pause();
        model.pause();
        assert_eq!(model.session(), SessionState::Paused);
        assert_eq!(model.stats().snapshot().pauses, 1);
    }

    #[test]
    fn test_restart_after_end_begins_fresh_history() {
        let (mut model, handle) = authorized_model(5);
        model.start();
        handle.tick();
        handle.tick();
        model.process_pending();
        model.end();
        assert_eq!(model.history().len(), 3);

        model.start();
        assert_eq!(model.session(), SessionState::Running);
        assert_eq!(model.history().len(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let (mut model, handle) = authorized_model(6);
        model.start();
        handle.tick();
        model.process_pending();

        model.reset();
        let display = model.display();
        assert_eq!(display.session, SessionState::NotStarted);
        assert_eq!(display.status, "Not started");
        assert_eq!(display.bpm_text, "--");
        assert!(display.recent_bpm.is_empty());
        assert!(display.authorized);
        assert_eq!(handle.tick(), None);
    }

    #[test]
    fn test_empty_reading_shows_placeholder() {
        let (mut model, _) = authorized_model(7);
        model.start();

        model.ingest(SensorEvent::empty());
        assert_eq!(model.display().bpm_text, "--");
        assert_eq!(model.history().len(), 1);

        model.ingest(SensorEvent::sample(90));
        assert_eq!(model.display().bpm_text, "90");
        assert_eq!(model.history().latest(), Some(90));
    }

    #[test]
    fn test_readings_dropped_when_not_running() {
        let (mut model, _) = authorized_model(8);
        model.ingest(SensorEvent::sample(80));
        assert!(model.history().is_empty());
        assert_eq!(model.display().bpm_text, "--");
        assert_eq!(model.stats().snapshot().readings_dropped, 1);
    }

    #[test]
    fn test_state_events_only_change_status() {
        let (mut model, _) = authorized_model(9);
        model.start();
        let len = model.history().len();

        model.ingest(SensorEvent::StateChanged(SessionState::Paused));
        assert_eq!(model.status(), Status::Paused);
        assert_eq!(model.session(), SessionState::Running);
        assert_eq!(model.history().len(), len);
    }

    #[test]
    fn test_scene_lifecycle() {
        let (mut model, _) = authorized_model(10);
        model.on_foreground();
        assert_eq!(model.session(), SessionState::NotStarted);

        model.start();
        model.on_background();
        assert_eq!(model.session(), SessionState::Paused);

        model.on_background();
        assert_eq!(model.session(), SessionState::Paused);

        model.on_foreground();
        assert_eq!(model.session(), SessionState::Running);
    }

    #[test]
    fn test_reauthorizing_keeps_live_status() {
        let (mut model, _) = authorized_model(12);
        model.start();
        model.request_auth();
        assert_eq!(model.status(), Status::Live);
        assert!(model.is_authorized());
    }

    #[test]
    fn test_subscribers_get_updates() {
        let (mut model, handle) = authorized_model(13);
        let updates = model.subscribe();

        let first = updates.try_recv().unwrap();
        assert_eq!(first.status, "Ready");

        model.start();
        let latest = updates.try_iter().last().unwrap();
        assert_eq!(latest.session, SessionState::Running);
        assert_eq!(latest.recent_bpm.len(), 1);

        handle.tick();
        model.process_pending();
        assert_eq!(updates.try_iter().last().unwrap().recent_bpm.len(), 2);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let (mut model, _) = authorized_model(14);
        let updates = model.subscribe();
        drop(updates);
        model.start();
        assert!(model.subscribers.is_empty());
    }
}
