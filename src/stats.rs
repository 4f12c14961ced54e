//! Session statistics.
//!
//! Counters are shared between the view-model thread and whoever reports on
//! them. Nothing is written to disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Running counters for one process lifetime.
#[derive(Debug)]
pub struct SessionStats {
    /// Sessions successfully started
    sessions_started: AtomicU64,
    /// Readings appended to the history
    samples_ingested: AtomicU64,
    /// Readings that carried no value
    empty_readings: AtomicU64,
    /// Readings that arrived while no session was running
    readings_dropped: AtomicU64,
    /// Pauses, manual or automatic
    pauses: AtomicU64,
    /// When counting began
    started_at: DateTime<Utc>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            sessions_started: AtomicU64::new(0),
            samples_ingested: AtomicU64::new(0),
            empty_readings: AtomicU64::new(0),
            readings_dropped: AtomicU64::new(0),
            pauses: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sample(&self) {
        self.samples_ingested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_empty_reading(&self) {
        self.empty_readings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_reading(&self) {
        self.readings_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pause(&self) {
        self.pauses.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            samples_ingested: self.samples_ingested.load(Ordering::Relaxed),
            empty_readings: self.empty_readings.load(Ordering::Relaxed),
            readings_dropped: self.readings_dropped.load(Ordering::Relaxed),
            pauses: self.pauses.load(Ordering::Relaxed),
            started_at: self.started_at,
            elapsed_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Session Statistics:\n\
             - Sessions started: {}\n\
             - Samples recorded: {}\n\
             - Readings without a value: {}\n\
             - Readings dropped while stopped: {}\n\
             - Pauses: {}\n\
             - Running time: {} seconds",
            stats.sessions_started,
            stats.samples_ingested,
            stats.empty_readings,
            stats.readings_dropped,
            stats.pauses,
            stats.elapsed_secs
        )
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.sessions_started.store(0, Ordering::Relaxed);
        self.samples_ingested.store(0, Ordering::Relaxed);
        self.empty_readings.store(0, Ordering::Relaxed);
        self.readings_dropped.store(0, Ordering::Relaxed);
        self.pauses.store(0, Ordering::Relaxed);
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`SessionStats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub sessions_started: u64,
    pub samples_ingested: u64,
    pub empty_readings: u64,
    pub readings_dropped: u64,
    pub pauses: u64,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: u64,
}

/// Thread-safe shared statistics.
pub type SharedSessionStats = Arc<SessionStats>;

/// Create a new shared statistics handle.
pub fn create_shared_stats() -> SharedSessionStats {
    Arc::new(SessionStats::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let stats = SessionStats::new();
        stats.record_session_started();
        stats.record_sample();
        stats.record_sample();
        stats.record_empty_reading();
        stats.record_dropped_reading();

        let snap = stats.snapshot();
        assert_eq!(snap.sessions_started, 1);
        assert_eq!(snap.samples_ingested, 2);
        assert_eq!(snap.empty_readings, 1);
        assert_eq!(snap.readings_dropped, 1);
        assert_eq!(snap.pauses, 0);
    }

    #[test]
    fn test_reset() {
        let stats = SessionStats::new();
        stats.record_pause();
        stats.record_sample();
        stats.reset();

        let snap = stats.snapshot();
        assert_eq!(snap.pauses, 0);
        assert_eq!(snap.samples_ingested, 0);
    }

    #[test]
    fn test_summary_format() {
        let stats = SessionStats::new();
        let summary = stats.summary();
        assert!(summary.contains("Sessions started"));
        assert!(summary.contains("Samples recorded"));
        assert!(summary.contains("Pauses"));
    }
}
