//! Bounded sample history backing the trend line.

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution};
use std::collections::VecDeque;

/// Default number of samples kept (48 seconds at the default cadence).
pub const DEFAULT_CAPACITY: usize = 24;

/// Fixed-size sliding window of BPM samples, oldest first.
///
/// Appending at capacity evicts the oldest sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    samples: VecDeque<i32>,
    capacity: usize,
}

impl History {
    /// Create an empty history. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest if full. Returns the evicted value.
    pub fn push(&mut self, bpm: i32) -> Option<i32> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(bpm);
        evicted
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The most recent sample.
    pub fn latest(&self) -> Option<i32> {
        self.samples.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &i32> {
        self.samples.iter()
    }

    /// Copy the samples out, oldest first.
    pub fn to_vec(&self) -> Vec<i32> {
        self.samples.iter().copied().collect()
    }

    /// Descriptive statistics over the window.
    pub fn summary(&self) -> Option<HistorySummary> {
        summarize(&self.to_vec())
    }
}

/// Descriptive statistics over a slice of samples. `None` when empty.
pub fn summarize(samples: &[i32]) -> Option<HistorySummary> {
    let min = *samples.iter().min()?;
    let max = *samples.iter().max()?;

    let data = Data::new(samples.iter().map(|&v| v as f64).collect::<Vec<_>>());
    let mean = data.mean().unwrap_or(min as f64);
    // Sample std dev is undefined for a single value.
    let std_dev = data.std_dev().filter(|v| v.is_finite()).unwrap_or(0.0);

    Some(HistorySummary {
        count: samples.len(),
        min,
        max,
        mean,
        std_dev,
    })
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Statistics over the samples currently in a [`History`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub count: usize,
    pub min: i32,
    pub max: i32,
    pub mean: f64,
    pub std_dev: f64,
}
