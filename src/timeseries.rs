//! # Sample Storage Module
//!
//! Per-frame color samples and the bounded rolling buffer that holds them
//! for the duration of a measurement session.
//!
//! ## Key Types
//! - `Sample`: One frame's average R/G/B brightness with its capture time
//! - `SampleBuffer`: Fixed-capacity sliding window of samples (FIFO eviction)
//! - `SampleSliceExt`: Helpers for pulling aligned series out of a snapshot
//!
//! ## Why a Sliding Window
//! The estimators only ever look at the most recent few seconds of signal.
//! Evicting from the front keeps the series contiguous in time, so a snapshot
//! never contains a gap or a jump backwards.

use std::collections::VecDeque;

/// Channel weights for the combined brightness value. Green carries most of
/// the pulse signal on a fingertip.
const RED_WEIGHT: f64 = 0.3;
const GREEN_WEIGHT: f64 = 0.6;
const BLUE_WEIGHT: f64 = 0.1;

/// Default number of samples retained by a session buffer
pub const DEFAULT_CAPACITY: usize = 350;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Milliseconds since acquisition start
    pub timestamp_ms: u64,
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl Sample {
    pub fn new(timestamp_ms: u64, red: f64, green: f64, blue: f64) -> Self {
        Self {
            timestamp_ms,
            red,
            green,
            blue,
        }
    }

    /// Weighted brightness fed to the bandpass filter
    pub fn combined(&self) -> f64 {
        self.red * RED_WEIGHT + self.green * GREEN_WEIGHT + self.blue * BLUE_WEIGHT
    }
}

pub trait SampleSliceExt {
    fn min_max_time(&self) -> Option<(u64, u64)>;
    fn combined_values(&self) -> Vec<f64>;
    fn timestamps(&self) -> Vec<u64>;
    fn mean_interval_ms(&self) -> Option<f64>;
}

impl SampleSliceExt for &[Sample] {
    fn min_max_time(&self) -> Option<(u64, u64)> {
        self.iter().fold(None, |acc, sample| match acc {
            None => Some((sample.timestamp_ms, sample.timestamp_ms)),
            Some((min, max)) => Some((min.min(sample.timestamp_ms), max.max(sample.timestamp_ms))),
        })
    }

    fn combined_values(&self) -> Vec<f64> {
        self.iter().map(Sample::combined).collect()
    }

    fn timestamps(&self) -> Vec<u64> {
        self.iter().map(|s| s.timestamp_ms).collect()
    }

    /// Average spacing between consecutive samples, first to last
    fn mean_interval_ms(&self) -> Option<f64> {
        if self.len() < 2 {
            return None;
        }
        let (first, last) = self.min_max_time()?;
        Some((last - first) as f64 / (self.len() - 1) as f64)
    }
}

/// Bounded, time-ordered sample store.
///
/// Appending past capacity drops the oldest sample. Samples whose timestamp
/// would move the series backwards are rejected.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    data: VecDeque<Sample>,
    capacity: usize,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.data.len() >= self.capacity
    }

    /// Append a sample, evicting the oldest one when over capacity.
    ///
    /// Returns `false` (and leaves the buffer untouched) if the sample is
    /// older than the newest stored sample.
    pub fn append(&mut self, sample: Sample) -> bool {
        if let Some(last) = self.data.back() {
            if sample.timestamp_ms < last.timestamp_ms {
                log::warn!(
                    "Dropping out-of-order sample at {} ms (newest is {} ms)",
                    sample.timestamp_ms,
                    last.timestamp_ms
                );
                return false;
            }
        }

        self.data.push_back(sample);
        if self.data.len() > self.capacity {
            self.data.pop_front();
        }
        true
    }

    /// Copy of the most recent `n` samples (or all of them if fewer exist)
    pub fn snapshot(&self, n: usize) -> Vec<Sample> {
        let start = self.data.len().saturating_sub(n);
        self.data.range(start..).copied().collect()
    }

    pub fn snapshot_all(&self) -> Vec<Sample> {
        self.data.iter().copied().collect()
    }

    /// Red channel of the most recent `n` samples
    pub fn last_reds(&self, n: usize) -> Vec<f64> {
        let start = self.data.len().saturating_sub(n);
        self.data.range(start..).map(|s| s.red).collect()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
