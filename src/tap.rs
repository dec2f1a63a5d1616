//! # Manual Tap Estimator
//!
//! Heart rate from the user tapping along with their pulse. Taps older than
//! 15 seconds are dropped on every tick; the median tap interval gives BPM.

use crate::fusion::is_valid_bpm;
use std::collections::VecDeque;

/// How long a tap stays relevant
pub const TAP_WINDOW_MS: u64 = 15_000;

#[derive(Debug, Clone, Default)]
pub struct TapEstimator {
    taps: VecDeque<u64>,
}

impl TapEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tap at `now_ms` and return the updated estimate
    pub fn tap(&mut self, now_ms: u64) -> Option<u32> {
        if let Some(&last) = self.taps.back() {
            if now_ms < last {
                log::warn!("Ignoring tap at {} ms, earlier than previous tap at {} ms", now_ms, last);
                return self.bpm();
            }
        }
        self.taps.push_back(now_ms);
        self.bpm()
    }

    /// Drop taps older than the window and return the current estimate
    pub fn tick(&mut self, now_ms: u64) -> Option<u32> {
        while let Some(&oldest) = self.taps.front() {
            if now_ms.saturating_sub(oldest) > TAP_WINDOW_MS {
                self.taps.pop_front();
            } else {
                break;
            }
        }
        self.bpm()
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    pub fn clear(&mut self) {
        self.taps.clear();
    }

    /// Median-interval BPM; needs at least two taps
    pub fn bpm(&self) -> Option<u32> {
        if self.taps.len() < 2 {
            return None;
        }

        let mut intervals: Vec<u64> = self
            .taps
            .iter()
            .zip(self.taps.iter().skip(1))
            .map(|(a, b)| b - a)
            .collect();
        intervals.sort_unstable();

        let median = intervals[intervals.len() / 2];
        if median == 0 {
            return None;
        }
        let bpm = (60_000.0 / median as f64).round() as u32;
        is_valid_bpm(bpm).then_some(bpm)
    }
}
