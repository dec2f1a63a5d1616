//! # Signal Quality Module
//!
//! Heuristic [0, 1] confidence in the current PPG signal, derived from the
//! short-window variance of the red channel.
//!
//! ## Mapping
//! A fingertip pressed correctly against the lens shows a small but visible
//! pulsation. Almost no variance means nothing is on the sensor, too much
//! means motion or over-pressure:
//! ```text
//! avg variance  < 0.05 -> 0.1
//!               < 0.3  -> avg / 0.3
//!               < 0.8  -> 1.0 - (avg - 0.3) / 0.5
//!               else   -> 0.2
//! ```

use crate::timeseries::SampleBuffer;
use std::collections::VecDeque;

/// Number of recent samples the variance is computed over
pub const DEFAULT_QUALITY_WINDOW: usize = 20;

const VARIANCE_HISTORY: usize = 5;
const VARIANCE_SCALE: f64 = 100.0;

/// Map the averaged normalized variance onto a quality score
pub fn quality_from_variance(avg_variance: f64) -> f64 {
    if avg_variance < 0.05 {
        0.1
    } else if avg_variance < 0.3 {
        avg_variance / 0.3
    } else if avg_variance < 0.8 {
        1.0 - (avg_variance - 0.3) / 0.5
    } else {
        0.2
    }
}

#[derive(Debug, Clone)]
pub struct QualityEstimator {
    window: usize,
    recent_variances: VecDeque<f64>,
    quality: f64,
}

impl QualityEstimator {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            recent_variances: VecDeque::with_capacity(VARIANCE_HISTORY + 1),
            quality: 0.0,
        }
    }

    /// Current smoothed quality in [0, 1]
    pub fn quality(&self) -> f64 {
        self.quality
    }

    /// Quality as an integer percentage (truncated)
    pub fn percent(&self) -> u8 {
        (self.quality * 100.0) as u8
    }

    /// Re-score after a new sample has been appended.
    ///
    /// Does nothing until the buffer holds more than `window` samples.
    pub fn observe(&mut self, buffer: &SampleBuffer) {
        if buffer.len() < self.window + 1 {
            return;
        }
        self.update_from_reds(&buffer.last_reds(self.window));
    }

    fn update_from_reds(&mut self, reds: &[f64]) {
        let n = reds.len() as f64;
        let mean = reds.iter().sum::<f64>() / n;
        let variance = reds.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        let normalized = (variance / VARIANCE_SCALE).min(1.0);

        self.recent_variances.push_back(normalized);
        if self.recent_variances.len() > VARIANCE_HISTORY {
            self.recent_variances.pop_front();
        }

        let avg_variance =
            self.recent_variances.iter().sum::<f64>() / self.recent_variances.len() as f64;
        self.quality = quality_from_variance(avg_variance);
    }

    pub fn reset(&mut self) {
        self.recent_variances.clear();
        self.quality = 0.0;
    }
}

impl Default for QualityEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_QUALITY_WINDOW)
    }
}
