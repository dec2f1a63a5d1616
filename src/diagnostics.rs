//! # Signal Diagnostics
//!
//! Snapshot of what the sensor currently sees, for troubleshooting finger
//! placement and lighting: channel levels, channel ratios, short-term red
//! variation, quality, and the filter cutoffs from the latest estimation
//! pass.

use crate::filter::NormalizedCutoffs;
use crate::timeseries::Sample;
use std::fmt;

/// Samples the diagnostics are averaged over
pub const DIAGNOSTIC_SAMPLES: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SignalDiagnostics {
    pub sample_count: usize,
    pub avg_red: f64,
    pub avg_green: f64,
    pub avg_blue: f64,
    pub brightness: f64,
    pub red_to_green: f64,
    pub red_to_blue: f64,
    pub red_variation: f64,
    pub quality_percent: u8,
    pub cutoffs: Option<NormalizedCutoffs>,
}

impl SignalDiagnostics {
    /// Build diagnostics from the most recent samples.
    ///
    /// `recent` should hold the last `DIAGNOSTIC_SAMPLES` samples;
    /// `sample_count` is the total buffered. Returns `None` when fewer than
    /// `DIAGNOSTIC_SAMPLES` are available.
    pub fn from_recent(
        recent: &[Sample],
        sample_count: usize,
        quality: f64,
        cutoffs: Option<NormalizedCutoffs>,
    ) -> Option<Self> {
        if recent.len() < DIAGNOSTIC_SAMPLES {
            return None;
        }
        let recent = &recent[recent.len() - DIAGNOSTIC_SAMPLES..];
        let n = recent.len() as f64;

        let avg_red = recent.iter().map(|s| s.red).sum::<f64>() / n;
        let avg_green = recent.iter().map(|s| s.green).sum::<f64>() / n;
        let avg_blue = recent.iter().map(|s| s.blue).sum::<f64>() / n;

        let red_variation = if recent.len() > 3 {
            let max = recent.iter().map(|s| s.red).fold(f64::MIN, f64::max);
            let min = recent.iter().map(|s| s.red).fold(f64::MAX, f64::min);
            max - min
        } else {
            0.0
        };

        Some(Self {
            sample_count,
            avg_red,
            avg_green,
            avg_blue,
            brightness: avg_red * 0.5 + avg_green * 0.3 + avg_blue * 0.2,
            red_to_green: avg_red / (avg_green + 1.0),
            red_to_blue: avg_red / (avg_blue + 1.0),
            red_variation,
            quality_percent: (quality * 100.0) as u8,
            cutoffs,
        })
    }
}

impl fmt::Display for SignalDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Signal quality diagnostics:")?;
        writeln!(f, "  Samples: {}", self.sample_count)?;
        writeln!(f, "  Brightness: {:.1}", self.brightness)?;
        writeln!(f, "  Red: {:.1}", self.avg_red)?;
        writeln!(f, "  Green: {:.1}", self.avg_green)?;
        writeln!(f, "  Blue: {:.1}", self.avg_blue)?;
        writeln!(f, "  Red/Green ratio: {:.2}", self.red_to_green)?;
        writeln!(f, "  Red/Blue ratio: {:.2}", self.red_to_blue)?;
        writeln!(f, "  Red variation: {:.2}", self.red_variation)?;
        if let Some(c) = &self.cutoffs {
            writeln!(
                f,
                "  Filter cutoffs: low={:.3} high={:.3} @ {:.1} Hz",
                c.low, c.high, c.sample_rate_hz
            )?;
        }
        write!(f, "  Signal quality: {}%", self.quality_percent)
    }
}
