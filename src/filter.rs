//! # Bandpass Filter Module
//!
//! Isolates the heart-rate band (0.5 - 3.3 Hz) from the combined brightness
//! series before peak and spectral analysis.
//!
//! ## Behaviour
//! 1. Subtract the series mean (DC removal)
//! 2. Run a fixed-coefficient second-order recursion
//!    `y[i] = a * (x[i] + y[i-1] - y[i-2])`, `a = 0.95`
//!
//! Camera frame timing is irregular, so for every sample the normalized
//! cutoffs are also derived from the local frame interval. Those values are
//! reported alongside the output for diagnostics; the recursion itself does
//! not depend on them.

/// Lower edge of the heart-rate band (30 BPM)
pub const LOW_CUTOFF_HZ: f64 = 0.5;
/// Upper edge of the heart-rate band (200 BPM)
pub const HIGH_CUTOFF_HZ: f64 = 3.3;

const FILTER_COEFFICIENT: f64 = 0.95;
const FALLBACK_SAMPLE_RATE_HZ: f64 = 30.0;
const MAX_LOW_CUTOFF: f64 = 0.4;
const MAX_HIGH_CUTOFF: f64 = 0.9;
const MIN_FILTER_INPUT: usize = 4;

/// Band edges normalized to the local Nyquist frequency
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedCutoffs {
    pub sample_rate_hz: f64,
    pub low: f64,
    pub high: f64,
}

impl NormalizedCutoffs {
    fn at_rate(sample_rate_hz: f64) -> Self {
        Self {
            sample_rate_hz,
            low: (2.0 * LOW_CUTOFF_HZ / sample_rate_hz).min(MAX_LOW_CUTOFF),
            high: (2.0 * HIGH_CUTOFF_HZ / sample_rate_hz).min(MAX_HIGH_CUTOFF),
        }
    }
}

/// Output of one filter pass; one value per input sample
#[derive(Debug, Clone, Default)]
pub struct FilteredSignal {
    pub values: Vec<f64>,
    pub cutoffs: Vec<NormalizedCutoffs>,
}

impl FilteredSignal {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last_cutoffs(&self) -> Option<NormalizedCutoffs> {
        self.cutoffs.last().copied()
    }
}

fn local_sample_rate(timestamps: &[u64], i: usize) -> f64 {
    if i == 0 || i >= timestamps.len() {
        return FALLBACK_SAMPLE_RATE_HZ;
    }
    let delta = timestamps[i] as i64 - timestamps[i - 1] as i64;
    if delta > 0 {
        1000.0 / delta as f64
    } else {
        FALLBACK_SAMPLE_RATE_HZ
    }
}

/// Filter `values` sampled at `timestamps` (milliseconds).
///
/// Fewer than four values are returned as-is.
pub fn bandpass(values: &[f64], timestamps: &[u64]) -> FilteredSignal {
    if values.len() < MIN_FILTER_INPUT {
        return FilteredSignal {
            values: values.to_vec(),
            cutoffs: Vec::new(),
        };
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;

    let mut out = Vec::with_capacity(values.len());
    let mut cutoffs = Vec::with_capacity(values.len());
    let mut y1 = 0.0;
    let mut y2 = 0.0;

    for (i, value) in values.iter().enumerate() {
        cutoffs.push(NormalizedCutoffs::at_rate(local_sample_rate(timestamps, i)));

        let x = value - mean;
        let y = FILTER_COEFFICIENT * (x + y1 - y2);
        y2 = y1;
        y1 = y;
        out.push(y);
    }

    if let Some(last) = cutoffs.last() {
        log::trace!(
            "Bandpass: {} samples, local rate {:.1} Hz, cutoffs low={:.3} high={:.3}",
            out.len(),
            last.sample_rate_hz,
            last.low,
            last.high
        );
    }

    FilteredSignal {
        values: out,
        cutoffs,
    }
}
