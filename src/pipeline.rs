//! # Estimation Pipeline
//!
//! One estimation pass over a snapshot of samples:
//! combined brightness -> bandpass -> {peaks, FFT} -> fusion.
//!
//! The same pass serves the periodic real-time update and the final
//! session-end calculation; only the fusion policy and the minimum amount of
//! filtered data differ.

use crate::filter::{self, NormalizedCutoffs};
use crate::fusion::{FusionPolicy, HeartRateEstimate};
use crate::peaks;
use crate::spectrum;
use crate::timeseries::{Sample, SampleSliceExt};

/// Smallest filtered series the estimators are run on
pub const MIN_FILTERED_SAMPLES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassResult {
    pub peaks_bpm: Option<u32>,
    pub fft_bpm: Option<u32>,
    pub estimate: HeartRateEstimate,
    pub cutoffs: Option<NormalizedCutoffs>,
}

/// Run both estimators over `samples` and fuse the results.
///
/// Returns `None` when the filtered series is shorter than `min_filtered`
/// (never less than `MIN_FILTERED_SAMPLES`).
pub fn run(
    samples: &[Sample],
    quality: f64,
    policy: FusionPolicy,
    min_filtered: usize,
) -> Option<PassResult> {
    let values = samples.combined_values();
    let timestamps = samples.timestamps();

    let filtered = filter::bandpass(&values, &timestamps);
    if filtered.len() < min_filtered.max(MIN_FILTERED_SAMPLES) {
        return None;
    }

    let peaks_bpm = peaks::estimate(&filtered.values, &timestamps);
    let fft_bpm = spectrum::estimate(&filtered.values, &timestamps);
    let estimate = policy.fuse(peaks_bpm, fft_bpm, quality);

    log::debug!(
        "Heart rate ({:?}): peaks={:?}, fft={:?}, quality={:.2} -> {}",
        policy,
        peaks_bpm,
        fft_bpm,
        quality,
        estimate
    );

    Some(PassResult {
        peaks_bpm,
        fft_bpm,
        estimate,
        cutoffs: filtered.last_cutoffs(),
    })
}
