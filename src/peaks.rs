//! # Peak-Based Heart Rate Estimation
//!
//! Time-domain estimate: find systolic peaks in the filtered signal with an
//! adaptive amplitude threshold, then convert the median peak-to-peak
//! interval into BPM.

use crate::fusion::{MAX_BPM, MIN_BPM};

/// Minimum spacing between accepted peaks, in samples
pub const MIN_PEAK_DISTANCE: usize = 15;
/// Fewer peaks than this can't give a trustworthy interval
pub const MIN_PEAKS: usize = 3;

const THRESHOLD_PERCENTILE: f64 = 0.7;
const THRESHOLD_SCALE: f64 = 0.5;

/// Half the 70th-percentile absolute amplitude. Zero for very short input.
pub fn adaptive_threshold(values: &[f64]) -> f64 {
    if values.len() <= 10 {
        return 0.0;
    }
    let mut amplitudes: Vec<f64> = values.iter().map(|v| v.abs()).collect();
    amplitudes.sort_by(|a, b| a.total_cmp(b));
    let index = (amplitudes.len() as f64 * THRESHOLD_PERCENTILE) as usize;
    amplitudes[index.min(amplitudes.len() - 1)] * THRESHOLD_SCALE
}

/// Indices of local maxima above `threshold`, at least `MIN_PEAK_DISTANCE`
/// samples apart. A peak must beat two neighbours on each side.
pub fn find_peaks(values: &[f64], threshold: f64) -> Vec<usize> {
    let mut peaks = Vec::new();
    if values.len() < 5 {
        return peaks;
    }

    let mut last_peak: Option<usize> = None;
    for i in 2..values.len() - 2 {
        let v = values[i];
        let is_local_max = v > values[i - 1]
            && v > values[i - 2]
            && v > values[i + 1]
            && v > values[i + 2];
        let far_enough = last_peak.map_or(true, |last| i - last >= MIN_PEAK_DISTANCE);

        if v > threshold && is_local_max && far_enough {
            peaks.push(i);
            last_peak = Some(i);
        }
    }
    peaks
}

/// Median of `intervals` using the upper-middle index for even counts
fn median_interval(mut intervals: Vec<u64>) -> Option<u64> {
    if intervals.is_empty() {
        return None;
    }
    intervals.sort_unstable();
    Some(intervals[intervals.len() / 2])
}

/// Estimate BPM from peak spacing.
///
/// `values` and `timestamps` must be aligned. Returns `None` when fewer than
/// three peaks are found or the result lies outside the physiological range.
pub fn estimate(values: &[f64], timestamps: &[u64]) -> Option<u32> {
    let threshold = adaptive_threshold(values);
    let peaks = find_peaks(values, threshold);

    log::debug!(
        "Peak analysis: found {} peaks, threshold={:.2}",
        peaks.len(),
        threshold
    );

    if peaks.len() < MIN_PEAKS {
        return None;
    }

    let intervals: Vec<u64> = peaks
        .windows(2)
        .filter_map(|pair| {
            let start = timestamps.get(pair[0])?;
            let end = timestamps.get(pair[1])?;
            Some(end.saturating_sub(*start))
        })
        .collect();

    let median = median_interval(intervals)?;
    log::debug!("Median peak interval: {} ms", median);
    if median == 0 {
        return None;
    }

    let bpm = (60_000.0 / median as f64).round() as u32;
    if (MIN_BPM..=MAX_BPM).contains(&bpm) {
        Some(bpm)
    } else {
        log::debug!("Peak BPM out of range: {}", bpm);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const SAMPLE_INTERVAL_MS: u64 = 40;

    fn sine(freq_hz: f64, n: usize) -> (Vec<f64>, Vec<u64>) {
        let timestamps: Vec<u64> = (0..n as u64).map(|i| i * SAMPLE_INTERVAL_MS).collect();
        let values = timestamps
            .iter()
            .map(|t| (2.0 * PI * freq_hz * *t as f64 / 1000.0).sin())
            .collect();
        (values, timestamps)
    }

    #[test]
    fn test_sinusoids_within_tolerance() {
        for freq in [0.7, 1.0, 1.1, 1.25, 1.5] {
            let (values, timestamps) = sine(freq, 350);
            let bpm = estimate(&values, &timestamps).expect("no estimate") as i64;
            let expected = (freq * 60.0).round() as i64;
            assert!((bpm - expected).abs() <= 3, "{} Hz: got {}", freq, bpm);
        }
    }

    #[test]
    fn test_exact_period() {
        // 1.25 Hz at 25 Hz sampling is exactly 20 samples per beat
        let (values, timestamps) = sine(1.25, 120);
        assert_eq!(estimate(&values, &timestamps), Some(75));
    }

    #[test]
    fn test_min_distance_caps_rate() {
        // 15 samples at 25 Hz is 600 ms: nothing above 100 BPM is resolved
        for freq in [2.0, 2.5, 3.0] {
            let (values, timestamps) = sine(freq, 350);
            let bpm = estimate(&values, &timestamps).expect("no estimate");
            assert!(bpm <= 100, "{} Hz: got {}", freq, bpm);
        }
    }

    #[test]
    fn test_two_peaks_is_undetermined() {
        let (values, timestamps) = sine(1.0, 50);
        assert_eq!(find_peaks(&values, adaptive_threshold(&values)), vec![6, 31]);
        assert_eq!(estimate(&values, &timestamps), None);

        // One more beat is enough
        let (values, timestamps) = sine(1.0, 60);
        assert_eq!(estimate(&values, &timestamps), Some(60));
    }

    #[test]
    fn test_flat_signal_has_no_peaks() {
        let values = vec![0.0; 100];
        let timestamps: Vec<u64> = (0..100).map(|i| i * 40).collect();
        assert!(find_peaks(&values, adaptive_threshold(&values)).is_empty());
        assert_eq!(estimate(&values, &timestamps), None);
    }

    #[test]
    fn test_min_peak_distance() {
        // Spikes every 5 samples; only every third one survives
        let values: Vec<f64> = (0..60).map(|i| if i % 5 == 2 { 1.0 } else { 0.0 }).collect();
        let peaks = find_peaks(&values, 0.5);
        assert_eq!(peaks, vec![2, 17, 32, 47]);
    }

    #[test]
    fn test_threshold_percentile() {
        let values: Vec<f64> = (0..20).map(|i| -(i as f64)).collect();
        // abs sorted 0..19, index 14 -> 14 * 0.5
        assert_eq!(adaptive_threshold(&values), 7.0);
        assert_eq!(adaptive_threshold(&values[..10]), 0.0);
    }

    #[test]
    fn test_out_of_range_rejected() {
        // Peaks 2 s apart -> 30 BPM
        let values: Vec<f64> = (0..200).map(|i| if i % 50 == 10 { 1.0 } else { 0.0 }).collect();
        let timestamps: Vec<u64> = (0..200).map(|i| i * 40).collect();
        assert_eq!(find_peaks(&values, adaptive_threshold(&values)).len(), 4);
        assert_eq!(estimate(&values, &timestamps), None);
    }
}
