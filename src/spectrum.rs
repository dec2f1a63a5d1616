//! # FFT-Based Heart Rate Estimation
//!
//! Frequency-domain estimate: Hamming-windowed, zero-padded radix-2 FFT of
//! the filtered signal, then the strongest bin inside the heart-rate band.
//!
//! ## Resolution
//! Bin width is `sample_rate / N`. A full 350-sample buffer at 25-30 fps pads
//! to 512 points, i.e. roughly 3 BPM per bin. The 120-sample real-time
//! window pads to 128 points and is about four times coarser.

use crate::filter::{HIGH_CUTOFF_HZ, LOW_CUTOFF_HZ};
use crate::fusion::is_valid_bpm;
use std::f64::consts::PI;

/// Minimum number of samples before a spectrum is attempted
pub const MIN_FFT_SAMPLES: usize = 32;

/// Below this the band is considered empty
const MIN_MAGNITUDE: f64 = 1e-9;

/// Multiply `data` in place by a Hamming window of the same length
pub fn apply_hamming(data: &mut [f64]) {
    let n = data.len();
    if n < 2 {
        return;
    }
    let denom = (n - 1) as f64;
    for (i, value) in data.iter_mut().enumerate() {
        *value *= 0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos();
    }
}

/// In-place iterative radix-2 FFT. Both slices must share a power-of-two
/// length.
pub fn fft(real: &mut [f64], imag: &mut [f64]) {
    let n = real.len();
    debug_assert_eq!(n, imag.len());
    debug_assert!(n.is_power_of_two());
    if n < 2 {
        return;
    }

    // Bit-reversal permutation
    let mut j = 0;
    for i in 0..n - 1 {
        if i < j {
            real.swap(i, j);
            imag.swap(i, j);
        }
        let mut k = n / 2;
        while k <= j {
            j -= k;
            k /= 2;
        }
        j += k;
    }

    // Butterflies
    let mut half = 1;
    while half < n {
        let span = half * 2;
        let angle = -PI / half as f64;
        let (w_imag, w_real) = angle.sin_cos();

        for start in (0..n).step_by(span) {
            let mut tw_real = 1.0;
            let mut tw_imag = 0.0;

            for offset in 0..half {
                let top = start + offset;
                let bottom = top + half;

                let t_real = tw_real * real[bottom] - tw_imag * imag[bottom];
                let t_imag = tw_real * imag[bottom] + tw_imag * real[bottom];

                real[bottom] = real[top] - t_real;
                imag[bottom] = imag[top] - t_imag;
                real[top] += t_real;
                imag[top] += t_imag;

                let next_real = tw_real * w_real - tw_imag * w_imag;
                tw_imag = tw_real * w_imag + tw_imag * w_real;
                tw_real = next_real;
            }
        }

        half = span;
    }
}

/// Mean sample rate in Hz over the (unpadded) timestamps
fn mean_sample_rate(timestamps: &[u64]) -> Option<f64> {
    let (first, last) = (timestamps.first()?, timestamps.last()?);
    if timestamps.len() < 2 || last <= first {
        return None;
    }
    let avg_delta = (last - first) as f64 / (timestamps.len() - 1) as f64;
    Some(1000.0 / avg_delta)
}

/// Estimate BPM from the dominant in-band frequency.
///
/// Returns `None` for fewer than 32 samples, a silent band, or a result
/// outside the physiological range.
pub fn estimate(values: &[f64], timestamps: &[u64]) -> Option<u32> {
    if values.len() < MIN_FFT_SAMPLES {
        return None;
    }

    let n = values.len().next_power_of_two();
    let mut real = vec![0.0; n];
    real[..values.len()].copy_from_slice(values);
    let mut imag = vec![0.0; n];

    apply_hamming(&mut real);
    fft(&mut real, &mut imag);

    let sample_rate = mean_sample_rate(timestamps)?;
    log::debug!("FFT analysis: sample rate={:.1} Hz, window size={}", sample_rate, n);

    let min_bin = (n as f64 * LOW_CUTOFF_HZ / sample_rate) as usize;
    let max_bin = ((n as f64 * HIGH_CUTOFF_HZ / sample_rate) as usize).min(n / 2);

    let mut max_magnitude = 0.0;
    let mut dominant_bin = 0;
    for bin in min_bin..max_bin {
        let magnitude = real[bin].hypot(imag[bin]);
        if magnitude > max_magnitude {
            max_magnitude = magnitude;
            dominant_bin = bin;
        }
    }

    let dominant_freq = dominant_bin as f64 * sample_rate / n as f64;
    log::debug!(
        "FFT: dominant frequency={:.2} Hz, magnitude={:.2}",
        dominant_freq,
        max_magnitude
    );

    if max_magnitude < MIN_MAGNITUDE {
        return None;
    }

    let bpm = (dominant_freq * 60.0).round() as u32;
    is_valid_bpm(bpm).then_some(bpm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_hz: f64, n: usize) -> (Vec<f64>, Vec<u64>) {
        let timestamps: Vec<u64> = (0..n as u64).map(|i| i * 40).collect();
        let values = timestamps
            .iter()
            .map(|t| (2.0 * PI * freq_hz * *t as f64 / 1000.0).sin())
            .collect();
        (values, timestamps)
    }

    #[test]
    fn test_fft_of_impulse_is_flat() {
        let mut real = vec![0.0; 8];
        let mut imag = vec![0.0; 8];
        real[0] = 1.0;
        fft(&mut real, &mut imag);
        for (re, im) in real.iter().zip(imag.iter()) {
            assert!((re - 1.0).abs() < 1e-12);
            assert!(im.abs() < 1e-12);
        }
    }

    #[test]
    fn test_fft_locates_pure_tone() {
        let n = 64;
        let mut real: Vec<f64> = (0..n).map(|i| (2.0 * PI * 5.0 * i as f64 / n as f64).cos()).collect();
        let mut imag = vec![0.0; n];
        fft(&mut real, &mut imag);

        let magnitudes: Vec<f64> = real.iter().zip(imag.iter()).map(|(r, i)| r.hypot(*i)).collect();
        assert!((magnitudes[5] - 32.0).abs() < 1e-9);
        assert!((magnitudes[59] - 32.0).abs() < 1e-9);
        assert!(magnitudes[4] < 1e-9);
    }

    #[test]
    fn test_hamming_endpoints() {
        let mut data = vec![1.0; 5];
        apply_hamming(&mut data);
        assert!((data[0] - 0.08).abs() < 1e-12);
        assert!((data[2] - 1.0).abs() < 1e-12);
        assert!((data[4] - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_sinusoids_within_tolerance() {
        for freq in [0.7, 1.0, 1.2, 1.5, 2.0, 2.5, 3.0] {
            let (values, timestamps) = sine(freq, 350);
            let bpm = estimate(&values, &timestamps).expect("no estimate") as i64;
            let expected = (freq * 60.0).round() as i64;
            assert!((bpm - expected).abs() <= 3, "{} Hz: got {}", freq, bpm);
        }
    }

    #[test]
    fn test_band_edge_truncates_below_range() {
        // ~30 Hz sampling: 0.67 Hz lands in the bin just under 40 BPM
        let timestamps: Vec<u64> = (0..350).map(|i| i * 33).collect();
        let values: Vec<f64> = timestamps
            .iter()
            .map(|t| (2.0 * PI * 0.67 * *t as f64 / 1000.0).sin())
            .collect();
        assert_eq!(estimate(&values, &timestamps), None);
    }

    #[test]
    fn test_too_few_samples() {
        let (values, timestamps) = sine(1.2, 31);
        assert_eq!(estimate(&values, &timestamps), None);
    }

    #[test]
    fn test_silent_signal() {
        let values = vec![0.0; 128];
        let timestamps: Vec<u64> = (0..128).map(|i| i * 40).collect();
        assert_eq!(estimate(&values, &timestamps), None);
    }

    #[test]
    fn test_degenerate_timestamps() {
        let (values, _) = sine(1.2, 64);
        assert_eq!(estimate(&values, &[0; 64]), None);
    }
}
