//! # Estimate Fusion Module
//!
//! Reconciles the peak-based and FFT-based estimates into one heart rate.
//!
//! ## Policies
//! - `Realtime`: used by the periodic update. When both methods produce a
//!   value it always blends them, weighting peaks at 0.7 when quality is
//!   above 0.7 and at 0.3 otherwise.
//! - `SessionEnd`: used once when a session stops. Close estimates (< 10 BPM
//!   apart) are blended 0.6/0.4 in favour of peaks; otherwise quality picks a
//!   single method (peaks above 0.7, FFT below).
//!
//! The two policies differ only in how a large gap between the methods is
//! handled.

use std::fmt;

pub const MIN_BPM: u32 = 40;
pub const MAX_BPM: u32 = 200;

const HIGH_QUALITY: f64 = 0.7;
const AGREEMENT_BPM: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Peaks,
    Fft,
    Fused,
    None,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Peaks => "peaks",
            Method::Fft => "fft",
            Method::Fused => "fused",
            Method::None => "none",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartRateEstimate {
    /// Beats per minute; 0 when undetermined
    pub bpm: u32,
    pub method: Method,
}

impl HeartRateEstimate {
    pub fn undetermined() -> Self {
        Self {
            bpm: 0,
            method: Method::None,
        }
    }

    fn checked(bpm: u32, method: Method) -> Self {
        if is_valid_bpm(bpm) {
            Self { bpm, method }
        } else {
            Self::undetermined()
        }
    }

    pub fn is_determined(&self) -> bool {
        self.method != Method::None && is_valid_bpm(self.bpm)
    }

    /// The BPM if it is usable
    pub fn bpm(&self) -> Option<u32> {
        self.is_determined().then_some(self.bpm)
    }
}

impl fmt::Display for HeartRateEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bpm() {
            Some(bpm) => write!(f, "{} BPM ({})", bpm, self.method),
            None => write!(f, "undetermined"),
        }
    }
}

pub fn is_valid_bpm(bpm: u32) -> bool {
    (MIN_BPM..=MAX_BPM).contains(&bpm)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionPolicy {
    Realtime,
    SessionEnd,
}

fn blend(peaks: u32, fft: u32, peak_weight: f64) -> u32 {
    (peaks as f64 * peak_weight + fft as f64 * (1.0 - peak_weight)).round() as u32
}

impl FusionPolicy {
    pub fn fuse(self, peaks: Option<u32>, fft: Option<u32>, quality: f64) -> HeartRateEstimate {
        let (peaks, fft) = match (peaks, fft) {
            (None, None) => return HeartRateEstimate::undetermined(),
            (Some(p), None) => return HeartRateEstimate::checked(p, Method::Peaks),
            (None, Some(f)) => return HeartRateEstimate::checked(f, Method::Fft),
            (Some(p), Some(f)) => (p, f),
        };

        match self {
            FusionPolicy::Realtime => {
                let peak_weight = if quality > HIGH_QUALITY { 0.7 } else { 0.3 };
                HeartRateEstimate::checked(blend(peaks, fft, peak_weight), Method::Fused)
            }
            FusionPolicy::SessionEnd => {
                if peaks.abs_diff(fft) < AGREEMENT_BPM {
                    HeartRateEstimate::checked(blend(peaks, fft, 0.6), Method::Fused)
                } else if quality > HIGH_QUALITY {
                    HeartRateEstimate::checked(peaks, Method::Peaks)
                } else {
                    HeartRateEstimate::checked(fft, Method::Fft)
                }
            }
        }
    }
}
