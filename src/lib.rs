//! # ppg-pulse
//!
//! Heart rate from a fingertip pressed over a phone camera with the torch
//! on. Each preview frame is reduced to one color sample; a rolling window
//! of samples is filtered and analysed by two independent estimators (peak
//! intervals and FFT) whose results are fused into a BPM.
//!
//! ## Modules
//! - `frame`: Frame to average color
//! - `timeseries`: Samples and the rolling buffer
//! - `quality`: Signal quality score
//! - `filter`, `peaks`, `spectrum`, `fusion`, `pipeline`: Estimation
//! - `session`: Live session with a periodic estimator thread
//! - `tap`: Manual tap-along estimate
//! - `diagnostics`: Sensor troubleshooting snapshot
//! - `recorder`, `replay`: CSV recordings and offline analysis
//! - `config`, `error`: Settings and error types

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod frame;
pub mod fusion;
pub mod peaks;
pub mod pipeline;
pub mod quality;
pub mod recorder;
pub mod replay;
pub mod session;
pub mod spectrum;
pub mod tap;
pub mod timeseries;

pub use config::{Config, SessionConfig};
pub use error::{ConfigError, RecorderError, SessionError};
pub use frame::{Frame, FrameColor};
pub use fusion::{FusionPolicy, HeartRateEstimate, Method};
pub use session::{FinalEstimate, FinalOutcome, RealtimeEstimate, Session, SessionUpdate};
pub use tap::TapEstimator;
pub use timeseries::{Sample, SampleBuffer};
