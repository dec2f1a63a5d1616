//! # Measurement Session Module
//!
//! Ties the pipeline to a live sample stream and manages the session
//! lifecycle.
//!
//! ## Key Components
//! - `SessionCore`: Single-threaded state (buffer + quality) and the
//!   producer/consumer logic, usable directly for offline replay
//! - `Session`: Thread-safe wrapper; frames are pushed from the capture
//!   thread while a periodic worker publishes real-time estimates
//! - `SessionUpdate`: Everything the session reports to its host
//!
//! ## Concurrency
//! ```text
//! capture thread --push_frame--> [Mutex<SessionCore>] <--snapshot-- periodic worker
//!                                        |                              |
//!                                        +------ SessionUpdate ---------+--> host
//! ```
//! The lock is held only while the buffer is mutated or copied; filtering
//! and both estimators run on the copy. `stop()` closes the producer path
//! and joins the worker before the final estimate is taken and the buffer
//! cleared, so no stale update or late write can follow it.

use crate::config::SessionConfig;
use crate::diagnostics::{SignalDiagnostics, DIAGNOSTIC_SAMPLES};
use crate::error::SessionError;
use crate::filter::NormalizedCutoffs;
use crate::frame::{self, Frame};
use crate::fusion::{FusionPolicy, HeartRateEstimate};
use crate::pipeline::{self, PassResult};
use crate::quality::QualityEstimator;
use crate::recorder::CsvRecorder;
use crate::timeseries::{Sample, SampleBuffer, SampleSliceExt};
use crossbeam_channel::{bounded, select, tick, unbounded, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

/// Quality below which the host should ask for better finger contact
const LOW_QUALITY: f64 = 0.4;
/// Samples needed before low quality is reported
const LOW_QUALITY_MIN_SAMPLES: usize = 30;
/// Log channel averages every this many samples
const LOG_EVERY_SAMPLES: usize = 50;

/// Published by a running session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// After every accepted sample
    Progress {
        progress_percent: u8,
        quality_percent: u8,
    },
    /// Quality dropped below the contact threshold
    LowQuality { quality_percent: u8 },
    /// Periodic heart-rate estimate
    Estimate(RealtimeEstimate),
    /// Buffer filled in non-continuous mode; the host should stop
    Complete,
    /// Session-end estimate
    Final(FinalEstimate),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RealtimeEstimate {
    pub estimate: HeartRateEstimate,
    pub peaks_bpm: Option<u32>,
    pub fft_bpm: Option<u32>,
    pub quality_percent: u8,
    pub progress_percent: u8,
    /// Buffer is full and the window is sliding
    pub continuous: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalOutcome {
    Measured,
    /// Enough data, but neither method found a plausible rate
    NotDetected,
    /// Session too short to analyse
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalEstimate {
    pub estimate: HeartRateEstimate,
    pub outcome: FinalOutcome,
    pub sample_count: usize,
}

/// Result of pushing one sample through the producer path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushOutcome {
    pub accepted: bool,
    pub progress_percent: u8,
    pub quality_percent: u8,
    /// Quality just crossed below the contact threshold
    pub low_quality: bool,
    /// Buffer just filled in non-continuous mode
    pub completed: bool,
}

/// Snapshot taken under the lock for one real-time pass
#[derive(Debug, Clone)]
pub struct RealtimeInput {
    pub samples: Vec<Sample>,
    pub quality: f64,
    pub progress_percent: u8,
    pub continuous: bool,
}

/// Session state without any threading
#[derive(Debug, Clone)]
pub struct SessionCore {
    config: SessionConfig,
    buffer: SampleBuffer,
    quality: QualityEstimator,
    accepting: bool,
    low_quality_flagged: bool,
    last_cutoffs: Option<NormalizedCutoffs>,
}

impl SessionCore {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            buffer: SampleBuffer::new(config.capacity),
            quality: QualityEstimator::new(config.quality_window),
            accepting: false,
            low_quality_flagged: false,
            last_cutoffs: None,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Clear all data and start accepting samples
    pub fn begin(&mut self) {
        self.clear();
        self.accepting = true;
    }

    /// Stop accepting samples; data is kept for the final estimate
    pub fn close(&mut self) {
        self.accepting = false;
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.quality.reset();
        self.low_quality_flagged = false;
        self.last_cutoffs = None;
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn quality(&self) -> f64 {
        self.quality.quality()
    }

    pub fn progress_percent(&self) -> u8 {
        if self.buffer.is_full() {
            100
        } else {
            (self.buffer.len() * 100 / self.buffer.capacity()) as u8
        }
    }

    /// Producer path: append a sample and re-score quality
    pub fn push(&mut self, sample: Sample) -> PushOutcome {
        let mut outcome = PushOutcome {
            accepted: false,
            progress_percent: self.progress_percent(),
            quality_percent: self.quality.percent(),
            low_quality: false,
            completed: false,
        };

        if !self.accepting || !self.buffer.append(sample) {
            return outcome;
        }
        self.quality.observe(&self.buffer);

        if self.buffer.len() % LOG_EVERY_SAMPLES == 0 {
            log::debug!(
                "RGB values: R={:.0}, G={:.0}, B={:.0}",
                sample.red,
                sample.green,
                sample.blue
            );
        }

        let is_low = self.quality.quality() < LOW_QUALITY && self.buffer.len() > LOW_QUALITY_MIN_SAMPLES;
        if is_low && !self.low_quality_flagged {
            log::warn!(
                "Low signal quality ({}%), finger contact may be poor",
                self.quality.percent()
            );
        }
        outcome.low_quality = is_low && !self.low_quality_flagged;
        self.low_quality_flagged = is_low;

        if !self.config.continuous_mode && self.buffer.is_full() {
            log::info!("Buffer full ({} samples), measurement complete", self.buffer.len());
            self.accepting = false;
            outcome.completed = true;
        }

        outcome.accepted = true;
        outcome.progress_percent = self.progress_percent();
        outcome.quality_percent = self.quality.percent();
        outcome
    }

    /// Consumer path: copy the real-time window if there is enough data
    pub fn realtime_input(&self) -> Option<RealtimeInput> {
        let len = self.buffer.len();
        if len <= self.config.quality_window * 2 || len < self.config.realtime_window {
            return None;
        }
        Some(RealtimeInput {
            samples: self.buffer.snapshot(self.config.realtime_window),
            quality: self.quality.quality(),
            progress_percent: self.progress_percent(),
            continuous: self.buffer.is_full(),
        })
    }

    pub fn snapshot_all(&self) -> Vec<Sample> {
        self.buffer.snapshot_all()
    }

    pub fn record_cutoffs(&mut self, cutoffs: Option<NormalizedCutoffs>) {
        if cutoffs.is_some() {
            self.last_cutoffs = cutoffs;
        }
    }

    pub fn diagnostics(&self) -> Option<SignalDiagnostics> {
        SignalDiagnostics::from_recent(
            &self.buffer.snapshot(DIAGNOSTIC_SAMPLES),
            self.buffer.len(),
            self.quality.quality(),
            self.last_cutoffs,
        )
    }

    /// Session-end estimate over everything retained
    pub fn final_estimate(&self) -> FinalEstimate {
        final_estimate(&self.snapshot_all(), self.quality(), self.config.quality_window)
    }
}

/// One real-time pass over a snapshot
pub fn realtime_estimate(input: &RealtimeInput) -> Option<(RealtimeEstimate, PassResult)> {
    let samples = input.samples.as_slice();
    if let Some(interval) = samples.mean_interval_ms().filter(|i| *i > 0.0) {
        log::debug!(
            "Frame rate: {:.0} FPS, window: {} frames",
            1000.0 / interval,
            samples.len()
        );
    }

    let pass = pipeline::run(
        samples,
        input.quality,
        FusionPolicy::Realtime,
        pipeline::MIN_FILTERED_SAMPLES,
    )?;

    let estimate = RealtimeEstimate {
        estimate: pass.estimate,
        peaks_bpm: pass.peaks_bpm,
        fft_bpm: pass.fft_bpm,
        quality_percent: (input.quality * 100.0) as u8,
        progress_percent: input.progress_percent,
        continuous: input.continuous,
    };
    Some((estimate, pass))
}

/// Session-end estimate over `samples`
pub fn final_estimate(samples: &[Sample], quality: f64, quality_window: usize) -> FinalEstimate {
    let insufficient = FinalEstimate {
        estimate: HeartRateEstimate::undetermined(),
        outcome: FinalOutcome::InsufficientData,
        sample_count: samples.len(),
    };

    if samples.len() <= quality_window {
        log::warn!("Not enough data for a heart rate: {} samples", samples.len());
        return insufficient;
    }

    let Some(pass) = pipeline::run(samples, quality, FusionPolicy::SessionEnd, quality_window * 2)
    else {
        log::warn!("Measurement too short: {} samples", samples.len());
        return insufficient;
    };

    let outcome = if pass.estimate.is_determined() {
        log::info!("Final heart rate: {}", pass.estimate);
        FinalOutcome::Measured
    } else {
        log::warn!("Could not determine heart rate from {} samples", samples.len());
        FinalOutcome::NotDetected
    };

    FinalEstimate {
        estimate: pass.estimate,
        outcome,
        sample_count: samples.len(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct PeriodicWorker {
    stop_tx: Sender<()>,
    handle: thread::JoinHandle<()>,
}

/// Thread-safe measurement session.
///
/// Frames may be pushed from any thread. Updates are delivered on the
/// receiver returned by `Session::new`.
pub struct Session {
    config: SessionConfig,
    core: Arc<Mutex<SessionCore>>,
    updates: Sender<SessionUpdate>,
    worker: Mutex<Option<PeriodicWorker>>,
    recorder: Mutex<Option<Arc<CsvRecorder>>>,
}

impl Session {
    /// Creates a new idle session.
    ///
    /// Returns the session and the receiver its updates are published on.
    pub fn new(config: SessionConfig) -> (Self, Receiver<SessionUpdate>) {
        let (updates, receiver) = unbounded();
        let session = Session {
            core: Arc::new(Mutex::new(SessionCore::new(config.clone()))),
            config,
            updates,
            worker: Mutex::new(None),
            recorder: Mutex::new(None),
        };
        (session, receiver)
    }

    /// Send every accepted sample to `recorder` (while it is recording)
    pub fn attach_recorder(&self, recorder: Option<Arc<CsvRecorder>>) {
        *lock(&self.recorder) = recorder;
    }

    pub fn is_running(&self) -> bool {
        lock(&self.worker).is_some()
    }

    /// Clear previous data and start the periodic estimator
    pub fn start(&self) -> Result<(), SessionError> {
        let mut worker = lock(&self.worker);
        if worker.is_some() {
            return Err(SessionError::AlreadyRunning);
        }

        lock(&self.core).begin();
        log::info!(
            "Session started: capacity={}, window={}, interval={:?}",
            self.config.capacity,
            self.config.realtime_window,
            self.config.update_interval
        );

        let (stop_tx, stop_rx) = bounded(1);
        let core = self.core.clone();
        let updates = self.updates.clone();
        let interval = self.config.update_interval;

        let handle = thread::spawn(move || {
            let ticker = tick(interval);
            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    recv(ticker) -> _ => Self::realtime_tick(&core, &updates),
                }
            }
            log::debug!("Periodic estimator stopped");
        });

        *worker = Some(PeriodicWorker { stop_tx, handle });
        Ok(())
    }

    fn realtime_tick(core: &Mutex<SessionCore>, updates: &Sender<SessionUpdate>) {
        let Some(input) = lock(core).realtime_input() else {
            return;
        };

        let Some((estimate, pass)) = realtime_estimate(&input) else {
            return;
        };
        lock(core).record_cutoffs(pass.cutoffs);

        if estimate.estimate.is_determined() {
            let _ = updates.send(SessionUpdate::Estimate(estimate));
        }
    }

    /// Producer path for a raw camera frame. Returns whether a sample was
    /// appended.
    pub fn push_frame(&self, frame: &Frame, timestamp_ms: u64) -> bool {
        match frame::extract(frame) {
            Some(color) => self.push_sample(color.into_sample(timestamp_ms)),
            None => false,
        }
    }

    /// Producer path for an already-extracted sample.
    ///
    /// Updates and the recorder row are sent while the core is still
    /// locked, so once `stop()` has closed the core nothing from an
    /// earlier push can follow `Final`.
    pub fn push_sample(&self, sample: Sample) -> bool {
        let mut core = lock(&self.core);
        let quality_before = core.quality();
        let outcome = core.push(sample);
        if !outcome.accepted {
            return false;
        }

        if let Some(recorder) = lock(&self.recorder).as_ref() {
            recorder.record(&sample, quality_before);
        }

        let _ = self.updates.send(SessionUpdate::Progress {
            progress_percent: outcome.progress_percent,
            quality_percent: outcome.quality_percent,
        });
        if outcome.low_quality {
            let _ = self.updates.send(SessionUpdate::LowQuality {
                quality_percent: outcome.quality_percent,
            });
        }
        if outcome.completed {
            let _ = self.updates.send(SessionUpdate::Complete);
        }
        true
    }

    /// Halt the producer and the periodic worker, compute the session-end
    /// estimate, then clear all data.
    ///
    /// The worker slot stays locked throughout, so a concurrent `start()`
    /// waits until this session is fully torn down.
    pub fn stop(&self) -> Result<FinalEstimate, SessionError> {
        let mut slot = lock(&self.worker);
        let worker = slot.take().ok_or(SessionError::NotRunning)?;

        lock(&self.core).close();

        let _ = worker.stop_tx.send(());
        if worker.handle.join().is_err() {
            log::error!("Periodic estimator panicked");
        }

        let result = {
            let mut core = lock(&self.core);
            let result = core.final_estimate();
            core.clear();
            result
        };
        log::info!("Session stopped after {} samples", result.sample_count);

        let _ = self.updates.send(SessionUpdate::Final(result));
        drop(slot);
        Ok(result)
    }

    /// Drop all buffered data without changing the running state
    pub fn clear(&self) {
        lock(&self.core).clear();
    }

    pub fn sample_count(&self) -> usize {
        lock(&self.core).len()
    }

    pub fn quality(&self) -> f64 {
        lock(&self.core).quality()
    }

    pub fn diagnostics(&self) -> Option<SignalDiagnostics> {
        lock(&self.core).diagnostics()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(worker) = lock(&self.worker).take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::{flat_samples, pulse_samples};
    use crate::recorder::read_recording;
    use std::time::Duration;
    use tempfile::tempdir;

    /// Config whose periodic worker never fires during a test
    fn quiet_config() -> SessionConfig {
        SessionConfig {
            update_interval: Duration::from_secs(3600),
            ..SessionConfig::default()
        }
    }

    #[test]
    fn test_lifecycle_errors() {
        let (session, _updates) = Session::new(quiet_config());
        assert_eq!(session.stop(), Err(SessionError::NotRunning));

        session.start().unwrap();
        assert!(session.is_running());
        assert_eq!(session.start(), Err(SessionError::AlreadyRunning));

        session.stop().unwrap();
        assert!(!session.is_running());
    }

    #[test]
    fn test_samples_rejected_when_idle() {
        let (session, _updates) = Session::new(quiet_config());
        assert!(!session.push_sample(Sample::new(0, 1.0, 1.0, 1.0)));
        assert_eq!(session.sample_count(), 0);
    }

    #[test]
    fn test_final_estimate_from_pulse() {
        let (session, updates) = Session::new(quiet_config());
        session.start().unwrap();
        for sample in pulse_samples(1.2, 350) {
            assert!(session.push_sample(sample));
        }

        let result = session.stop().unwrap();
        assert_eq!(result.outcome, FinalOutcome::Measured);
        assert_eq!(result.sample_count, 350);
        let bpm = result.estimate.bpm().unwrap() as i64;
        assert!((bpm - 72).abs() <= 3, "got {}", bpm);

        // Buffer is cleared and the final result was published
        assert_eq!(session.sample_count(), 0);
        let last = updates.try_iter().last();
        assert_eq!(last, Some(SessionUpdate::Final(result)));
    }

    #[test]
    fn test_short_session_is_insufficient() {
        let (session, _updates) = Session::new(quiet_config());
        session.start().unwrap();
        for sample in pulse_samples(1.2, 15) {
            session.push_sample(sample);
        }
        let result = session.stop().unwrap();
        assert_eq!(result.outcome, FinalOutcome::InsufficientData);
        assert_eq!(result.estimate.bpm(), None);

        // Between the two gates: enough samples, too little filtered data
        let core_result = final_estimate(&pulse_samples(1.2, 30), 0.5, 20);
        assert_eq!(core_result.outcome, FinalOutcome::InsufficientData);
    }

    #[test]
    fn test_flat_signal_not_detected() {
        let (session, updates) = Session::new(quiet_config());
        session.start().unwrap();
        for sample in flat_samples(350) {
            session.push_sample(sample);
        }
        assert!((session.quality() - 0.1).abs() < 1e-12);

        let low_quality: Vec<_> = updates
            .try_iter()
            .filter(|u| matches!(u, SessionUpdate::LowQuality { .. }))
            .collect();
        assert_eq!(low_quality, vec![SessionUpdate::LowQuality { quality_percent: 10 }]);

        let result = session.stop().unwrap();
        assert_eq!(result.outcome, FinalOutcome::NotDetected);
    }

    #[test]
    fn test_progress_updates() {
        let config = SessionConfig {
            capacity: 50,
            ..quiet_config()
        };
        let (session, updates) = Session::new(config);
        session.start().unwrap();
        for sample in pulse_samples(1.0, 60) {
            session.push_sample(sample);
        }

        let progress: Vec<u8> = updates
            .try_iter()
            .filter_map(|u| match u {
                SessionUpdate::Progress { progress_percent, .. } => Some(progress_percent),
                _ => None,
            })
            .collect();
        assert_eq!(progress.len(), 60);
        assert_eq!(progress[0], 2);
        assert_eq!(progress[24], 50);
        assert!(progress[49..].iter().all(|p| *p == 100));

        // Sliding window keeps only the newest 50
        assert_eq!(session.sample_count(), 50);
    }

    #[test]
    fn test_non_continuous_completes() {
        let config = SessionConfig {
            capacity: 50,
            continuous_mode: false,
            ..quiet_config()
        };
        let (session, updates) = Session::new(config);
        session.start().unwrap();

        let accepted = pulse_samples(1.0, 60)
            .into_iter()
            .filter(|s| session.push_sample(*s))
            .count();
        assert_eq!(accepted, 50);
        assert_eq!(
            updates.try_iter().filter(|u| *u == SessionUpdate::Complete).count(),
            1
        );
        session.stop().unwrap();
    }

    #[test]
    fn test_periodic_estimate_published() {
        let config = SessionConfig {
            update_interval: Duration::from_millis(20),
            ..SessionConfig::default()
        };
        let (session, updates) = Session::new(config);
        session.start().unwrap();
        for sample in pulse_samples(1.0, 200) {
            session.push_sample(sample);
        }

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        let mut estimate = None;
        while estimate.is_none() {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match updates.recv_timeout(remaining) {
                Ok(SessionUpdate::Estimate(e)) => estimate = Some(e),
                Ok(_) => continue,
                Err(_) => break,
            }
        }
        session.stop().unwrap();

        let estimate = estimate.expect("no periodic estimate");
        let bpm = estimate.estimate.bpm().unwrap() as i64;
        assert!((bpm - 60).abs() <= 5, "got {}", bpm);
        assert!(!estimate.continuous);
        assert!(estimate.quality_percent < 40);
    }

    #[test]
    fn test_no_updates_after_stop() {
        let config = SessionConfig {
            update_interval: Duration::from_millis(5),
            ..SessionConfig::default()
        };
        let (session, updates) = Session::new(config);
        session.start().unwrap();
        for sample in pulse_samples(1.0, 200) {
            session.push_sample(sample);
        }
        session.stop().unwrap();

        // Final is the last thing ever published
        let drained: Vec<_> = updates.try_iter().collect();
        assert!(matches!(drained.last(), Some(SessionUpdate::Final(_))));
        std::thread::sleep(Duration::from_millis(30));
        assert!(updates.try_recv().is_err());
        assert!(!session.push_sample(Sample::new(10_000, 1.0, 1.0, 1.0)));
    }

    #[test]
    fn test_final_is_last_with_concurrent_producer() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let (session, updates) = Session::new(quiet_config());
        for _ in 0..100 {
            session.start().unwrap();
            let done = AtomicBool::new(false);

            thread::scope(|s| {
                s.spawn(|| {
                    let mut t = 0;
                    while !done.load(Ordering::SeqCst) {
                        session.push_sample(Sample::new(t, 100.0, 100.0, 100.0));
                        t += 40;
                    }
                });
                thread::sleep(Duration::from_millis(1));
                session.stop().unwrap();
                done.store(true, Ordering::SeqCst);
            });

            let drained: Vec<_> = updates.try_iter().collect();
            let finals = drained
                .iter()
                .filter(|u| matches!(u, SessionUpdate::Final(_)))
                .count();
            assert_eq!(finals, 1);
            assert!(matches!(drained.last(), Some(SessionUpdate::Final(_))));
        }
    }

    #[test]
    fn test_start_waits_for_stop() {
        let (session, updates) = Session::new(quiet_config());
        for _ in 0..50 {
            session.start().unwrap();
            for sample in flat_samples(30) {
                session.push_sample(sample);
            }

            let started = thread::scope(|s| {
                let stopper = s.spawn(|| session.stop());
                let started = session.start();
                let stopped = stopper.join().unwrap();

                match &started {
                    // start() ran first and the stop ended that same session
                    Err(SessionError::AlreadyRunning) => assert!(stopped.is_ok()),
                    // stop() finished before the new session began
                    Ok(()) => assert!(stopped.is_ok()),
                    Err(e) => panic!("unexpected start error: {}", e),
                }
                started.is_ok()
            });

            // The stop always sees the data of the session it ended
            let finals: Vec<FinalEstimate> = updates
                .try_iter()
                .filter_map(|u| match u {
                    SessionUpdate::Final(f) => Some(f),
                    _ => None,
                })
                .collect();
            assert_eq!(finals.len(), 1);
            assert_eq!(finals[0].sample_count, 30);

            if started {
                assert!(session.is_running());
                assert_eq!(session.sample_count(), 0);
                session.stop().unwrap();
                updates.try_iter().for_each(drop);
            }
            assert!(!session.is_running());
        }
    }

    #[test]
    fn test_restart_clears_previous_data() {
        let (session, _updates) = Session::new(quiet_config());
        session.start().unwrap();
        for sample in pulse_samples(1.0, 100) {
            session.push_sample(sample);
        }
        session.clear();
        assert_eq!(session.sample_count(), 0);

        // Timestamps start over after clear
        assert!(session.push_sample(Sample::new(0, 1.0, 1.0, 1.0)));
        session.stop().unwrap();

        session.start().unwrap();
        assert_eq!(session.sample_count(), 0);
        session.stop().unwrap();
    }

    #[test]
    fn test_push_frame() {
        let (session, _updates) = Session::new(quiet_config());
        session.start().unwrap();

        let pixels = vec![120u8; 16 * 16 * 3 / 2];
        assert!(session.push_frame(&Frame::new(&pixels, 16, 16), 0));
        assert!(!session.push_frame(&Frame::new(&[], 16, 16), 40));
        assert_eq!(session.sample_count(), 1);
        session.stop().unwrap();
    }

    #[test]
    fn test_diagnostics() {
        let (session, _updates) = Session::new(quiet_config());
        session.start().unwrap();
        assert!(session.diagnostics().is_none());
        for sample in flat_samples(10) {
            session.push_sample(sample);
        }
        let diag = session.diagnostics().unwrap();
        assert_eq!(diag.sample_count, 10);
        assert_eq!(diag.avg_red, 100.0);
        session.stop().unwrap();
    }

    #[test]
    fn test_recorder_receives_samples() {
        let temp_dir = tempdir().unwrap();
        let recorder = Arc::new(CsvRecorder::new());
        let (session, _updates) = Session::new(quiet_config());
        session.attach_recorder(Some(recorder.clone()));

        let path = recorder.start_recording(temp_dir.path()).unwrap();
        session.start().unwrap();
        for sample in pulse_samples(1.0, 25) {
            session.push_sample(sample);
        }
        session.stop().unwrap();
        recorder.stop_recording().unwrap();

        let rows = read_recording(&path).unwrap();
        assert_eq!(rows.len(), 25);
        // Quality recorded is the value before the sample was scored
        assert_eq!(rows[0].quality, 0);
        assert_eq!(rows[24].time, 24 * 40);
    }

    #[test]
    fn test_core_realtime_gating() {
        let mut core = SessionCore::new(SessionConfig::default());
        assert!(!core.is_accepting());
        core.begin();
        assert!(core.is_accepting());
        for sample in pulse_samples(1.0, 119) {
            core.push(sample);
        }
        assert!(core.realtime_input().is_none());

        core.push(pulse_samples(1.0, 120)[119]);
        let input = core.realtime_input().unwrap();
        assert_eq!(input.samples.len(), 120);
        assert_eq!(input.progress_percent, 34);
    }
}
