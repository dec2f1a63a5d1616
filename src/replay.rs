//! # Replay Module
//!
//! Runs recorded samples back through a `SessionCore` on a virtual clock
//! driven by the sample timestamps, so a recording yields the same periodic
//! and session-end estimates the live session would have produced.
//!
//! A periodic pass fires whenever the recording's clock crosses the next
//! multiple of the update interval, measured from the first sample.

use crate::config::SessionConfig;
use crate::diagnostics::SignalDiagnostics;
use crate::recorder::CsvRecorder;
use crate::session::{self, FinalEstimate, RealtimeEstimate, SessionCore};
use crate::timeseries::Sample;
use std::fmt;

/// One periodic estimate at a point in recording time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEstimate {
    pub at_ms: u64,
    pub estimate: RealtimeEstimate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub samples_read: usize,
    pub samples_accepted: usize,
    pub realtime: Vec<TimedEstimate>,
    /// Recording time at which quality first dropped below the contact threshold
    pub low_quality_at: Option<u64>,
    /// Buffer filled with continuous mode off
    pub completed_early: bool,
    pub diagnostics: Option<SignalDiagnostics>,
    pub final_estimate: FinalEstimate,
}

/// Replay `samples` with the given settings.
///
/// With `final_only` the periodic passes are skipped.
pub fn replay<I>(samples: I, config: &SessionConfig, final_only: bool) -> ReplayReport
where
    I: IntoIterator<Item = Sample>,
{
    replay_into(samples, config, final_only, None)
}

/// Like `replay`, also writing every analysed sample with its recomputed
/// quality to `recorder` while it is recording.
pub fn replay_into<I>(
    samples: I,
    config: &SessionConfig,
    final_only: bool,
    recorder: Option<&CsvRecorder>,
) -> ReplayReport
where
    I: IntoIterator<Item = Sample>,
{
    let interval_ms = (config.update_interval.as_millis() as u64).max(1);
    let mut core = SessionCore::new(config.clone());
    core.begin();

    let mut samples_read = 0;
    let mut samples_accepted = 0;
    let mut realtime = Vec::new();
    let mut low_quality_at = None;
    let mut completed_early = false;
    let mut next_tick: Option<u64> = None;

    for sample in samples {
        samples_read += 1;
        let quality_before = core.quality();
        let outcome = core.push(sample);
        if !outcome.accepted {
            continue;
        }
        samples_accepted += 1;
        if let Some(recorder) = recorder {
            recorder.record(&sample, quality_before);
        }

        if outcome.low_quality && low_quality_at.is_none() {
            low_quality_at = Some(sample.timestamp_ms);
        }

        if !final_only {
            let tick = next_tick.get_or_insert(sample.timestamp_ms + interval_ms);
            while sample.timestamp_ms >= *tick {
                if let Some(estimate) = periodic_pass(&mut core, *tick) {
                    realtime.push(estimate);
                }
                *tick += interval_ms;
            }
        }

        completed_early |= outcome.completed;
        if !core.is_accepting() {
            break;
        }
    }

    log::info!(
        "Replayed {} of {} samples, {} periodic estimates",
        samples_accepted,
        samples_read,
        realtime.len()
    );

    let diagnostics = core.diagnostics();
    core.close();
    let final_estimate = core.final_estimate();

    ReplayReport {
        samples_read,
        samples_accepted,
        realtime,
        low_quality_at,
        completed_early,
        diagnostics,
        final_estimate,
    }
}

fn periodic_pass(core: &mut SessionCore, at_ms: u64) -> Option<TimedEstimate> {
    let input = core.realtime_input()?;
    let (estimate, pass) = session::realtime_estimate(&input)?;
    core.record_cutoffs(pass.cutoffs);
    estimate
        .estimate
        .is_determined()
        .then_some(TimedEstimate { at_ms, estimate })
}

impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Samples: {} read, {} analysed",
            self.samples_read, self.samples_accepted
        )?;
        for timed in &self.realtime {
            let e = &timed.estimate;
            writeln!(
                f,
                "{:>8.1}s  {:<22} quality {:>3}%  progress {:>3}%{}",
                timed.at_ms as f64 / 1000.0,
                e.estimate.to_string(),
                e.quality_percent,
                e.progress_percent,
                if e.continuous { "  (continuous)" } else { "" }
            )?;
        }
        if let Some(at) = self.low_quality_at {
            writeln!(f, "Low signal quality from {:.1}s", at as f64 / 1000.0)?;
        }
        if self.completed_early {
            writeln!(f, "Buffer full, measurement complete")?;
        }
        if let Some(diagnostics) = &self.diagnostics {
            writeln!(f, "{}", diagnostics)?;
        }
        write!(
            f,
            "Final: {} ({:?}, {} samples)",
            self.final_estimate.estimate, self.final_estimate.outcome, self.final_estimate.sample_count
        )
    }
}
