//! # Recording Module
//!
//! Writes the per-frame color samples of a session to CSV for offline
//! analysis, and reads such recordings back for replay.
//!
//! ## Architecture
//! - **CsvRecorder**: Owns the recording lifecycle; cheap to call from the
//!   frame path
//! - **Writer Thread**: Background thread doing all file I/O, fed through a
//!   command channel so frame arrival never waits on the disk
//!
//! ## File Format
//! ```text
//! pulse_data_YYYYMMDD_HHMMSS.csv
//! time,red,green,blue,quality
//! 0,182,61,20,0
//! 33,181,63,21,10
//! ...
//! ```
//! `time` is milliseconds since session start; colors are truncated to
//! integers and `quality` is the quality score in percent.

use crate::error::RecorderError;
use crate::timeseries::Sample;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

const HEADER: [&str; 5] = ["time", "red", "green", "blue", "quality"];

/// One CSV row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRow {
    pub time: u64,
    pub red: i32,
    pub green: i32,
    pub blue: i32,
    pub quality: i32,
}

impl RecordedRow {
    pub fn from_sample(sample: &Sample, quality: f64) -> Self {
        Self {
            time: sample.timestamp_ms,
            red: sample.red as i32,
            green: sample.green as i32,
            blue: sample.blue as i32,
            quality: (quality * 100.0) as i32,
        }
    }

    pub fn to_sample(&self) -> Sample {
        Sample::new(self.time, self.red as f64, self.green as f64, self.blue as f64)
    }
}

/// Command sent from the frame path to the writer thread
#[derive(Debug)]
enum RecorderCommand {
    /// Open a new file and write the header
    Open {
        path: PathBuf,
        reply: Sender<Result<(), RecorderError>>,
    },
    /// Append one row to the open file
    Row(RecordedRow),
    /// Flush and close the open file
    Close {
        reply: Sender<Result<Option<PathBuf>, RecorderError>>,
    },
    /// Shut the writer thread down
    Stop,
}

struct OpenRecording {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

/// CSV recorder for session samples.
///
/// Rows are queued and written on a background thread.
pub struct CsvRecorder {
    command_tx: Sender<RecorderCommand>,
    writer_thread: Option<thread::JoinHandle<()>>,
    is_recording: Arc<AtomicBool>,
}

impl CsvRecorder {
    pub fn new() -> Self {
        let (command_tx, command_rx) = unbounded();

        let writer_thread = thread::spawn(move || {
            Self::writer_loop(command_rx);
        });

        CsvRecorder {
            command_tx,
            writer_thread: Some(writer_thread),
            is_recording: Arc::new(AtomicBool::new(false)),
        }
    }

    /// File name for a recording started now
    pub fn timestamped_filename() -> String {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        format!("pulse_data_{}.csv", timestamp)
    }

    /// Start recording into a new timestamped file under `output_dir`.
    ///
    /// Returns the path of the new file.
    pub fn start_recording(&self, output_dir: impl AsRef<Path>) -> Result<PathBuf, RecorderError> {
        if self.is_recording() {
            return Err(RecorderError::AlreadyRecording);
        }

        let output_dir = output_dir.as_ref();
        if !output_dir.exists() {
            std::fs::create_dir_all(output_dir).map_err(|source| RecorderError::CreateDir {
                path: output_dir.to_path_buf(),
                source,
            })?;
        }

        let path = output_dir.join(Self::timestamped_filename());
        log::info!("Starting recording to: {}", path.display());

        let (reply, response) = bounded(1);
        self.command_tx
            .send(RecorderCommand::Open {
                path: path.clone(),
                reply,
            })
            .map_err(|_| RecorderError::WriterGone)?;
        response.recv().map_err(|_| RecorderError::WriterGone)??;

        self.is_recording.store(true, Ordering::SeqCst);
        Ok(path)
    }

    /// Stop recording and flush remaining rows.
    ///
    /// Returns the path of the finished file, or `None` if nothing was
    /// being recorded.
    pub fn stop_recording(&self) -> Result<Option<PathBuf>, RecorderError> {
        if !self.is_recording.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }

        log::info!("Stopping recording");

        let (reply, response) = bounded(1);
        self.command_tx
            .send(RecorderCommand::Close { reply })
            .map_err(|_| RecorderError::WriterGone)?;
        response.recv().map_err(|_| RecorderError::WriterGone)?
    }

    /// Queue a sample row. No-op unless a recording is open.
    pub fn record(&self, sample: &Sample, quality: f64) {
        if !self.is_recording() {
            return;
        }
        if self
            .command_tx
            .send(RecorderCommand::Row(RecordedRow::from_sample(sample, quality)))
            .is_err()
        {
            log::error!("Failed to queue recorded sample: writer thread gone");
        }
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    fn open(path: &Path) -> Result<OpenRecording, RecorderError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        writer.write_record(HEADER)?;
        Ok(OpenRecording {
            path: path.to_path_buf(),
            writer,
            rows: 0,
        })
    }

    fn close(recording: OpenRecording) -> Result<Option<PathBuf>, RecorderError> {
        let OpenRecording {
            path,
            mut writer,
            rows,
        } = recording;
        writer.flush()?;
        log::info!("Saved {} samples to {}", rows, path.display());
        Ok(Some(path))
    }

    /// Writer thread loop
    ///
    /// Processes commands from the frame path and handles file I/O.
    fn writer_loop(command_rx: Receiver<RecorderCommand>) {
        let mut current: Option<OpenRecording> = None;

        loop {
            match command_rx.recv() {
                Ok(RecorderCommand::Open { path, reply }) => {
                    if let Some(previous) = current.take() {
                        if let Err(e) = Self::close(previous) {
                            log::error!("Failed to close previous recording: {}", e);
                        }
                    }
                    let result = Self::open(&path).map(|recording| {
                        current = Some(recording);
                    });
                    if let Err(e) = &result {
                        log::error!("Failed to open {}: {}", path.display(), e);
                    }
                    let _ = reply.send(result);
                }
                Ok(RecorderCommand::Row(row)) => {
                    if let Some(recording) = current.as_mut() {
                        match recording.writer.serialize(row) {
                            Ok(()) => recording.rows += 1,
                            Err(e) => log::error!("Failed to write sample row: {}", e),
                        }
                    }
                }
                Ok(RecorderCommand::Close { reply }) => {
                    let result = match current.take() {
                        Some(recording) => Self::close(recording),
                        None => Ok(None),
                    };
                    if let Err(e) = &result {
                        log::error!("Failed to flush recording: {}", e);
                    }
                    let _ = reply.send(result);
                }
                Ok(RecorderCommand::Stop) => {
                    if let Some(recording) = current.take() {
                        if let Err(e) = Self::close(recording) {
                            log::error!("Failed to flush recording on stop: {}", e);
                        }
                    }
                    log::debug!("Recorder writer thread stopped");
                    break;
                }
                Err(_) => {
                    log::debug!("Recorder writer thread: command channel closed");
                    break;
                }
            }
        }
    }
}

impl Default for CsvRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CsvRecorder {
    fn drop(&mut self) {
        // Ensure the open file is flushed
        let _ = self.stop_recording();

        let _ = self.command_tx.send(RecorderCommand::Stop);

        if let Some(handle) = self.writer_thread.take() {
            let _ = handle.join();
        }
    }
}

/// Read a recording written by `CsvRecorder`
pub fn read_recording(path: impl AsRef<Path>) -> Result<Vec<RecordedRow>, RecorderError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_row_truncates_values() {
        let sample = Sample::new(33, 182.9, 61.2, 20.999);
        let row = RecordedRow::from_sample(&sample, 0.456);
        assert_eq!(
            row,
            RecordedRow {
                time: 33,
                red: 182,
                green: 61,
                blue: 20,
                quality: 45,
            }
        );
    }

    #[test]
    fn test_filename_format() {
        let name = CsvRecorder::timestamped_filename();
        assert!(name.starts_with("pulse_data_"));
        assert!(name.ends_with(".csv"));
        // pulse_data_ + YYYYMMDD_HHMMSS + .csv
        assert_eq!(name.len(), "pulse_data_".len() + 15 + ".csv".len());
    }

    #[test]
    fn test_start_stop_recording() {
        let temp_dir = tempdir().unwrap();
        let recorder = CsvRecorder::new();

        assert!(!recorder.is_recording());
        let path = recorder.start_recording(temp_dir.path()).unwrap();
        assert!(recorder.is_recording());
        assert!(matches!(
            recorder.start_recording(temp_dir.path()),
            Err(RecorderError::AlreadyRecording)
        ));

        recorder.record(&Sample::new(0, 180.5, 60.0, 20.0), 0.0);
        recorder.record(&Sample::new(40, 181.0, 62.7, 21.0), 0.1);

        assert_eq!(recorder.stop_recording().unwrap(), Some(path.clone()));
        assert!(!recorder.is_recording());

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "time,red,green,blue,quality\n0,180,60,20,0\n40,181,62,21,10\n");
    }

    #[test]
    fn test_stop_without_recording() {
        let recorder = CsvRecorder::new();
        assert_eq!(recorder.stop_recording().unwrap(), None);
        // Rows outside a recording are dropped
        recorder.record(&Sample::new(0, 1.0, 1.0, 1.0), 0.5);
    }

    #[test]
    fn test_creates_output_dir() {
        let temp_dir = tempdir().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let recorder = CsvRecorder::new();

        let path = recorder.start_recording(&nested).unwrap();
        assert!(path.starts_with(&nested));
        recorder.stop_recording().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_read_recording() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("pulse.csv");
        std::fs::write(&path, "time,red,green,blue,quality\n0,180,60,20,0\n33,181,62,21,55\n").unwrap();

        let rows = read_recording(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].quality, 55);
        assert_eq!(rows[1].to_sample(), Sample::new(33, 181.0, 62.0, 21.0));
    }

    #[test]
    fn test_read_invalid_recording() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bad.csv");
        std::fs::write(&path, "time,red,green,blue,quality\nsoon,1,2,3,4\n").unwrap();

        assert!(matches!(read_recording(&path), Err(RecorderError::Csv(_))));
        assert!(matches!(
            read_recording(temp_dir.path().join("missing.csv")),
            Err(RecorderError::Csv(_))
        ));
    }
}
