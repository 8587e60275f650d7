pub mod wav;
pub mod wfdb;

use ecgview_core::{AnalysisError, SegmentExtractor, SegmentRequest, Signal};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("header line {line}: {reason}")]
    Header { line: usize, reason: String },

    #[error("unsupported storage: {0}")]
    UnsupportedFormat(String),

    #[error("channel {channel} requested but the record has {available}")]
    NoSuchChannel { channel: usize, available: usize },

    #[error("no .hea or .wav file for record {0}")]
    NotFound(String),

    #[error(transparent)]
    Wav(#[from] hound::Error),
}

/// A directory of recordings: WFDB records (`<id>.hea` plus signal files)
/// and WAV files (`<id>.wav`). WFDB wins when both exist.
#[derive(Clone, Debug)]
pub struct RecordDirectory {
    dir: PathBuf,
    sample_rate_override: Option<u32>,
}

impl RecordDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sample_rate_override: None,
        }
    }

    /// Use `fs` instead of the rate stored in the recording.
    pub fn with_sample_rate(mut self, fs: Option<u32>) -> Self {
        self.sample_rate_override = fs;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ids of every record in the directory, sorted.
    pub fn list_records(&self) -> Result<Vec<String>, RecordError> {
        let io_err = |source| RecordError::Io {
            path: self.dir.clone(),
            source,
        };
        let mut ids: Vec<String> = std::fs::read_dir(&self.dir)
            .map_err(io_err)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("hea") | Some("wav")
                )
            })
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Full channel and native sampling rate of a record.
    pub fn read_channel(&self, record_id: &str, channel: usize) -> Result<(Vec<f64>, f64), RecordError> {
        if self.dir.join(format!("{record_id}.hea")).is_file() {
            let record = wfdb::WfdbRecord::open(&self.dir, record_id)?;
            let samples = record.read_channel(channel)?;
            return Ok((samples, record.header.sample_rate));
        }
        let wav_path = self.dir.join(format!("{record_id}.wav"));
        if wav_path.is_file() {
            let mut record = wav::read_wav(&wav_path)?;
            let available = record.channels.len();
            if channel >= available {
                return Err(RecordError::NoSuchChannel { channel, available });
            }
            return Ok((record.channels.swap_remove(channel), record.sample_rate as f64));
        }
        Err(RecordError::NotFound(record_id.to_string()))
    }
}

impl SegmentExtractor for RecordDirectory {
    fn extract(&self, request: &SegmentRequest) -> ecgview_core::Result<Signal> {
        let (samples, native_rate) = self
            .read_channel(&request.record_id, request.channel)
            .map_err(|e| AnalysisError::source_read(&request.record_id, e))?;
        let range = request.window.check(samples.len())?;

        let sample_rate = match self.sample_rate_override {
            Some(fs) => fs,
            None => {
                let rounded = native_rate.round();
                if (rounded - native_rate).abs() > 1e-9 {
                    log::warn!(
                        "{}: sampling rate {native_rate} Hz rounded to {rounded} Hz",
                        request.record_id
                    );
                }
                rounded as u32
            }
        };

        log::debug!(
            "{} channel {}: {} of {} samples at {} Hz",
            request.record_id,
            request.channel,
            request.window,
            samples.len(),
            sample_rate
        );
        Signal::new(samples[range].to_vec(), sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecgview_core::SegmentWindow;

    fn write_record(dir: &Path, id: &str, values: &[i16]) {
        std::fs::write(
            dir.join(format!("{id}.hea")),
            format!("{id} 1 250 {}\n{id}.dat 16 100 16 0 0 0 0 ECG\n", values.len()),
        )
        .unwrap();
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        std::fs::write(dir.join(format!("{id}.dat")), bytes).unwrap();
    }

    #[test]
    fn test_extract_window() {
        let dir = tempfile::tempdir().unwrap();
        write_record(dir.path(), "a01", &[0, 100, 200, 300, 400]);
        let records = RecordDirectory::new(dir.path());
        let sig = records
            .extract(&SegmentRequest::new("a01", 0, SegmentWindow::new(1, 4)))
            .unwrap();
        assert_eq!(sig.samples(), &[1.0, 2.0, 3.0]);
        assert_eq!(sig.sample_rate(), 250);
    }

    #[test]
    fn test_sample_rate_override() {
        let dir = tempfile::tempdir().unwrap();
        write_record(dir.path(), "a01", &[0, 100, 200]);
        let records = RecordDirectory::new(dir.path()).with_sample_rate(Some(128));
        let sig = records
            .extract(&SegmentRequest::new("a01", 0, SegmentWindow::new(0, 3)))
            .unwrap();
        assert_eq!(sig.sample_rate(), 128);
    }

    #[test]
    fn test_invalid_range_and_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        write_record(dir.path(), "a01", &[0, 100, 200]);
        let records = RecordDirectory::new(dir.path());
        assert_eq!(
            records.extract(&SegmentRequest::new("a01", 0, SegmentWindow::new(2, 2))),
            Err(AnalysisError::InvalidRange { start: 2, end: 2, len: 3 })
        );
        assert!(matches!(
            records.extract(&SegmentRequest::new("zz", 0, SegmentWindow::new(0, 1))),
            Err(AnalysisError::SourceRead { .. })
        ));
        assert!(matches!(
            records.extract(&SegmentRequest::new("a01", 3, SegmentWindow::new(0, 1))),
            Err(AnalysisError::SourceRead { .. })
        ));
    }

    #[test]
    fn test_list_records() {
        let dir = tempfile::tempdir().unwrap();
        write_record(dir.path(), "b02", &[1, 2]);
        write_record(dir.path(), "a01", &[1, 2]);
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let ids = RecordDirectory::new(dir.path()).list_records().unwrap();
        assert_eq!(ids, vec!["a01".to_string(), "b02".to_string()]);
    }
}
