use crate::error::{AnalysisError, Result};
use crate::types::{SegmentWindow, Signal};
use std::collections::HashMap;

/// Which samples to pull out of which record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentRequest {
    pub record_id: String,
    pub channel: usize,
    pub window: SegmentWindow,
}

impl SegmentRequest {
    pub fn new(record_id: impl Into<String>, channel: usize, window: SegmentWindow) -> Self {
        Self {
            record_id: record_id.into(),
            channel,
            window,
        }
    }
}

/// Source of bounded sample windows.
///
/// Implementations return `InvalidRange` for a window outside the record and
/// `SourceRead` for anything that prevents reading it; neither is retried.
pub trait SegmentExtractor {
    fn extract(&self, request: &SegmentRequest) -> Result<Signal>;
}

/// Records held in memory, keyed by id, one `Signal` per channel.
#[derive(Clone, Debug, Default)]
pub struct InMemoryExtractor {
    records: HashMap<String, Vec<Signal>>,
}

impl InMemoryExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record_id: impl Into<String>, channels: Vec<Signal>) -> &mut Self {
        self.records.insert(record_id.into(), channels);
        self
    }
}

impl SegmentExtractor for InMemoryExtractor {
    fn extract(&self, request: &SegmentRequest) -> Result<Signal> {
        let channels = self
            .records
            .get(&request.record_id)
            .ok_or_else(|| AnalysisError::source_read(&request.record_id, "no such record"))?;
        let signal = channels.get(request.channel).ok_or_else(|| {
            AnalysisError::source_read(
                &request.record_id,
                format!(
                    "channel {} requested but record has {}",
                    request.channel,
                    channels.len()
                ),
            )
        })?;
        signal.window(&request.window)
    }
}
