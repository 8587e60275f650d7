use super::{write_artifact, ReportContext, ReportError, Reporter};
use chrono::{DateTime, Utc};
use ecgview_core::{AnalysisError, Descriptor, DescriptorKind, SegmentWindow, Signal};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct FailureEntry {
    kind: DescriptorKind,
    error: String,
}

#[derive(Debug, Serialize)]
struct SegmentReport {
    record: String,
    channel: usize,
    window: SegmentWindow,
    sample_rate: Option<u32>,
    samples: usize,
    /// blake3 of the segment's samples as little-endian f64 bytes.
    fingerprint: Option<String>,
    generated_at: DateTime<Utc>,
    descriptors: Vec<Descriptor>,
    failures: Vec<FailureEntry>,
}

/// Collects everything reported for a segment and writes it as one
/// `<out>/json/<record>.json` document when the segment is finished.
pub struct JsonExporter {
    out_dir: PathBuf,
    pending: Option<SegmentReport>,
}

impl JsonExporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            pending: None,
        }
    }

    fn pending(&mut self, ctx: &ReportContext) -> &mut SegmentReport {
        self.pending.get_or_insert_with(|| SegmentReport {
            record: ctx.record_id.to_string(),
            channel: ctx.channel,
            window: ctx.window,
            sample_rate: None,
            samples: ctx.window.len(),
            fingerprint: None,
            generated_at: Utc::now(),
            descriptors: Vec::new(),
            failures: Vec::new(),
        })
    }
}

pub fn fingerprint(signal: &Signal) -> String {
    let mut hasher = blake3::Hasher::new();
    for s in signal.samples() {
        hasher.update(&s.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

impl Reporter for JsonExporter {
    fn signal(&mut self, ctx: &ReportContext, signal: &Signal) -> Result<(), ReportError> {
        // Start of a new segment; discard anything left by an aborted one
        self.pending = None;
        let report = self.pending(ctx);
        report.sample_rate = Some(signal.sample_rate());
        report.samples = signal.len();
        report.fingerprint = Some(fingerprint(signal));
        Ok(())
    }

    fn descriptor(&mut self, ctx: &ReportContext, descriptor: &Descriptor) -> Result<(), ReportError> {
        self.pending(ctx).descriptors.push(descriptor.clone());
        Ok(())
    }

    fn failure(
        &mut self,
        ctx: &ReportContext,
        kind: DescriptorKind,
        error: &AnalysisError,
    ) -> Result<(), ReportError> {
        self.pending(ctx).failures.push(FailureEntry {
            kind,
            error: error.to_string(),
        });
        Ok(())
    }

    fn finish(&mut self, ctx: &ReportContext) -> Result<(), ReportError> {
        let Some(report) = self.pending.take() else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(&report)?;
        let path = self.out_dir.join("json").join(format!("{}.json", ctx.stem()));
        write_artifact(&path, &bytes)
    }
}
