//! Consumers of computed descriptors: statistics logging, figure files and
//! JSON export. Reporters never feed back into the analysis.

pub mod figures;
pub mod json;
pub mod stats_log;

pub use figures::FigureReporter;
pub use json::JsonExporter;
pub use stats_log::LogReporter;

use crate::canvas::RenderError;
use ecgview_core::{AnalysisError, Descriptor, DescriptorKind, SegmentWindow, Signal};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot render {}: {source}", .path.display())]
    Render { path: PathBuf, source: RenderError },

    #[error("cannot serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// What happens when a reporter fails to write an artifact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum WritePolicy {
    /// Stop and return the error to the caller.
    #[default]
    FailFast,
    /// Log a warning and keep going.
    BestEffort,
}

/// Identifies the segment being reported on.
#[derive(Clone, Copy, Debug)]
pub struct ReportContext<'a> {
    pub record_id: &'a str,
    pub channel: usize,
    pub window: SegmentWindow,
}

impl ReportContext<'_> {
    /// File stem for this segment's artifacts; channel 0 keeps the bare record id.
    pub fn stem(&self) -> String {
        if self.channel == 0 {
            self.record_id.to_string()
        } else {
            format!("{}_ch{}", self.record_id, self.channel)
        }
    }
}

pub trait Reporter {
    fn signal(&mut self, _ctx: &ReportContext, _signal: &Signal) -> Result<(), ReportError> {
        Ok(())
    }

    fn descriptor(&mut self, ctx: &ReportContext, descriptor: &Descriptor) -> Result<(), ReportError>;

    /// An estimator that produced no descriptor for this segment.
    fn failure(
        &mut self,
        _ctx: &ReportContext,
        _kind: DescriptorKind,
        _error: &AnalysisError,
    ) -> Result<(), ReportError> {
        Ok(())
    }

    /// Called once after every descriptor of the segment was delivered.
    fn finish(&mut self, _ctx: &ReportContext) -> Result<(), ReportError> {
        Ok(())
    }
}

/// Fans each call out to every reporter, applying the write policy.
pub struct ReporterSet {
    reporters: Vec<Box<dyn Reporter>>,
    policy: WritePolicy,
    write_failures: usize,
}

impl ReporterSet {
    pub fn new(policy: WritePolicy) -> Self {
        Self {
            reporters: Vec::new(),
            policy,
            write_failures: 0,
        }
    }

    pub fn push(&mut self, reporter: Box<dyn Reporter>) -> &mut Self {
        self.reporters.push(reporter);
        self
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }

    /// Writes that failed and were skipped under [`WritePolicy::BestEffort`].
    pub fn write_failures(&self) -> usize {
        self.write_failures
    }

    pub fn signal(&mut self, ctx: &ReportContext, signal: &Signal) -> Result<(), ReportError> {
        self.each(|r| r.signal(ctx, signal))
    }

    pub fn descriptor(&mut self, ctx: &ReportContext, descriptor: &Descriptor) -> Result<(), ReportError> {
        self.each(|r| r.descriptor(ctx, descriptor))
    }

    pub fn failure(
        &mut self,
        ctx: &ReportContext,
        kind: DescriptorKind,
        error: &AnalysisError,
    ) -> Result<(), ReportError> {
        self.each(|r| r.failure(ctx, kind, error))
    }

    pub fn finish(&mut self, ctx: &ReportContext) -> Result<(), ReportError> {
        self.each(|r| r.finish(ctx))
    }

    fn each<F>(&mut self, mut call: F) -> Result<(), ReportError>
    where
        F: FnMut(&mut dyn Reporter) -> Result<(), ReportError>,
    {
        for reporter in self.reporters.iter_mut() {
            if let Err(e) = call(reporter.as_mut()) {
                match self.policy {
                    WritePolicy::FailFast => return Err(e),
                    WritePolicy::BestEffort => {
                        log::warn!("{e}");
                        self.write_failures += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Write `bytes` to `path`, creating parent directories and replacing any
/// existing file.
pub fn write_artifact(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, bytes).map_err(io_err)?;
    log::info!("Saved {}", path.display());
    Ok(())
}
