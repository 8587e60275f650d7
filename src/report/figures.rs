use super::{write_artifact, ReportContext, ReportError, Reporter};
use crate::canvas::{descriptor_figure, signal_figure, Figure, FigureBackend};
use ecgview_core::{Descriptor, Signal};
use std::path::{Path, PathBuf};

/// Directory holding the plots of the raw segment.
pub const SIGNAL_DIR: &str = "ecg_signal";

/// Renders each plot through every backend into
/// `<out>/<kind>/<record>.<ext>`.
pub struct FigureReporter {
    out_dir: PathBuf,
    backends: Vec<Box<dyn FigureBackend>>,
}

impl FigureReporter {
    pub fn new(out_dir: impl Into<PathBuf>, backends: Vec<Box<dyn FigureBackend>>) -> Self {
        Self {
            out_dir: out_dir.into(),
            backends,
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn emit(&self, kind_dir: &str, stem: &str, figure: &Figure) -> Result<(), ReportError> {
        for backend in &self.backends {
            let path = self
                .out_dir
                .join(kind_dir)
                .join(format!("{stem}.{}", backend.extension()));
            let bytes = backend.render(figure).map_err(|source| ReportError::Render {
                path: path.clone(),
                source,
            })?;
            write_artifact(&path, &bytes)?;
        }
        Ok(())
    }
}

impl Reporter for FigureReporter {
    fn signal(&mut self, ctx: &ReportContext, signal: &Signal) -> Result<(), ReportError> {
        self.emit(SIGNAL_DIR, &ctx.stem(), &signal_figure(signal, ctx.record_id))
    }

    fn descriptor(&mut self, ctx: &ReportContext, descriptor: &Descriptor) -> Result<(), ReportError> {
        match descriptor_figure(descriptor) {
            Some(figure) => self.emit(descriptor.kind().as_str(), &ctx.stem(), &figure),
            None => Ok(()),
        }
    }
}
