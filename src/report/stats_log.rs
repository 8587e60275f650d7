use super::{ReportContext, ReportError, Reporter};
use ecgview_core::{AnalysisError, Descriptor, DescriptorKind};

/// Logs the segment statistics at info level and descriptor sizes at debug.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn descriptor(&mut self, ctx: &ReportContext, descriptor: &Descriptor) -> Result<(), ReportError> {
        let record = ctx.record_id;
        match descriptor {
            Descriptor::Statistics(s) => {
                log::info!("Mean of the ECG signal ({record}): {:.4}", s.mean);
                log::info!("Variance of the ECG signal ({record}): {:.4}", s.variance);
                log::info!(
                    "Standard deviation of the ECG signal ({record}): {:.4}",
                    s.std_dev
                );
            }
            Descriptor::Ecdf(e) => log::debug!("{record}: ECDF over {} samples", e.x.len()),
            Descriptor::Density(d) => log::debug!(
                "{record}: KDE on {} points, bandwidth {:.4}",
                d.xs.len(),
                d.bandwidth
            ),
            Descriptor::Autocorrelation(a) => {
                log::debug!("{record}: autocorrelation for {} lags", a.lags.len())
            }
            Descriptor::Psd(p) => log::debug!(
                "{record}: PSD with {} bins ({} x {}-sample segments), peak {:.3} Hz",
                p.frequencies.len(),
                p.segments_averaged,
                p.segment_len,
                p.peak_frequency().unwrap_or(0.0)
            ),
        }
        Ok(())
    }

    fn failure(
        &mut self,
        ctx: &ReportContext,
        kind: DescriptorKind,
        error: &AnalysisError,
    ) -> Result<(), ReportError> {
        log::warn!("{}: no {kind} descriptor: {error}", ctx.record_id);
        Ok(())
    }
}
