use crate::autocorr::autocorrelation;
use crate::density::{estimate_density, DensityParams};
use crate::ecdf::ecdf;
use crate::error::{AnalysisError, Result};
use crate::segment::{SegmentExtractor, SegmentRequest};
use crate::spectral::{welch, WelchParams};
use crate::stats::compute_statistics;
use crate::types::{
    Autocorrelation, Density, Descriptor, DescriptorKind, Ecdf, Psd, Signal, Statistics,
};
use serde::Deserialize;

/// Tunables for the estimators that have any.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub density: DensityParams,
    pub welch: WelchParams,
}

/// Outcome of every estimator on one segment.
///
/// Each estimator succeeds or fails on its own; a degenerate density does
/// not hide the autocorrelation of the same segment.
#[derive(Clone, Debug)]
pub struct Analysis {
    pub statistics: Result<Statistics>,
    pub ecdf: Result<Ecdf>,
    pub density: Result<Density>,
    pub autocorrelation: Result<Autocorrelation>,
    pub psd: Result<Psd>,
}

impl Analysis {
    /// Successful descriptors in fixed order.
    pub fn descriptors(&self) -> impl Iterator<Item = Descriptor> + '_ {
        let stats = self.statistics.as_ref().ok().map(|s| Descriptor::Statistics(*s));
        let ecdf = self.ecdf.as_ref().ok().map(|e| Descriptor::Ecdf(e.clone()));
        let density = self.density.as_ref().ok().map(|d| Descriptor::Density(d.clone()));
        let acf = self
            .autocorrelation
            .as_ref()
            .ok()
            .map(|a| Descriptor::Autocorrelation(a.clone()));
        let psd = self.psd.as_ref().ok().map(|p| Descriptor::Psd(p.clone()));
        [stats, ecdf, density, acf, psd].into_iter().flatten()
    }

    pub fn failures(&self) -> impl Iterator<Item = (DescriptorKind, &AnalysisError)> {
        [
            (DescriptorKind::Statistics, self.statistics.as_ref().err()),
            (DescriptorKind::Ecdf, self.ecdf.as_ref().err()),
            (DescriptorKind::Density, self.density.as_ref().err()),
            (DescriptorKind::Autocorrelation, self.autocorrelation.as_ref().err()),
            (DescriptorKind::Psd, self.psd.as_ref().err()),
        ]
        .into_iter()
        .filter_map(|(kind, err)| err.map(|e| (kind, e)))
    }

    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Run all five estimators on `signal`.
pub fn analyze(signal: &Signal, config: &AnalysisConfig) -> Analysis {
    let samples = signal.samples();
    Analysis {
        statistics: compute_statistics(samples),
        ecdf: ecdf(samples),
        density: estimate_density(samples, &config.density),
        autocorrelation: autocorrelation(samples),
        psd: welch(samples, signal.sample_rate(), &config.welch),
    }
}

/// Extract the requested segment, then analyze it.
///
/// Extraction errors are returned as-is and no estimator runs.
pub fn extract_and_analyze(
    extractor: &dyn SegmentExtractor,
    request: &SegmentRequest,
    config: &AnalysisConfig,
) -> Result<(Signal, Analysis)> {
    let signal = extractor.extract(request)?;
    let analysis = analyze(&signal, config);
    Ok((signal, analysis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_descriptors_in_order() {
        let signal = Signal::new((0..64).map(|i| ((i * 13) % 7) as f64).collect(), 128).unwrap();
        let analysis = analyze(&signal, &AnalysisConfig::default());
        assert!(analysis.is_complete());
        let kinds: Vec<_> = analysis.descriptors().map(|d| d.kind()).collect();
        assert_eq!(kinds, DescriptorKind::ALL.to_vec());
    }

    #[test]
    fn test_failures_are_per_estimator() {
        let signal = Signal::new(vec![2.0; 8], 100).unwrap();
        let analysis = analyze(&signal, &AnalysisConfig::default());
        let failed: Vec<_> = analysis.failures().map(|(k, _)| k).collect();
        assert_eq!(failed, vec![DescriptorKind::Density, DescriptorKind::Psd]);
        assert_eq!(analysis.descriptors().count(), 3);
    }
}
