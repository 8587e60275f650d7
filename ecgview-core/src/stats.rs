use crate::error::{AnalysisError, Result};
use crate::types::Statistics;

/// Mean, population variance and standard deviation of `samples`.
pub fn compute_statistics(samples: &[f64]) -> Result<Statistics> {
    check_samples(samples)?;
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
    Ok(Statistics {
        mean,
        variance,
        std_dev: variance.sqrt(),
    })
}

/// Rejects an empty segment and reports the first non-finite sample.
pub(crate) fn check_samples(samples: &[f64]) -> Result<()> {
    if samples.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    match samples.iter().position(|s| !s.is_finite()) {
        Some(index) => Err(AnalysisError::NonFiniteSample { index }),
        None => Ok(()),
    }
}

pub(crate) fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}
