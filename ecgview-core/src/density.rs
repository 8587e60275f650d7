use crate::error::{AnalysisError, Result};
use crate::stats::{check_samples, mean};
use crate::types::{Density, Histogram};
use serde::Deserialize;

/// Automatic bandwidth selection for the Gaussian kernel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandwidthRule {
    /// `σ · N^(-1/5)`
    #[default]
    Scott,
    /// `σ · (3N/4)^(-1/5)`
    Silverman,
}

impl BandwidthRule {
    fn factor(self, n: usize) -> f64 {
        let n = n as f64;
        match self {
            BandwidthRule::Scott => n.powf(-0.2),
            BandwidthRule::Silverman => (n * 0.75).powf(-0.2),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DensityParams {
    /// Evaluation points spanning `[min, max]`.
    pub grid_points: usize,
    pub histogram_bins: usize,
    pub bandwidth: BandwidthRule,
}

impl Default for DensityParams {
    fn default() -> Self {
        Self {
            grid_points: 1000,
            histogram_bins: 30,
            bandwidth: BandwidthRule::Scott,
        }
    }
}

/// Gaussian kernel density estimate of `samples`, evaluated on an even grid
/// from the smallest to the largest sample, plus a companion histogram.
///
/// σ in the bandwidth rule is the sample standard deviation (N−1).
pub fn estimate_density(samples: &[f64], params: &DensityParams) -> Result<Density> {
    check_samples(samples)?;
    if params.grid_points < 2 {
        return Err(AnalysisError::InvalidParameter(format!(
            "density grid needs at least 2 points, got {}",
            params.grid_points
        )));
    }
    let (lo, hi) = min_max(samples);
    if lo == hi {
        return Err(AnalysisError::DegenerateDistribution {
            reason: "kernel density needs at least two distinct values",
        });
    }

    let n = samples.len();
    let m = mean(samples);
    let sigma = (samples.iter().map(|&x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt();
    let bandwidth = sigma * params.bandwidth.factor(n);
    // Distinct values whose spread underflows still leave no usable kernel
    if !(bandwidth > 0.0 && bandwidth.is_finite()) {
        return Err(AnalysisError::DegenerateDistribution {
            reason: "kernel bandwidth is zero or not finite",
        });
    }

    let step = (hi - lo) / (params.grid_points - 1) as f64;
    let xs: Vec<f64> = (0..params.grid_points)
        .map(|i| lo + i as f64 * step)
        .collect();

    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let inv_h = 1.0 / bandwidth;
    let pdf = xs
        .iter()
        .map(|&x| {
            let sum: f64 = samples
                .iter()
                .map(|&s| {
                    let u = (x - s) * inv_h;
                    (-0.5 * u * u).exp()
                })
                .sum();
            sum * norm
        })
        .collect();

    let histogram = histogram(samples, params.histogram_bins)?;

    Ok(Density {
        xs,
        pdf,
        bandwidth,
        histogram,
    })
}

/// Equal-width histogram over `[min, max]`, scaled so the bar areas sum to 1.
///
/// The last bin is closed on the right. A constant input gets a unit-wide
/// range centred on the value.
pub fn histogram(samples: &[f64], bins: usize) -> Result<Histogram> {
    check_samples(samples)?;
    if bins == 0 {
        return Err(AnalysisError::InvalidParameter(
            "histogram needs at least one bin".into(),
        ));
    }
    let (mut lo, mut hi) = min_max(samples);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + i as f64 * width).collect();

    let mut counts = vec![0usize; bins];
    for &s in samples {
        let idx = (((s - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let scale = 1.0 / (samples.len() as f64 * width);
    let density = counts.iter().map(|&c| c as f64 * scale).collect();
    Ok(Histogram { edges, density })
}

/// Trapezoidal integral of `ys` over the (possibly uneven) grid `xs`.
pub fn trapezoid(xs: &[f64], ys: &[f64]) -> f64 {
    xs.windows(2)
        .zip(ys.windows(2))
        .map(|(x, y)| (x[1] - x[0]) * (y[0] + y[1]) * 0.5)
        .sum()
}

fn min_max(samples: &[f64]) -> (f64, f64) {
    samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
            (lo.min(s), hi.max(s))
        })
}
