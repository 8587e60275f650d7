use crate::error::Result;
use crate::stats::check_samples;
use crate::types::Ecdf;

/// Empirical CDF: samples sorted ascending, `y[i] = (i + 1) / N`.
///
/// Tied values keep their own rank, so `y` stays strictly increasing.
pub fn ecdf(samples: &[f64]) -> Result<Ecdf> {
    check_samples(samples)?;
    let mut x = samples.to_vec();
    x.sort_by(f64::total_cmp);

    let n = x.len();
    let y = (1..=n).map(|rank| rank as f64 / n as f64).collect();
    Ok(Ecdf { x, y })
}
