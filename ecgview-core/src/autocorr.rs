use crate::dsp::fft::self_correlation;
use crate::error::Result;
use crate::stats::{check_samples, mean};
use crate::types::Autocorrelation;

/// Raw autocorrelation of the mean-centred segment for lags `0..N`.
///
/// `values[0]` is the sum of squared deviations. Nothing is normalised, so a
/// constant segment yields all zeros rather than a division by zero.
pub fn autocorrelation(samples: &[f64]) -> Result<Autocorrelation> {
    check_samples(samples)?;
    let m = mean(samples);
    let centred: Vec<f64> = samples.iter().map(|&x| x - m).collect();

    // Only the non-negative half of the 2N-1 correlation is produced.
    let values = if centred.iter().all(|&c| c == 0.0) {
        vec![0.0; centred.len()]
    } else {
        self_correlation(&centred)?
    };

    Ok(Autocorrelation {
        lags: (0..samples.len()).collect(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use std::f64::consts::PI;

    #[test]
    fn test_lag_zero_is_sum_of_squares() {
        let x = [1.0, 4.0, -2.0, 0.5, 3.5, 2.0];
        let m = x.iter().sum::<f64>() / x.len() as f64;
        let ss: f64 = x.iter().map(|v| (v - m).powi(2)).sum();
        let ac = autocorrelation(&x).unwrap();
        assert_eq!(ac.lags, vec![0, 1, 2, 3, 4, 5]);
        assert!((ac.values[0] - ss).abs() < 1e-9);
    }

    #[test]
    fn test_matches_direct_correlation() {
        let x: Vec<f64> = (0..37).map(|i| ((i * 7919) % 23) as f64 - 4.0).collect();
        let m = x.iter().sum::<f64>() / x.len() as f64;
        let c: Vec<f64> = x.iter().map(|v| v - m).collect();
        let ac = autocorrelation(&x).unwrap();
        for lag in [0, 1, 5, 20, 36] {
            let direct: f64 = (0..c.len() - lag).map(|i| c[i] * c[i + lag]).sum();
            assert!((ac.values[lag] - direct).abs() < 1e-8, "lag {lag}");
        }
    }

    #[test]
    fn test_peak_at_zero_lag() {
        let x: Vec<f64> = (0..500)
            .map(|i| (2.0 * PI * i as f64 / 50.0).sin() + 0.3 * (i as f64 * 0.37).cos())
            .collect();
        let ac = autocorrelation(&x).unwrap();
        assert!(ac.values.iter().skip(1).all(|&v| v <= ac.values[0]));
    }

    #[test]
    fn test_constant_segment_is_all_zero() {
        let ac = autocorrelation(&[1.0; 5]).unwrap();
        assert_eq!(ac.values, vec![0.0; 5]);
        assert_eq!(ac.lags.len(), 5);
    }

    #[test]
    fn test_not_normalised() {
        let ac = autocorrelation(&[0.0, 10.0, 0.0, 10.0]).unwrap();
        assert!(ac.values[0] > 1.0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(autocorrelation(&[]), Err(AnalysisError::EmptyInput));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert_eq!(
            autocorrelation(&[1.0, 2.0, f64::NAN, 4.0]),
            Err(AnalysisError::NonFiniteSample { index: 2 })
        );
    }
}
