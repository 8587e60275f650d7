use crate::error::{AnalysisError, Result};
use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use serde::Deserialize;
use std::sync::Arc;

/// Taper applied to each sub-segment before the transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    #[default]
    Hann,
    Hamming,
    Rectangular,
}

impl Window {
    /// Periodic (DFT-even) coefficients: `w[n]` uses `2πn/N`, not `2πn/(N-1)`,
    /// so overlapping frames at 50% sum to a constant.
    pub fn coefficients(self, size: usize) -> Vec<f64> {
        let n = size as f64;
        let two_pi = 2.0 * std::f64::consts::PI;
        match self {
            Window::Hann => (0..size)
                .map(|i| 0.5 - 0.5 * (two_pi * i as f64 / n).cos())
                .collect(),
            Window::Hamming => (0..size)
                .map(|i| 0.54 - 0.46 * (two_pi * i as f64 / n).cos())
                .collect(),
            Window::Rectangular => vec![1.0; size],
        }
    }
}

/// Forward real FFT with buffers allocated once and reused across frames.
pub struct PowerSpectrum {
    fft: Arc<dyn RealToComplex<f64>>,
    input: Vec<f64>,
    output: Vec<Complex<f64>>,
}

impl PowerSpectrum {
    pub fn new(size: usize) -> Self {
        let fft = RealFftPlanner::<f64>::new().plan_fft_forward(size);
        let input = fft.make_input_vec();
        let output = fft.make_output_vec();
        Self { fft, input, output }
    }

    /// Number of one-sided bins: `size / 2 + 1`.
    pub fn bins(&self) -> usize {
        self.output.len()
    }

    /// `|X[k]|²` of `frame · window`, added into `accum`.
    pub fn accumulate(&mut self, frame: &[f64], window: &[f64], accum: &mut [f64]) -> Result<()> {
        for (inp, (&s, &w)) in self.input.iter_mut().zip(frame.iter().zip(window.iter())) {
            *inp = s * w;
        }
        self.fft
            .process(&mut self.input, &mut self.output)
            .map_err(|e| AnalysisError::Transform(e.to_string()))?;
        for (a, c) in accum.iter_mut().zip(self.output.iter()) {
            *a += c.norm_sqr();
        }
        Ok(())
    }
}

/// Full linear self-correlation of `x` for non-negative lags `0..x.len()`.
///
/// Zero-pads to a power of two at least `2N - 1` long so the circular
/// correlation computed through the spectrum equals the linear one.
pub fn self_correlation(x: &[f64]) -> Result<Vec<f64>> {
    let n = x.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    let size = (2 * n - 1).next_power_of_two().max(2);

    let mut planner = RealFftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(size);
    let inverse = planner.plan_fft_inverse(size);

    let mut buf = forward.make_input_vec();
    buf[..n].copy_from_slice(x);
    let mut spectrum = forward.make_output_vec();
    forward
        .process(&mut buf, &mut spectrum)
        .map_err(|e| AnalysisError::Transform(e.to_string()))?;

    // |X|² is purely real, which also satisfies the inverse's DC/Nyquist check
    for c in spectrum.iter_mut() {
        *c = Complex::new(c.norm_sqr(), 0.0);
    }

    let mut out = inverse.make_output_vec();
    inverse
        .process(&mut spectrum, &mut out)
        .map_err(|e| AnalysisError::Transform(e.to_string()))?;

    let scale = 1.0 / size as f64;
    Ok(out[..n].iter().map(|v| v * scale).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_is_periodic() {
        let w = Window::Hann.coefficients(8);
        assert_eq!(w[0], 0.0);
        assert!((w[4] - 1.0).abs() < 1e-12);
        // periodic: last sample mirrors w[1], not w[0]
        assert!(w[7] > 0.0);
        assert!((w[7] - w[1]).abs() < 1e-12);
    }

    #[test]
    fn test_rectangular_is_ones() {
        assert!(Window::Rectangular.coefficients(5).iter().all(|&w| w == 1.0));
    }

    #[test]
    fn test_power_spectrum_dc() {
        let mut ps = PowerSpectrum::new(8);
        assert_eq!(ps.bins(), 5);
        let mut accum = vec![0.0; 5];
        ps.accumulate(&[1.0; 8], &[1.0; 8], &mut accum).unwrap();
        assert!((accum[0] - 64.0).abs() < 1e-9);
        assert!(accum[1..].iter().all(|&p| p.abs() < 1e-9));
    }

    #[test]
    fn test_self_correlation_matches_direct_sum() {
        let x = [1.0, -2.0, 0.5, 3.0, -1.5];
        let fast = self_correlation(&x).unwrap();
        for lag in 0..x.len() {
            let direct: f64 = (0..x.len() - lag).map(|i| x[i] * x[i + lag]).sum();
            assert!(
                (fast[lag] - direct).abs() < 1e-9,
                "lag {lag}: {} vs {direct}",
                fast[lag]
            );
        }
    }

    #[test]
    fn test_self_correlation_single_sample() {
        let r = self_correlation(&[3.0]).unwrap();
        assert_eq!(r.len(), 1);
        assert!((r[0] - 9.0).abs() < 1e-12);
    }
}
