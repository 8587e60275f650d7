//! Welch power spectral density estimation.
//!
//! The segment is split into overlapping sub-segments, each is detrended,
//! tapered and transformed, and the one-sided periodograms are averaged.
//! Output is a density in `unit²/Hz`.

use crate::dsp::fft::{PowerSpectrum, Window};
use crate::error::{AnalysisError, Result};
use crate::stats::check_samples;
use crate::types::Psd;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detrend {
    None,
    /// Subtract each sub-segment's mean before tapering.
    #[default]
    Constant,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WelchParams {
    /// Samples per sub-segment (also the transform length).
    pub segment_len: usize,
    /// Samples shared by consecutive sub-segments. `None` means half a segment.
    pub overlap: Option<usize>,
    pub window: Window,
    pub detrend: Detrend,
}

impl Default for WelchParams {
    fn default() -> Self {
        Self {
            segment_len: 2048,
            overlap: None,
            window: Window::Hann,
            detrend: Detrend::Constant,
        }
    }
}

/// Welch PSD of `samples` recorded at `sample_rate` Hz.
///
/// When the input is shorter than `params.segment_len`, a single sub-segment
/// spanning the whole input is used and the overlap falls back to half of it.
/// The effective length is reported in [`Psd::segment_len`].
pub fn welch(samples: &[f64], sample_rate: u32, params: &WelchParams) -> Result<Psd> {
    check_samples(samples)?;
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidParameter(
            "sampling rate must be positive".into(),
        ));
    }
    if params.segment_len == 0 {
        return Err(AnalysisError::InvalidParameter(
            "Welch segment length must be positive".into(),
        ));
    }
    let first = samples[0];
    if samples.iter().all(|&s| s == first) {
        return Err(AnalysisError::DegenerateDistribution {
            reason: "power spectrum of a zero-variance segment",
        });
    }

    let (seg_len, overlap) = if samples.len() < params.segment_len {
        log::debug!(
            "segment of {} samples is shorter than the {}-sample Welch window; using one window of {}",
            samples.len(),
            params.segment_len,
            samples.len()
        );
        (samples.len(), samples.len() / 2)
    } else {
        (
            params.segment_len,
            params.overlap.unwrap_or(params.segment_len / 2),
        )
    };
    if overlap >= seg_len {
        return Err(AnalysisError::InvalidParameter(format!(
            "overlap {overlap} must be smaller than the segment length {seg_len}"
        )));
    }

    let window = params.window.coefficients(seg_len);
    let window_power: f64 = window.iter().map(|w| w * w).sum();
    if window_power <= 0.0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "{:?} window of length {seg_len} has no energy",
            params.window
        )));
    }

    let step = seg_len - overlap;
    let frames = (samples.len() - seg_len) / step + 1;

    let mut spectrum = PowerSpectrum::new(seg_len);
    let bins = spectrum.bins();
    let mut accum = vec![0.0f64; bins];
    let mut frame_buf = vec![0.0f64; seg_len];

    for frame_i in 0..frames {
        let pos = frame_i * step;
        let frame = &samples[pos..pos + seg_len];
        match params.detrend {
            Detrend::None => frame_buf.copy_from_slice(frame),
            Detrend::Constant => {
                let m = frame.iter().sum::<f64>() / seg_len as f64;
                for (b, &s) in frame_buf.iter_mut().zip(frame) {
                    *b = s - m;
                }
            }
        }
        spectrum.accumulate(&frame_buf, &window, &mut accum)?;
    }

    let scale = 1.0 / (sample_rate as f64 * window_power * frames as f64);
    // Nyquist only exists as its own bin for even lengths
    let last_doubled = if seg_len % 2 == 0 { bins - 1 } else { bins };
    let power = accum
        .iter()
        .enumerate()
        .map(|(k, &a)| {
            let p = a * scale;
            let p = if k > 0 && k < last_doubled { 2.0 * p } else { p };
            p.max(0.0)
        })
        .collect();

    let df = sample_rate as f64 / seg_len as f64;
    let frequencies = (0..bins).map(|k| k as f64 * df).collect();

    Ok(Psd {
        frequencies,
        power,
        segment_len: seg_len,
        segments_averaged: frames,
    })
}
