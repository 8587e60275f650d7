use crate::error::{AnalysisError, Result};
use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// A single-channel sample sequence and its sampling rate.
///
/// Immutable once built; every sample is finite.
#[derive(Clone, Debug, PartialEq)]
pub struct Signal {
    samples: Vec<f64>,
    sample_rate: u32,
}

impl Signal {
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidParameter(
                "sampling rate must be positive".into(),
            ));
        }
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(AnalysisError::NonFiniteSample { index });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Copy out the samples covered by `window`.
    pub fn window(&self, window: &SegmentWindow) -> Result<Signal> {
        let range = window.check(self.samples.len())?;
        Ok(Signal {
            samples: self.samples[range].to_vec(),
            sample_rate: self.sample_rate,
        })
    }

    /// Same samples, different nominal rate.
    pub fn with_sample_rate(self, sample_rate: u32) -> Result<Signal> {
        Signal::new(self.samples, sample_rate)
    }
}

/// Half-open sample range `[start, end)` into a source recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SegmentWindow {
    pub start: usize,
    pub end: usize,
}

impl SegmentWindow {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Validate against a source of `len` samples: `start < end <= len`.
    pub fn check(&self, len: usize) -> Result<Range<usize>> {
        if self.start >= self.end || self.end > len {
            return Err(AnalysisError::InvalidRange {
                start: self.start,
                end: self.end,
                len,
            });
        }
        Ok(self.start..self.end)
    }
}

impl fmt::Display for SegmentWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Statistics {
    pub mean: f64,
    /// Population variance (divides by N).
    pub variance: f64,
    pub std_dev: f64,
}

/// Sorted samples paired with their cumulative fraction `(i + 1) / N`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Ecdf {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Density-normalised histogram; `edges.len() == density.len() + 1`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub density: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Density {
    pub xs: Vec<f64>,
    pub pdf: Vec<f64>,
    pub bandwidth: f64,
    pub histogram: Histogram,
}

/// Raw (unnormalised) autocorrelation for lags `0..N`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Autocorrelation {
    pub lags: Vec<usize>,
    pub values: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Psd {
    pub frequencies: Vec<f64>,
    pub power: Vec<f64>,
    /// Samples per sub-segment actually used (may be below the requested length).
    pub segment_len: usize,
    pub segments_averaged: usize,
}

impl Psd {
    pub fn freq_resolution(&self) -> f64 {
        match self.frequencies.get(1) {
            Some(f1) => f1 - self.frequencies[0],
            None => 0.0,
        }
    }

    /// Frequency of the strongest bin, ignoring DC.
    pub fn peak_frequency(&self) -> Option<f64> {
        self.power
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| self.frequencies[i])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorKind {
    Statistics,
    Ecdf,
    Density,
    Autocorrelation,
    Psd,
}

impl DescriptorKind {
    pub const ALL: [DescriptorKind; 5] = [
        DescriptorKind::Statistics,
        DescriptorKind::Ecdf,
        DescriptorKind::Density,
        DescriptorKind::Autocorrelation,
        DescriptorKind::Psd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DescriptorKind::Statistics => "statistics",
            DescriptorKind::Ecdf => "ecdf",
            DescriptorKind::Density => "pdf",
            DescriptorKind::Autocorrelation => "autocorrelation",
            DescriptorKind::Psd => "psd",
        }
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One computed descriptor of a segment.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Descriptor {
    Statistics(Statistics),
    Ecdf(Ecdf),
    Density(Density),
    Autocorrelation(Autocorrelation),
    Psd(Psd),
}

impl Descriptor {
    pub fn kind(&self) -> DescriptorKind {
        match self {
            Descriptor::Statistics(_) => DescriptorKind::Statistics,
            Descriptor::Ecdf(_) => DescriptorKind::Ecdf,
            Descriptor::Density(_) => DescriptorKind::Density,
            Descriptor::Autocorrelation(_) => DescriptorKind::Autocorrelation,
            Descriptor::Psd(_) => DescriptorKind::Psd,
        }
    }
}
