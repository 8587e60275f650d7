//! Descriptors of a single-channel ECG segment: basic statistics, empirical
//! CDF, Gaussian KDE, raw autocorrelation and Welch PSD.
//!
//! Every estimator is a pure function of an immutable segment. Nothing here
//! performs I/O; records come in through [`SegmentExtractor`] and results go
//! out as [`Descriptor`] values.

pub mod autocorr;
pub mod density;
pub mod dsp;
pub mod ecdf;
pub mod error;
pub mod pipeline;
pub mod segment;
pub mod spectral;
pub mod stats;
pub mod types;

pub use error::{AnalysisError, Result};
pub use pipeline::{analyze, extract_and_analyze, Analysis, AnalysisConfig};
pub use segment::{InMemoryExtractor, SegmentExtractor, SegmentRequest};
pub use types::{
    Autocorrelation, Density, Descriptor, DescriptorKind, Ecdf, Histogram, Psd, SegmentWindow,
    Signal, Statistics,
};
