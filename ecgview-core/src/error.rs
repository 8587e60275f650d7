use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Failure kinds shared by extraction and every estimator.
///
/// Estimators never fall back to NaN or default values: any precondition
/// violation surfaces here and the caller decides whether to abort or skip.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("segment is empty")]
    EmptyInput,

    #[error("degenerate distribution: {reason}")]
    DegenerateDistribution { reason: &'static str },

    #[error("segment [{start}, {end}) is outside the source (length {len})")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("cannot read record {record}: {reason}")]
    SourceRead { record: String, reason: String },

    #[error("sample {index} is not a finite number")]
    NonFiniteSample { index: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("frequency transform failed: {0}")]
    Transform(String),
}

impl AnalysisError {
    pub fn source_read(record: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceRead {
            record: record.into(),
            reason: reason.to_string(),
        }
    }
}
