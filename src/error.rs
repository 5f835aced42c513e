//! Error types for this crate.
//!
//! All fallible operations return [`Result<T>`] which uses [`PipelineError`] as the error type.

use thiserror::Error;

/// A [`Result`](std::result::Result) alias using [`PipelineError`] as the error type.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// The unified error type for all crate errors.
///
/// # Example
///
/// ```rust
/// use label_pipelines::error::PipelineError;
///
/// fn describe(e: &PipelineError) -> &'static str {
///     match e {
///         PipelineError::MissingField(_) => "record is missing a label column",
///         PipelineError::InvalidParams(_) => "fix the call arguments",
///         PipelineError::Download(_) => "network issue, retry",
///         _ => "other failure",
///     }
/// }
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PipelineError {
    /// Network or download failure. Retry may help.
    #[error("{0}")]
    Download(String),

    /// Tokenization failure. Check input text.
    #[error("{0}")]
    Tokenization(String),

    /// Device initialization failure. Fall back to CPU.
    #[error("{0}")]
    Device(String),

    /// Bad argument: threshold out of range, mismatched label lists, zero sizes.
    #[error("{0}")]
    InvalidParams(String),

    /// A named field is absent from a record or table.
    #[error("Field '{0}' not found")]
    MissingField(String),

    /// A field that must hold a number holds text.
    #[error("Field '{0}' is not numeric")]
    NotNumeric(String),

    /// Logits and labels (or other paired arrays) disagree in shape.
    #[error("{0}")]
    ShapeMismatch(String),

    /// Malformed tabular data.
    #[error("{0}")]
    Data(String),

    /// Internal error. Report if seen.
    #[error("{0}")]
    Unexpected(String),
}

impl From<hf_hub::api::sync::ApiError> for PipelineError {
    fn from(value: hf_hub::api::sync::ApiError) -> Self {
        PipelineError::Download(format!("HuggingFace API error: {}", value))
    }
}

impl From<candle_core::Error> for PipelineError {
    fn from(value: candle_core::Error) -> Self {
        PipelineError::Unexpected(value.to_string())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(value: std::io::Error) -> Self {
        PipelineError::Unexpected(value.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(value: serde_json::Error) -> Self {
        PipelineError::InvalidParams(format!("Invalid JSON: {}", value))
    }
}

impl From<csv::Error> for PipelineError {
    fn from(value: csv::Error) -> Self {
        PipelineError::Data(value.to_string())
    }
}
