//! Error types for the cleaning pipeline

use arrow::error::ArrowError;
use thiserror::Error;

/// Failures raised by pipeline stages. Every variant names the stage and the
/// column it was working on; none of them are recovered inside the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("[{stage}] missing required column `{column}`")]
    MissingColumn { stage: String, column: String },

    #[error("[{stage}] cannot convert `{column}` row {row} value {value:?} to {target}")]
    TypeConversion {
        stage: String,
        column: String,
        row: usize,
        value: String,
        target: &'static str,
    },

    #[error("[{stage}] cannot parse `{column}` row {row} value {value:?} as a year-month date")]
    DateParse {
        stage: String,
        column: String,
        row: usize,
        value: String,
    },

    #[error("[{stage}] malformed `{column}` row {row} value {value:?}: {reason}")]
    Format {
        stage: String,
        column: String,
        row: usize,
        value: String,
        reason: &'static str,
    },

    #[error("[{stage}] `{column}` row {row} value {value:?} does not match `{pattern}`")]
    Parse {
        stage: String,
        column: String,
        row: usize,
        value: String,
        pattern: &'static str,
    },

    #[error("[{stage}] division by zero: `{column}` is 0 at row {row}")]
    Division {
        stage: String,
        column: String,
        row: usize,
    },

    #[error("[{stage}] arrow error: {source}")]
    Arrow {
        stage: String,
        #[source]
        source: ArrowError,
    },
}

impl PipelineError {
    pub fn missing(stage: &str, column: &str) -> Self {
        Self::MissingColumn {
            stage: stage.to_string(),
            column: column.to_string(),
        }
    }

    pub fn arrow(stage: &str, source: ArrowError) -> Self {
        Self::Arrow {
            stage: stage.to_string(),
            source,
        }
    }

    /// Name of the stage that raised the error.
    pub fn stage(&self) -> &str {
        match self {
            Self::MissingColumn { stage, .. }
            | Self::TypeConversion { stage, .. }
            | Self::DateParse { stage, .. }
            | Self::Format { stage, .. }
            | Self::Parse { stage, .. }
            | Self::Division { stage, .. }
            | Self::Arrow { stage, .. } => stage,
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
