//! Error types for the profiling engine.
//!
//! Only failures that stop a run surface as [`ProfilerError`]. Per-value
//! coercion failures are counted inside analyzer outputs, and per-column or
//! dataset-level rule failures are recorded as rule statuses on the
//! resulting profile.

use thiserror::Error;

/// Result type for profiling operations.
pub type Result<T> = std::result::Result<T, ProfilerError>;

/// Errors that can occur while configuring or running a profile.
#[derive(Error, Debug)]
pub enum ProfilerError {
    /// The rule configuration is malformed. Raised before any column work starts.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The batch violates its shape invariants (ragged columns, duplicate names).
    #[error("Invalid batch shape: {0}")]
    BatchShape(String),

    /// A panic while analyzing a single column. The engine records it on
    /// that column and carries on with the rest.
    #[error("Analysis of column '{column}' failed: {message}")]
    ColumnAnalysis { column: String, message: String },

    /// The run was cancelled through its cancellation token.
    #[error("Profiling run was cancelled")]
    Cancelled,

    /// A batch source failed to produce data.
    #[error("Data source error ({source_type}): {message}")]
    DataSource {
        source_type: String,
        message: String,
    },

    /// DataFusion query execution error.
    #[error("Query execution failed: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Arrow computation error.
    #[error("Arrow computation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Filesystem error from a sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invariant violation inside the engine.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProfilerError {
    /// Creates a configuration error with the given message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a batch shape error with the given message.
    pub fn batch_shape(msg: impl Into<String>) -> Self {
        Self::BatchShape(msg.into())
    }

    /// Creates a column analysis error.
    pub fn column_analysis(column: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ColumnAnalysis {
            column: column.into(),
            message: msg.into(),
        }
    }

    /// Creates a data source error.
    pub fn data_source(source_type: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: msg.into(),
        }
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Converts serde_json errors to ProfilerError.
impl From<serde_json::Error> for ProfilerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProfilerError::configuration("string.patterns must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: string.patterns must not be empty"
        );

        let err = ProfilerError::column_analysis("email", "boom");
        assert_eq!(err.to_string(), "Analysis of column 'email' failed: boom");

        let err = ProfilerError::data_source("memory", "exhausted");
        assert_eq!(err.to_string(), "Data source error (memory): exhausted");
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ProfilerError = parse_err.into();
        assert!(matches!(err, ProfilerError::Serialization(_)));
    }
}
