//! Error types for the normalization pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that end processing of one individual group, or the whole run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Rows without a usable individual key cannot form a record.
    #[error("group of {rows} row(s) has no individual key")]
    MissingSubjectKey { rows: usize },

    /// The row source failed before grouping finished.
    #[error(transparent)]
    Ingest(#[from] hnf1b_ingest::IngestError),

    /// A record could not be serialized for its content digest.
    #[error("failed to serialize record {id}: {source}")]
    Serialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// The record store rejected the record after all retries.
    #[error("failed to store record {id}: {source}")]
    Store {
        id: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Errors writing canonical records.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{operation} failed for {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode record {id}: {source}")]
    Encode {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Record ids become file names; path separators are refused.
    #[error("record id '{id}' is not a valid file name")]
    InvalidId { id: String },
}

impl StoreError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::MissingSubjectKey { rows: 2 };
        assert_eq!(err.to_string(), "group of 2 row(s) has no individual key");

        let err = StoreError::InvalidId {
            id: "../x".to_string(),
        };
        assert_eq!(err.to_string(), "record id '../x' is not a valid file name");
    }
}
