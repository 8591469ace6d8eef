#![deny(unsafe_code)]

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StandardsError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV table {table}: {source}")]
    Csv {
        table: String,
        #[source]
        source: csv::Error,
    },

    #[error("invalid row {row} in table {table}: {message}")]
    InvalidRow {
        table: String,
        row: usize,
        message: String,
    },
}

impl StandardsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(table: &str, row: usize, message: impl Into<String>) -> Self {
        Self::InvalidRow {
            table: table.to_string(),
            row,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StandardsError>;
