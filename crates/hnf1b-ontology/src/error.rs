//! Error types for ontology resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Why a single remote provider could not supply a label.
///
/// Provider errors never abort resolution; the resolver logs them and moves
/// on to the next tier.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to {provider} timed out")]
    Timeout { provider: String },

    #[error("{provider} returned HTTP {status}")]
    Status { provider: String, status: u16 },

    #[error("request to {provider} failed: {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned a malformed payload: {message}")]
    Malformed { provider: String, message: String },

    #[error("{provider} has no label for {code}")]
    NotFound { provider: String, code: String },
}

/// Errors building or persisting resolver state.
#[derive(Debug, Error)]
pub enum OntologyError {
    #[error("{operation} failed for {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode cache entry for {code}: {source}")]
    Encode {
        code: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid provider configuration '{name}': {message}")]
    InvalidProvider { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, OntologyError>;
