//! Error types for the overheat index

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scoring or publishing
///
/// Corrupt or missing persisted state is not an error: the state store falls
/// back to the baseline and logs a warning instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Missing output files for {index_key}: {path}")]
    MissingArtifact { index_key: String, path: PathBuf },

    #[error("Invalid stats document {path}: {reason}")]
    InvalidStats { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
