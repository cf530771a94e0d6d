//! Errors raised by the shared helpers.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, UtilsError>;

#[derive(Debug, Error)]
pub enum UtilsError {
    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    #[error("environment variable {key}={value:?} is not a valid {expected}")]
    InvalidEnv {
        key: String,
        value: String,
        expected: &'static str,
    },

    /// Document keys become file names
    #[error("invalid document key {0:?}")]
    InvalidKey(String),

    #[error("malformed document {}: {source}", path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
