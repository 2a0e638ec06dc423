//! Error types for voidsave-bundle

use crate::cipher::DecryptError;
use crate::validate::ValidationReport;
use thiserror::Error;
use voidsave_core::CodecError;

/// Why an import was refused
///
/// Every variant leaves durable state untouched: nothing is written before an
/// import has been validated and confirmed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImportError {
    #[error("decrypt failed: {0}")]
    Decrypt(#[from] DecryptError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Validation(#[from] ValidationReport),

    #[error("malformed payload: {0}")]
    Payload(String),
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::Payload(err.to_string())
    }
}

/// Why an export was refused
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The record would not pass import validation
    #[error(transparent)]
    Validation(#[from] ValidationReport),

    #[error("payload serialization failed: {0}")]
    Payload(String),
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Payload(err.to_string())
    }
}

/// Result type alias for imports
pub type Result<T> = std::result::Result<T, ImportError>;
