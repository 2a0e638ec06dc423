//! Error types for voidsave-history

use thiserror::Error;
use voidsave_core::CodecError;

/// Run-history decoding error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("run history key {0:?} is not a timestamp")]
    BadKey(String),

    #[error("run history entry {timestamp} is missing {field}")]
    MissingField {
        timestamp: i64,
        field: &'static str,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
