//! Error types for voidsave-core

use crate::quest::{QuestId, QuestState};
use thiserror::Error;

/// Failure to turn save text into a value tree, or a value tree into a record
///
/// Fatal to the single decode call only. Callers treat the record as absent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("unparseable save text: {0}")]
    Syntax(String),

    #[error("save text is not valid UTF-8")]
    Utf8,

    #[error("malformed big integer at {path}: {found:?}")]
    MalformedBigInt { path: String, found: String },

    #[error("non-finite number at {path}")]
    NonFinite { path: String },

    #[error("unexpected shape at {path}: expected {expected}, got {got}")]
    UnexpectedShape {
        path: String,
        expected: &'static str,
        got: &'static str,
    },
}

impl CodecError {
    /// Shorthand for a shape mismatch
    pub fn shape(path: impl Into<String>, expected: &'static str, got: &'static str) -> Self {
        CodecError::UnexpectedShape {
            path: path.into(),
            expected,
            got,
        }
    }
}

/// Opaque failure reported by a storage collaborator
///
/// The engine does not interpret it beyond "this read/write did not
/// complete" and never assumes a partial write happened.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("storage {op} failed for {key}: {message}")]
pub struct StorageError {
    pub op: StorageOp,
    pub key: String,
    pub message: String,
}

impl StorageError {
    /// Create a storage error for an operation on a key
    pub fn new(op: StorageOp, key: impl Into<String>, message: impl ToString) -> Self {
        Self {
            op,
            key: key.into(),
            message: message.to_string(),
        }
    }
}

/// Storage operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    Get,
    Set,
    Delete,
}

impl std::fmt::Display for StorageOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageOp::Get => write!(f, "get"),
            StorageOp::Set => write!(f, "set"),
            StorageOp::Delete => write!(f, "delete"),
        }
    }
}

/// Rejected quest transition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuestError {
    #[error("quest {quest} cannot move back from {from:?} to {to:?}")]
    Regression {
        quest: QuestId,
        from: QuestState,
        to: QuestState,
    },
}

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Quest(#[from] QuestError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
