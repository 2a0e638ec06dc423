//! Error types for voidsave-slots

use crate::slot::SlotId;
use thiserror::Error;
use voidsave_bundle::{ExportError, ImportError};
use voidsave_core::{CodecError, SpeciesId, StorageError};

/// Configuration loading error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Duplicate species definition: {0}")]
    DuplicateSpecies(SpeciesId),
}

/// Slot manager error type
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    History(#[from] voidsave_history::Error),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("session slot {0} is out of range")]
    SlotOutOfRange(usize),

    #[error("refusing to overwrite slot {0} with a blank session")]
    BlankSession(SlotId),

    #[error("a write to {0} is already in flight")]
    WriteInFlight(String),

    #[error("no write lock registered for {0}")]
    UnknownKey(String),

    #[error("lock for {0} is poisoned")]
    Poisoned(String),

    #[error("profile would lose dex progress for species {0:?}")]
    DexRegression(Vec<SpeciesId>),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
