//! voidsave-bundle - Export and import of save data between devices
//!
//! A bundle is one sealed blob holding a profile and up to five session
//! snapshots. The import path is split in two so that a confirmation step
//! always sits between decoding and writing:
//!
//! 1. [`Importer`] decrypts, decodes and validates, producing a
//!    [`PendingImport`] or a rejection listing every failed check
//! 2. [`PendingImport::resolve`] asks an [`ImportConfirmer`] and only then
//!    yields the [`ApprovedImport`] the slot manager writes back
//!
//! Encryption is injected through the [`Cipher`] trait.

pub mod cipher;
pub mod error;
pub mod export;
pub mod gate;
pub mod import;
pub mod payload;
pub mod validate;

pub use cipher::{AesCipher, BundleKey, Cipher, DecryptError, PlainCipher};
pub use error::{ExportError, ImportError, Result};
pub use export::Exporter;
pub use gate::{
    ApprovedImport, ImportConfirmer, ImportContents, ImportKind, ImportSummary, PendingImport,
    SessionSummary,
};
pub use import::Importer;
pub use payload::BundlePayload;
pub use validate::{ValidationFailure, ValidationReport};
