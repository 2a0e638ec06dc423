//! Import side: sealed envelopes to pending imports
//!
//! Every entry point runs decrypt, decode and validate to completion and
//! hands back either a rejection or a [`PendingImport`]. Nothing here touches
//! storage.

use crate::cipher::{BundleKey, Cipher};
use crate::error::{ImportError, Result};
use crate::gate::{ImportContents, ImportSummary, PendingImport};
use crate::payload::BundlePayload;
use crate::validate::{check_profile, check_run_history, check_session, ValidationReport};
use log::debug;
use std::sync::Arc;
use voidsave_core::{codec, ProfileRecord, SessionRecord, Value, SESSION_SLOTS};
use voidsave_history::{RunHistory, DEFAULT_CAPACITY};
use voidsave_migrate::{read_session, Migrator, RawProfile};

/// Opens and validates exported data
pub struct Importer {
    cipher: Arc<dyn Cipher>,
    key: BundleKey,
    migrator: Arc<Migrator>,
    history_capacity: usize,
}

impl Importer {
    pub fn new(cipher: Arc<dyn Cipher>, key: BundleKey, migrator: Arc<Migrator>) -> Self {
        Self {
            cipher,
            key,
            migrator,
            history_capacity: DEFAULT_CAPACITY,
        }
    }

    /// Bound applied to imported run histories
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    fn open(&self, sealed: &[u8]) -> Result<Value> {
        let plaintext = self.cipher.decrypt(sealed, &self.key)?;
        Ok(codec::decode_bytes(&plaintext)?)
    }

    fn migrate(&self, value: Value) -> Result<(ProfileRecord, Vec<&'static str>)> {
        let raw = RawProfile::from_value(value)?;
        let (profile, report) = self.migrator.normalize_with_report(raw);
        let migrated = report.applied.iter().map(|(name, _)| *name).collect();
        Ok((profile, migrated))
    }

    /// Open a bundle made by [`Exporter::export_bundle`](crate::Exporter::export_bundle)
    ///
    /// The profile and every present session are checked before anything is
    /// normalized; the rejection lists every failed check.
    pub fn import_bundle(&self, sealed: &[u8]) -> Result<PendingImport> {
        let plaintext = self.cipher.decrypt(sealed, &self.key)?;
        let payload = BundlePayload::from_bytes(&plaintext)?;

        let profile_value = codec::decode(&payload.profile_text)?;
        let mut report = ValidationReport::default();
        check_profile(&profile_value, &mut report);

        let mut session_values: [Option<Value>; SESSION_SLOTS] = Default::default();
        for (slot, text) in payload.session_texts.iter().enumerate() {
            let Some(text) = text else { continue };
            let value = codec::decode(text)?;
            check_session(slot, &value, &mut report);
            session_values[slot] = Some(value);
        }
        report.into_result()?;

        let (profile, migrated) = self.migrate(profile_value)?;
        let mut sessions: [Option<SessionRecord>; SESSION_SLOTS] = Default::default();
        for (slot, value) in session_values.into_iter().enumerate() {
            if let Some(value) = value {
                sessions[slot] = Some(read_session(value)?);
            }
        }

        debug!(
            "import: bundle for trainer {} with {} sessions",
            profile.trainer_id,
            sessions.iter().flatten().count()
        );
        Ok(PendingImport::new(
            ImportContents::Bundle { profile, sessions },
            migrated,
        ))
    }

    /// Open a single exported profile
    pub fn import_profile(&self, sealed: &[u8]) -> Result<PendingImport> {
        let value = self.open(sealed)?;
        let mut report = ValidationReport::default();
        check_profile(&value, &mut report);
        report.into_result()?;

        let (profile, migrated) = self.migrate(value)?;
        Ok(PendingImport::new(ImportContents::Profile(profile), migrated))
    }

    /// Open a single exported session, to be written to `slot`
    pub fn import_session(&self, sealed: &[u8], slot: usize) -> Result<PendingImport> {
        if slot >= SESSION_SLOTS {
            return Err(ImportError::Payload(format!(
                "session slot {slot} is out of range"
            )));
        }
        let value = self.open(sealed)?;
        let mut report = ValidationReport::default();
        check_session(slot, &value, &mut report);
        report.into_result()?;

        let session = read_session(value)?;
        Ok(PendingImport::new(
            ImportContents::Session { slot, session },
            Vec::new(),
        ))
    }

    /// Open an exported run history
    pub fn import_run_history(&self, sealed: &[u8]) -> Result<PendingImport> {
        let value = self.open(sealed)?;
        let mut report = ValidationReport::default();
        check_run_history(&value, &mut report);
        report.into_result()?;

        let history = RunHistory::from_value(value, self.history_capacity).map_err(|e| match e {
            voidsave_history::Error::Codec(err) => ImportError::Codec(err),
            other => ImportError::Payload(other.to_string()),
        })?;
        Ok(PendingImport::new(ImportContents::RunHistory(history), Vec::new()))
    }

    /// Validate a bundle and describe it without producing an import
    pub fn inspect(&self, sealed: &[u8]) -> Result<ImportSummary> {
        self.import_bundle(sealed).map(|pending| pending.summary().clone())
    }
}
