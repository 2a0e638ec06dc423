//! Export side: records to sealed envelopes

use crate::cipher::{BundleKey, Cipher};
use crate::error::ExportError;
use crate::payload::BundlePayload;
use crate::validate::{check_profile, check_run_history, check_session, ValidationReport};
use log::{debug, warn};
use std::sync::Arc;
use voidsave_core::{codec, keys, ProfileRecord, SessionRecord, ToValue, SESSION_SLOTS};
use voidsave_history::RunHistory;

/// Seals records for transfer
///
/// Refuses to produce anything the matching [`Importer`](crate::Importer)
/// would reject.
pub struct Exporter {
    cipher: Arc<dyn Cipher>,
    key: BundleKey,
}

impl Exporter {
    pub fn new(cipher: Arc<dyn Cipher>, key: BundleKey) -> Self {
        Self { cipher, key }
    }

    /// Seal a profile with up to five session slots
    ///
    /// Sessions that would fail import validation are left out of the bundle
    /// and logged. Slots past the fifth are ignored.
    pub fn export_bundle(
        &self,
        profile: &ProfileRecord,
        sessions: &[Option<SessionRecord>],
    ) -> Result<Vec<u8>, ExportError> {
        let profile_value = profile.to_value();
        let mut report = ValidationReport::default();
        check_profile(&profile_value, &mut report);
        report.into_result()?;

        if sessions.len() > SESSION_SLOTS {
            warn!(
                "export: ignoring {} sessions past slot {}",
                sessions.len() - SESSION_SLOTS,
                SESSION_SLOTS - 1
            );
        }

        let mut payload = BundlePayload {
            profile_text: codec::encode(&profile_value)?,
            ..Default::default()
        };
        for (slot, session) in sessions.iter().enumerate().take(SESSION_SLOTS) {
            let Some(session) = session else { continue };
            let value = session.to_value();
            let mut report = ValidationReport::default();
            check_session(slot, &value, &mut report);
            if report.is_ok() {
                payload.session_texts[slot] = Some(codec::encode(&value)?);
            } else {
                warn!("export: dropping session {}: {}", slot, report);
            }
        }

        let plaintext = payload.to_bytes()?;
        debug!("export: bundle payload {} bytes", plaintext.len());
        Ok(self.cipher.encrypt(&plaintext, &self.key))
    }

    /// Seal a single profile, written with the short entry keys
    pub fn export_profile(&self, profile: &ProfileRecord) -> Result<Vec<u8>, ExportError> {
        let mut value = profile.to_value();
        let mut report = ValidationReport::default();
        check_profile(&value, &mut report);
        report.into_result()?;

        keys::shorten_profile(&mut value);
        let text = codec::encode(&value)?;
        Ok(self.cipher.encrypt(text.as_bytes(), &self.key))
    }

    /// Seal a single session
    pub fn export_session(&self, session: &SessionRecord) -> Result<Vec<u8>, ExportError> {
        let value = session.to_value();
        let mut report = ValidationReport::default();
        check_session(0, &value, &mut report);
        report.into_result()?;

        let text = codec::encode(&value)?;
        Ok(self.cipher.encrypt(text.as_bytes(), &self.key))
    }

    /// Seal the run history
    pub fn export_run_history(&self, history: &RunHistory) -> Result<Vec<u8>, ExportError> {
        let value = history.to_value();
        let mut report = ValidationReport::default();
        check_run_history(&value, &mut report);
        report.into_result()?;

        let text = codec::encode(&value)?;
        Ok(self.cipher.encrypt(text.as_bytes(), &self.key))
    }
}
