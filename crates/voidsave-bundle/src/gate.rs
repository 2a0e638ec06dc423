//! Confirmation gate between a validated import and the write-back
//!
//! An [`Importer`](crate::Importer) only ever produces a [`PendingImport`].
//! The slot manager only accepts an [`ApprovedImport`], and the only way to
//! get one is to put the pending import in front of an [`ImportConfirmer`]
//! and have it say yes.

use voidsave_core::{ProfileRecord, SessionRecord, SESSION_SLOTS};
use voidsave_history::RunHistory;

/// What an import would replace
#[derive(Debug, Clone, PartialEq)]
pub enum ImportContents {
    /// Profile plus every session slot; empty slots are cleared
    Bundle {
        profile: ProfileRecord,
        sessions: [Option<SessionRecord>; SESSION_SLOTS],
    },
    Profile(ProfileRecord),
    Session {
        slot: usize,
        session: SessionRecord,
    },
    RunHistory(RunHistory),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Bundle,
    Profile,
    Session,
    RunHistory,
}

/// One session as shown to the user before confirming
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub slot: usize,
    pub timestamp: i64,
    pub wave_index: u32,
    pub game_mode: u32,
}

impl SessionSummary {
    fn of(slot: usize, session: &SessionRecord) -> Self {
        Self {
            slot,
            timestamp: session.timestamp,
            wave_index: session.wave_index,
            game_mode: session.game_mode,
        }
    }
}

/// Everything a confirmation prompt needs to describe an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub kind: ImportKind,
    pub trainer_id: Option<u32>,
    pub dex_size: Option<usize>,
    pub profile_timestamp: Option<i64>,
    pub sessions: Vec<SessionSummary>,
    pub runs: Option<usize>,
    /// Migration steps that rewrote the imported profile
    pub migrated: Vec<&'static str>,
}

impl ImportSummary {
    pub(crate) fn describe(contents: &ImportContents, migrated: Vec<&'static str>) -> Self {
        let mut summary = Self {
            kind: ImportKind::Bundle,
            trainer_id: None,
            dex_size: None,
            profile_timestamp: None,
            sessions: Vec::new(),
            runs: None,
            migrated,
        };
        let profile_fields = |profile: &ProfileRecord, summary: &mut Self| {
            summary.trainer_id = Some(profile.trainer_id);
            summary.dex_size = Some(profile.dex.len());
            summary.profile_timestamp = Some(profile.timestamp);
        };
        match contents {
            ImportContents::Bundle { profile, sessions } => {
                profile_fields(profile, &mut summary);
                summary.sessions = sessions
                    .iter()
                    .enumerate()
                    .filter_map(|(slot, s)| s.as_ref().map(|s| SessionSummary::of(slot, s)))
                    .collect();
            }
            ImportContents::Profile(profile) => {
                summary.kind = ImportKind::Profile;
                profile_fields(profile, &mut summary);
            }
            ImportContents::Session { slot, session } => {
                summary.kind = ImportKind::Session;
                summary.sessions = vec![SessionSummary::of(*slot, session)];
            }
            ImportContents::RunHistory(history) => {
                summary.kind = ImportKind::RunHistory;
                summary.runs = Some(history.len());
            }
        }
        summary
    }
}

/// The UI side of the gate
pub trait ImportConfirmer {
    /// Return true to let the import overwrite live data
    fn confirm(&mut self, summary: &ImportSummary) -> bool;
}

impl<F> ImportConfirmer for F
where
    F: FnMut(&ImportSummary) -> bool,
{
    fn confirm(&mut self, summary: &ImportSummary) -> bool {
        self(summary)
    }
}

/// A decoded, validated import that has not been confirmed
///
/// Dropping it abandons the import with no effect on stored data.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "an import does nothing until it is resolved and applied"]
pub struct PendingImport {
    contents: ImportContents,
    summary: ImportSummary,
}

impl PendingImport {
    pub(crate) fn new(contents: ImportContents, migrated: Vec<&'static str>) -> Self {
        let summary = ImportSummary::describe(&contents, migrated);
        Self { contents, summary }
    }

    pub fn summary(&self) -> &ImportSummary {
        &self.summary
    }

    /// Read-only view of what would be written
    pub fn contents(&self) -> &ImportContents {
        &self.contents
    }

    /// Ask `confirmer`; `None` when it declines
    pub fn resolve(self, confirmer: &mut dyn ImportConfirmer) -> Option<ApprovedImport> {
        if confirmer.confirm(&self.summary) {
            Some(ApprovedImport {
                contents: self.contents,
                summary: self.summary,
            })
        } else {
            None
        }
    }
}

/// A confirmed import, ready for write-back
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovedImport {
    contents: ImportContents,
    summary: ImportSummary,
}

impl ApprovedImport {
    pub fn summary(&self) -> &ImportSummary {
        &self.summary
    }

    pub fn contents(&self) -> &ImportContents {
        &self.contents
    }

    pub fn into_parts(self) -> (ImportContents, ImportSummary) {
        (self.contents, self.summary)
    }
}
