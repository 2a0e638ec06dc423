//! Storage keys owned by one account

use crate::slot::SlotId;

pub const PROFILE: &str = "profile";
pub const SESSION_PREFIX: &str = "session";
pub const RUN_HISTORY: &str = "runHistory";
pub const STARTER_PREFS: &str = "starterPrefs";

/// Engine-assigned keys, optionally namespaced with `_<suffix>`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeySpace {
    suffix: Option<String>,
}

impl KeySpace {
    pub fn new(suffix: Option<&str>) -> Self {
        Self {
            suffix: suffix.filter(|s| !s.is_empty()).map(str::to_string),
        }
    }

    fn key(&self, base: &str) -> String {
        match &self.suffix {
            Some(suffix) => format!("{base}_{suffix}"),
            None => base.to_string(),
        }
    }

    pub fn profile(&self) -> String {
        self.key(PROFILE)
    }

    pub fn session(&self, slot: SlotId) -> String {
        self.key(&format!("{SESSION_PREFIX}{slot}"))
    }

    pub fn run_history(&self) -> String {
        self.key(RUN_HISTORY)
    }

    pub fn starter_prefs(&self) -> String {
        self.key(STARTER_PREFS)
    }

    /// Every key, profile first and sessions in slot order
    pub fn all(&self) -> Vec<String> {
        let mut keys = vec![self.profile()];
        keys.extend(SlotId::all().map(|slot| self.session(slot)));
        keys.push(self.run_history());
        keys.push(self.starter_prefs());
        keys
    }
}
