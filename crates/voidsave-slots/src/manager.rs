//! The slot manager
//!
//! Sole mutator of one account's durable state. Every write to a storage key
//! holds that key's lock for its whole read-modify-write cycle; the codec,
//! migrator and validation run without any lock.

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::keys::KeySpace;
use crate::locks::KeyLocks;
use crate::slot::SlotId;
use log::{debug, info, warn};
use rand::Rng;
use std::sync::{Arc, Mutex};
use voidsave_bundle::{
    ApprovedImport, Exporter, ImportConfirmer, ImportContents, ImportSummary, Importer,
};
use voidsave_core::prefs::{decode_prefs, encode_prefs};
use voidsave_core::{
    codec, ProfileRecord, SessionRecord, StarterPreferences, Storage, ToValue, SESSION_SLOTS,
};
use voidsave_history::{RunHistory, RunHistoryEntry};
use voidsave_migrate::{read_session, Migrator, RawProfile};

/// Outcome of [`SlotManager::save_all`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveAllOutcome {
    /// The active session was blank and was not written
    pub session_skipped: bool,
}

/// Owns the profile, the five session slots, the run history and the
/// starter preferences of one account
pub struct SlotManager<S: Storage> {
    storage: S,
    migrator: Arc<Migrator>,
    config: EngineConfig,
    keys: KeySpace,
    locks: KeyLocks,
    profile: Mutex<Option<ProfileRecord>>,
    /// Last preference text read or written, to skip identical writes
    last_prefs: Mutex<Option<String>>,
}

impl<S: Storage> SlotManager<S> {
    pub fn new(storage: S, migrator: Arc<Migrator>, config: EngineConfig) -> Self {
        let keys = KeySpace::new(config.key_suffix.as_deref());
        let locks = KeyLocks::new(keys.all(), config.contention);
        Self {
            storage,
            migrator,
            config,
            keys,
            locks,
            profile: Mutex::new(None),
            last_prefs: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn migrator(&self) -> &Arc<Migrator> {
        &self.migrator
    }

    fn write(&self, key: &str, text: &str) -> Result<()> {
        debug!("write {} ({} bytes)", key, text.len());
        self.storage.set(key, text.as_bytes())?;
        Ok(())
    }

    fn cache_profile(&self, profile: ProfileRecord) -> Result<()> {
        let mut cached = self
            .profile
            .lock()
            .map_err(|_| Error::Poisoned("profile cache".into()))?;
        *cached = Some(profile);
        Ok(())
    }

    /// Profile last loaded or saved through this manager
    pub fn cached_profile(&self) -> Result<Option<ProfileRecord>> {
        let cached = self
            .profile
            .lock()
            .map_err(|_| Error::Poisoned("profile cache".into()))?;
        Ok(cached.clone())
    }

    // Profile

    /// Load and normalize the stored profile
    ///
    /// A missing profile yields a fresh account with random trainer ids. The
    /// new account is not written until it is saved.
    pub fn load_profile(&self) -> Result<ProfileRecord> {
        let key = self.keys.profile();
        let profile = match self.storage.get(&key)? {
            Some(bytes) => {
                let raw = RawProfile::from_value(codec::decode_bytes(&bytes)?)?;
                let (profile, report) = self.migrator.normalize_with_report(raw);
                if !report.is_noop() {
                    debug!("profile migrated: {:?}", report.applied);
                }
                profile
            }
            None => {
                let mut rng = rand::rng();
                let trainer_id = rng.random_range(1..=u32::from(u16::MAX));
                let secret_id = rng.random_range(1..=u32::from(u16::MAX));
                info!("no profile under {}, starting new account {}", key, trainer_id);
                let mut profile = ProfileRecord::new_account(
                    self.migrator.catalog().as_ref(),
                    trainer_id,
                    secret_id,
                    self.config.default_perma_money,
                    0,
                );
                profile.touch();
                profile
            }
        };
        self.cache_profile(profile.clone())?;
        Ok(profile)
    }

    /// Encode and store the profile
    ///
    /// Refuses a record whose dex has lost progress relative to the profile
    /// this manager last loaded or saved.
    pub fn save_profile(&self, profile: &ProfileRecord) -> Result<()> {
        let key = self.keys.profile();
        let _guard = self.locks.acquire(&key)?;
        if let Some(previous) = self.cached_profile()? {
            let lost = profile.dex_regressions(&previous);
            if !lost.is_empty() {
                return Err(Error::DexRegression(lost));
            }
        }
        let text = codec::encode(&profile.to_value())?;
        self.write(&key, &text)?;
        self.cache_profile(profile.clone())
    }

    /// Save the profile and, unless it is blank, the active run
    pub fn save_all(
        &self,
        profile: &ProfileRecord,
        active: Option<(SlotId, &SessionRecord)>,
    ) -> Result<SaveAllOutcome> {
        self.save_profile(profile)?;
        let mut outcome = SaveAllOutcome {
            session_skipped: false,
        };
        if let Some((slot, session)) = active {
            if session.is_blank(self.config.require_play_time) {
                warn!("not saving blank session into slot {}", slot);
                outcome.session_skipped = true;
            } else {
                self.save_session(slot, session)?;
            }
        }
        Ok(outcome)
    }

    // Sessions

    pub fn load_session(&self, slot: SlotId) -> Result<Option<SessionRecord>> {
        match self.storage.get(&self.keys.session(slot))? {
            Some(bytes) => Ok(Some(read_session(codec::decode_bytes(&bytes)?)?)),
            None => Ok(None),
        }
    }

    /// Store a run in `slot`; a blank run is refused
    pub fn save_session(&self, slot: SlotId, session: &SessionRecord) -> Result<()> {
        if session.is_blank(self.config.require_play_time) {
            return Err(Error::BlankSession(slot));
        }
        let key = self.keys.session(slot);
        let _guard = self.locks.acquire(&key)?;
        let text = codec::encode(&session.to_value())?;
        self.write(&key, &text)
    }

    pub fn delete_session(&self, slot: SlotId) -> Result<()> {
        let key = self.keys.session(slot);
        let _guard = self.locks.acquire(&key)?;
        debug!("delete {}", key);
        self.storage.delete(&key)?;
        Ok(())
    }

    /// Stored run for a slot scan; a slot that fails to decode counts as empty
    fn scan_session(&self, slot: SlotId) -> Result<Option<SessionRecord>> {
        match self.load_session(slot) {
            Err(Error::Codec(e)) => {
                warn!("slot {} does not decode, treating it as empty: {}", slot, e);
                Ok(None)
            }
            other => other,
        }
    }

    /// Slot holding the most recently saved run
    ///
    /// Ties go to the lowest slot index. Undecodable slots are skipped.
    pub fn most_recent_slot(&self) -> Result<Option<SlotId>> {
        let mut best: Option<(SlotId, i64)> = None;
        for slot in SlotId::all() {
            let Some(session) = self.scan_session(slot)? else {
                continue;
            };
            match best {
                Some((_, newest)) if session.timestamp <= newest => {}
                _ => best = Some((slot, session.timestamp)),
            }
        }
        Ok(best.map(|(slot, _)| slot))
    }

    /// Every slot's stored run, in slot order; undecodable slots are `None`
    pub fn load_sessions(&self) -> Result<[Option<SessionRecord>; SESSION_SLOTS]> {
        let mut sessions: [Option<SessionRecord>; SESSION_SLOTS] = Default::default();
        for slot in SlotId::all() {
            sessions[slot.index()] = self.scan_session(slot)?;
        }
        Ok(sessions)
    }

    // Run history

    pub fn load_run_history(&self) -> Result<RunHistory> {
        let capacity = self.config.run_history_capacity;
        match self.storage.get(&self.keys.run_history())? {
            Some(bytes) => {
                let value = codec::decode_bytes(&bytes)?;
                Ok(RunHistory::from_value(value, capacity)?)
            }
            None => Ok(RunHistory::new(capacity)),
        }
    }

    fn update_run_history<T>(&self, update: impl FnOnce(&mut RunHistory) -> T) -> Result<T> {
        let key = self.keys.run_history();
        let _guard = self.locks.acquire(&key)?;
        let mut history = self.load_run_history()?;
        let out = update(&mut history);
        self.write(&key, &history.to_text()?)?;
        Ok(out)
    }

    /// Record a finished run; returns the timestamps evicted to stay in bounds
    pub fn push_run_history(&self, entry: RunHistoryEntry) -> Result<Vec<i64>> {
        self.update_run_history(|history| history.push(entry))
    }

    pub fn set_run_favorite(&self, timestamp: i64, favorite: bool) -> Result<bool> {
        self.update_run_history(|history| history.set_favorite(timestamp, favorite))
    }

    // Starter preferences

    pub fn load_starter_prefs(&self) -> Result<StarterPreferences> {
        let Some(bytes) = self.storage.get(&self.keys.starter_prefs())? else {
            return Ok(StarterPreferences::new());
        };
        let text = String::from_utf8(bytes).map_err(|_| voidsave_core::CodecError::Utf8)?;
        let prefs = decode_prefs(&text)?;
        self.remember_prefs(text)?;
        Ok(prefs)
    }

    fn remember_prefs(&self, text: String) -> Result<()> {
        let mut last = self
            .last_prefs
            .lock()
            .map_err(|_| Error::Poisoned("starter prefs cache".into()))?;
        *last = Some(text);
        Ok(())
    }

    /// Store starter preferences unless they match the last text read or
    /// written; returns whether a write happened
    pub fn save_starter_prefs(&self, prefs: &StarterPreferences) -> Result<bool> {
        let text = encode_prefs(prefs)?;
        let key = self.keys.starter_prefs();
        let _guard = self.locks.acquire(&key)?;
        {
            let last = self
                .last_prefs
                .lock()
                .map_err(|_| Error::Poisoned("starter prefs cache".into()))?;
            if last.as_deref() == Some(text.as_str()) {
                return Ok(false);
            }
        }
        self.write(&key, &text)?;
        self.remember_prefs(text)?;
        Ok(true)
    }

    // Import and export

    /// Seal the stored profile and sessions into a bundle
    pub fn export_bundle(&self, exporter: &Exporter) -> Result<Vec<u8>> {
        let profile = self.load_profile()?;
        let sessions = self.load_sessions()?;
        Ok(exporter.export_bundle(&profile, &sessions)?)
    }

    /// Validate a bundle, ask `confirmer`, and apply it when accepted
    ///
    /// Returns false when the confirmer declined; stored data is untouched
    /// on decline and on every error raised before the first write.
    pub fn import_bundle(
        &self,
        importer: &Importer,
        sealed: &[u8],
        confirmer: &mut dyn ImportConfirmer,
    ) -> Result<bool> {
        let pending = importer.import_bundle(sealed)?;
        match pending.resolve(confirmer) {
            Some(approved) => {
                self.apply_import(approved)?;
                Ok(true)
            }
            None => {
                info!("bundle import declined");
                Ok(false)
            }
        }
    }

    /// Write a confirmed import over live data
    ///
    /// Everything is encoded before the first write. A bundle replaces the
    /// profile and all five slots; slots absent from the bundle are cleared
    /// only after every write has gone through.
    pub fn apply_import(&self, approved: ApprovedImport) -> Result<ImportSummary> {
        let (contents, summary) = approved.into_parts();
        match contents {
            ImportContents::Bundle { profile, sessions } => {
                let profile_text = codec::encode(&profile.to_value())?;
                let mut session_texts: [Option<String>; SESSION_SLOTS] = Default::default();
                for (slot, session) in sessions.iter().enumerate() {
                    if let Some(session) = session {
                        session_texts[slot] = Some(codec::encode(&session.to_value())?);
                    }
                }

                let session_keys: Vec<String> =
                    SlotId::all().map(|slot| self.keys.session(slot)).collect();
                let profile_key = self.keys.profile();
                let _guards = self
                    .locks
                    .acquire_all(std::iter::once(&profile_key).chain(session_keys.iter()))?;

                self.write(&profile_key, &profile_text)?;
                for (key, text) in session_keys.iter().zip(session_texts.iter()) {
                    if let Some(text) = text {
                        self.write(key, text)?;
                    }
                }
                for (key, text) in session_keys.iter().zip(session_texts.iter()) {
                    if text.is_none() {
                        debug!("delete {}", key);
                        self.storage.delete(key)?;
                    }
                }
                self.cache_profile(profile)?;
            }
            ImportContents::Profile(profile) => {
                let text = codec::encode(&profile.to_value())?;
                let key = self.keys.profile();
                let _guard = self.locks.acquire(&key)?;
                self.write(&key, &text)?;
                self.cache_profile(profile)?;
            }
            ImportContents::Session { slot, session } => {
                let slot = SlotId::new(slot)?;
                let text = codec::encode(&session.to_value())?;
                let key = self.keys.session(slot);
                let _guard = self.locks.acquire(&key)?;
                self.write(&key, &text)?;
            }
            ImportContents::RunHistory(history) => {
                let text = history.to_text()?;
                let key = self.keys.run_history();
                let _guard = self.locks.acquire(&key)?;
                self.write(&key, &text)?;
            }
        }
        info!("applied {:?} import", summary.kind);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Contention;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use voidsave_bundle::{AesCipher, BundleKey, Cipher};
    use voidsave_core::{
        AbilityAttr, Bitfield, DexAttr, MemoryStorage, RunContext, SpeciesClass, SpeciesInfo,
        StarterAttributes, StaticCatalog, StorageError, StorageOp, Value,
    };

    fn migrator() -> Arc<Migrator> {
        let catalog = StaticCatalog::from_species([
            SpeciesInfo::new(1, SpeciesClass::Regular, true),
            SpeciesInfo::new(4, SpeciesClass::Regular, true),
            SpeciesInfo::new(144, SpeciesClass::SubLegendary, false),
            SpeciesInfo::new(150, SpeciesClass::Legendary, false),
        ]);
        Arc::new(Migrator::new(Arc::new(catalog)))
    }

    fn manager() -> SlotManager<MemoryStorage> {
        SlotManager::new(MemoryStorage::new(), migrator(), EngineConfig::default())
    }

    fn slot(index: usize) -> SlotId {
        SlotId::new(index).unwrap()
    }

    fn session(timestamp: i64) -> SessionRecord {
        SessionRecord {
            timestamp,
            wave_index: 8,
            play_time: 120,
            party: vec![Value::empty_map()],
            context: RunContext::with_defaults(),
            ..Default::default()
        }
    }

    /// Counts writes on top of an in-memory store
    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        sets: AtomicUsize,
    }

    impl Storage for CountingStorage {
        fn get(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, bytes: &[u8]) -> std::result::Result<(), StorageError> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, bytes)
        }

        fn delete(&self, key: &str) -> std::result::Result<(), StorageError> {
            self.inner.delete(key)
        }
    }

    /// Fails every write to the profile key once armed
    #[derive(Default)]
    struct ProfileWriteFails {
        inner: MemoryStorage,
        armed: AtomicBool,
    }

    impl Storage for ProfileWriteFails {
        fn get(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, bytes: &[u8]) -> std::result::Result<(), StorageError> {
            if key == "profile" && self.armed.load(Ordering::SeqCst) {
                return Err(StorageError::new(StorageOp::Set, key, "disk full"));
            }
            self.inner.set(key, bytes)
        }

        fn delete(&self, key: &str) -> std::result::Result<(), StorageError> {
            self.inner.delete(key)
        }
    }

    #[test]
    fn test_missing_profile_is_new_account() {
        let manager = manager();
        let profile = manager.load_profile().unwrap();
        assert_eq!(profile.dex.len(), 4);
        assert_eq!(profile.starters.len(), 2);
        assert_eq!(profile.perma_money, 10_000);
        assert!(profile.timestamp > 0);
        assert!((1..=65535).contains(&profile.trainer_id));
        assert_eq!(manager.storage().get("profile").unwrap(), None);
        assert_eq!(manager.cached_profile().unwrap(), Some(profile));
    }

    #[test]
    fn test_profile_round_trip_keeps_big_bitfields() {
        let manager = manager();
        let mut profile = manager.load_profile().unwrap();
        profile.dex_mut(150).caught_attr = Bitfield::from_u64((1 << 40) + 5);
        manager.save_profile(&profile).unwrap();

        let reloaded = SlotManager::new(
            MemoryStorage::new(),
            migrator(),
            EngineConfig::default(),
        );
        reloaded
            .storage()
            .set("profile", &manager.storage().get("profile").unwrap().unwrap())
            .unwrap();
        let loaded = reloaded.load_profile().unwrap();
        assert_eq!(loaded.dex[&150].caught_attr.to_string(), "1099511627781");
        assert_eq!(loaded.trainer_id, profile.trainer_id);
    }

    #[test]
    fn test_legacy_profile_migrates_on_load() {
        let manager = manager();
        manager
            .storage()
            .set(
                "profile",
                br#"{"dexData":{"1":{"$sa":"3n","$ca":"3n"}},"timestamp":5}"#,
            )
            .unwrap();
        let profile = manager.load_profile().unwrap();
        assert_eq!(profile.dex.len(), 4);
        assert!(profile.starters[&1].has_ability(AbilityAttr::ABILITY_1));
        assert_eq!(profile.starters[&1].obtained_fusions, Vec::<u32>::new());
    }

    #[test]
    fn test_dex_regression_refused() {
        let manager = manager();
        let mut profile = manager.load_profile().unwrap();
        profile.dex_mut(1).caught_attr.insert(DexAttr::SHINY);
        manager.save_profile(&profile).unwrap();

        let mut stale = profile.clone();
        stale.dex_mut(1).caught_attr = Bitfield::new();
        assert!(matches!(
            manager.save_profile(&stale),
            Err(Error::DexRegression(ids)) if ids == vec![1]
        ));
    }

    #[test]
    fn test_session_save_load_delete() {
        let manager = manager();
        assert_eq!(manager.load_session(slot(2)).unwrap(), None);
        manager.save_session(slot(2), &session(900)).unwrap();
        assert_eq!(manager.load_session(slot(2)).unwrap(), Some(session(900)));
        manager.delete_session(slot(2)).unwrap();
        assert_eq!(manager.load_session(slot(2)).unwrap(), None);
    }

    #[test]
    fn test_blank_session_refused() {
        let manager = manager();
        manager.save_session(slot(0), &session(100)).unwrap();

        let mut blank = session(200);
        blank.party.clear();
        assert!(matches!(
            manager.save_session(slot(0), &blank),
            Err(Error::BlankSession(s)) if s == slot(0)
        ));
        let mut wave_zero = session(200);
        wave_zero.wave_index = 0;
        assert!(manager.save_session(slot(0), &wave_zero).is_err());
        assert_eq!(manager.load_session(slot(0)).unwrap(), Some(session(100)));
    }

    #[test]
    fn test_save_all_skips_blank_run() {
        let config = EngineConfig {
            require_play_time: true,
            ..EngineConfig::default()
        };
        let manager = SlotManager::new(MemoryStorage::new(), migrator(), config);
        let profile = manager.load_profile().unwrap();

        let mut unplayed = session(300);
        unplayed.play_time = 0;
        let outcome = manager.save_all(&profile, Some((slot(1), &unplayed))).unwrap();
        assert!(outcome.session_skipped);
        assert!(manager.storage().get("profile").unwrap().is_some());
        assert_eq!(manager.load_session(slot(1)).unwrap(), None);

        let outcome = manager.save_all(&profile, Some((slot(1), &session(300)))).unwrap();
        assert!(!outcome.session_skipped);
        assert!(manager.load_session(slot(1)).unwrap().is_some());
    }

    #[test]
    fn test_most_recent_slot_tie_goes_to_lowest() {
        let manager = manager();
        assert_eq!(manager.most_recent_slot().unwrap(), None);
        for (index, ts) in [0, 500, 500, 0, 0].into_iter().enumerate() {
            manager.save_session(slot(index), &session(ts)).unwrap();
        }
        assert_eq!(manager.most_recent_slot().unwrap(), Some(slot(1)));

        manager.delete_session(slot(1)).unwrap();
        assert_eq!(manager.most_recent_slot().unwrap(), Some(slot(2)));
    }

    #[test]
    fn test_undecodable_slot_counts_as_empty() {
        let manager = manager();
        manager.save_session(slot(0), &session(100)).unwrap();
        manager.storage().set("session2", b"{\"seed\": 12n").unwrap();
        manager.save_session(slot(4), &session(900)).unwrap();

        assert!(matches!(manager.load_session(slot(2)), Err(Error::Codec(_))));
        assert_eq!(manager.most_recent_slot().unwrap(), Some(slot(4)));
        let sessions = manager.load_sessions().unwrap();
        assert_eq!(sessions[0], Some(session(100)));
        assert_eq!(sessions[2], None);
        assert_eq!(sessions[4], Some(session(900)));
    }

    #[test]
    fn test_run_history_bounded() {
        let config = EngineConfig {
            run_history_capacity: 2,
            ..EngineConfig::default()
        };
        let manager = SlotManager::new(MemoryStorage::new(), migrator(), config);
        for ts in [10, 30, 20] {
            manager
                .push_run_history(RunHistoryEntry::new(session(ts), ts == 30))
                .unwrap();
        }
        let history = manager.load_run_history().unwrap();
        let kept: Vec<i64> = history.iter().map(|(ts, _)| ts).collect();
        assert_eq!(kept, vec![30, 20]);

        assert!(manager.set_run_favorite(20, true).unwrap());
        assert!(!manager.set_run_favorite(10, true).unwrap());
        assert!(manager.load_run_history().unwrap().get(20).unwrap().is_favorite);
    }

    #[test]
    fn test_starter_prefs_skip_identical_writes() {
        let manager = SlotManager::new(CountingStorage::default(), migrator(), EngineConfig::default());
        assert!(manager.load_starter_prefs().unwrap().is_empty());

        let mut prefs = StarterPreferences::new();
        prefs.insert(
            4,
            StarterAttributes {
                shiny: Some(true),
                ..Default::default()
            },
        );
        assert!(manager.save_starter_prefs(&prefs).unwrap());
        assert!(!manager.save_starter_prefs(&prefs).unwrap());
        assert_eq!(manager.storage().sets.load(Ordering::SeqCst), 1);

        prefs.get_mut(&4).unwrap().favorite = Some(true);
        assert!(manager.save_starter_prefs(&prefs).unwrap());
        assert_eq!(manager.load_starter_prefs().unwrap(), prefs);
    }

    #[test]
    fn test_reject_contention() {
        let config = EngineConfig {
            contention: Contention::Reject,
            ..EngineConfig::default()
        };
        let manager = SlotManager::new(MemoryStorage::new(), migrator(), config);
        let key = manager.keys().session(slot(3));
        let held = manager.locks.acquire(&key).unwrap();
        assert!(matches!(
            manager.save_session(slot(3), &session(1)),
            Err(Error::WriteInFlight(k)) if k == "session3"
        ));
        drop(held);
        manager.save_session(slot(3), &session(1)).unwrap();
    }

    #[test]
    fn test_key_suffix() {
        let config = EngineConfig {
            key_suffix: Some("guest".into()),
            ..EngineConfig::default()
        };
        let manager = SlotManager::new(MemoryStorage::new(), migrator(), config);
        let profile = manager.load_profile().unwrap();
        manager.save_profile(&profile).unwrap();
        manager.save_session(slot(0), &session(5)).unwrap();
        assert_eq!(manager.storage().keys(), vec!["profile_guest", "session0_guest"]);
    }

    fn bundle_tools() -> (Exporter, Importer) {
        let cipher: Arc<dyn Cipher> = Arc::new(AesCipher);
        let key = BundleKey::new("transfer");
        (
            Exporter::new(cipher.clone(), key.clone()),
            Importer::new(cipher, key, migrator()),
        )
    }

    #[test]
    fn test_bundle_transfer_replaces_slots() {
        let (exporter, importer) = bundle_tools();

        let source = manager();
        let mut profile = source.load_profile().unwrap();
        profile.dex_mut(4).caught_attr.insert(DexAttr::NON_SHINY);
        source.save_profile(&profile).unwrap();
        source.save_session(slot(1), &session(700)).unwrap();
        let sealed = source.export_bundle(&exporter).unwrap();

        let target = manager();
        target.save_session(slot(3), &session(50)).unwrap();

        let mut decline = |_: &ImportSummary| false;
        assert!(!target.import_bundle(&importer, &sealed, &mut decline).unwrap());
        assert_eq!(target.load_session(slot(3)).unwrap(), Some(session(50)));
        assert_eq!(target.storage().get("profile").unwrap(), None);

        let mut accept = |summary: &ImportSummary| summary.trainer_id == Some(profile.trainer_id);
        assert!(target.import_bundle(&importer, &sealed, &mut accept).unwrap());
        assert_eq!(target.load_session(slot(3)).unwrap(), None);
        assert_eq!(target.load_session(slot(1)).unwrap(), Some(session(700)));
        let imported = target.load_profile().unwrap();
        assert_eq!(imported.trainer_id, profile.trainer_id);
        assert_eq!(imported.dex, profile.dex);
    }

    #[test]
    fn test_failed_bundle_write_keeps_old_runs() {
        let (exporter, importer) = bundle_tools();
        let source = manager();
        let profile = source.load_profile().unwrap();
        source.save_profile(&profile).unwrap();
        source.save_session(slot(1), &session(700)).unwrap();
        let sealed = source.export_bundle(&exporter).unwrap();

        let target = SlotManager::new(
            ProfileWriteFails::default(),
            migrator(),
            EngineConfig::default(),
        );
        target.save_session(slot(3), &session(50)).unwrap();
        target.storage().armed.store(true, Ordering::SeqCst);

        let mut accept = |_: &ImportSummary| true;
        assert!(matches!(
            target.import_bundle(&importer, &sealed, &mut accept),
            Err(Error::Storage(_))
        ));
        assert_eq!(target.load_session(slot(3)).unwrap(), Some(session(50)));
        assert_eq!(target.load_session(slot(1)).unwrap(), None);
    }

    #[test]
    fn test_rejected_bundle_leaves_state() {
        let (_, importer) = bundle_tools();
        let target = manager();
        target.save_session(slot(0), &session(10)).unwrap();
        let garbage = AesCipher.encrypt(b"{\"profileText\":\"{}\"}", &BundleKey::new("transfer"));
        let mut accept = |_: &ImportSummary| true;
        assert!(matches!(
            target.import_bundle(&importer, &garbage, &mut accept),
            Err(Error::Import(_))
        ));
        assert_eq!(target.load_session(slot(0)).unwrap(), Some(session(10)));
    }

    #[test]
    fn test_file_backed_manager() {
        let dir = tempfile::tempdir().unwrap();
        let storage = voidsave_db::FileStorage::open(dir.path()).unwrap();
        let manager = SlotManager::new(storage.clone(), migrator(), EngineConfig::default());
        let profile = manager.load_profile().unwrap();
        manager.save_profile(&profile).unwrap();
        manager.save_session(slot(4), &session(42)).unwrap();

        let reopened = SlotManager::new(storage, migrator(), EngineConfig::default());
        assert_eq!(reopened.load_profile().unwrap().trainer_id, profile.trainer_id);
        assert_eq!(reopened.most_recent_slot().unwrap(), Some(slot(4)));
    }
}
