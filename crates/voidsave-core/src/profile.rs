//! Account-wide profile record

use crate::dex::{regressions, DexEntry, SpeciesDex, SpeciesId};
use crate::error::QuestError;
use crate::modifier::ModifierData;
use crate::quest::{QuestId, QuestState, QuestStore, QuestTransition, RewardDescriptor, RewardKind};
use crate::species::SpeciesCatalog;
use crate::starter::{StarterEntry, StarterRoster};
use crate::stats::{self, GameStats};
use crate::value::{ToValue, Value, ValueMap};
use std::collections::BTreeMap;

/// Player gender flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlayerGender {
    #[default]
    Unset,
    Male,
    Female,
}

impl PlayerGender {
    pub fn code(self) -> i64 {
        match self {
            PlayerGender::Unset => 0,
            PlayerGender::Male => 1,
            PlayerGender::Female => 2,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            1 => PlayerGender::Male,
            2 => PlayerGender::Female,
            _ => PlayerGender::Unset,
        }
    }
}

/// The one profile an account owns
///
/// Dex bitfields and counters only grow between writes and every starter id
/// resolves in the dex.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileRecord {
    pub trainer_id: u32,
    pub secret_id: u32,
    pub gender: PlayerGender,
    pub dex: SpeciesDex,
    pub starters: StarterRoster,
    pub stats: GameStats,
    pub unlocks: BTreeMap<u32, bool>,
    pub achv_unlocks: BTreeMap<String, i64>,
    pub voucher_unlocks: BTreeMap<String, i64>,
    pub voucher_counts: BTreeMap<String, u32>,
    pub eggs: Vec<Value>,
    pub egg_pity: Vec<u32>,
    pub unlock_pity: Vec<u32>,
    pub perma_money: u64,
    pub perma_modifiers: Vec<ModifierData>,
    pub quests: QuestStore,
    pub defeated_rivals: Vec<u32>,
    pub uni_smitty_unlocks: Vec<String>,
    pub mod_forms_unlocked: Vec<String>,
    pub game_version: String,
    /// Milliseconds since the Unix epoch of the last save
    pub timestamp: i64,
    /// Top-level fields carried through without interpretation
    pub extra: ValueMap,
}

/// Number of egg tiers tracked by the pity counters
pub const EGG_TIERS: usize = 4;

impl ProfileRecord {
    /// A fresh account: every catalog species has a zeroed dex entry and
    /// every starter species a zeroed starter entry
    pub fn new_account(
        catalog: &dyn SpeciesCatalog,
        trainer_id: u32,
        secret_id: u32,
        perma_money: u64,
        timestamp: i64,
    ) -> Self {
        let mut profile = Self {
            trainer_id,
            secret_id,
            stats: GameStats::zeroed(),
            egg_pity: vec![0; EGG_TIERS],
            unlock_pity: vec![0; EGG_TIERS],
            perma_money,
            timestamp,
            ..Self::default()
        };
        profile.ensure_catalog_entries(catalog);
        profile
    }

    /// Stamp the record with the current wall-clock time
    pub fn touch(&mut self) {
        self.timestamp = chrono::Utc::now().timestamp_millis();
    }

    /// Add any missing catalog dex and starter entries and make every starter
    /// resolvable in the dex. Returns how many entries were created.
    pub fn ensure_catalog_entries(&mut self, catalog: &dyn SpeciesCatalog) -> usize {
        let mut created = 0;
        for id in catalog.species_ids() {
            if !self.dex.contains_key(&id) {
                self.dex
                    .insert(id, DexEntry::with_nature(catalog.default_nature_attr(id)));
                created += 1;
            }
            if catalog.is_starter(id) && !self.starters.contains_key(&id) {
                self.starters.insert(id, StarterEntry::default());
                created += 1;
            }
        }
        let orphans: Vec<SpeciesId> = self
            .starters
            .keys()
            .filter(|id| !self.dex.contains_key(*id))
            .copied()
            .collect();
        for id in orphans {
            self.dex.insert(id, DexEntry::default());
            created += 1;
        }
        created
    }

    /// Dex entry for a species, created on first reference
    pub fn dex_mut(&mut self, species: SpeciesId) -> &mut DexEntry {
        self.dex.entry(species).or_default()
    }

    /// Starter entry for a species, created on first reference together with
    /// its dex entry
    pub fn starter_mut(&mut self, species: SpeciesId) -> &mut StarterEntry {
        self.dex.entry(species).or_default();
        self.starters.entry(species).or_default()
    }

    /// True when every starter id resolves in the dex
    pub fn starters_resolve(&self) -> bool {
        self.starters.keys().all(|id| self.dex.contains_key(id))
    }

    /// Species whose dex progress would be lost by replacing `previous`
    /// with this record
    pub fn dex_regressions(&self, previous: &ProfileRecord) -> Vec<SpeciesId> {
        regressions(&previous.dex, &self.dex)
    }

    /// Change a quest's state, counting glitch form rewards on completion
    pub fn set_quest_state(
        &mut self,
        quest: QuestId,
        state: QuestState,
        reward: Option<RewardDescriptor>,
    ) -> Result<QuestTransition, QuestError> {
        let transition = self.quests.set_state(quest, state, reward)?;
        if let Some(reward) = &transition.rewarded {
            if reward.kind.is_glitch_form() {
                self.stats.add(stats::GLITCH_FORMS_UNLOCKED, 1);
            }
        }
        Ok(transition)
    }

    /// True when a completed quest grants `kind` for the species
    pub fn can_use_reward_form(&self, species: SpeciesId, kind: RewardKind) -> bool {
        self.quests.is_completed_with_reward(species, kind)
    }

    pub fn is_smitty_form_unlocked(&self, name: &str) -> bool {
        self.uni_smitty_unlocks.iter().any(|n| n == name)
    }

    /// Register a universal smitty form; returns false when already known
    pub fn unlock_smitty_form(&mut self, name: &str) -> bool {
        if self.is_smitty_form_unlocked(name) {
            return false;
        }
        self.uni_smitty_unlocks.push(name.to_string());
        self.stats.add(stats::SMITTY_FORMS_UNLOCKED, 1);
        true
    }

    pub fn is_mod_form_unlocked(&self, name: &str) -> bool {
        self.mod_forms_unlocked.iter().any(|n| n == name)
    }

    /// Register a mod form; returns false when already known
    pub fn unlock_mod_form(&mut self, name: &str) -> bool {
        if self.is_mod_form_unlocked(name) {
            return false;
        }
        self.mod_forms_unlocked.push(name.to_string());
        self.stats.add(stats::GLITCH_MODS_UNLOCKED, 1);
        true
    }

    /// Credit permanent currency and keep the high-water stat in step
    pub fn add_perma_money(&mut self, amount: u64) {
        self.perma_money = self.perma_money.saturating_add(amount);
        self.stats.raise_to(stats::HIGHEST_PERMA_MONEY, self.perma_money);
    }

    /// Spend permanent currency; false when there is not enough
    pub fn spend_perma_money(&mut self, amount: u64) -> bool {
        match self.perma_money.checked_sub(amount) {
            Some(left) => {
                self.perma_money = left;
                true
            }
            None => false,
        }
    }
}

fn keyed<K: ToString, V: Clone + Into<Value>>(map: &BTreeMap<K, V>) -> Value {
    Value::Map(
        map.iter()
            .map(|(k, v)| (k.to_string(), v.clone().into()))
            .collect(),
    )
}

impl ToValue for ProfileRecord {
    fn to_value(&self) -> Value {
        let mut map = ValueMap::new();
        map.insert("trainerId".into(), self.trainer_id.into());
        map.insert("secretId".into(), self.secret_id.into());
        map.insert("gender".into(), self.gender.code().into());
        map.insert("dexData".into(), self.dex.to_value());
        map.insert("starterData".into(), self.starters.to_value());
        map.insert("gameStats".into(), self.stats.to_value());
        map.insert("unlocks".into(), keyed(&self.unlocks));
        map.insert("achvUnlocks".into(), keyed(&self.achv_unlocks));
        map.insert("voucherUnlocks".into(), keyed(&self.voucher_unlocks));
        map.insert("voucherCounts".into(), keyed(&self.voucher_counts));
        map.insert("eggs".into(), Value::List(self.eggs.clone()));
        map.insert("gameVersion".into(), self.game_version.as_str().into());
        map.insert("timestamp".into(), self.timestamp.into());
        map.insert("eggPity".into(), self.egg_pity.clone().into());
        map.insert("unlockPity".into(), self.unlock_pity.clone().into());
        map.insert("permaMoney".into(), self.perma_money.into());
        map.insert("permaModifiers".into(), self.perma_modifiers.to_value());
        map.insert("questUnlockables".into(), self.quests.to_value());
        map.insert("defeatedRivals".into(), self.defeated_rivals.clone().into());
        map.insert(
            "uniSmittyUnlocks".into(),
            self.uni_smitty_unlocks.clone().into(),
        );
        map.insert(
            "modFormsUnlocked".into(),
            self.mod_forms_unlocked.clone().into(),
        );
        for (key, value) in &self.extra {
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitfield::Bitfield;
    use crate::codec;
    use crate::dex::DexAttr;
    use crate::quest::RewardTarget;
    use crate::species::{SpeciesClass, SpeciesInfo, StaticCatalog};

    fn catalog() -> StaticCatalog {
        StaticCatalog::from_species([
            SpeciesInfo::new(1, SpeciesClass::Regular, true),
            SpeciesInfo::new(2, SpeciesClass::Regular, false),
            SpeciesInfo::new(150, SpeciesClass::Legendary, false),
        ])
    }

    #[test]
    fn test_new_account_shape() {
        let profile = ProfileRecord::new_account(&catalog(), 12, 34, 10_000, 1);
        assert_eq!(profile.dex.len(), 3);
        assert_eq!(profile.starters.len(), 1);
        assert!(profile.starters_resolve());
        assert!(profile.dex.values().all(|e| !e.is_caught()));
        assert_eq!(profile.stats.get(stats::LEGENDARY_CAUGHT), 0);
        assert!(profile.stats.has(stats::SUB_LEGENDARY_CAUGHT));
    }

    #[test]
    fn test_starter_mut_creates_dex_entry() {
        let mut profile = ProfileRecord::default();
        profile.starter_mut(25).add_candy(3);
        assert!(profile.dex.contains_key(&25));
        assert_eq!(profile.starters[&25].candy_count, 3);
    }

    #[test]
    fn test_glitch_counter_bumps_once() {
        let mut profile = ProfileRecord::new_account(&catalog(), 1, 1, 0, 1);
        let reward =
            RewardDescriptor::new(RewardKind::GlitchFormB, RewardTarget::Id(150), 11);
        profile
            .set_quest_state(11, QuestState::Completed, Some(reward.clone()))
            .unwrap();
        profile
            .set_quest_state(11, QuestState::Completed, Some(reward))
            .unwrap();
        assert_eq!(profile.stats.get(stats::GLITCH_FORMS_UNLOCKED), 1);
        assert!(profile.can_use_reward_form(150, RewardKind::GlitchFormB));
    }

    #[test]
    fn test_unlock_registries() {
        let mut profile = ProfileRecord::default();
        assert!(profile.unlock_smitty_form("omnimon"));
        assert!(!profile.unlock_smitty_form("omnimon"));
        assert!(profile.unlock_mod_form("glitchy"));
        assert_eq!(profile.stats.get(stats::SMITTY_FORMS_UNLOCKED), 1);
        assert_eq!(profile.stats.get(stats::GLITCH_MODS_UNLOCKED), 1);
    }

    #[test]
    fn test_profile_round_trips_through_codec() {
        let mut profile = ProfileRecord::new_account(&catalog(), 7, 8, 10_000, 1_700_000_000_000);
        profile
            .dex_mut(1)
            .record_caught(&Bitfield::from_u64((1 << 40) + 5), false);
        profile.dex_mut(1).caught_attr.set_bit(DexAttr::form_bit(90));

        let text = codec::encode(&profile.to_value()).unwrap();
        let back = codec::decode(&text).unwrap();
        assert_eq!(back, profile.to_value());
        let caught = back
            .get("dexData")
            .and_then(|d| d.get("1"))
            .and_then(|e| e.get("caughtAttr"))
            .and_then(Value::as_bigint)
            .unwrap();
        assert!(caught.bit(97));
        assert!(caught.bit(40));
    }

    #[test]
    fn test_perma_money_high_water() {
        let mut profile = ProfileRecord::default();
        profile.add_perma_money(500);
        assert!(profile.spend_perma_money(200));
        assert!(!profile.spend_perma_money(10_000));
        assert_eq!(profile.perma_money, 300);
        assert_eq!(profile.stats.get(stats::HIGHEST_PERMA_MONEY), 500);
    }
}
