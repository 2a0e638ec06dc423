//! The migration pipeline

use crate::raw::{RawDexEntry, RawProfile, RawStarterEntry};
use crate::steps::{default_steps, MigrationStep};
use log::{debug, warn};
use std::sync::Arc;
use voidsave_core::{
    CodecError, DexEntry, PlayerGender, ProfileRecord, SpeciesCatalog, StarterEntry, ToValue,
    Value,
};

/// What a normalize call changed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MigrationReport {
    /// (step name, entries or fields rewritten) for every step that fired
    pub applied: Vec<(&'static str, usize)>,
}

impl MigrationReport {
    pub fn fired(&self, step: &str) -> bool {
        self.applied.iter().any(|(name, _)| *name == step)
    }

    /// True when the input was already current
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Upgrades decoded profiles of any revision to the current record
///
/// Total over anything [`RawProfile`] can hold: steps never fail, they only
/// rewrite. Stateless apart from the injected catalog, so one instance can be
/// shared freely.
pub struct Migrator {
    catalog: Arc<dyn SpeciesCatalog>,
    steps: Vec<Box<dyn MigrationStep>>,
}

impl Migrator {
    pub fn new(catalog: Arc<dyn SpeciesCatalog>) -> Self {
        Self {
            catalog,
            steps: default_steps(),
        }
    }

    pub fn catalog(&self) -> &Arc<dyn SpeciesCatalog> {
        &self.catalog
    }

    /// Step names in the order they run
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn normalize(&self, raw: RawProfile) -> ProfileRecord {
        self.normalize_with_report(raw).0
    }

    pub fn normalize_with_report(&self, mut raw: RawProfile) -> (ProfileRecord, MigrationReport) {
        let catalog = self.catalog.as_ref();
        let mut report = MigrationReport::default();
        for step in &self.steps {
            if !step.applies(&raw, catalog) {
                continue;
            }
            let changed = step.apply(&mut raw, catalog);
            if step.name() == "populate-defaults" {
                debug!("migration step {} filled {} fields", step.name(), changed);
            } else {
                warn!("migration step {} rewrote {} entries", step.name(), changed);
            }
            report.applied.push((step.name(), changed));
        }
        (into_record(raw), report)
    }

    /// Read and normalize a decoded tree
    pub fn normalize_value(&self, value: Value) -> Result<ProfileRecord, CodecError> {
        Ok(self.normalize(RawProfile::from_value(value)?))
    }

    /// Decode, read and normalize save text
    pub fn normalize_text(&self, text: &str) -> Result<ProfileRecord, CodecError> {
        Ok(self.normalize(RawProfile::from_text(text)?))
    }

    /// Run the chain again over an already normalized record
    pub fn renormalize(&self, profile: &ProfileRecord) -> Result<ProfileRecord, CodecError> {
        self.normalize_value(profile.to_value())
    }
}

fn dex_entry(raw: RawDexEntry) -> DexEntry {
    let defaults = DexEntry::default();
    DexEntry {
        seen_attr: raw.seen_attr.unwrap_or_default(),
        caught_attr: raw.caught_attr.unwrap_or_default(),
        nature_attr: raw.nature_attr.unwrap_or_default(),
        seen_count: raw.seen_count.unwrap_or_default(),
        caught_count: raw.caught_count.unwrap_or_default(),
        hatched_count: raw.hatched_count.unwrap_or_default(),
        ivs: raw.ivs.unwrap_or(defaults.ivs),
    }
}

fn starter_entry(raw: RawStarterEntry) -> StarterEntry {
    StarterEntry {
        moveset: raw.moveset,
        egg_moves: raw.egg_moves.unwrap_or_default(),
        candy_count: raw.candy_count.unwrap_or_default(),
        friendship: raw.friendship.unwrap_or_default(),
        ability_attr: raw.ability_attr.unwrap_or_default(),
        passive_attr: raw.passive_attr.unwrap_or_default(),
        value_reduction: raw.value_reduction.unwrap_or_default(),
        classic_win_count: raw.classic_win_count.unwrap_or_default(),
        obtained_fusions: raw.obtained_fusions.unwrap_or_default(),
        fusion_movesets: raw.fusion_movesets.unwrap_or_default(),
    }
}

/// Final conversion once defaults are in place; any remaining gap falls back
/// to the type default
fn into_record(raw: RawProfile) -> ProfileRecord {
    ProfileRecord {
        trainer_id: raw.trainer_id.unwrap_or_default(),
        secret_id: raw.secret_id.unwrap_or_default(),
        gender: PlayerGender::from_code(raw.gender.unwrap_or_default()),
        dex: raw.dex.into_iter().map(|(id, e)| (id, dex_entry(e))).collect(),
        starters: raw
            .starters
            .unwrap_or_default()
            .into_iter()
            .map(|(id, e)| (id, starter_entry(e)))
            .collect(),
        stats: raw.stats.unwrap_or_default(),
        unlocks: raw.unlocks.unwrap_or_default(),
        achv_unlocks: raw.achv_unlocks.unwrap_or_default(),
        voucher_unlocks: raw.voucher_unlocks.unwrap_or_default(),
        voucher_counts: raw.voucher_counts.unwrap_or_default(),
        eggs: raw.eggs.unwrap_or_default(),
        egg_pity: raw.egg_pity.unwrap_or_default(),
        unlock_pity: raw.unlock_pity.unwrap_or_default(),
        perma_money: raw.perma_money.unwrap_or_default(),
        perma_modifiers: raw.perma_modifiers.unwrap_or_default(),
        quests: raw.quests.unwrap_or_default(),
        defeated_rivals: raw.defeated_rivals.unwrap_or_default(),
        uni_smitty_unlocks: raw.uni_smitty_unlocks.unwrap_or_default(),
        mod_forms_unlocked: raw.mod_forms_unlocked.unwrap_or_default(),
        game_version: raw.game_version.unwrap_or_default(),
        timestamp: raw.timestamp.unwrap_or_default(),
        extra: raw.extra,
    }
}
