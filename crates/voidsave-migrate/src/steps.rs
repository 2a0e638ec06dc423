//! Ordered migration steps
//!
//! Each step is a pure rewrite of a [`RawProfile`] guarded by a precondition
//! that is false once the step's work is done, so re-running the whole chain
//! on current data changes nothing.

use crate::raw::{RawDexEntry, RawProfile, RawStarterEntry};
use std::collections::BTreeMap;
use voidsave_core::dex::IV_COUNT;
use voidsave_core::profile::EGG_TIERS;
use voidsave_core::stats::{
    LEGENDARY_CAUGHT, LEGENDARY_HATCHED, LEGENDARY_SEEN, MYTHICAL_CAUGHT, MYTHICAL_SEEN,
    SUB_LEGENDARY_CAUGHT, SUB_LEGENDARY_HATCHED, SUB_LEGENDARY_SEEN,
};
use voidsave_core::{
    AbilityAttr, Bitfield, DexAttr, GameStats, QuestStore, SpeciesCatalog, SpeciesClass, SpeciesId,
};

/// One idempotent schema transform
pub(crate) trait MigrationStep: Send + Sync {
    fn name(&self) -> &'static str;

    /// True when the record still has work for this step
    fn applies(&self, raw: &RawProfile, catalog: &dyn SpeciesCatalog) -> bool;

    /// Rewrite the record, returning how many entries or fields changed
    fn apply(&self, raw: &mut RawProfile, catalog: &dyn SpeciesCatalog) -> usize;
}

/// The fixed step order
pub(crate) fn default_steps() -> Vec<Box<dyn MigrationStep>> {
    vec![
        Box::new(FoldLegacyStarterTables),
        Box::new(StarterAbilityBackfill),
        Box::new(AbilityFromVariant),
        Box::new(StatRebucket),
        Box::new(PopulateDefaults),
    ]
}

fn caught_attr(raw: &RawProfile, species: SpeciesId) -> Option<&Bitfield> {
    raw.dex.get(&species).and_then(|e| e.caught_attr.as_ref())
}

/// Build starter entries for a record that predates `starterData`
///
/// Starters are seeded from the catalog plus every species the legacy tables
/// mention, the tables are folded in, and candy is credited from dex history
/// once: one per catch, two per hatch, four for a caught shiny.
pub(crate) struct FoldLegacyStarterTables;

impl MigrationStep for FoldLegacyStarterTables {
    fn name(&self) -> &'static str {
        "fold-legacy-starter-tables"
    }

    fn applies(&self, raw: &RawProfile, _catalog: &dyn SpeciesCatalog) -> bool {
        raw.starters.is_none()
    }

    fn apply(&self, raw: &mut RawProfile, catalog: &dyn SpeciesCatalog) -> usize {
        let tables = std::mem::take(&mut raw.legacy_tables);
        let mut ids: Vec<SpeciesId> = catalog
            .species_ids()
            .into_iter()
            .filter(|id| catalog.is_starter(*id))
            .collect();
        ids.extend(tables.species());
        ids.sort_unstable();
        ids.dedup();

        let mut starters = BTreeMap::new();
        for id in ids {
            let mut entry = RawStarterEntry {
                moveset: tables.movesets.get(&id).cloned(),
                egg_moves: tables.egg_moves.get(&id).copied(),
                obtained_fusions: tables.obtained_fusions.get(&id).cloned(),
                fusion_movesets: tables.fusion_movesets.get(&id).cloned(),
                ..Default::default()
            };
            if let Some(dex) = raw.dex.get(&id) {
                let mut candy = dex.caught_count.unwrap_or(0);
                candy = candy.saturating_add(dex.hatched_count.unwrap_or(0).saturating_mul(2));
                if dex
                    .caught_attr
                    .as_ref()
                    .is_some_and(|c| c.intersects(DexAttr::SHINY))
                {
                    candy = candy.saturating_add(4);
                }
                entry.candy_count = Some(candy);
            }
            starters.insert(id, entry);
        }
        let created = starters.len();
        raw.starters = Some(starters);
        created
    }
}

/// A caught species owns at least its first ability
pub(crate) struct StarterAbilityBackfill;

impl StarterAbilityBackfill {
    fn pending(raw: &RawProfile) -> Vec<SpeciesId> {
        let Some(starters) = &raw.starters else {
            return Vec::new();
        };
        starters
            .iter()
            .filter(|(id, entry)| {
                entry.ability_attr == Some(0)
                    && caught_attr(raw, **id).is_some_and(|c| !c.is_empty())
            })
            .map(|(id, _)| *id)
            .collect()
    }
}

impl MigrationStep for StarterAbilityBackfill {
    fn name(&self) -> &'static str {
        "starter-ability-backfill"
    }

    fn applies(&self, raw: &RawProfile, _catalog: &dyn SpeciesCatalog) -> bool {
        !Self::pending(raw).is_empty()
    }

    fn apply(&self, raw: &mut RawProfile, _catalog: &dyn SpeciesCatalog) -> usize {
        let pending = Self::pending(raw);
        if let Some(starters) = raw.starters.as_mut() {
            for id in &pending {
                if let Some(entry) = starters.get_mut(id) {
                    entry.ability_attr = Some(AbilityAttr::ABILITY_1);
                }
            }
        }
        pending.len()
    }
}

/// Move ability ownership out of the dex variant bits
///
/// Old writers had no ability field and flagged abilities with the variant
/// tier bits of `caughtAttr`. The bits are decomposed into `abilityAttr`, then
/// the second and third tier bits are cleared and the default tier is set.
/// Entries that already carry an ability field are never touched.
pub(crate) struct AbilityFromVariant;

impl AbilityFromVariant {
    fn pending(raw: &RawProfile) -> Vec<SpeciesId> {
        raw.starters
            .as_ref()
            .map(|s| {
                s.iter()
                    .filter(|(_, e)| e.ability_attr.is_none())
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl MigrationStep for AbilityFromVariant {
    fn name(&self) -> &'static str {
        "ability-from-variant"
    }

    fn applies(&self, raw: &RawProfile, _catalog: &dyn SpeciesCatalog) -> bool {
        !Self::pending(raw).is_empty()
    }

    fn apply(&self, raw: &mut RawProfile, _catalog: &dyn SpeciesCatalog) -> usize {
        let pending = Self::pending(raw);
        for id in &pending {
            let mut ability = 0;
            if let Some(caught) = raw.dex.get_mut(id).and_then(|e| e.caught_attr.as_mut()) {
                if !caught.is_empty() {
                    // the default tier ends up set, and it maps to the first ability
                    ability = AbilityAttr::ABILITY_1;
                    if caught.intersects(DexAttr::VARIANT_2) {
                        ability |= AbilityAttr::ABILITY_2;
                    }
                    if caught.intersects(DexAttr::VARIANT_3) {
                        ability |= AbilityAttr::ABILITY_HIDDEN;
                    }
                    caught.insert(DexAttr::DEFAULT_VARIANT);
                    caught.remove(DexAttr::VARIANT_2 | DexAttr::VARIANT_3);
                }
            }
            if let Some(entry) = raw.starters.as_mut().and_then(|s| s.get_mut(id)) {
                entry.ability_attr = Some(ability);
            }
        }
        pending.len()
    }
}

/// Split the legendary counters into legendary and sub-legendary
///
/// Sub-legendary counts are replayed from the dex through the catalog and
/// moved out of the legendary bucket, so the two buckets together never hold
/// less than the old aggregate.
pub(crate) struct StatRebucket;

impl MigrationStep for StatRebucket {
    fn name(&self) -> &'static str {
        "stat-rebucket"
    }

    fn applies(&self, raw: &RawProfile, _catalog: &dyn SpeciesCatalog) -> bool {
        raw.stats
            .as_ref()
            .is_some_and(|s| s.has(LEGENDARY_CAUGHT) && !s.has(SUB_LEGENDARY_CAUGHT))
    }

    fn apply(&self, raw: &mut RawProfile, catalog: &dyn SpeciesCatalog) -> usize {
        let (mut seen, mut caught, mut hatched) = (0u64, 0u64, 0u64);
        for (id, entry) in &raw.dex {
            if catalog.classify(*id) == SpeciesClass::SubLegendary {
                seen += u64::from(entry.seen_count.unwrap_or(0));
                caught += u64::from(entry.caught_count.unwrap_or(0));
                hatched += u64::from(entry.hatched_count.unwrap_or(0));
            }
        }
        let Some(stats) = raw.stats.as_mut() else {
            return 0;
        };
        rebucket(stats, seen, caught, hatched);
        6
    }
}

fn rebucket(stats: &mut GameStats, seen: u64, caught: u64, hatched: u64) {
    for (sub, legendary, amount) in [
        (SUB_LEGENDARY_SEEN, LEGENDARY_SEEN, seen),
        (SUB_LEGENDARY_CAUGHT, LEGENDARY_CAUGHT, caught),
        (SUB_LEGENDARY_HATCHED, LEGENDARY_HATCHED, hatched),
    ] {
        stats.set(sub, amount);
        stats.set(legendary, stats.get(legendary).saturating_sub(amount));
    }
    for (seen_key, caught_key) in [
        (SUB_LEGENDARY_SEEN, SUB_LEGENDARY_CAUGHT),
        (LEGENDARY_SEEN, LEGENDARY_CAUGHT),
        (MYTHICAL_SEEN, MYTHICAL_CAUGHT),
    ] {
        let floor = stats.get(caught_key);
        stats.raise_to(seen_key, floor);
    }
}

/// Populate every absent field with its documented default
///
/// Runs last. Present values are never replaced.
pub(crate) struct PopulateDefaults;

impl RawDexEntry {
    fn is_complete(&self) -> bool {
        self.seen_attr.is_some()
            && self.caught_attr.is_some()
            && self.nature_attr.is_some()
            && self.seen_count.is_some()
            && self.caught_count.is_some()
            && self.hatched_count.is_some()
            && self.ivs.is_some()
    }

    fn fill(&mut self, default_nature: Bitfield) -> usize {
        let mut filled = 0;
        fill(&mut self.seen_attr, Bitfield::new, &mut filled);
        fill(&mut self.caught_attr, Bitfield::new, &mut filled);
        fill(&mut self.seen_count, || 0, &mut filled);
        fill(&mut self.caught_count, || 0, &mut filled);
        fill(&mut self.hatched_count, || 0, &mut filled);
        fill(&mut self.ivs, || vec![0; IV_COUNT], &mut filled);
        let caught = self.caught_attr.as_ref().is_some_and(|c| !c.is_empty());
        let nature_missing = match &self.nature_attr {
            None => true,
            Some(n) => caught && n.is_empty() && !default_nature.is_empty(),
        };
        if nature_missing {
            self.nature_attr = Some(default_nature);
            filled += 1;
        }
        filled
    }
}

impl RawStarterEntry {
    fn is_complete(&self) -> bool {
        self.egg_moves.is_some()
            && self.candy_count.is_some()
            && self.friendship.is_some()
            && self.ability_attr.is_some()
            && self.passive_attr.is_some()
            && self.value_reduction.is_some()
            && self.classic_win_count.is_some()
            && self.obtained_fusions.is_some()
            && self.fusion_movesets.is_some()
    }

    /// `caught` seeds a missing ability field the way the backfill would
    fn fill(&mut self, caught: bool) -> usize {
        let mut filled = 0;
        let ability = if caught { AbilityAttr::ABILITY_1 } else { 0 };
        fill(&mut self.egg_moves, || 0, &mut filled);
        fill(&mut self.candy_count, || 0, &mut filled);
        fill(&mut self.friendship, || 0, &mut filled);
        fill(&mut self.ability_attr, || ability, &mut filled);
        fill(&mut self.passive_attr, || 0, &mut filled);
        fill(&mut self.value_reduction, || 0, &mut filled);
        fill(&mut self.classic_win_count, || 0, &mut filled);
        fill(&mut self.obtained_fusions, Vec::new, &mut filled);
        fill(&mut self.fusion_movesets, Vec::new, &mut filled);
        filled
    }
}

fn fill<T>(slot: &mut Option<T>, default: impl FnOnce() -> T, filled: &mut usize) {
    if slot.is_none() {
        *slot = Some(default());
        *filled += 1;
    }
}

impl PopulateDefaults {
    fn catalog_gap(raw: &RawProfile, catalog: &dyn SpeciesCatalog) -> bool {
        let starters = raw.starters.as_ref();
        catalog.species_ids().into_iter().any(|id| {
            !raw.dex.contains_key(&id)
                || (catalog.is_starter(id) && !starters.is_some_and(|s| s.contains_key(&id)))
        }) || starters.is_some_and(|s| s.keys().any(|id| !raw.dex.contains_key(id)))
    }

    fn nature_gap(raw: &RawProfile, catalog: &dyn SpeciesCatalog) -> bool {
        raw.dex.iter().any(|(id, e)| {
            e.caught_attr.as_ref().is_some_and(|c| !c.is_empty())
                && e.nature_attr.as_ref().is_some_and(|n| n.is_empty())
                && !catalog.default_nature_attr(*id).is_empty()
        })
    }
}

impl MigrationStep for PopulateDefaults {
    fn name(&self) -> &'static str {
        "populate-defaults"
    }

    fn applies(&self, raw: &RawProfile, catalog: &dyn SpeciesCatalog) -> bool {
        let scalars_missing = raw.trainer_id.is_none()
            || raw.secret_id.is_none()
            || raw.gender.is_none()
            || raw.unlocks.is_none()
            || raw.achv_unlocks.is_none()
            || raw.voucher_unlocks.is_none()
            || raw.voucher_counts.is_none()
            || raw.eggs.is_none()
            || raw.egg_pity.is_none()
            || raw.unlock_pity.is_none()
            || raw.perma_money.is_none()
            || raw.perma_modifiers.is_none()
            || raw.quests.is_none()
            || raw.defeated_rivals.is_none()
            || raw.uni_smitty_unlocks.is_none()
            || raw.mod_forms_unlocked.is_none()
            || raw.game_version.is_none()
            || raw.timestamp.is_none();
        let mut stats_missing = raw.stats.is_none();
        if let Some(stats) = &raw.stats {
            stats_missing = stats.clone().fill_defaults() > 0;
        }
        scalars_missing
            || stats_missing
            || raw.starters.is_none()
            || raw.dex.values().any(|e| !e.is_complete())
            || raw
                .starters
                .as_ref()
                .is_some_and(|s| s.values().any(|e| !e.is_complete()))
            || Self::catalog_gap(raw, catalog)
            || Self::nature_gap(raw, catalog)
    }

    fn apply(&self, raw: &mut RawProfile, catalog: &dyn SpeciesCatalog) -> usize {
        let mut filled = 0;
        fill(&mut raw.trainer_id, || 0, &mut filled);
        fill(&mut raw.secret_id, || 0, &mut filled);
        fill(&mut raw.gender, || 0, &mut filled);
        fill(&mut raw.unlocks, BTreeMap::new, &mut filled);
        fill(&mut raw.achv_unlocks, BTreeMap::new, &mut filled);
        fill(&mut raw.voucher_unlocks, BTreeMap::new, &mut filled);
        fill(&mut raw.voucher_counts, BTreeMap::new, &mut filled);
        fill(&mut raw.eggs, Vec::new, &mut filled);
        fill(&mut raw.egg_pity, || vec![0; EGG_TIERS], &mut filled);
        fill(&mut raw.unlock_pity, || vec![0; EGG_TIERS], &mut filled);
        fill(&mut raw.perma_money, || 0, &mut filled);
        fill(&mut raw.perma_modifiers, Vec::new, &mut filled);
        fill(&mut raw.quests, QuestStore::new, &mut filled);
        fill(&mut raw.defeated_rivals, Vec::new, &mut filled);
        fill(&mut raw.uni_smitty_unlocks, Vec::new, &mut filled);
        fill(&mut raw.mod_forms_unlocked, Vec::new, &mut filled);
        fill(&mut raw.game_version, String::new, &mut filled);
        fill(&mut raw.timestamp, || 0, &mut filled);
        fill(&mut raw.stats, GameStats::default, &mut filled);
        if let Some(stats) = raw.stats.as_mut() {
            filled += stats.fill_defaults();
        }

        for id in catalog.species_ids() {
            if !raw.dex.contains_key(&id) {
                raw.dex.insert(id, RawDexEntry::default());
                filled += 1;
            }
        }
        let starters = raw.starters.get_or_insert_with(BTreeMap::new);
        for id in catalog.species_ids() {
            if catalog.is_starter(id) && !starters.contains_key(&id) {
                starters.insert(id, RawStarterEntry::default());
                filled += 1;
            }
        }
        for id in starters.keys() {
            if !raw.dex.contains_key(id) {
                raw.dex.insert(*id, RawDexEntry::default());
                filled += 1;
            }
        }
        for (id, entry) in starters.iter_mut() {
            let caught = raw
                .dex
                .get(id)
                .and_then(|e| e.caught_attr.as_ref())
                .is_some_and(|c| !c.is_empty());
            filled += entry.fill(caught);
        }
        for (id, entry) in raw.dex.iter_mut() {
            filled += entry.fill(catalog.default_nature_attr(*id));
        }
        filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voidsave_core::{SpeciesInfo, StaticCatalog};

    fn catalog() -> StaticCatalog {
        StaticCatalog::from_species([
            SpeciesInfo::new(1, SpeciesClass::Regular, true),
            SpeciesInfo::new(144, SpeciesClass::SubLegendary, false),
            SpeciesInfo::new(150, SpeciesClass::Legendary, false),
        ])
    }

    fn dex(caught: u64, seen_count: u32, caught_count: u32, hatched: u32) -> RawDexEntry {
        RawDexEntry {
            caught_attr: Some(Bitfield::from_u64(caught)),
            seen_attr: Some(Bitfield::from_u64(caught)),
            seen_count: Some(seen_count),
            caught_count: Some(caught_count),
            hatched_count: Some(hatched),
            ..Default::default()
        }
    }

    #[test]
    fn test_legacy_fold_credits_candy_once() {
        let mut raw = RawProfile::default();
        raw.dex
            .insert(1, dex(DexAttr::SHINY | DexAttr::NON_SHINY, 5, 3, 2));
        raw.legacy_tables.egg_moves.insert(1, 0b101);
        raw.legacy_tables.obtained_fusions.insert(7, vec![1]);

        let step = FoldLegacyStarterTables;
        assert!(step.applies(&raw, &catalog()));
        step.apply(&mut raw, &catalog());
        let starters = raw.starters.as_ref().unwrap();
        // 3 caught + 2 * 2 hatched + 4 shiny
        assert_eq!(starters[&1].candy_count, Some(11));
        assert_eq!(starters[&1].egg_moves, Some(0b101));
        assert_eq!(starters[&7].obtained_fusions, Some(vec![1]));
        assert!(raw.legacy_tables.is_empty());
        assert!(!step.applies(&raw, &catalog()));
    }

    #[test]
    fn test_backfill_only_zero_ability() {
        let mut raw = RawProfile::default();
        raw.dex.insert(1, dex(DexAttr::NON_SHINY, 1, 1, 0));
        raw.dex.insert(4, dex(DexAttr::NON_SHINY, 1, 1, 0));
        raw.dex.insert(7, dex(0, 1, 0, 0));
        let mut starters = BTreeMap::new();
        for id in [1, 4, 7] {
            starters.insert(
                id,
                RawStarterEntry {
                    ability_attr: Some(if id == 4 { 2 } else { 0 }),
                    ..Default::default()
                },
            );
        }
        raw.starters = Some(starters);

        let step = StarterAbilityBackfill;
        assert_eq!(step.apply(&mut raw, &catalog()), 1);
        let starters = raw.starters.as_ref().unwrap();
        assert_eq!(starters[&1].ability_attr, Some(AbilityAttr::ABILITY_1));
        assert_eq!(starters[&4].ability_attr, Some(2));
        assert_eq!(starters[&7].ability_attr, Some(0));
        assert!(!step.applies(&raw, &catalog()));
    }

    #[test]
    fn test_ability_from_variant_decomposes_bits() {
        let mut raw = RawProfile::default();
        let old = DexAttr::NON_SHINY | DexAttr::MALE | DexAttr::VARIANT_2 | DexAttr::VARIANT_3;
        raw.dex.insert(1, dex(old, 1, 1, 0));
        let mut starters = BTreeMap::new();
        starters.insert(1, RawStarterEntry::default());
        starters.insert(2, RawStarterEntry::default());
        raw.starters = Some(starters);

        let step = AbilityFromVariant;
        assert!(step.applies(&raw, &catalog()));
        step.apply(&mut raw, &catalog());

        let caught = raw.dex[&1].caught_attr.clone().unwrap();
        assert!(caught.intersects(DexAttr::DEFAULT_VARIANT));
        assert!(!caught.intersects(DexAttr::VARIANT_2 | DexAttr::VARIANT_3));
        assert!(caught.intersects(DexAttr::MALE));
        let starters = raw.starters.as_ref().unwrap();
        assert_eq!(
            starters[&1].ability_attr,
            Some(AbilityAttr::ABILITY_1 | AbilityAttr::ABILITY_2 | AbilityAttr::ABILITY_HIDDEN)
        );
        // never caught, nothing to decompose
        assert_eq!(starters[&2].ability_attr, Some(0));
        assert!(!step.applies(&raw, &catalog()));
    }

    #[test]
    fn test_rebucket_moves_sub_legendaries() {
        let mut raw = RawProfile::default();
        raw.dex.insert(144, dex(1, 4, 2, 1));
        raw.dex.insert(150, dex(1, 3, 1, 0));
        let mut stats = GameStats::default();
        stats.set(LEGENDARY_SEEN, 7);
        stats.set(LEGENDARY_CAUGHT, 3);
        stats.set(LEGENDARY_HATCHED, 0);
        raw.stats = Some(stats);

        let step = StatRebucket;
        assert!(step.applies(&raw, &catalog()));
        step.apply(&mut raw, &catalog());
        let stats = raw.stats.as_ref().unwrap();
        assert_eq!(stats.get(SUB_LEGENDARY_SEEN), 4);
        assert_eq!(stats.get(SUB_LEGENDARY_CAUGHT), 2);
        assert_eq!(stats.get(SUB_LEGENDARY_HATCHED), 1);
        assert_eq!(stats.get(LEGENDARY_SEEN), 3);
        assert_eq!(stats.get(LEGENDARY_CAUGHT), 1);
        assert_eq!(stats.get(LEGENDARY_HATCHED), 0);
        assert!(!step.applies(&raw, &catalog()));
    }

    #[test]
    fn test_defaults_never_overwrite() {
        let mut raw = RawProfile {
            perma_money: Some(42),
            ..Default::default()
        };
        raw.dex.insert(1, dex(DexAttr::NON_SHINY, 2, 1, 0));
        let mut starters = BTreeMap::new();
        starters.insert(
            1,
            RawStarterEntry {
                candy_count: Some(9),
                ..Default::default()
            },
        );
        raw.starters = Some(starters);

        let step = PopulateDefaults;
        assert!(step.applies(&raw, &catalog()));
        step.apply(&mut raw, &catalog());
        assert_eq!(raw.perma_money, Some(42));
        let starter = &raw.starters.as_ref().unwrap()[&1];
        assert_eq!(starter.candy_count, Some(9));
        assert_eq!(starter.obtained_fusions, Some(vec![]));
        assert_eq!(raw.dex[&1].seen_count, Some(2));
        assert!(raw.dex.contains_key(&150));
        assert!(!step.applies(&raw, &catalog()));
    }
}
