//! Typed intermediate between a decoded tree and a current profile
//!
//! `RawProfile` keeps every field optional so migration steps can tell "the
//! writer never had this field" apart from "the writer stored zero". Reading
//! the tree only fails when a field that must hold a bitfield holds something
//! else; every other oddity falls back to absence.

use crate::fields::{
    bitfield_field, bool_field, i64_field, list_field, map_field, present, species_keyed,
    string_field, string_list, u32_field, u32_list, u64_field,
};
use log::warn;
use std::collections::BTreeMap;
use voidsave_core::keys;
use voidsave_core::{
    codec, Bitfield, CodecError, GameStats, ModifierData, QuestProgress, QuestState,
    QuestStore, RewardDescriptor, RewardKind, RewardTarget, SpeciesId, StarterMoveset, Value,
    ValueMap,
};

/// Dex entry as found on disk
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawDexEntry {
    pub seen_attr: Option<Bitfield>,
    pub caught_attr: Option<Bitfield>,
    pub nature_attr: Option<Bitfield>,
    pub seen_count: Option<u32>,
    pub caught_count: Option<u32>,
    pub hatched_count: Option<u32>,
    pub ivs: Option<Vec<u32>>,
}

/// Starter entry as found on disk
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawStarterEntry {
    pub moveset: Option<StarterMoveset>,
    pub egg_moves: Option<u32>,
    pub candy_count: Option<u32>,
    pub friendship: Option<u32>,
    /// `None` means the writer predates the dedicated ability field
    pub ability_attr: Option<u32>,
    pub passive_attr: Option<u32>,
    pub value_reduction: Option<u32>,
    pub classic_win_count: Option<u32>,
    pub obtained_fusions: Option<Vec<SpeciesId>>,
    pub fusion_movesets: Option<Vec<StarterMoveset>>,
}

/// Per-table starter data written before starters had their own entries
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LegacyStarterTables {
    pub movesets: BTreeMap<SpeciesId, StarterMoveset>,
    pub egg_moves: BTreeMap<SpeciesId, u32>,
    pub obtained_fusions: BTreeMap<SpeciesId, Vec<SpeciesId>>,
    pub fusion_movesets: BTreeMap<SpeciesId, Vec<StarterMoveset>>,
}

impl LegacyStarterTables {
    pub fn is_empty(&self) -> bool {
        self.movesets.is_empty()
            && self.egg_moves.is_empty()
            && self.obtained_fusions.is_empty()
            && self.fusion_movesets.is_empty()
    }

    /// Every species mentioned by any table
    pub fn species(&self) -> Vec<SpeciesId> {
        let mut ids: Vec<SpeciesId> = self
            .movesets
            .keys()
            .chain(self.egg_moves.keys())
            .chain(self.obtained_fusions.keys())
            .chain(self.fusion_movesets.keys())
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Top-level keys of the legacy starter tables
pub const LEGACY_TABLE_KEYS: [&str; 4] = [
    "starterMoveData",
    "starterEggMoveData",
    "starterObtainedFusionData",
    "starterFusionMovesets",
];

/// Top-level keys read into typed fields; everything else lands in `extra`
const KNOWN_KEYS: &[&str] = &[
    "trainerId",
    "secretId",
    "gender",
    "dexData",
    "starterData",
    "gameStats",
    "unlocks",
    "achvUnlocks",
    "voucherUnlocks",
    "voucherCounts",
    "eggs",
    "gameVersion",
    "timestamp",
    "eggPity",
    "unlockPity",
    "permaMoney",
    "permaModifiers",
    "questUnlockables",
    "defeatedRivals",
    "uniSmittyUnlocks",
    "modFormsUnlocked",
];

/// A decoded profile of any schema revision
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawProfile {
    pub trainer_id: Option<u32>,
    pub secret_id: Option<u32>,
    pub gender: Option<i64>,
    pub dex: BTreeMap<SpeciesId, RawDexEntry>,
    /// `None` when the record has no `starterData` map at all
    pub starters: Option<BTreeMap<SpeciesId, RawStarterEntry>>,
    pub legacy_tables: LegacyStarterTables,
    pub stats: Option<GameStats>,
    pub unlocks: Option<BTreeMap<u32, bool>>,
    pub achv_unlocks: Option<BTreeMap<String, i64>>,
    pub voucher_unlocks: Option<BTreeMap<String, i64>>,
    pub voucher_counts: Option<BTreeMap<String, u32>>,
    pub eggs: Option<Vec<Value>>,
    pub egg_pity: Option<Vec<u32>>,
    pub unlock_pity: Option<Vec<u32>>,
    pub perma_money: Option<u64>,
    pub perma_modifiers: Option<Vec<ModifierData>>,
    pub quests: Option<QuestStore>,
    pub defeated_rivals: Option<Vec<u32>>,
    pub uni_smitty_unlocks: Option<Vec<String>>,
    pub mod_forms_unlocked: Option<Vec<String>>,
    pub game_version: Option<String>,
    pub timestamp: Option<i64>,
    pub extra: ValueMap,
}

impl RawProfile {
    /// Decode save text and read it
    pub fn from_text(text: &str) -> Result<Self, CodecError> {
        Self::from_value(codec::decode(text)?)
    }

    /// Read a decoded tree
    ///
    /// Short keys are expanded first, so both spellings are accepted.
    pub fn from_value(mut value: Value) -> Result<Self, CodecError> {
        keys::expand_profile(&mut value);
        let got = value.type_name();
        let Value::Map(root) = value else {
            return Err(CodecError::shape("$", "map", got));
        };

        let mut raw = RawProfile {
            trainer_id: u32_field(&root, "trainerId"),
            secret_id: u32_field(&root, "secretId"),
            gender: i64_field(&root, "gender"),
            game_version: string_field(&root, "gameVersion"),
            timestamp: i64_field(&root, "timestamp"),
            perma_money: u64_field(&root, "permaMoney"),
            egg_pity: u32_list(&root, "eggPity"),
            unlock_pity: u32_list(&root, "unlockPity"),
            defeated_rivals: u32_list(&root, "defeatedRivals"),
            uni_smitty_unlocks: string_list(&root, "uniSmittyUnlocks"),
            mod_forms_unlocked: string_list(&root, "modFormsUnlocked"),
            eggs: list_field(&root, "eggs").map(<[Value]>::to_vec),
            ..Default::default()
        };

        if let Some(dex) = map_field(&root, "dexData") {
            for (id, entry) in species_keyed(dex) {
                if let Value::Map(fields) = entry {
                    let path = format!("$.dexData.{}", id);
                    raw.dex.insert(id, read_dex_entry(fields, &path)?);
                }
            }
        }

        raw.starters = map_field(&root, "starterData").map(|starters| {
            species_keyed(starters)
                .filter_map(|(id, entry)| entry.as_map().map(|f| (id, read_starter_entry(f))))
                .collect()
        });

        raw.legacy_tables = read_legacy_tables(&root);
        raw.stats = map_field(&root, "gameStats").map(read_stats);
        raw.unlocks = map_field(&root, "unlocks").map(|m| {
            species_keyed(m)
                .filter_map(|(k, v)| v.as_bool().map(|b| (k, b)))
                .collect()
        });
        raw.achv_unlocks = map_field(&root, "achvUnlocks").map(int_map);
        raw.voucher_unlocks = map_field(&root, "voucherUnlocks").map(int_map);
        raw.voucher_counts = map_field(&root, "voucherCounts").map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_u32().map(|n| (k.clone(), n)))
                .collect()
        });
        raw.perma_modifiers = list_field(&root, "permaModifiers")
            .map(|items| items.iter().filter_map(read_modifier).collect());
        raw.quests = map_field(&root, "questUnlockables").map(read_quests);

        for (key, value) in root {
            if !KNOWN_KEYS.contains(&key.as_str()) && !LEGACY_TABLE_KEYS.contains(&key.as_str()) {
                raw.extra.insert(key, value);
            }
        }

        Ok(raw)
    }
}

fn int_map(map: &ValueMap) -> BTreeMap<String, i64> {
    map.iter()
        .filter_map(|(k, v)| v.as_int().map(|n| (k.clone(), n)))
        .collect()
}

fn read_dex_entry(fields: &ValueMap, path: &str) -> Result<RawDexEntry, CodecError> {
    Ok(RawDexEntry {
        seen_attr: bitfield_field(fields, "seenAttr", path)?,
        caught_attr: bitfield_field(fields, "caughtAttr", path)?,
        nature_attr: bitfield_field(fields, "natureAttr", path).unwrap_or(None),
        seen_count: u32_field(fields, "seenCount"),
        caught_count: u32_field(fields, "caughtCount"),
        hatched_count: u32_field(fields, "hatchedCount"),
        ivs: u32_list(fields, "ivs"),
    })
}

fn read_starter_entry(fields: &ValueMap) -> RawStarterEntry {
    RawStarterEntry {
        moveset: present(fields, "moveset").and_then(read_moveset),
        egg_moves: u32_field(fields, "eggMoves"),
        candy_count: u32_field(fields, "candyCount"),
        friendship: u32_field(fields, "friendship"),
        ability_attr: u32_field(fields, "abilityAttr"),
        passive_attr: u32_field(fields, "passiveAttr"),
        value_reduction: u32_field(fields, "valueReduction"),
        classic_win_count: u32_field(fields, "classicWinCount"),
        obtained_fusions: u32_list(fields, "obtainedFusions"),
        fusion_movesets: list_field(fields, "fusionMovesets")
            .map(|items| items.iter().filter_map(read_moveset).collect()),
    }
}

/// A moveset is a list of move ids or a map of form index → list
pub(crate) fn read_moveset(value: &Value) -> Option<StarterMoveset> {
    match value {
        Value::List(items) => Some(StarterMoveset::Moves(
            items.iter().filter_map(Value::as_u32).collect(),
        )),
        Value::Map(forms) => Some(StarterMoveset::PerForm(
            species_keyed(forms)
                .filter_map(|(form, moves)| {
                    moves
                        .as_list()
                        .map(|m| (form, m.iter().filter_map(Value::as_u32).collect()))
                })
                .collect(),
        )),
        _ => None,
    }
}

fn read_legacy_tables(root: &ValueMap) -> LegacyStarterTables {
    let mut tables = LegacyStarterTables::default();
    if let Some(map) = map_field(root, LEGACY_TABLE_KEYS[0]) {
        tables.movesets = species_keyed(map)
            .filter_map(|(id, v)| read_moveset(v).map(|m| (id, m)))
            .collect();
    }
    if let Some(map) = map_field(root, LEGACY_TABLE_KEYS[1]) {
        tables.egg_moves = species_keyed(map)
            .filter_map(|(id, v)| v.as_u32().map(|m| (id, m)))
            .collect();
    }
    if let Some(map) = map_field(root, LEGACY_TABLE_KEYS[2]) {
        tables.obtained_fusions = species_keyed(map)
            .filter_map(|(id, v)| {
                v.as_list()
                    .map(|l| (id, l.iter().filter_map(Value::as_u32).collect()))
            })
            .collect();
    }
    if let Some(map) = map_field(root, LEGACY_TABLE_KEYS[3]) {
        tables.fusion_movesets = species_keyed(map)
            .filter_map(|(id, v)| {
                v.as_list()
                    .map(|l| (id, l.iter().filter_map(read_moveset).collect()))
            })
            .collect();
    }
    tables
}

fn read_stats(map: &ValueMap) -> GameStats {
    let mut stats = GameStats::default();
    for (name, value) in map {
        match value {
            Value::Map(tally) => stats.set_tally(
                name,
                tally
                    .iter()
                    .filter_map(|(k, v)| v.as_u64().map(|n| (k.clone(), n)))
                    .collect(),
            ),
            other => {
                if let Some(n) = other.as_u64() {
                    stats.set(name, n);
                }
            }
        }
    }
    stats
}

/// Read a persisted modifier; entries without a type id are dropped
pub(crate) fn read_modifier(value: &Value) -> Option<ModifierData> {
    let Some(fields) = value.as_map() else {
        warn!("dropping modifier stored as {}", value.type_name());
        return None;
    };
    let Some(type_id) = string_field(fields, "typeId") else {
        warn!(
            "dropping modifier without typeId (className {:?})",
            string_field(fields, "className")
        );
        return None;
    };
    let mut extra = fields.clone();
    for key in [
        "className",
        "typeId",
        "player",
        "stackCount",
        "args",
        "typePregenArgs",
        "consoleCode",
    ] {
        extra.shift_remove(key);
    }
    Some(ModifierData {
        class_name: string_field(fields, "className").unwrap_or_default(),
        type_id,
        player: bool_field(fields, "player").unwrap_or(true),
        stack_count: u32_field(fields, "stackCount").unwrap_or(1),
        args: list_field(fields, "args").map(<[Value]>::to_vec).unwrap_or_default(),
        type_pregen_args: list_field(fields, "typePregenArgs").map(<[Value]>::to_vec),
        console_code: string_field(fields, "consoleCode"),
        extra,
    })
}

/// Read the quest map; entries with an unknown state code are dropped
pub fn read_quests(map: &ValueMap) -> QuestStore {
    let mut store = QuestStore::new();
    for (id, entry) in species_keyed(map) {
        let Some(fields) = entry.as_map() else {
            continue;
        };
        let Some(state) = i64_field(fields, "state").and_then(QuestState::from_code) else {
            continue;
        };
        store.restore(
            id,
            QuestProgress {
                state,
                stage_index: u32_field(fields, "currentStage"),
                progress_count: u32_field(fields, "currentCount"),
                reward: map_field(fields, "questUnlockData").and_then(read_reward),
            },
        );
    }
    store
}

fn read_reward(fields: &ValueMap) -> Option<RewardDescriptor> {
    let kind = RewardKind::from_code(u32_field(fields, "rewardType")?);
    let target = match present(fields, "rewardId")? {
        Value::String(name) => RewardTarget::Name(name.clone()),
        Value::List(items) => RewardTarget::Ids(items.iter().filter_map(Value::as_u32).collect()),
        other => RewardTarget::Id(other.as_u32()?),
    };
    let mut extra = fields.clone();
    for key in ["rewardType", "rewardId", "rewardAmount", "questId", "rewardText"] {
        extra.shift_remove(key);
    }
    Some(RewardDescriptor {
        kind,
        target,
        amount: u64_field(fields, "rewardAmount"),
        quest_id: u32_field(fields, "questId").unwrap_or_default(),
        text: string_field(fields, "rewardText"),
        extra,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_map_root_is_shape_error() {
        let err = RawProfile::from_value(Value::List(vec![])).unwrap_err();
        assert_eq!(err, CodecError::shape("$", "map", "list"));
    }

    #[test]
    fn test_short_keys_expanded() {
        let text = r#"{"dexData":{"1":{"$sa":"3n","$ca":"1n","$s":4,"$c":1}},
                       "starterData":{"1":{"$x":12,"$a":1,"$of":[4]}},"timestamp":9}"#;
        let raw = RawProfile::from_text(text).unwrap();
        let dex = &raw.dex[&1];
        assert_eq!(dex.seen_attr, Some(Bitfield::from_u64(3)));
        assert_eq!(dex.seen_count, Some(4));
        let starter = &raw.starters.as_ref().unwrap()[&1];
        assert_eq!(starter.candy_count, Some(12));
        assert_eq!(starter.obtained_fusions, Some(vec![4]));
        assert_eq!(raw.timestamp, Some(9));
    }

    #[test]
    fn test_bad_bitfield_names_path() {
        let text = r#"{"dexData":{"25":{"caughtAttr":true}}}"#;
        let err = RawProfile::from_text(text).unwrap_err();
        assert_eq!(err, CodecError::shape("$.dexData.25.caughtAttr", "bitfield", "bool"));
    }

    #[test]
    fn test_missing_starter_data_is_none() {
        let raw = RawProfile::from_text(r#"{"dexData":{},"starterMoveData":{"1":[33,45]}}"#)
            .unwrap();
        assert!(raw.starters.is_none());
        assert_eq!(
            raw.legacy_tables.movesets.get(&1),
            Some(&StarterMoveset::Moves(vec![33, 45]))
        );
        assert!(!raw.extra.contains_key("starterMoveData"));
    }

    #[test]
    fn test_unknown_fields_carried() {
        let raw = RawProfile::from_text(r#"{"dexData":{},"smitomTalks":[1,2]}"#).unwrap();
        assert_eq!(
            raw.extra.get("smitomTalks"),
            Some(&Value::List(vec![Value::Int(1), Value::Int(2)]))
        );
    }

    #[test]
    fn test_modifier_without_type_id_dropped() {
        let text = r#"{"permaModifiers":[
            {"className":"MoneyMultiplierModifier","stackCount":2},
            {"className":"ExpBoosterModifier","typeId":"EXP_CHARM","stackCount":3},
            7]}"#;
        let raw = RawProfile::from_text(text).unwrap();
        let modifiers = raw.perma_modifiers.unwrap();
        assert_eq!(modifiers.len(), 1);
        assert_eq!(modifiers[0].type_id, "EXP_CHARM");
        assert_eq!(modifiers[0].stack_count, 3);
    }

    #[test]
    fn test_quests_read() {
        let text = r#"{"questUnlockables":{
            "3":{"state":2,"questUnlockData":{"rewardType":0,"rewardId":25,"questId":3,"questSpriteId":"x"}},
            "4":{"state":1,"currentStage":2,"currentCount":5},
            "5":{"state":9}}}"#;
        let raw = RawProfile::from_text(text).unwrap();
        let quests = raw.quests.unwrap();
        assert_eq!(quests.len(), 2);
        assert!(quests.is_completed_with_reward(25, RewardKind::GlitchFormA));
        assert_eq!(quests.stage_of(4), 2);
        let reward = quests.reward_of(3).unwrap();
        assert_eq!(reward.extra.get("questSpriteId"), Some(&Value::String("x".into())));
    }
}
