//! Session record reading
//!
//! Sessions have no migration chain of their own, only field defaults: a null
//! party reads as empty, a null trainer as absent, and the run-context
//! toggles fall back to off.

use crate::fields::{at, i64_field, list_field, map_field, present, string_field, u32_field, u64_field};
use crate::raw::read_modifier;
use voidsave_core::{
    codec, ArenaSnapshot, BattleType, CodecError, RunContext, SessionRecord, Value, ValueMap,
};

const KNOWN_KEYS: &[&str] = &[
    "seed",
    "playTime",
    "gameMode",
    "party",
    "enemyParty",
    "modifiers",
    "enemyModifiers",
    "arena",
    "pokeballCounts",
    "money",
    "score",
    "waveIndex",
    "battleType",
    "trainer",
    "challenges",
    "gameVersion",
    "timestamp",
];

/// Decode save text and read a session
pub fn read_session_text(text: &str) -> Result<SessionRecord, CodecError> {
    read_session(codec::decode(text)?)
}

/// Read a decoded session tree
///
/// Fails only when the root is not a map or a roster field holds something
/// other than a list.
pub fn read_session(value: Value) -> Result<SessionRecord, CodecError> {
    read_session_at(value, "$")
}

/// Read a session nested at `path` inside a larger tree
pub fn read_session_at(value: Value, path: &str) -> Result<SessionRecord, CodecError> {
    let got = value.type_name();
    let Value::Map(root) = value else {
        return Err(CodecError::shape(path, "map", got));
    };

    let mut session = SessionRecord {
        seed: seed(&root, path)?,
        play_time: u64_field(&root, "playTime").unwrap_or(0),
        game_mode: u32_field(&root, "gameMode").unwrap_or(0),
        party: roster(&root, "party", path)?,
        enemy_party: roster(&root, "enemyParty", path)?,
        modifiers: modifiers(&root, "modifiers"),
        enemy_modifiers: modifiers(&root, "enemyModifiers"),
        arena: map_field(&root, "arena").map(read_arena).unwrap_or_default(),
        pokeball_counts: map_field(&root, "pokeballCounts")
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_u32().map(|n| (k.clone(), n)))
                    .collect()
            })
            .unwrap_or_default(),
        money: u64_field(&root, "money").unwrap_or(0),
        score: u64_field(&root, "score").unwrap_or(0),
        wave_index: u32_field(&root, "waveIndex").unwrap_or(0),
        battle_type: BattleType::from_code(u32_field(&root, "battleType").unwrap_or(0)),
        trainer: present(&root, "trainer").cloned(),
        challenges: list_field(&root, "challenges")
            .map(<[Value]>::to_vec)
            .unwrap_or_default(),
        game_version: string_field(&root, "gameVersion").unwrap_or_default(),
        timestamp: i64_field(&root, "timestamp").unwrap_or(0),
        context: RunContext::default(),
    };

    for (key, value) in root {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            session.context.insert(key, value);
        }
    }
    session.context.fill_defaults();
    Ok(session)
}

/// Old writers sometimes stored the seed as a number
fn seed(root: &ValueMap, path: &str) -> Result<String, CodecError> {
    match present(root, "seed") {
        None => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Int(n)) => Ok(n.to_string()),
        Some(Value::BigInt(n)) => Ok(n.to_string()),
        Some(other) => Err(CodecError::shape(at(path, "seed"), "string", other.type_name())),
    }
}

fn roster(root: &ValueMap, key: &str, path: &str) -> Result<Vec<Value>, CodecError> {
    match present(root, key) {
        None => Ok(Vec::new()),
        Some(Value::List(items)) => Ok(items.clone()),
        Some(other) => Err(CodecError::shape(at(path, key), "list", other.type_name())),
    }
}

fn modifiers(root: &ValueMap, key: &str) -> Vec<voidsave_core::ModifierData> {
    list_field(root, key)
        .map(|items| items.iter().filter_map(read_modifier).collect())
        .unwrap_or_default()
}

fn read_arena(fields: &ValueMap) -> ArenaSnapshot {
    let mut extra = fields.clone();
    for key in ["biome", "weather", "terrain", "tags"] {
        extra.shift_remove(key);
    }
    ArenaSnapshot {
        biome: u32_field(fields, "biome").unwrap_or(0),
        weather: present(fields, "weather").cloned(),
        terrain: present(fields, "terrain").cloned(),
        tags: list_field(fields, "tags").map(<[Value]>::to_vec).unwrap_or_default(),
        extra,
    }
}
