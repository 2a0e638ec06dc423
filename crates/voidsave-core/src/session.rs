//! Per-run session record

use crate::modifier::ModifierData;
use crate::value::{ToValue, Value, ValueMap};
use std::collections::BTreeMap;

/// Number of concurrently live run slots
pub const SESSION_SLOTS: usize = 5;

/// Battle discriminant of the wave the run was saved on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BattleType {
    #[default]
    Wild,
    Trainer,
    Clear,
    Other(u32),
}

impl BattleType {
    pub fn code(self) -> u32 {
        match self {
            BattleType::Wild => 0,
            BattleType::Trainer => 1,
            BattleType::Clear => 2,
            BattleType::Other(code) => code,
        }
    }

    pub fn from_code(code: u32) -> Self {
        match code {
            0 => BattleType::Wild,
            1 => BattleType::Trainer,
            2 => BattleType::Clear,
            other => BattleType::Other(other),
        }
    }
}

/// Arena state at save time
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArenaSnapshot {
    pub biome: u32,
    pub weather: Option<Value>,
    pub terrain: Option<Value>,
    pub tags: Vec<Value>,
    pub extra: ValueMap,
}

impl ToValue for ArenaSnapshot {
    fn to_value(&self) -> Value {
        let mut map = ValueMap::new();
        map.insert("biome".into(), self.biome.into());
        map.insert("weather".into(), self.weather.to_value());
        map.insert("terrain".into(), self.terrain.to_value());
        map.insert("tags".into(), Value::List(self.tags.clone()));
        for (key, value) in &self.extra {
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Map(map)
    }
}

pub const SACRIFICE_TOGGLE: &str = "sacrificeToggleOn";
pub const MOVE_USAGE: &str = "moveUsageCount";
pub const SHOP_PREARGS: &str = "preargsForShop";

/// Free-form per-run bag: wave counters, consumed move usage, toggles
///
/// Written at the top level of the session text next to the typed fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunContext(pub ValueMap);

impl RunContext {
    /// A context holding the documented defaults
    pub fn with_defaults() -> Self {
        let mut ctx = Self::default();
        ctx.fill_defaults();
        ctx
    }

    /// Replace absent or null toggles and counters with their defaults
    pub fn fill_defaults(&mut self) {
        for (key, default) in [
            (SACRIFICE_TOGGLE, Value::Bool(false)),
            (MOVE_USAGE, Value::empty_map()),
            (SHOP_PREARGS, Value::empty_map()),
        ] {
            match self.0.get(key) {
                Some(v) if !v.is_null() => {}
                _ => {
                    self.0.insert(key.to_string(), default);
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn sacrifice_toggle_on(&self) -> bool {
        self.0
            .get(SACRIFICE_TOGGLE)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn set_sacrifice_toggle(&mut self, on: bool) {
        self.0.insert(SACRIFICE_TOGGLE.to_string(), on.into());
    }

    /// Uses of a move counted this run
    pub fn move_usage(&self, move_id: u32) -> u64 {
        self.0
            .get(MOVE_USAGE)
            .and_then(|m| m.get(&move_id.to_string()))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    pub fn record_move_usage(&mut self, move_id: u32) {
        let used = self.move_usage(move_id) + 1;
        let counts = self
            .0
            .entry(MOVE_USAGE.to_string())
            .or_insert_with(Value::empty_map);
        if !matches!(counts, Value::Map(_)) {
            *counts = Value::empty_map();
        }
        if let Value::Map(counts) = counts {
            counts.insert(move_id.to_string(), used.into());
        }
    }
}

/// One live run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionRecord {
    pub seed: String,
    /// Seconds played in this run
    pub play_time: u64,
    pub game_mode: u32,
    pub party: Vec<Value>,
    pub enemy_party: Vec<Value>,
    pub modifiers: Vec<ModifierData>,
    pub enemy_modifiers: Vec<ModifierData>,
    pub arena: ArenaSnapshot,
    pub pokeball_counts: BTreeMap<String, u32>,
    pub money: u64,
    pub score: u64,
    pub wave_index: u32,
    pub battle_type: BattleType,
    pub trainer: Option<Value>,
    pub challenges: Vec<Value>,
    pub game_version: String,
    /// Milliseconds since the Unix epoch of the last save
    pub timestamp: i64,
    pub context: RunContext,
}

impl SessionRecord {
    /// True when persisting this run would overwrite a real run with nothing
    ///
    /// With `require_play_time` a run that has not been played yet also
    /// counts as blank.
    pub fn is_blank(&self, require_play_time: bool) -> bool {
        self.party.is_empty() || self.wave_index == 0 || (require_play_time && self.play_time == 0)
    }

    /// Stamp the record with the current wall-clock time
    pub fn touch(&mut self) {
        self.timestamp = chrono::Utc::now().timestamp_millis();
    }
}

impl ToValue for SessionRecord {
    fn to_value(&self) -> Value {
        let mut map = ValueMap::new();
        map.insert("seed".into(), self.seed.as_str().into());
        map.insert("playTime".into(), self.play_time.into());
        map.insert("gameMode".into(), self.game_mode.into());
        map.insert("party".into(), Value::List(self.party.clone()));
        map.insert("enemyParty".into(), Value::List(self.enemy_party.clone()));
        map.insert("modifiers".into(), self.modifiers.to_value());
        map.insert("enemyModifiers".into(), self.enemy_modifiers.to_value());
        map.insert("arena".into(), self.arena.to_value());
        map.insert(
            "pokeballCounts".into(),
            Value::Map(
                self.pokeball_counts
                    .iter()
                    .map(|(k, v)| (k.clone(), (*v).into()))
                    .collect(),
            ),
        );
        map.insert("money".into(), self.money.into());
        map.insert("score".into(), self.score.into());
        map.insert("waveIndex".into(), self.wave_index.into());
        map.insert("battleType".into(), self.battle_type.code().into());
        map.insert("trainer".into(), self.trainer.to_value());
        map.insert("challenges".into(), Value::List(self.challenges.clone()));
        map.insert("gameVersion".into(), self.game_version.as_str().into());
        map.insert("timestamp".into(), self.timestamp.into());
        for (key, value) in &self.context.0 {
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Map(map)
    }
}
