//! Per-species starter progression

use crate::dex::SpeciesId;
use crate::value::{ToValue, Value, ValueMap};
use std::collections::BTreeMap;

/// Move identifier
pub type MoveId = u32;

/// Ability unlock bits
pub struct AbilityAttr;

impl AbilityAttr {
    pub const ABILITY_1: u32 = 1;
    pub const ABILITY_2: u32 = 2;
    pub const ABILITY_HIDDEN: u32 = 4;
}

/// Passive unlock bits
pub struct PassiveAttr;

impl PassiveAttr {
    pub const UNLOCKED: u32 = 1;
    pub const ENABLED: u32 = 2;
}

/// A saved starting moveset, either one list or one list per form index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StarterMoveset {
    Moves(Vec<MoveId>),
    PerForm(BTreeMap<u32, Vec<MoveId>>),
}

impl ToValue for StarterMoveset {
    fn to_value(&self) -> Value {
        match self {
            StarterMoveset::Moves(moves) => moves.clone().into(),
            StarterMoveset::PerForm(forms) => Value::Map(
                forms
                    .iter()
                    .map(|(form, moves)| (form.to_string(), moves.clone().into()))
                    .collect(),
            ),
        }
    }
}

/// Progression owned by a starter species
///
/// Created the first time the species is referenced. Entries are never
/// removed and their counters only grow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StarterEntry {
    pub moveset: Option<StarterMoveset>,
    pub egg_moves: u32,
    pub candy_count: u32,
    pub friendship: u32,
    pub ability_attr: u32,
    pub passive_attr: u32,
    pub value_reduction: u32,
    pub classic_win_count: u32,
    pub obtained_fusions: Vec<SpeciesId>,
    pub fusion_movesets: Vec<StarterMoveset>,
}

impl StarterEntry {
    /// Add candy, saturating
    pub fn add_candy(&mut self, amount: u32) {
        self.candy_count = self.candy_count.saturating_add(amount);
    }

    /// Remember a fusion partner; returns false when it was already known
    pub fn record_fusion(&mut self, partner: SpeciesId) -> bool {
        if self.obtained_fusions.contains(&partner) {
            return false;
        }
        self.obtained_fusions.push(partner);
        true
    }

    /// True when the given ability bit is unlocked
    pub fn has_ability(&self, bit: u32) -> bool {
        self.ability_attr & bit != 0
    }
}

impl ToValue for StarterEntry {
    fn to_value(&self) -> Value {
        let mut map = ValueMap::new();
        map.insert("moveset".into(), self.moveset.to_value());
        map.insert("eggMoves".into(), self.egg_moves.into());
        map.insert("candyCount".into(), self.candy_count.into());
        map.insert("friendship".into(), self.friendship.into());
        map.insert("abilityAttr".into(), self.ability_attr.into());
        map.insert("passiveAttr".into(), self.passive_attr.into());
        map.insert("valueReduction".into(), self.value_reduction.into());
        map.insert("classicWinCount".into(), self.classic_win_count.into());
        map.insert(
            "obtainedFusions".into(),
            self.obtained_fusions.clone().into(),
        );
        map.insert("fusionMovesets".into(), self.fusion_movesets.to_value());
        Value::Map(map)
    }
}

/// Species id → starter entry
pub type StarterRoster = BTreeMap<SpeciesId, StarterEntry>;

impl ToValue for StarterRoster {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(id, entry)| (id.to_string(), entry.to_value()))
                .collect(),
        )
    }
}
