//! Aggregate play statistics
//!
//! Stats are a flat bag of named counters plus a few named tallies
//! (counter per sub-key). New releases add counters freely, so the record is
//! keyed by name rather than a fixed struct; the names below are the ones
//! every current profile carries.

use crate::value::{ToValue, Value, ValueMap};
use std::collections::BTreeMap;

pub const PLAY_TIME: &str = "playTime";
pub const POKEMON_SEEN: &str = "pokemonSeen";
pub const POKEMON_CAUGHT: &str = "pokemonCaught";
pub const POKEMON_HATCHED: &str = "pokemonHatched";
pub const SUB_LEGENDARY_SEEN: &str = "subLegendaryPokemonSeen";
pub const SUB_LEGENDARY_CAUGHT: &str = "subLegendaryPokemonCaught";
pub const SUB_LEGENDARY_HATCHED: &str = "subLegendaryPokemonHatched";
pub const LEGENDARY_SEEN: &str = "legendaryPokemonSeen";
pub const LEGENDARY_CAUGHT: &str = "legendaryPokemonCaught";
pub const LEGENDARY_HATCHED: &str = "legendaryPokemonHatched";
pub const MYTHICAL_SEEN: &str = "mythicalPokemonSeen";
pub const MYTHICAL_CAUGHT: &str = "mythicalPokemonCaught";
pub const MYTHICAL_HATCHED: &str = "mythicalPokemonHatched";
pub const GLITCH_FORMS_UNLOCKED: &str = "glitchFormsUnlocked";
pub const SMITTY_FORMS_UNLOCKED: &str = "smittyFormsUnlocked";
pub const GLITCH_MODS_UNLOCKED: &str = "glitchModsUnlocked";
pub const QUESTS_COMPLETED: &str = "questsCompleted";
pub const HIGHEST_PERMA_MONEY: &str = "highestPermaMoney";

/// Counters every current profile carries, defaulting to zero
pub const COUNTERS: &[&str] = &[
    PLAY_TIME,
    "battles",
    "classicSessionsPlayed",
    "sessionsWon",
    "ribbonsOwned",
    "dailyRunSessionsPlayed",
    "dailyRunSessionsWon",
    "endlessSessionsPlayed",
    "highestEndlessWave",
    "highestLevel",
    "highestMoney",
    "highestDamage",
    "highestHeal",
    POKEMON_SEEN,
    "pokemonDefeated",
    POKEMON_CAUGHT,
    POKEMON_HATCHED,
    SUB_LEGENDARY_SEEN,
    SUB_LEGENDARY_CAUGHT,
    SUB_LEGENDARY_HATCHED,
    LEGENDARY_SEEN,
    LEGENDARY_CAUGHT,
    LEGENDARY_HATCHED,
    MYTHICAL_SEEN,
    MYTHICAL_CAUGHT,
    MYTHICAL_HATCHED,
    "shinyPokemonSeen",
    "shinyPokemonCaught",
    "shinyPokemonHatched",
    "pokemonFused",
    "trainersDefeated",
    "eggsPulled",
    "rareEggsPulled",
    "epicEggsPulled",
    "legendaryEggsPulled",
    "manaphyEggsPulled",
    "sessionsPlayed",
    HIGHEST_PERMA_MONEY,
    "rivalsDefeated",
    GLITCH_FORMS_UNLOCKED,
    SMITTY_FORMS_UNLOCKED,
    "fusionsCaptured",
    "glitchEvolutions",
    "smittyEvolutions",
    "megaEvolutions",
    "trainerPokemonSnatched",
    "permaItemsBought",
    "glitchFormsDefeated",
    "smittyFormsDefeated",
    "majorBossesDefeated",
    QUESTS_COMPLETED,
    "bountiesCompleted",
    "battlesEscaped",
    "glitchModsCreated",
    "glitchModsUploaded",
    GLITCH_MODS_UNLOCKED,
    "totalEvolutions",
    "reroll",
    "permaReroll",
];

/// Per-key tallies every current profile carries, defaulting to empty
pub const TALLIES: &[&str] = &[
    "modifiersObtained",
    "typeOfDefeated",
    "typeOfMovesUsed",
    "playerKnockoutType",
];

/// Named counters and tallies
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameStats {
    counters: BTreeMap<String, u64>,
    tallies: BTreeMap<String, BTreeMap<String, u64>>,
}

impl GameStats {
    /// Stats with every known counter and tally present and zero
    pub fn zeroed() -> Self {
        let mut stats = Self::default();
        stats.fill_defaults();
        stats
    }

    /// Insert every known counter and tally that is missing
    ///
    /// Returns the number of fields added. Present values are untouched.
    pub fn fill_defaults(&mut self) -> usize {
        let mut added = 0;
        for name in COUNTERS {
            if !self.counters.contains_key(*name) {
                self.counters.insert((*name).to_string(), 0);
                added += 1;
            }
        }
        for name in TALLIES {
            if !self.tallies.contains_key(*name) {
                self.tallies.insert((*name).to_string(), BTreeMap::new());
                added += 1;
            }
        }
        added
    }

    /// True when the counter is stored, even if zero
    pub fn has(&self, name: &str) -> bool {
        self.counters.contains_key(name)
    }

    /// Counter value, zero when absent
    pub fn get(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn set(&mut self, name: &str, value: u64) {
        self.counters.insert(name.to_string(), value);
    }

    pub fn add(&mut self, name: &str, amount: u64) {
        let slot = self.counters.entry(name.to_string()).or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    /// Raise a high-water counter
    pub fn raise_to(&mut self, name: &str, value: u64) {
        let slot = self.counters.entry(name.to_string()).or_insert(0);
        *slot = (*slot).max(value);
    }

    /// Bump one sub-key of a tally
    pub fn tally(&mut self, name: &str, key: &str) {
        let slot = self
            .tallies
            .entry(name.to_string())
            .or_default()
            .entry(key.to_string())
            .or_insert(0);
        *slot = slot.saturating_add(1);
    }

    pub fn tally_of(&self, name: &str) -> Option<&BTreeMap<String, u64>> {
        self.tallies.get(name)
    }

    pub fn set_tally(&mut self, name: &str, tally: BTreeMap<String, u64>) {
        self.tallies.insert(name.to_string(), tally);
    }

    pub fn counters(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counters.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl ToValue for GameStats {
    fn to_value(&self) -> Value {
        let mut map = ValueMap::new();
        for (name, value) in &self.counters {
            map.insert(name.clone(), (*value).into());
        }
        for (name, tally) in &self.tallies {
            let inner: ValueMap = tally
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(*v)))
                .collect();
            map.insert(name.clone(), Value::Map(inner));
        }
        Value::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_defaults_keeps_values() {
        let mut stats = GameStats::default();
        stats.set(LEGENDARY_CAUGHT, 7);
        let added = stats.fill_defaults();
        assert_eq!(added, COUNTERS.len() + TALLIES.len() - 1);
        assert_eq!(stats.get(LEGENDARY_CAUGHT), 7);
        assert!(stats.has(SUB_LEGENDARY_CAUGHT));
        assert_eq!(stats.fill_defaults(), 0);
    }

    #[test]
    fn test_tally() {
        let mut stats = GameStats::zeroed();
        stats.tally("typeOfDefeated", "FIRE");
        stats.tally("typeOfDefeated", "FIRE");
        assert_eq!(stats.tally_of("typeOfDefeated").and_then(|t| t.get("FIRE")), Some(&2));
    }

    #[test]
    fn test_raise_to() {
        let mut stats = GameStats::zeroed();
        stats.raise_to(HIGHEST_PERMA_MONEY, 500);
        stats.raise_to(HIGHEST_PERMA_MONEY, 100);
        assert_eq!(stats.get(HIGHEST_PERMA_MONEY), 500);
    }
}
