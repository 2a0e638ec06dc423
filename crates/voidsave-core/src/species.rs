//! Species classification seam
//!
//! The engine needs a little game knowledge when it builds a new account or
//! re-buckets legendary statistics. That knowledge comes from a catalog
//! injected by the host.

use crate::bitfield::Bitfield;
use crate::dex::SpeciesId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rarity bucket used by the aggregate statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpeciesClass {
    #[default]
    Regular,
    SubLegendary,
    Legendary,
    Mythical,
}

/// Read-only species knowledge
pub trait SpeciesCatalog: Send + Sync {
    /// Every species a fresh account has a dex entry for, ascending
    fn species_ids(&self) -> Vec<SpeciesId>;

    fn classify(&self, id: SpeciesId) -> SpeciesClass;

    /// True for species that own a starter entry
    fn is_starter(&self, id: SpeciesId) -> bool;

    /// Nature bitfield a fresh dex entry starts with
    fn default_nature_attr(&self, id: SpeciesId) -> Bitfield;
}

/// One species row of a catalog file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesInfo {
    pub id: SpeciesId,
    #[serde(default)]
    pub class: SpeciesClass,
    #[serde(default)]
    pub starter: bool,
    #[serde(default)]
    pub nature_attr: u64,
}

impl SpeciesInfo {
    pub fn new(id: SpeciesId, class: SpeciesClass, starter: bool) -> Self {
        Self {
            id,
            class,
            starter,
            nature_attr: 0,
        }
    }
}

/// A catalog held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    species: BTreeMap<SpeciesId, SpeciesInfo>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from rows; later rows replace earlier ones with the same id
    pub fn from_species(rows: impl IntoIterator<Item = SpeciesInfo>) -> Self {
        let mut catalog = Self::new();
        for row in rows {
            catalog.insert(row);
        }
        catalog
    }

    /// Insert a row, returning the one it replaced
    pub fn insert(&mut self, info: SpeciesInfo) -> Option<SpeciesInfo> {
        self.species.insert(info.id, info)
    }

    pub fn get(&self, id: SpeciesId) -> Option<&SpeciesInfo> {
        self.species.get(&id)
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}

impl SpeciesCatalog for StaticCatalog {
    fn species_ids(&self) -> Vec<SpeciesId> {
        self.species.keys().copied().collect()
    }

    fn classify(&self, id: SpeciesId) -> SpeciesClass {
        self.species.get(&id).map(|s| s.class).unwrap_or_default()
    }

    fn is_starter(&self, id: SpeciesId) -> bool {
        self.species.get(&id).is_some_and(|s| s.starter)
    }

    fn default_nature_attr(&self, id: SpeciesId) -> Bitfield {
        self.species
            .get(&id)
            .map(|s| Bitfield::from_u64(s.nature_attr))
            .unwrap_or_default()
    }
}
