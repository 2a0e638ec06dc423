//! RON configuration: engine settings and the species catalog

use crate::error::{ConfigError, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use voidsave_core::{SpeciesInfo, StaticCatalog};
use voidsave_history::DEFAULT_CAPACITY;

/// What a second write to a key does while the first is still running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Contention {
    /// Wait for the first write to finish
    #[default]
    Queue,
    /// Fail with [`Error::WriteInFlight`]
    Reject,
}

/// Slot manager settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Runs kept in the run history
    pub run_history_capacity: usize,
    /// Account namespace appended to every storage key
    pub key_suffix: Option<String>,
    pub contention: Contention,
    /// Permanent money a new account starts with
    pub default_perma_money: u64,
    /// Treat a session with no play time as blank
    pub require_play_time: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            run_history_capacity: DEFAULT_CAPACITY,
            key_suffix: None,
            contention: Contention::Queue,
            default_perma_money: 10_000,
            require_play_time: false,
        }
    }
}

impl EngineConfig {
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let config = ron::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::from_ron_str(&content)
    }
}

#[derive(Deserialize)]
struct CatalogConfig {
    species: Vec<SpeciesInfo>,
}

/// Parse a species catalog
///
/// ```ron
/// (
///     species: [
///         (id: 1, class: Regular, starter: true),
///         (id: 150, class: Legendary),
///     ],
/// )
/// ```
pub fn catalog_from_ron_str(content: &str) -> Result<StaticCatalog> {
    let file: CatalogConfig = ron::from_str(content).map_err(ConfigError::from)?;
    let mut seen = BTreeSet::new();
    for info in &file.species {
        if !seen.insert(info.id) {
            return Err(Error::Config(ConfigError::DuplicateSpecies(info.id)));
        }
    }
    Ok(StaticCatalog::from_species(file.species))
}

/// Load a species catalog file
pub fn load_catalog(path: impl AsRef<Path>) -> Result<StaticCatalog> {
    let content = fs::read_to_string(path).map_err(ConfigError::from)?;
    catalog_from_ron_str(&content)
}
