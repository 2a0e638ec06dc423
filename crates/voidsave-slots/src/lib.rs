//! voidsave-slots - Durable state of one account
//!
//! [`SlotManager`] owns the profile, five session slots, the run history and
//! the starter preferences, and is the only component that writes them.
//! Reads go through the codec and the migrator; writes are serialized per
//! storage key.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use voidsave_core::{MemoryStorage, SpeciesClass, SpeciesInfo, StaticCatalog};
//! use voidsave_migrate::Migrator;
//! use voidsave_slots::{EngineConfig, SlotManager};
//!
//! let catalog = StaticCatalog::from_species([SpeciesInfo::new(1, SpeciesClass::Regular, true)]);
//! let migrator = Arc::new(Migrator::new(Arc::new(catalog)));
//! let manager = SlotManager::new(MemoryStorage::new(), migrator, EngineConfig::default());
//!
//! // Nothing stored yet: a new account
//! let profile = manager.load_profile().unwrap();
//! assert_eq!(profile.dex.len(), 1);
//! manager.save_profile(&profile).unwrap();
//! assert_eq!(manager.most_recent_slot().unwrap(), None);
//! ```

pub mod config;
pub mod error;
pub mod keys;
mod locks;
pub mod manager;
pub mod slot;

pub use config::{catalog_from_ron_str, load_catalog, Contention, EngineConfig};
pub use error::{ConfigError, Error, Result};
pub use keys::KeySpace;
pub use manager::{SaveAllOutcome, SlotManager};
pub use slot::SlotId;
