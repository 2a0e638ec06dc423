//! voidsave-core: shared types for the voidsave save engine
//!
//! This crate provides:
//! - The dynamic [`Value`] tree every record passes through
//! - [`Bitfield`], an arbitrary-precision flag accumulator
//! - The BigValue [`codec`], a bijection between value trees and save text
//! - Typed records: [`ProfileRecord`], [`SessionRecord`], [`QuestStore`]
//! - The [`Storage`] and [`SpeciesCatalog`] seams the host implements

pub mod bitfield;
pub mod codec;
pub mod dex;
pub mod error;
pub mod keys;
pub mod modifier;
pub mod prefs;
pub mod profile;
pub mod quest;
pub mod session;
pub mod species;
pub mod starter;
pub mod stats;
pub mod storage;
pub mod value;

pub use bitfield::Bitfield;
pub use dex::{DexAttr, DexEntry, SpeciesDex, SpeciesId};
pub use error::{CodecError, Error, QuestError, Result, StorageError, StorageOp};
pub use modifier::ModifierData;
pub use prefs::{StarterAttributes, StarterPreferences};
pub use profile::{PlayerGender, ProfileRecord};
pub use quest::{
    QuestId, QuestProgress, QuestState, QuestStore, QuestTransition, RewardDescriptor, RewardKind,
    RewardTarget,
};
pub use session::{ArenaSnapshot, BattleType, RunContext, SessionRecord, SESSION_SLOTS};
pub use species::{SpeciesCatalog, SpeciesClass, SpeciesInfo, StaticCatalog};
pub use starter::{AbilityAttr, MoveId, PassiveAttr, StarterEntry, StarterMoveset, StarterRoster};
pub use stats::GameStats;
pub use storage::{MemoryStorage, Storage};
pub use value::{ToValue, Value, ValueMap};
