//! voidsave-migrate: schema migration for voidsave save data
//!
//! Decoded save trees of any revision are read into a typed intermediate
//! ([`RawProfile`]) and pushed through a fixed chain of idempotent steps:
//!
//! 1. fold legacy per-table starter data into starter entries
//! 2. backfill the first ability for caught species
//! 3. move ability ownership out of the dex variant bits
//! 4. split legendary statistics into legendary and sub-legendary
//! 5. populate absent fields with their defaults
//!
//! The chain is only reachable through [`Migrator`]; individual steps are not
//! exported.

mod fields;
pub mod migrator;
pub mod raw;
pub mod session;
mod steps;

pub use migrator::{MigrationReport, Migrator};
pub use raw::{read_quests, LegacyStarterTables, RawDexEntry, RawProfile, RawStarterEntry};
pub use session::{read_session, read_session_at, read_session_text};
