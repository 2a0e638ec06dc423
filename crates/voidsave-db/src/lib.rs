//! voidsave-db - Durable storage backends
//!
//! Two implementations of the [`voidsave_core::Storage`] seam:
//! - [`FileStorage`]: one file per key in a directory, with a backup copy of
//!   the previous write
//! - [`NativeDbStorage`]: blobs in an embedded `native_db` database, on disk
//!   or in memory

mod error;
mod file;
mod models;
mod native;

pub use error::{Error, Result};
pub use file::FileStorage;
pub use native::NativeDbStorage;
