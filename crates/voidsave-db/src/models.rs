//! Database models for persistent storage.

use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// One stored value, addressed by its engine key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredBlob {
    /// Primary key - storage key (`profile`, `session0`, ...).
    #[primary_key]
    pub key: String,
    /// Encoded save text.
    pub bytes: Vec<u8>,
}

impl StoredBlob {
    pub fn new(key: &str, bytes: &[u8]) -> Self {
        Self {
            key: key.to_string(),
            bytes: bytes.to_vec(),
        }
    }
}
