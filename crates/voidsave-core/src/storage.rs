//! Storage collaborator seam
//!
//! The engine owns the keys and the bytes; where the bytes land is the
//! collaborator's business. Implementations must not retry on their own
//! behalf and must report every failed call.

use crate::error::{StorageError, StorageOp};
use std::collections::HashMap;
use std::sync::RwLock;

/// Byte store addressed by engine-assigned keys
pub trait Storage: Send + Sync {
    /// Fetch the bytes stored under `key`, `None` when nothing is stored
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store `bytes` under `key`, replacing anything already there
    fn set(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Remove `key`; removing a missing key is not an error
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        (**self).set(key, bytes)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key)
    }
}

/// Process-local storage, used by tests and as a scratch backend
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = match self.entries.read() {
            Ok(entries) => entries.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        };
        keys.sort();
        keys
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StorageError::new(StorageOp::Get, key, e))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::new(StorageOp::Set, key, e))?;
        entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::new(StorageOp::Delete, key, e))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("profile").unwrap(), None);
        storage.set("profile", b"{}").unwrap();
        storage.set("session0", b"{}").unwrap();
        assert_eq!(storage.get("profile").unwrap(), Some(b"{}".to_vec()));
        assert_eq!(storage.keys(), vec!["profile", "session0"]);
        storage.delete("profile").unwrap();
        storage.delete("profile").unwrap();
        assert_eq!(storage.get("profile").unwrap(), None);
    }
}
