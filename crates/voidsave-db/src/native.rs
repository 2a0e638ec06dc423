//! Embedded database backend.

use crate::error::{Error, Result};
use crate::models::StoredBlob;
use log::debug;
use native_db::*;
use std::path::Path;
use std::sync::LazyLock;
use voidsave_core::{Storage, StorageError, StorageOp};

// Static models for the database
static MODELS: LazyLock<std::result::Result<Models, String>> = LazyLock::new(|| {
    let mut models = Models::new();
    models
        .define::<StoredBlob>()
        .map_err(|e| e.to_string())?;
    Ok(models)
});

fn models() -> Result<&'static Models> {
    MODELS.as_ref().map_err(|e| Error::Database(e.clone()))
}

/// Storage backed by a `native_db` database.
pub struct NativeDbStorage {
    db: Database<'static>,
}

impl NativeDbStorage {
    /// Open or create a database at the given path.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new().create(models()?, path.as_ref())?;
        Ok(Self { db })
    }

    /// Create an in-memory database.
    pub fn create_in_memory() -> Result<Self> {
        let db = Builder::new().create_in_memory(models()?)?;
        Ok(Self { db })
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredBlob> = r.get().primary(key.to_string())?;
        Ok(stored.map(|blob| blob.bytes))
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        rw.upsert(StoredBlob::new(key, bytes))?;
        rw.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let stored: Option<StoredBlob> = rw.get().primary(key.to_string())?;
        if let Some(blob) = stored {
            rw.remove(blob)?;
        }
        rw.commit()?;
        Ok(())
    }

    /// All stored keys, in key order.
    pub fn keys(&self) -> Result<Vec<String>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredBlob>()?;
        let iter = scan.all()?;
        let blobs: std::result::Result<Vec<StoredBlob>, _> = iter.collect();
        let blobs = blobs.map_err(|e| Error::Database(e.to_string()))?;
        Ok(blobs.into_iter().map(|blob| blob.key).collect())
    }
}

impl Storage for NativeDbStorage {
    fn get(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, StorageError> {
        self.load(key)
            .map_err(|e| StorageError::new(StorageOp::Get, key, e))
    }

    fn set(&self, key: &str, bytes: &[u8]) -> std::result::Result<(), StorageError> {
        debug!("db write {} ({} bytes)", key, bytes.len());
        self.store(key, bytes)
            .map_err(|e| StorageError::new(StorageOp::Set, key, e))
    }

    fn delete(&self, key: &str) -> std::result::Result<(), StorageError> {
        self.remove(key)
            .map_err(|e| StorageError::new(StorageOp::Delete, key, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_round_trip() {
        let storage = NativeDbStorage::create_in_memory().unwrap();
        assert_eq!(storage.get("profile").unwrap(), None);

        storage.set("profile", b"{\"trainerId\":1}").unwrap();
        storage.set("session2", b"{}").unwrap();
        assert_eq!(
            storage.get("profile").unwrap(),
            Some(b"{\"trainerId\":1}".to_vec())
        );
        assert_eq!(storage.keys().unwrap(), vec!["profile", "session2"]);

        storage.set("profile", b"{}").unwrap();
        assert_eq!(storage.get("profile").unwrap(), Some(b"{}".to_vec()));
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let storage = NativeDbStorage::create_in_memory().unwrap();
        storage.delete("session4").unwrap();
        storage.set("session4", b"{}").unwrap();
        storage.delete("session4").unwrap();
        assert_eq!(storage.get("session4").unwrap(), None);
    }

    #[test]
    fn test_on_disk_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saves.db");
        {
            let storage = NativeDbStorage::create(&path).unwrap();
            storage.set("runHistory", b"{}").unwrap();
        }
        let storage = NativeDbStorage::create(&path).unwrap();
        assert_eq!(storage.get("runHistory").unwrap(), Some(b"{}".to_vec()));
    }
}
