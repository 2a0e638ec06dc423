//! Directory-of-files backend.

use crate::error::{Error, Result};
use log::{debug, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use voidsave_core::{Storage, StorageError, StorageOp};

/// Storage writing `<root>/<key>.sav`
///
/// Before a key is overwritten its current file is copied to
/// `<key>.sav.bak`. Reads fall back to that copy when the primary file is
/// missing, empty, or unreadable.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Use `root` as the save directory, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        check_key(key)?;
        Ok(self.root.join(format!("{key}.sav")))
    }

    fn backup_path(&self, key: &str) -> Result<PathBuf> {
        check_key(key)?;
        Ok(self.root.join(format!("{key}.sav.bak")))
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key)?;
        let backup = self.backup_path(key)?;
        match fs::read(&path) {
            Ok(bytes) if !bytes.is_empty() => Ok(Some(bytes)),
            Ok(_) => {
                warn!("{} is empty, trying backup", path.display());
                read_optional(&backup)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => read_optional(&backup),
            Err(err) => match read_optional(&backup)? {
                Some(bytes) => {
                    warn!("read failed for {}, using backup: {}", path.display(), err);
                    Ok(Some(bytes))
                }
                None => Err(err.into()),
            },
        }
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.path(key)?;
        if path.exists() {
            fs::copy(&path, self.backup_path(key)?)?;
        }
        fs::write(&path, bytes)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        for path in [self.path(key)?, self.backup_path(key)?] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Keys with a primary file, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let is_save = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext == "sav")
                .unwrap_or(false);
            if !is_save {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

fn check_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidKey(key.to_string()))
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) if bytes.is_empty() => Ok(None),
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, StorageError> {
        self.load(key)
            .map_err(|e| StorageError::new(StorageOp::Get, key, e))
    }

    fn set(&self, key: &str, bytes: &[u8]) -> std::result::Result<(), StorageError> {
        debug!("file write {} ({} bytes)", key, bytes.len());
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

    fn storage() -> (tempfile::TempDir, FileStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("saves")).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_write_and_read() {
        let (_dir, storage) = storage();
        assert_eq!(storage.get("profile").unwrap(), None);
        storage.set("profile", b"{}").unwrap();
        assert_eq!(storage.get("profile").unwrap(), Some(b"{}".to_vec()));
        assert!(storage.root().join("profile.sav").exists());
        assert!(!storage.root().join("profile.sav.bak").exists());
    }

    #[test]
    fn test_overwrite_keeps_backup() {
        let (_dir, storage) = storage();
        storage.set("session0", b"first").unwrap();
        storage.set("session0", b"second").unwrap();
        let backup = fs::read(storage.root().join("session0.sav.bak")).unwrap();
        assert_eq!(backup, b"first");
        assert_eq!(storage.get("session0").unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn test_truncated_primary_falls_back() {
        let (_dir, storage) = storage();
        storage.set("profile", b"good").unwrap();
        storage.set("profile", b"newer").unwrap();
        fs::write(storage.root().join("profile.sav"), b"").unwrap();
        assert_eq!(storage.get("profile").unwrap(), Some(b"good".to_vec()));
    }

    #[test]
    fn test_delete_removes_backup() {
        let (_dir, storage) = storage();
        storage.set("session1", b"a").unwrap();
        storage.set("session1", b"b").unwrap();
        storage.delete("session1").unwrap();
        storage.delete("session1").unwrap();
        assert_eq!(storage.get("session1").unwrap(), None);
    }

    #[test]
    fn test_keys_and_invalid_key() {
        let (_dir, storage) = storage();
        storage.set("session3", b"x").unwrap();
        storage.set("profile_alt", b"x").unwrap();
        storage.set("profile_alt", b"y").unwrap();
        assert_eq!(storage.keys().unwrap(), vec!["profile_alt", "session3"]);

        let err = storage.set("../escape", b"x").unwrap_err();
        assert_eq!(err.op, StorageOp::Set);
        assert_eq!(err.key, "../escape");
    }
}
