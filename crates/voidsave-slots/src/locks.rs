//! One writer per storage key

use crate::config::Contention;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, TryLockError};

/// Write locks for a fixed set of keys
#[derive(Debug)]
pub(crate) struct KeyLocks {
    locks: HashMap<String, Mutex<()>>,
    contention: Contention,
}

impl KeyLocks {
    pub fn new(keys: impl IntoIterator<Item = String>, contention: Contention) -> Self {
        Self {
            locks: keys.into_iter().map(|k| (k, Mutex::new(()))).collect(),
            contention,
        }
    }

    /// Hold the write lock for `key` until the guard drops
    pub fn acquire(&self, key: &str) -> Result<MutexGuard<'_, ()>> {
        let lock = self
            .locks
            .get(key)
            .ok_or_else(|| Error::UnknownKey(key.to_string()))?;
        match self.contention {
            Contention::Queue => lock.lock().map_err(|_| Error::Poisoned(key.to_string())),
            Contention::Reject => match lock.try_lock() {
                Ok(guard) => Ok(guard),
                Err(TryLockError::WouldBlock) => Err(Error::WriteInFlight(key.to_string())),
                Err(TryLockError::Poisoned(_)) => Err(Error::Poisoned(key.to_string())),
            },
        }
    }

    /// Lock several keys in the order given
    pub fn acquire_all<'a>(
        &'a self,
        keys: impl IntoIterator<Item = &'a String>,
    ) -> Result<Vec<MutexGuard<'a, ()>>> {
        keys.into_iter().map(|key| self.acquire(key)).collect()
    }
}
