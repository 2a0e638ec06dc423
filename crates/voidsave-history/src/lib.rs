//! voidsave-history - Bounded log of finished runs
//!
//! Completed runs are kept as session snapshots keyed by the run's save
//! timestamp. The log never grows past its capacity: every push evicts the
//! oldest entries until the bound holds again, so the log always contains the
//! most recent runs seen so far.
//!
//! # Example
//!
//! ```rust
//! use voidsave_core::SessionRecord;
//! use voidsave_history::{RunHistory, RunHistoryEntry};
//!
//! let mut history = RunHistory::new(2);
//! for ts in [100, 300, 200] {
//!     let session = SessionRecord { timestamp: ts, ..Default::default() };
//!     history.push(RunHistoryEntry::new(session, false));
//! }
//!
//! let kept: Vec<i64> = history.iter().map(|(ts, _)| ts).collect();
//! assert_eq!(kept, vec![300, 200]);
//! ```

pub mod error;

pub use error::{Error, Result};

use log::debug;
use std::collections::BTreeMap;
use voidsave_core::{codec, SessionRecord, ToValue, Value, ValueMap};
use voidsave_migrate::read_session_at;

/// Default number of runs kept
pub const DEFAULT_CAPACITY: usize = 25;

/// One finished run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunHistoryEntry {
    /// Session snapshot taken when the run ended
    pub session: SessionRecord,
    pub is_victory: bool,
    pub is_favorite: bool,
}

impl RunHistoryEntry {
    pub fn new(session: SessionRecord, is_victory: bool) -> Self {
        Self {
            session,
            is_victory,
            is_favorite: false,
        }
    }

    /// Key the entry is stored under
    pub fn timestamp(&self) -> i64 {
        self.session.timestamp
    }
}

impl ToValue for RunHistoryEntry {
    fn to_value(&self) -> Value {
        let mut map = ValueMap::new();
        map.insert("entry".into(), self.session.to_value());
        map.insert("isVictory".into(), self.is_victory.into());
        map.insert("isFavorite".into(), self.is_favorite.into());
        Value::Map(map)
    }
}

/// Timestamp-keyed run log with a hard size bound
#[derive(Debug, Clone, PartialEq)]
pub struct RunHistory {
    entries: BTreeMap<i64, RunHistoryEntry>,
    capacity: usize,
}

impl RunHistory {
    /// Create an empty history holding at most `capacity` runs
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a run under its timestamp and evict down to capacity
    ///
    /// A run with an already-present timestamp replaces the old one. Returns
    /// the timestamps evicted, oldest first; the pushed run itself is among
    /// them when it is older than everything kept.
    pub fn push(&mut self, entry: RunHistoryEntry) -> Vec<i64> {
        self.entries.insert(entry.timestamp(), entry);
        self.evict()
    }

    /// Push several runs, then evict once
    pub fn extend(&mut self, entries: impl IntoIterator<Item = RunHistoryEntry>) -> Vec<i64> {
        for entry in entries {
            self.entries.insert(entry.timestamp(), entry);
        }
        self.evict()
    }

    fn evict(&mut self) -> Vec<i64> {
        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            match self.entries.pop_first() {
                Some((timestamp, _)) => evicted.push(timestamp),
                None => break,
            }
        }
        if !evicted.is_empty() {
            debug!("run history evicted {} entries", evicted.len());
        }
        evicted
    }

    pub fn get(&self, timestamp: i64) -> Option<&RunHistoryEntry> {
        self.entries.get(&timestamp)
    }

    /// Mark or unmark a run as favorite; false when no run has that timestamp
    pub fn set_favorite(&mut self, timestamp: i64, favorite: bool) -> bool {
        match self.entries.get_mut(&timestamp) {
            Some(entry) => {
                entry.is_favorite = favorite;
                true
            }
            None => false,
        }
    }

    /// Runs newest first
    pub fn iter(&self) -> impl Iterator<Item = (i64, &RunHistoryEntry)> {
        self.entries.iter().rev().map(|(ts, entry)| (*ts, entry))
    }

    /// Oldest and newest timestamps held
    pub fn timestamp_range(&self) -> Option<(i64, i64)> {
        let oldest = self.entries.keys().next()?;
        let newest = self.entries.keys().next_back()?;
        Some((*oldest, *newest))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Read a decoded history tree
    ///
    /// Every entry must carry a session snapshot plus both flags. Entries
    /// beyond `capacity` are evicted oldest first.
    pub fn from_value(value: Value, capacity: usize) -> Result<Self> {
        let got = value.type_name();
        let Value::Map(root) = value else {
            return Err(voidsave_core::CodecError::shape("$", "map", got).into());
        };

        let mut history = Self::new(capacity);
        let mut entries = Vec::with_capacity(root.len());
        for (key, raw) in root {
            let timestamp: i64 = key.parse().map_err(|_| Error::BadKey(key.clone()))?;
            entries.push(read_entry(timestamp, raw)?);
        }
        history.extend(entries);
        Ok(history)
    }

    /// Decode save text and read the history in it
    pub fn from_text(text: &str, capacity: usize) -> Result<Self> {
        Self::from_value(codec::decode(text)?, capacity)
    }

    /// Encode the history as save text
    pub fn to_text(&self) -> Result<String> {
        Ok(codec::encode(&self.to_value())?)
    }
}

fn read_entry(timestamp: i64, raw: Value) -> Result<RunHistoryEntry> {
    let path = format!("$.{timestamp}");
    let got = raw.type_name();
    let Value::Map(mut fields) = raw else {
        return Err(voidsave_core::CodecError::shape(path, "map", got).into());
    };

    let flag = |fields: &ValueMap, field: &'static str| {
        fields
            .get(field)
            .and_then(Value::as_bool)
            .ok_or(Error::MissingField { timestamp, field })
    };
    let is_victory = flag(&fields, "isVictory")?;
    let is_favorite = flag(&fields, "isFavorite")?;

    let session = match fields.shift_remove("entry") {
        Some(value) if !value.is_null() => read_session_at(value, &format!("{path}.entry"))?,
        _ => {
            return Err(Error::MissingField {
                timestamp,
                field: "entry",
            })
        }
    };

    let mut entry = RunHistoryEntry {
        session,
        is_victory,
        is_favorite,
    };
    // The map key is authoritative when the snapshot disagrees
    entry.session.timestamp = timestamp;
    Ok(entry)
}

impl ToValue for RunHistory {
    fn to_value(&self) -> Value {
        Value::Map(
            self.entries
                .iter()
                .map(|(ts, entry)| (ts.to_string(), entry.to_value()))
                .collect(),
        )
    }
}

impl Default for RunHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
