//! Interaction history
//!
//! Past tool runs are kept newest first, capped at [`HISTORY_LIMIT`], and
//! written through a [`KeyValueStore`] as one JSON array after every change.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Most entries kept
pub const HISTORY_LIMIT: usize = 50;

/// Store key holding the history array
pub const HISTORY_KEY: &str = "capy-history";

/// String key/value persistence, as provided by browser local storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store, for tests and sessions that should not persist
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// One file per key under a directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.local/state/capy` (or `$XDG_STATE_HOME/capy`), `/tmp/capy` without a home
    pub fn default_dir() -> PathBuf {
        std::env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".local/state")))
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
            .join("capy")
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    /// Tool identifier, e.g. "summarize"
    pub tool: String,
    pub input: String,
    pub output: String,
    pub timestamp: DateTime<Utc>,
}

pub struct History<S: KeyValueStore> {
    store: S,
    entries: Vec<HistoryEntry>,
}

impl<S: KeyValueStore> History<S> {
    /// Read saved history. Unreadable data is logged and treated as empty.
    pub fn load(store: S) -> Result<Self> {
        let entries = match store.get(HISTORY_KEY)? {
            Some(raw) => match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Error parsing history, starting empty: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        info!(count = entries.len(), "History loaded");
        Ok(Self { store, entries })
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a finished tool run as the newest entry
    pub fn record(&mut self, tool: &str, input: &str, output: &str) -> Result<&HistoryEntry> {
        let timestamp = Utc::now();
        let base = timestamp.timestamp_millis().to_string();
        let mut id = base.clone();
        // Two runs in the same millisecond would otherwise share an id
        let mut suffix = 1;
        while self.get(&id).is_some() {
            id = format!("{}-{}", base, suffix);
            suffix += 1;
        }

        let mut entries = Vec::with_capacity(HISTORY_LIMIT);
        entries.push(HistoryEntry {
            id,
            tool: tool.to_string(),
            input: input.to_string(),
            output: output.to_string(),
            timestamp,
        });
        entries.extend(self.entries.iter().take(HISTORY_LIMIT - 1).cloned());
        self.commit(entries)?;
        Ok(&self.entries[0])
    }

    /// Remove one entry; returns whether it existed
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        if self.get(id).is_none() {
            return Ok(false);
        }
        let entries = self.entries.iter().filter(|e| e.id != id).cloned().collect();
        self.commit(entries)?;
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(HISTORY_KEY)?;
        self.entries.clear();
        Ok(())
    }

    /// Write `entries` to the store, adopting them only once the write succeeds
    fn commit(&mut self, entries: Vec<HistoryEntry>) -> Result<()> {
        let json = serde_json::to_string(&entries)?;
        self.store.set(HISTORY_KEY, &json)?;
        self.entries = entries;
        Ok(())
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
