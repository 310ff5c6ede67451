//! Best-effort local mirror of the petition list.
//!
//! The whole list is serialized under one key and overwritten on every
//! mutation. Reads never fail: a missing or unparseable slot is treated as
//! empty. Writes never fail either: when the slot store reports that it is
//! full, the key is cleared and the write retried once; if that also fails
//! the mirror is simply left empty and a log line is the only trace.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use wishwall_core::petition::Petition;

/// Storage key for the serialized petition list.
pub const DEFAULT_CACHE_KEY: &str = "wishwall_petitions_v2";

const FILE_EXTENSION: &str = "json";

// ---------------------------------------------------------------------------
// Slot stores
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    /// Writing the value would exceed the store's capacity.
    #[error("Storage capacity exceeded: {needed} bytes needed, {capacity} available")]
    CapacityExceeded { needed: u64, capacity: u64 },

    #[error("Storage I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A durable string key-value slot, in the manner of browser local storage.
pub trait SlotStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SlotError>;

    /// Replace the value under `key`.
    ///
    /// The previous value still counts towards capacity while the new one
    /// is being written.
    fn set(&self, key: &str, value: &str) -> Result<(), SlotError>;

    /// Delete `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), SlotError>;
}

/// In-process slot store with an optional byte quota.
#[derive(Debug, Default)]
pub struct MemorySlotStore {
    slots: Mutex<HashMap<String, String>>,
    capacity: Option<u64>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total bytes (keys plus values) the store may hold.
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            slots: Mutex::default(),
            capacity: Some(capacity),
        }
    }

    /// Bytes currently held.
    pub fn used(&self) -> u64 {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.iter().map(|(k, v)| (k.len() + v.len()) as u64).sum()
    }
}

impl SlotStore for MemorySlotStore {
    fn get(&self, key: &str) -> Result<Option<String>, SlotError> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SlotError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(capacity) = self.capacity {
            let used: u64 = slots.iter().map(|(k, v)| (k.len() + v.len()) as u64).sum();
            let needed = (key.len() + value.len()) as u64;
            if used + needed > capacity {
                return Err(SlotError::CapacityExceeded {
                    needed,
                    capacity: capacity.saturating_sub(used),
                });
            }
        }
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SlotError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(key);
        Ok(())
    }
}

/// Slot store backed by one file per key inside a directory.
///
/// Writes go to a temporary file that is renamed over the slot, so a crash
/// mid-write leaves the previous value intact.
#[derive(Debug)]
pub struct FileSlotStore {
    dir: PathBuf,
    capacity: Option<u64>,
}

impl FileSlotStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, SlotError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            capacity: None,
        })
    }

    /// Limit the total bytes of all slot files.
    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf, SlotError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(SlotError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid slot key '{key}'"),
            )));
        }
        Ok(self.dir.join(format!("{key}.{FILE_EXTENSION}")))
    }

    fn used(&self) -> Result<u64, SlotError> {
        let mut total = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == FILE_EXTENSION) {
                total += fs::metadata(&path)?.len();
            }
        }
        Ok(total)
    }
}

impl SlotStore for FileSlotStore {
    fn get(&self, key: &str) -> Result<Option<String>, SlotError> {
        match fs::read_to_string(self.slot_path(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SlotError> {
        let path = self.slot_path(key)?;
        if let Some(capacity) = self.capacity {
            let used = self.used()?;
            let needed = value.len() as u64;
            if used + needed > capacity {
                return Err(SlotError::CapacityExceeded {
                    needed,
                    capacity: capacity.saturating_sub(used),
                });
            }
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SlotError> {
        match fs::remove_file(self.slot_path(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// What happened to a [`LocalCache::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Saved,
    /// The store was full; the old value was cleared and the retry worked.
    SavedAfterClear,
    /// Nothing is cached for the key any more.
    Dropped,
}

impl CacheOutcome {
    pub fn is_saved(self) -> bool {
        !matches!(self, Self::Dropped)
    }
}

/// Whole-list petition mirror on top of a [`SlotStore`].
#[derive(Debug)]
pub struct LocalCache<S> {
    store: S,
    key: String,
}

impl<S: SlotStore> LocalCache<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_CACHE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Last saved list, or `None` if nothing usable is stored.
    pub fn load(&self) -> Option<Vec<Petition>> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to read petition cache");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(petitions) => Some(petitions),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Ignoring corrupt petition cache");
                None
            }
        }
    }

    /// Overwrite the cached list. Never fails; see [`CacheOutcome`].
    pub fn save(&self, petitions: &[Petition]) -> CacheOutcome {
        let raw = match serde_json::to_string(petitions) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to serialize petition cache");
                return CacheOutcome::Dropped;
            }
        };

        match self.store.set(&self.key, &raw) {
            Ok(()) => CacheOutcome::Saved,
            Err(SlotError::CapacityExceeded { needed, capacity }) => {
                tracing::warn!(key = %self.key, needed, capacity, "Petition cache full, clearing and retrying");
                self.clear();
                match self.store.set(&self.key, &raw) {
                    Ok(()) => CacheOutcome::SavedAfterClear,
                    Err(e) => {
                        tracing::error!(key = %self.key, error = %e, "Failed to save petition cache after clearing");
                        CacheOutcome::Dropped
                    }
                }
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to save petition cache");
                CacheOutcome::Dropped
            }
        }
    }

    /// Remove the cached list.
    pub fn clear(&self) {
        if let Err(e) = self.store.remove(&self.key) {
            tracing::warn!(key = %self.key, error = %e, "Failed to clear petition cache");
        }
    }
}
