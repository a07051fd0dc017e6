//! Persistent geocoding cache with lazy expiry.
//!
//! The whole cache lives under one storage key as a JSON object, so it
//! survives page reloads. Entries older than the configured expiry are
//! dropped whenever the blob is read; nothing else ever evicts them.
//!
//! # Cache Key Structure
//! - The address, trimmed and lower-cased (see [`normalize_key`])
//!
//! # Cache Value Structure
//! - `result`: the resolved [`GeocodeResult`]
//! - `timestamp`: insertion time in epoch milliseconds
//!
//! Every storage or decoding fault degrades to "empty cache"; callers never
//! see an error from [`GeocodeCache`].

use crate::geocode::GeocodeResult;
use crate::utils::now_ms;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Normalized address → cached lookup.
pub type CacheMap = HashMap<String, CacheEntry>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub result: GeocodeResult,
    pub timestamp: u64,
}

/// Cache key for an address.
pub fn normalize_key(address: &str) -> String {
    address.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    Unavailable,
    /// The browser refused the write, usually because the quota is full.
    WriteRejected(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable => write!(f, "Local storage is not available"),
            StorageError::WriteRejected(msg) => write!(f, "Local storage write failed: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// A string-keyed blob store, e.g. the browser's `localStorage`.
pub trait CacheStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// `window.localStorage`.
#[derive(Debug, Clone, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        gloo_utils::window()
            .local_storage()
            .ok()
            .flatten()
            .ok_or(StorageError::Unavailable)
    }
}

impl CacheStore for LocalStorageStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::storage()?
            .get_item(key)
            .map_err(|_| StorageError::Unavailable)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::WriteRejected(format!("{:?}", e)))
    }
}

/// In-memory store. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }
}

impl CacheStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Geocoding cache over a [`CacheStore`].
pub struct GeocodeCache<S> {
    store: S,
    storage_key: String,
    expiry_ms: u64,
}

impl<S: CacheStore> GeocodeCache<S> {
    pub fn new(store: S, storage_key: impl Into<String>, expiry_ms: u64) -> Self {
        Self {
            store,
            storage_key: storage_key.into(),
            expiry_ms,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All live entries. Expired ones are left out but not written back.
    pub fn load(&self) -> CacheMap {
        self.load_at(now_ms())
    }

    pub fn load_at(&self, now: u64) -> CacheMap {
        let raw = match self.store.read(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return CacheMap::new(),
            Err(e) => {
                log::debug!("Geocoding cache unreadable: {}", e);
                return CacheMap::new();
            }
        };
        let mut map: CacheMap = match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(e) => {
                log::warn!("Discarding corrupt geocoding cache: {}", e);
                return CacheMap::new();
            }
        };
        map.retain(|_, entry| !self.is_expired(entry, now));
        map
    }

    fn is_expired(&self, entry: &CacheEntry, now: u64) -> bool {
        now.saturating_sub(entry.timestamp) > self.expiry_ms
    }

    pub fn get(&self, address: &str) -> Option<GeocodeResult> {
        self.get_at(address, now_ms())
    }

    pub fn get_at(&self, address: &str, now: u64) -> Option<GeocodeResult> {
        self.load_at(now)
            .remove(&normalize_key(address))
            .map(|entry| entry.result)
    }

    pub fn set(&self, address: &str, result: GeocodeResult) {
        self.set_many_at(std::iter::once((address.to_string(), result)), now_ms());
    }

    /// Merge several results into the stored mapping and write it back once.
    pub fn set_many<I>(&self, results: I)
    where
        I: IntoIterator<Item = (String, GeocodeResult)>,
    {
        self.set_many_at(results, now_ms());
    }

    pub fn set_many_at<I>(&self, results: I, now: u64)
    where
        I: IntoIterator<Item = (String, GeocodeResult)>,
    {
        let mut map = self.load_at(now);
        for (address, result) in results {
            map.insert(
                normalize_key(&address),
                CacheEntry {
                    result,
                    timestamp: now,
                },
            );
        }
        self.persist(&map);
    }

    fn persist(&self, map: &CacheMap) {
        let json = match serde_json::to_string(map) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Could not encode geocoding cache: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.write(&self.storage_key, &json) {
            log::warn!("{}", e);
        }
    }
}
