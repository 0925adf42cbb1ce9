//! Per-customer booking state store.
//!
//! The booking wizard hands state between steps through a small key/value
//! store scoped to the customer's session. Persistence sits behind the
//! [`StorageAdapter`] trait so the same coordination logic runs against
//! in-memory storage, encrypted storage, or a server-synced session without
//! change.
//!
//! Storage is best-effort caching, never a source of truth: adapter
//! failures degrade to "value absent" and are never surfaced to callers.
//!
//! A [`BookingStore`] pairs two adapters, mirroring the durable/transient
//! split of the original storage tiers:
//! - reads return the first non-empty value across [transient, durable]
//! - writes go to both tiers
//! - removes clear both tiers

pub mod keys;
mod registry;

pub use registry::StoreRegistry;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;

use fernhill_core::ServiceSlug;

/// A key/value persistence backend.
///
/// Implementations must swallow their own failures: a broken backend reads
/// as empty and accepts writes as no-ops.
pub trait StorageAdapter: Send + Sync {
    /// Read a value. `None` for missing keys or backend failure.
    fn get(&self, key: &str) -> Option<String>;
    /// Write a value. Best-effort.
    fn put(&self, key: &str, value: &str);
    /// Remove a value. Best-effort.
    fn remove(&self, key: &str);
    /// All stored keys. Diagnostic surface for adapter implementations.
    fn keys(&self) -> Vec<String>;
}

/// In-memory adapter backed by a `RwLock<HashMap>`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty in-memory adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageAdapter for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.entries.write() {
            map.insert(key.to_owned(), value.to_owned());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut map) = self.entries.write() {
            map.remove(key);
        }
    }

    fn keys(&self) -> Vec<String> {
        self.entries
            .read()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Two-tier store carrying one customer's booking state.
#[derive(Clone)]
pub struct BookingStore {
    durable: Arc<dyn StorageAdapter>,
    transient: Arc<dyn StorageAdapter>,
}

impl BookingStore {
    /// Create a store over explicit adapters.
    #[must_use]
    pub fn new(durable: Arc<dyn StorageAdapter>, transient: Arc<dyn StorageAdapter>) -> Self {
        Self { durable, transient }
    }

    /// Create a store over two fresh in-memory adapters.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
        )
    }

    /// Read the first non-empty value across [transient, durable].
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        for adapter in [&self.transient, &self.durable] {
            if let Some(value) = adapter.get(key)
                && !value.is_empty()
            {
                return Some(value);
            }
        }
        None
    }

    /// Write a value to both tiers.
    pub fn put(&self, key: &str, value: &str) {
        self.transient.put(key, value);
        self.durable.put(key, value);
    }

    /// Remove a value from both tiers.
    pub fn remove(&self, key: &str) {
        self.transient.remove(key);
        self.durable.remove(key);
    }

    /// Read and deserialize a JSON value. Corrupt entries read as absent.
    #[must_use]
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        serde_json::from_str(&raw).ok()
    }

    /// Serialize and write a JSON value. Unserializable values are dropped.
    pub fn put_json<T: Serialize>(&self, key: &str, value: &T) {
        if let Ok(raw) = serde_json::to_string(value) {
            self.put(key, &raw);
        }
    }

    /// Whether a customer token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.get(keys::AUTH_TOKEN).is_some()
    }

    /// Remove every slug-scoped key for `slug` except the finalized marker.
    ///
    /// Runs when a booking completes. Authentication keys are global and are
    /// never touched; the finalized marker survives so a stray re-entry into
    /// the wizard resolves to the paid order instead of minting a new one.
    pub fn clear_booking(&self, slug: &ServiceSlug) {
        for make_key in keys::PURGED_ON_COMPLETION {
            self.remove(&make_key(slug));
        }
    }

    /// Remove the authentication keys (logout).
    pub fn clear_auth(&self) {
        self.remove(keys::AUTH_TOKEN);
        self.remove(keys::CURRENT_USER);
    }
}
