//! Session-keyed registry of booking stores.
//!
//! Each HTTP session owns one [`BookingStore`]; handlers look it up by the
//! stable store id kept in the session cookie.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::BookingStore;

/// Registry mapping session store ids to live stores.
#[derive(Clone, Default)]
pub struct StoreRegistry {
    stores: Arc<RwLock<HashMap<String, Arc<BookingStore>>>>,
}

impl StoreRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the store for a session, creating it on first use.
    #[must_use]
    pub fn get_or_create(&self, store_id: &str) -> Arc<BookingStore> {
        if let Some(store) = self
            .stores
            .read()
            .ok()
            .and_then(|map| map.get(store_id).cloned())
        {
            return store;
        }

        let store = Arc::new(BookingStore::in_memory());
        if let Ok(mut map) = self.stores.write() {
            // A racing request may have created it first; keep theirs.
            return map
                .entry(store_id.to_owned())
                .or_insert_with(|| store.clone())
                .clone();
        }
        store
    }

    /// Drop a session's store (session expiry).
    pub fn evict(&self, store_id: &str) {
        if let Ok(mut map) = self.stores.write() {
            map.remove(store_id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_is_stable_per_id() {
        let registry = StoreRegistry::new();
        let a = registry.get_or_create("sess-1");
        a.put("k", "v");

        let again = registry.get_or_create("sess-1");
        assert_eq!(again.get("k").as_deref(), Some("v"));

        let other = registry.get_or_create("sess-2");
        assert_eq!(other.get("k"), None);
    }

    #[test]
    fn test_evict_drops_state() {
        let registry = StoreRegistry::new();
        registry.get_or_create("sess-1").put("k", "v");
        registry.evict("sess-1");
        assert_eq!(registry.get_or_create("sess-1").get("k"), None);
    }
}
