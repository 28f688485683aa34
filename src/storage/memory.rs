//! In-memory cache storage.
//!
//! A map of store name → (key → response) behind an async RwLock. Used by
//! tests and by hosts that embed the worker with their own persistence above.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::net::FetchResponse;
use crate::storage::{CacheStorage, CacheStore, StorageError};

type StoreMap = HashMap<String, FetchResponse>;

/// In-process [`CacheStorage`] implementation.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    stores: Arc<RwLock<HashMap<String, Arc<MemoryStore>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a store of this name currently exists (not created by asking).
    pub async fn store_exists(&self, name: &str) -> bool {
        self.stores.read().await.contains_key(name)
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>, StorageError> {
        let mut stores = self.stores.write().await;
        let store = stores
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryStore::default()))
            .clone();
        Ok(store)
    }

    async fn delete_store(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.stores.write().await.remove(name).is_some())
    }
}

/// One named in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<StoreMap>,
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<FetchResponse>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, response: FetchResponse) -> Result<(), StorageError> {
        self.entries.write().await.insert(key.to_string(), response);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let storage = MemoryStorage::new();
        let store = storage.open("content").await.unwrap();

        store
            .put("https://app.example/a.js", FetchResponse::with_body("aaa"))
            .await
            .unwrap();

        let hit = store.get("https://app.example/a.js").await.unwrap().unwrap();
        assert_eq!(&hit.body[..], b"aaa");

        assert!(store.delete("https://app.example/a.js").await.unwrap());
        assert!(!store.delete("https://app.example/a.js").await.unwrap());
        assert!(store.get("https://app.example/a.js").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_store_drops_entries() {
        let storage = MemoryStorage::new();
        let store = storage.open("temp").await.unwrap();
        store.put("k", FetchResponse::with_body("v")).await.unwrap();

        assert!(storage.delete_store("temp").await.unwrap());
        assert!(!storage.store_exists("temp").await);

        // Re-opening creates a fresh empty store.
        let store = storage.open("temp").await.unwrap();
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let storage = MemoryStorage::new();
        let a = storage.open("content").await.unwrap();
        a.put("k", FetchResponse::with_body("v")).await.unwrap();

        let b = storage.open("content").await.unwrap();
        assert_eq!(b.keys().await.unwrap(), vec!["k".to_string()]);
    }
}
