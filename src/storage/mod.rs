//! Cache storage seam: named request→response stores.
//!
//! Models the host's cache-storage capability as a pair of traits:
//! - [`CacheStorage`]: opens and deletes named stores
//! - [`CacheStore`]: match/put/delete/enumerate within one store
//!
//! The worker only orchestrates these stores; it never owns the bytes.
//! Implementations:
//! - [`memory::MemoryStorage`]: in-process maps, for tests and embedding
//! - [`disk::DiskStorage`]: one directory per store, for the CLI

pub mod disk;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::net::FetchResponse;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache entry {key:?}: {reason}")]
    CorruptEntry { key: String, reason: String },
}

/// One named key→response store.
///
/// Keys are full request URLs (or the fixed stored-manifest key in the
/// manifest-history store). Individual operations are atomic per entry; there
/// is no cross-entry transaction.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up the response cached under `key`.
    async fn get(&self, key: &str) -> Result<Option<FetchResponse>, StorageError>;

    /// Store `response` under `key`, replacing any previous entry.
    async fn put(&self, key: &str, response: FetchResponse) -> Result<(), StorageError>;

    /// Remove the entry under `key`. Returns whether an entry existed.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    /// Enumerate every key currently present.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// A collection of named stores, opened lazily by name.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open the store called `name`, creating it if absent.
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>, StorageError>;

    /// Delete the store called `name` and everything in it.
    /// Returns whether the store existed.
    async fn delete_store(&self, name: &str) -> Result<bool, StorageError>;
}
