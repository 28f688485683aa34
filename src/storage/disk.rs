//! Disk-backed cache storage.
//!
//! One directory per named store under a base path. Each entry is a pair of
//! files named by the SHA-256 of its key: `<digest>.meta.json` holds the
//! original key, status, and headers; `<digest>.body` holds the raw bytes.
//! Uses tokio's async file I/O.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, warn};

use crate::net::FetchResponse;
use crate::storage::{CacheStorage, CacheStore, StorageError};

const META_SUFFIX: &str = ".meta.json";
const BODY_SUFFIX: &str = ".body";

/// Filesystem-backed [`CacheStorage`] implementation.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    base_dir: PathBuf,
}

impl DiskStorage {
    /// Create a disk storage rooted at `base_dir` (created if missing).
    pub async fn new(base_dir: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_dir).await?;
        Ok(Self { base_dir })
    }

    fn store_dir(&self, name: &str) -> PathBuf {
        // Store names are fixed identifiers from config, but hash them anyway
        // so arbitrary names cannot escape the base directory.
        self.base_dir.join(digest(name))
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>, StorageError> {
        let dir = self.store_dir(name);
        fs::create_dir_all(&dir).await?;
        debug!(store = name, dir = %dir.display(), "Opened cache store");
        Ok(Arc::new(DiskStore { dir }))
    }

    async fn delete_store(&self, name: &str) -> Result<bool, StorageError> {
        let dir = self.store_dir(name);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Metadata half of a disk entry.
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    key: String,
    status: u16,
    headers: Vec<(String, String)>,
}

/// One named on-disk store.
#[derive(Debug)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    fn meta_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{META_SUFFIX}", digest(key)))
    }

    fn body_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{BODY_SUFFIX}", digest(key)))
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn get(&self, key: &str) -> Result<Option<FetchResponse>, StorageError> {
        let meta_bytes = match fs::read(self.meta_path(key)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta: EntryMeta =
            serde_json::from_slice(&meta_bytes).map_err(|e| StorageError::CorruptEntry {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        let body = fs::read(self.body_path(key)).await.map_err(|e| {
            // A meta file without its body half means a torn write.
            StorageError::CorruptEntry {
                key: key.to_string(),
                reason: format!("missing body file: {e}"),
            }
        })?;
        Ok(Some(FetchResponse {
            status: meta.status,
            headers: meta.headers,
            body: Bytes::from(body),
        }))
    }

    async fn put(&self, key: &str, response: FetchResponse) -> Result<(), StorageError> {
        let meta = EntryMeta {
            key: key.to_string(),
            status: response.status,
            headers: response.headers,
        };
        let meta_bytes = serde_json::to_vec(&meta).map_err(|e| StorageError::CorruptEntry {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        // Body first: a reader treats meta-without-body as corrupt, while a
        // dangling body file is harmless.
        fs::write(self.body_path(key), &response.body).await?;
        fs::write(self.meta_path(key), &meta_bytes).await?;
        debug!(key, bytes = response.body.len(), "Stored cache entry");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let existed = match fs::remove_file(self.meta_path(key)).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        match fs::remove_file(self.body_path(key)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(existed)
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.ends_with(META_SUFFIX) {
                continue;
            }
            let bytes = fs::read(entry.path()).await?;
            match serde_json::from_slice::<EntryMeta>(&bytes) {
                Ok(meta) => keys.push(meta.key),
                Err(e) => {
                    warn!(file = name, error = %e, "Skipping unreadable cache entry");
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

fn digest(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let out = hasher.finalize();
    let mut hex = String::with_capacity(out.len() * 2);
    for byte in out {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}
