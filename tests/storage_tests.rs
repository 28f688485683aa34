//! Integration tests for the disk-backed cache storage.

use bytes::Bytes;
use tempfile::TempDir;

use shellcache::net::FetchResponse;
use shellcache::storage::disk::DiskStorage;
use shellcache::storage::{CacheStorage, CacheStore, StorageError};

fn response(body: &str) -> FetchResponse {
    FetchResponse {
        status: 200,
        headers: vec![("content-type".to_string(), "text/javascript".to_string())],
        body: Bytes::from(body.as_bytes().to_vec()),
    }
}

#[tokio::test]
async fn test_disk_round_trip() {
    let dir = TempDir::new().unwrap();
    let storage = DiskStorage::new(dir.path().to_path_buf()).await.unwrap();
    let store = storage.open("content").await.unwrap();

    store
        .put("https://app.example/main.js", response("main-v1"))
        .await
        .unwrap();

    let hit = store
        .get("https://app.example/main.js")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hit.status, 200);
    assert_eq!(hit.headers[0].1, "text/javascript");
    assert_eq!(&hit.body[..], b"main-v1");

    assert!(store.get("https://app.example/other.js").await.unwrap().is_none());
}

#[tokio::test]
async fn test_disk_keys_and_delete() {
    let dir = TempDir::new().unwrap();
    let storage = DiskStorage::new(dir.path().to_path_buf()).await.unwrap();
    let store = storage.open("content").await.unwrap();

    store.put("https://app.example/a", response("a")).await.unwrap();
    store.put("https://app.example/b", response("b")).await.unwrap();

    assert_eq!(
        store.keys().await.unwrap(),
        vec![
            "https://app.example/a".to_string(),
            "https://app.example/b".to_string()
        ]
    );

    assert!(store.delete("https://app.example/a").await.unwrap());
    assert!(!store.delete("https://app.example/a").await.unwrap());
    assert_eq!(store.keys().await.unwrap(), vec!["https://app.example/b".to_string()]);
}

#[tokio::test]
async fn test_disk_entries_survive_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let storage = DiskStorage::new(dir.path().to_path_buf()).await.unwrap();
        let store = storage.open("content").await.unwrap();
        store
            .put("https://app.example/main.js", response("persisted"))
            .await
            .unwrap();
    }

    let storage = DiskStorage::new(dir.path().to_path_buf()).await.unwrap();
    let store = storage.open("content").await.unwrap();
    let hit = store
        .get("https://app.example/main.js")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&hit.body[..], b"persisted");
}

#[tokio::test]
async fn test_disk_delete_store() {
    let dir = TempDir::new().unwrap();
    let storage = DiskStorage::new(dir.path().to_path_buf()).await.unwrap();
    let store = storage.open("temp").await.unwrap();
    store.put("k", response("v")).await.unwrap();

    assert!(storage.delete_store("temp").await.unwrap());
    assert!(!storage.delete_store("temp").await.unwrap());

    let store = storage.open("temp").await.unwrap();
    assert!(store.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_disk_put_overwrites() {
    let dir = TempDir::new().unwrap();
    let storage = DiskStorage::new(dir.path().to_path_buf()).await.unwrap();
    let store = storage.open("content").await.unwrap();

    store.put("k", response("old")).await.unwrap();
    store.put("k", response("new")).await.unwrap();

    let hit = store.get("k").await.unwrap().unwrap();
    assert_eq!(&hit.body[..], b"new");
    assert_eq!(store.keys().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_disk_corrupt_meta_is_reported() {
    let dir = TempDir::new().unwrap();
    let storage = DiskStorage::new(dir.path().to_path_buf()).await.unwrap();
    let store = storage.open("content").await.unwrap();
    store.put("k", response("v")).await.unwrap();

    // Smash every metadata file in the store directory.
    for entry in walk(dir.path()) {
        if entry.to_string_lossy().ends_with(".meta.json") {
            std::fs::write(&entry, b"not json").unwrap();
        }
    }

    assert!(matches!(
        store.get("k").await,
        Err(StorageError::CorruptEntry { .. })
    ));
    // Enumeration skips the unreadable entry instead of failing.
    assert!(store.keys().await.unwrap().is_empty());
}

fn walk(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            out.extend(walk(&path));
        } else {
            out.push(path);
        }
    }
    out
}
