//! Shared test fixtures: a scripted fetcher and worker builders.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use shellcache::manifest::{CoreShell, ResourceManifest};
use shellcache::net::{FetchError, FetchRequest, FetchResponse, Fetcher};
use shellcache::storage::memory::MemoryStorage;
use shellcache::worker::{CacheNames, CacheWorker};

pub const ORIGIN: &str = "https://app.example";

/// Fetcher with scripted responses, per-URL failure injection, a global
/// offline switch, and call recording.
#[derive(Default)]
pub struct MockFetcher {
    responses: Mutex<HashMap<String, FetchResponse>>,
    failing: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a 200 response with `body` for the canonical URL of `key`.
    pub fn serve(&self, key: &str, body: &str) {
        let url = shellcache::manifest::canonical_url(ORIGIN, key);
        self.responses
            .lock()
            .unwrap()
            .insert(url, FetchResponse::with_body(body.as_bytes().to_vec()));
    }

    /// Script an arbitrary response for a full URL.
    pub fn serve_url(&self, url: &str, response: FetchResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    /// Make fetches of this exact URL fail at the transport level.
    pub fn fail_url(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    /// Make every fetch fail at the transport level.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// How many fetches hit this exact URL.
    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        self.calls.lock().unwrap().push(request.url.clone());

        let down = self.offline.load(Ordering::SeqCst)
            || self.failing.lock().unwrap().contains(&request.url);
        if down {
            return Err(FetchError::transport(
                &request.url,
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "simulated outage"),
            ));
        }

        match self.responses.lock().unwrap().get(&request.url) {
            Some(response) => Ok(response.clone()),
            None => Ok(FetchResponse {
                status: 404,
                headers: Vec::new(),
                body: bytes::Bytes::new(),
            }),
        }
    }
}

pub fn manifest(pairs: &[(&str, &str)]) -> ResourceManifest {
    let entries: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ResourceManifest::new(entries)
}

pub fn shell(keys: &[&str]) -> CoreShell {
    CoreShell(keys.iter().map(|k| k.to_string()).collect())
}

/// Build a worker over the given storage and fetcher with default store names.
pub fn worker(
    resources: ResourceManifest,
    core: CoreShell,
    storage: Arc<MemoryStorage>,
    fetcher: Arc<MockFetcher>,
) -> CacheWorker {
    CacheWorker::new(
        resources,
        core,
        ORIGIN,
        CacheNames::default(),
        storage,
        fetcher,
    )
}

pub fn url(key: &str) -> String {
    shellcache::manifest::canonical_url(ORIGIN, key)
}
