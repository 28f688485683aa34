//! The cache lifecycle worker.
//!
//! [`CacheWorker`] is the central coordinator. It owns the resource manifest,
//! the core-shell list, and the three named store handles, and drives the four
//! lifecycle events through injected collaborators:
//! - [`install`]: stage the core shell into the temp store
//! - [`migrate`]: activation — promote temp entries and diff out stale ones
//! - [`fetch`]: request interception (cache-first / network-first)
//! - [`offline`]: message dispatch and full offline download

pub mod fetch;
pub mod install;
pub mod migrate;
pub mod offline;

use std::sync::Arc;

use futures::future::try_join_all;
use thiserror::Error;
use tracing::debug;

use crate::manifest::{canonical_url, CoreShell, ResourceManifest};
use crate::net::{CacheMode, FetchError, FetchRequest, Fetcher};
use crate::storage::{CacheStorage, CacheStore, StorageError};

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Malformed stored manifest record: {0}")]
    StoredManifest(#[from] serde_json::Error),

    #[error("Invalid lifecycle transition {from:?} -> {to:?}")]
    InvalidTransition { from: WorkerState, to: WorkerState },
}

/// Lifecycle state of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Constructed, install not yet run.
    Uninitialized,
    /// Install in progress (core shell downloading).
    Installing,
    /// Install complete, waiting to activate.
    Installed,
    /// Activation (cache migration) in progress.
    Activating,
    /// Serving fetches.
    Active,
}

fn is_valid_transition(from: WorkerState, to: WorkerState) -> bool {
    use WorkerState::*;
    matches!(
        (from, to),
        (Uninitialized, Installing)
            | (Installing, Installed)
            | (Installed, Activating)
            | (Activating, Active)
    )
}

/// Names of the three logical stores the worker orchestrates.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheNames {
    /// Staging store populated during install, deleted during activation.
    pub temp: String,
    /// Permanent content store the fetch handler serves from.
    pub content: String,
    /// Single-entry store holding the previous activation's manifest.
    pub manifest: String,
}

impl Default for CacheNames {
    fn default() -> Self {
        Self {
            temp: "app-temp-cache".to_string(),
            content: "app-content-cache".to_string(),
            manifest: "app-manifest".to_string(),
        }
    }
}

/// The two recognized message-channel commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Immediately activate a waiting worker (caller owes a page reload).
    SkipWaiting,
    /// Download every manifest resource not yet in the content store.
    DownloadOffline,
}

impl Message {
    /// Parse a raw message payload. Anything unrecognized is ignored.
    pub fn parse(payload: &str) -> Option<Self> {
        match payload {
            "skipWaiting" => Some(Message::SkipWaiting),
            "downloadOffline" => Some(Message::DownloadOffline),
            _ => None,
        }
    }
}

/// The cache lifecycle manager.
pub struct CacheWorker {
    manifest: ResourceManifest,
    core_shell: CoreShell,
    origin: String,
    names: CacheNames,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    state: WorkerState,
    skip_waiting: bool,
    clients_claimed: bool,
}

impl CacheWorker {
    pub fn new(
        manifest: ResourceManifest,
        core_shell: CoreShell,
        origin: impl Into<String>,
        names: CacheNames,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            manifest,
            core_shell,
            origin: origin.into().trim_end_matches('/').to_string(),
            names,
            storage,
            fetcher,
            state: WorkerState::Uninitialized,
            skip_waiting: false,
            clients_claimed: false,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn manifest(&self) -> &ResourceManifest {
        &self.manifest
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Whether this worker has requested to replace any predecessor
    /// immediately rather than waiting for natural lifecycle rotation.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting
    }

    /// Whether open clients have been claimed by this worker.
    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed
    }

    pub(crate) fn transition(&mut self, to: WorkerState) -> Result<(), WorkerError> {
        if !is_valid_transition(self.state, to) {
            return Err(WorkerError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        debug!(from = ?self.state, to = ?to, "Lifecycle transition");
        self.state = to;
        Ok(())
    }

    pub(crate) async fn open_temp(&self) -> Result<Arc<dyn CacheStore>, WorkerError> {
        Ok(self.storage.open(&self.names.temp).await?)
    }

    pub(crate) async fn open_content(&self) -> Result<Arc<dyn CacheStore>, WorkerError> {
        Ok(self.storage.open(&self.names.content).await?)
    }

    pub(crate) async fn open_manifest_store(&self) -> Result<Arc<dyn CacheStore>, WorkerError> {
        Ok(self.storage.open(&self.names.manifest).await?)
    }

    pub(crate) fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub(crate) fn names(&self) -> &CacheNames {
        &self.names
    }

    pub(crate) fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    pub(crate) fn claim_clients(&mut self) {
        self.clients_claimed = true;
        debug!("Claimed open clients");
    }

    /// Fetch every resource key in `keys` and store it in `store` under its
    /// canonical URL.
    ///
    /// Add-all semantics: fetches run concurrently, and any transport error or
    /// non-2xx status fails the whole batch. Returns the number staged.
    pub(crate) async fn stage_all<I>(
        &self,
        store: &Arc<dyn CacheStore>,
        keys: I,
        cache_mode: CacheMode,
    ) -> Result<usize, WorkerError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let jobs = keys.into_iter().map(|key| {
            let url = canonical_url(&self.origin, key.as_ref());
            let store = store.clone();
            let fetcher = self.fetcher.clone();
            async move {
                let request = FetchRequest {
                    cache_mode,
                    ..FetchRequest::get(url.clone())
                };
                let response = fetcher.fetch(&request).await?;
                if !response.ok() {
                    return Err(WorkerError::Fetch(FetchError::BadStatus {
                        url,
                        status: response.status,
                    }));
                }
                store.put(&url, response).await?;
                Ok::<_, WorkerError>(())
            }
        });
        let staged = try_join_all(jobs).await?.len();
        Ok(staged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_parse() {
        assert_eq!(Message::parse("skipWaiting"), Some(Message::SkipWaiting));
        assert_eq!(
            Message::parse("downloadOffline"),
            Some(Message::DownloadOffline)
        );
        assert_eq!(Message::parse("SkipWaiting"), None);
        assert_eq!(Message::parse(""), None);
        assert_eq!(Message::parse("purgeEverything"), None);
    }

    #[test]
    fn test_transition_table() {
        use WorkerState::*;
        assert!(is_valid_transition(Uninitialized, Installing));
        assert!(is_valid_transition(Installing, Installed));
        assert!(is_valid_transition(Installed, Activating));
        assert!(is_valid_transition(Activating, Active));

        assert!(!is_valid_transition(Uninitialized, Active));
        assert!(!is_valid_transition(Installing, Activating));
        assert!(!is_valid_transition(Active, Installing));
        assert!(!is_valid_transition(Installed, Installed));
    }
}
