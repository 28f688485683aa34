//! Activation: promote staged entries and migrate the permanent cache.
//!
//! Reconciles the temp store and the previous activation's manifest against
//! the current manifest. Entries whose checksum is unchanged are reused;
//! changed or removed entries are evicted; staged shell entries always win.
//! Any failure inside the sequence voids the whole cache state: all three
//! stores are deleted and the next activation rebuilds from scratch.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::manifest::{is_stale, resource_key, ResourceManifest, STORED_MANIFEST_KEY};
use crate::net::FetchResponse;
use crate::storage::CacheStore;
use crate::worker::{CacheWorker, WorkerError, WorkerState};

impl CacheWorker {
    /// Run the activation phase.
    ///
    /// On migration failure the error is logged and every named store is
    /// deleted unconditionally; the worker still ends up [`WorkerState::Active`]
    /// (over empty caches), and the next install/activate cycle rebuilds.
    pub async fn activate(&mut self) -> Result<(), WorkerError> {
        self.transition(WorkerState::Activating)?;

        if let Err(e) = self.run_migration().await {
            // The cache state cannot be trusted after a partial migration.
            error!(error = %e, "Cache migration failed; resetting all stores");
            self.purge_all_stores().await;
        }

        self.transition(WorkerState::Active)
    }

    async fn run_migration(&mut self) -> Result<(), WorkerError> {
        let mut content = self.open_content().await?;
        let temp = self.open_temp().await?;
        let manifest_store = self.open_manifest_store().await?;

        let stored = read_stored_manifest(&manifest_store).await?;

        match stored {
            // First-ever activation (or post-reset): start from a clean
            // content store holding exactly the staged entries.
            None => {
                self.storage().delete_store(&self.names().content).await?;
                content = self.open_content().await?;
                let promoted = promote_temp_entries(&temp, &content).await?;
                info!(promoted, "First activation: content cache rebuilt from staging");
            }
            // Upgrade: evict stale entries, keep the rest.
            Some(stored) => {
                let mut evicted = 0usize;
                for url in content.keys().await? {
                    let stale = match resource_key(self.origin(), &url) {
                        Some(key) => is_stale(self.manifest(), &stored, &key),
                        // Not under our origin: nothing the manifest could
                        // ever vouch for.
                        None => true,
                    };
                    if stale {
                        content.delete(&url).await?;
                        evicted += 1;
                        debug!(url = %url, "Evicted stale cache entry");
                    }
                }
                let promoted = promote_temp_entries(&temp, &content).await?;
                info!(evicted, promoted, "Upgrade migration complete");
            }
        }

        self.storage().delete_store(&self.names().temp).await?;

        let record = FetchResponse::with_body(self.manifest().to_json()?);
        manifest_store.put(STORED_MANIFEST_KEY, record).await?;

        self.claim_clients();
        Ok(())
    }

    /// Delete all three named stores, best effort, no partial persistence.
    async fn purge_all_stores(&self) {
        let names = self.names().clone();
        for name in [&names.content, &names.temp, &names.manifest] {
            if let Err(e) = self.storage().delete_store(name).await {
                error!(store = %name, error = %e, "Failed to delete store during reset");
            }
        }
    }
}

/// Read back the manifest persisted by the previous successful activation.
pub(crate) async fn read_stored_manifest(
    manifest_store: &Arc<dyn CacheStore>,
) -> Result<Option<ResourceManifest>, WorkerError> {
    match manifest_store.get(STORED_MANIFEST_KEY).await? {
        None => Ok(None),
        Some(record) => Ok(Some(ResourceManifest::from_json(&record.body)?)),
    }
}

/// Copy every staged entry into the content store, overwriting survivors so
/// the shell is always the freshest build.
async fn promote_temp_entries(
    temp: &Arc<dyn CacheStore>,
    content: &Arc<dyn CacheStore>,
) -> Result<usize, WorkerError> {
    let mut promoted = 0usize;
    for url in temp.keys().await? {
        if let Some(response) = temp.get(&url).await? {
            content.put(&url, response).await?;
            promoted += 1;
        }
    }
    Ok(promoted)
}
