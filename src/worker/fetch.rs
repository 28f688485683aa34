//! Fetch interception.
//!
//! Only GET requests for manifest resources are handled; everything else is
//! declined back to the host's default networking. The root document is
//! network-first so online users always see the latest build; every other
//! resource is cache-first with lazy population.

use tracing::{debug, trace};

use crate::manifest::{canonical_url, resource_key, ROOT_KEY};
use crate::net::{FetchRequest, FetchResponse};
use crate::worker::{CacheWorker, WorkerError};

impl CacheWorker {
    /// Intercept a request.
    ///
    /// `Ok(None)` means the request is not ours (non-GET, foreign origin, or
    /// a key outside the manifest) and the host should handle it normally.
    /// A transport failure with no cached fallback propagates as `Err`.
    pub async fn handle_fetch(
        &self,
        request: &FetchRequest,
    ) -> Result<Option<FetchResponse>, WorkerError> {
        if !request.method.is_get() {
            return Ok(None);
        }
        let Some(key) = resource_key(self.origin(), &request.url) else {
            return Ok(None);
        };
        if !self.manifest().contains(&key) {
            trace!(url = %request.url, "Not a manifest resource; declining");
            return Ok(None);
        }

        if key == ROOT_KEY {
            self.network_first(&key).await.map(Some)
        } else {
            self.cache_first(&key).await.map(Some)
        }
    }

    /// Serve from cache, falling back to the network on a miss and lazily
    /// populating the cache when the fetch succeeds.
    async fn cache_first(&self, key: &str) -> Result<FetchResponse, WorkerError> {
        let content = self.open_content().await?;
        let url = canonical_url(self.origin(), key);

        if let Some(cached) = content.get(&url).await? {
            trace!(key, "Cache hit");
            return Ok(cached);
        }

        debug!(key, "Cache miss; fetching");
        let response = self.fetcher().fetch(&FetchRequest::get(url.clone())).await?;
        if response.ok() {
            content.put(&url, response.clone()).await?;
        }
        Ok(response)
    }

    /// Always try the live network first; fall back to the cache only when
    /// the fetch itself fails. Used for the root document.
    async fn network_first(&self, key: &str) -> Result<FetchResponse, WorkerError> {
        let content = self.open_content().await?;
        let url = canonical_url(self.origin(), key);

        match self.fetcher().fetch(&FetchRequest::get(url.clone())).await {
            Ok(response) => {
                content.put(&url, response.clone()).await?;
                Ok(response)
            }
            Err(fetch_err) => match content.get(&url).await? {
                Some(cached) => {
                    debug!(key, "Network unavailable; serving cached root");
                    Ok(cached)
                }
                None => Err(fetch_err.into()),
            },
        }
    }
}
