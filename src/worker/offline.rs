//! Message handling and the full offline download.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::manifest::resource_key;
use crate::net::CacheMode;
use crate::worker::{CacheWorker, Message, WorkerError, WorkerState};

impl CacheWorker {
    /// Handle a raw message payload; unrecognized payloads are ignored.
    pub async fn handle_message(&mut self, payload: &str) -> Result<(), WorkerError> {
        match Message::parse(payload) {
            Some(Message::SkipWaiting) => self.skip_waiting_now().await,
            Some(Message::DownloadOffline) => self.download_offline().await.map(|_| ()),
            None => {
                debug!(payload, "Ignoring unknown message");
                Ok(())
            }
        }
    }

    /// Immediately activate a waiting worker version. The caller owes the
    /// page reload; a worker that is not waiting is left alone.
    async fn skip_waiting_now(&mut self) -> Result<(), WorkerError> {
        self.skip_waiting = true;
        if self.state() == WorkerState::Installed {
            self.activate().await
        } else {
            debug!(state = ?self.state(), "skipWaiting with no waiting worker");
            Ok(())
        }
    }

    /// Download every manifest resource not yet present in the content store.
    ///
    /// Add-all semantics: any single failure aborts the remaining downloads
    /// for this invocation. Returns the number of resources downloaded.
    pub async fn download_offline(&self) -> Result<usize, WorkerError> {
        let content = self.open_content().await?;

        let cached: HashSet<String> = content
            .keys()
            .await?
            .iter()
            .filter_map(|url| resource_key(self.origin(), url))
            .collect();

        let missing: Vec<&str> = self
            .manifest()
            .keys()
            .filter(|key| !cached.contains(*key))
            .collect();

        if missing.is_empty() {
            debug!("Offline download: nothing missing");
            return Ok(0);
        }

        let downloaded = self
            .stage_all(&content, missing, CacheMode::Default)
            .await?;
        info!(downloaded, "Offline download complete");
        Ok(downloaded)
    }
}
