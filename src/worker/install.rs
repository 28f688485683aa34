//! Install phase: stage the core shell.
//!
//! Downloads every core-shell resource into the temp store with a
//! cache-bypassing fetch. All-or-nothing: one failed shell fetch fails the
//! install and the worker never reaches the waiting state.

use tracing::{info, warn};

use crate::net::CacheMode;
use crate::worker::{CacheWorker, WorkerError, WorkerState};

impl CacheWorker {
    /// Run the install phase.
    ///
    /// Also requests skip-waiting: the new worker version takes over as soon
    /// as possible instead of waiting for its predecessor to retire.
    pub async fn install(&mut self) -> Result<(), WorkerError> {
        self.transition(WorkerState::Installing)?;
        self.skip_waiting = true;

        let temp = self.open_temp().await?;
        let shell = self.core_shell.clone();
        match self.stage_all(&temp, shell.iter(), CacheMode::Reload).await {
            Ok(staged) => {
                info!(staged, "Core shell staged");
                self.transition(WorkerState::Installed)
            }
            Err(e) => {
                // The worker stays short of Installed; this version will
                // never activate.
                warn!(error = %e, "Install failed");
                Err(e)
            }
        }
    }
}
