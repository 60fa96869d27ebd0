//! Poll loop driving a [`QueueMonitor`].
//!
//! # Lifecycle
//!
//! 1. Load the persisted state (a miss or a load failure starts from
//!    `Uninitialized`)
//! 2. Check immediately, then once per interval
//! 3. On cancellation, save the final state and return it
//!
//! Tick failures are logged and never end the loop. Only the shutdown token
//! does.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use super::poll::PollConfig;
use crate::monitor::{CheckOutcome, MonitorError, MonitorState, QueueMonitor, restored_state_name};
use crate::persistence::{StateRepository, StateStore};

/// Owns a monitor and its repository for the lifetime of the process.
#[derive(Debug)]
pub struct Runner<M, S> {
    monitor: M,
    repository: StateRepository<S>,
    config: PollConfig,
}

impl<M: QueueMonitor, S: StateStore> Runner<M, S> {
    pub fn new(monitor: M, repository: StateRepository<S>, config: PollConfig) -> Self {
        Runner {
            monitor,
            repository,
            config,
        }
    }

    /// Runs until `shutdown` is cancelled.
    ///
    /// Returns the final state, which has been handed to the repository
    /// (whether the save succeeded is only logged). Awaiting the spawned task
    /// is how the owner waits for shutdown to be durable.
    #[instrument(skip_all, fields(interval = ?self.config.interval))]
    pub async fn run(mut self, shutdown: CancellationToken) -> MonitorState {
        self.restore().await;
        info!("Queue monitor started");

        // The first tick completes immediately.
        let mut ticker = tokio::time::interval(self.config.effective_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping queue monitor");
                    break;
                }

                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        // Not raced against `shutdown`: it is already cancelled.
        let state = self.monitor.state();
        if save(&self.repository, self.config.store_timeout, &state).await {
            info!("Final state saved");
        }
        info!("Queue monitor stopped");
        state
    }

    async fn restore(&mut self) {
        let loaded = tokio::time::timeout(self.config.store_timeout, self.repository.get()).await;
        let record = match loaded {
            Ok(Ok(Some(record))) => Some(record),
            Ok(Ok(None)) => {
                info!("No persisted state, starting uninitialized");
                None
            }
            Ok(Err(e)) => {
                error!(error = %e, "Failed to load persisted state, starting uninitialized");
                None
            }
            Err(_) => {
                error!(
                    timeout = ?self.config.store_timeout,
                    "Timed out loading persisted state, starting uninitialized"
                );
                None
            }
        };

        if let Some(record) = &record {
            info!(state = %restored_state_name(Some(record)), "Restored persisted state");
        }
        self.monitor.init(record.as_ref());
    }

    async fn tick(&mut self) {
        let state_may_have_changed = match self.monitor.check_and_process().await {
            Ok(CheckOutcome::Skipped) => false,
            Ok(CheckOutcome::Checked { state, notified }) => {
                debug!(state = %state, notified, "Status check complete");
                true
            }
            // Delivery failures may still have committed a transition.
            Err(e @ MonitorError::Notify(_)) => {
                error!(error = %e, transient = e.is_transient(), "Status check failed");
                true
            }
            Err(e) => {
                error!(error = %e, transient = e.is_transient(), "Status check failed");
                false
            }
        };

        if self.config.persist_every_tick && state_may_have_changed {
            let state = self.monitor.state();
            if save(&self.repository, self.config.store_timeout, &state).await {
                debug!("State saved");
            }
        }
    }
}

/// Saves `state` within `timeout`. Returns whether it was saved.
async fn save<S: StateStore>(
    repository: &StateRepository<S>,
    timeout: Duration,
    state: &MonitorState,
) -> bool {
    match tokio::time::timeout(timeout, repository.save(state)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            error!(error = %e, "Failed to save state");
            false
        }
        Err(_) => {
            error!(timeout = ?timeout, "Timed out saving state");
            false
        }
    }
}
