//! Background projector tailing the global event log.
//!
//! The projector polls [`EventRepository::load_events_after`] from the
//! store's processed position and folds each batch into the
//! [`ProjectionStore`]. Readers therefore observe writes only after the next
//! successful poll.

use std::sync::Arc;
use std::time::Duration;

use bastion_core::clock::Clock;
use bastion_core::error::DomainError;
use bastion_core::repository::EventRepository;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::store::ProjectionStore;

/// Tuning for the projector loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectorConfig {
    /// Pause between polls once the log is drained.
    pub poll_interval: Duration,
    /// Maximum events fetched per poll.
    pub batch_size: usize,
    /// Artificial lag before a fetched batch is applied. Zero in production.
    pub delay: Duration,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            batch_size: 500,
            delay: Duration::ZERO,
        }
    }
}

/// Folds the event log into a [`ProjectionStore`].
pub struct Projector {
    repo: Arc<dyn EventRepository>,
    store: Arc<ProjectionStore>,
    clock: Arc<dyn Clock>,
    config: ProjectorConfig,
}

impl Projector {
    #[must_use]
    pub fn new(
        repo: Arc<dyn EventRepository>,
        store: Arc<ProjectionStore>,
        clock: Arc<dyn Clock>,
        config: ProjectorConfig,
    ) -> Self {
        Self {
            repo,
            store,
            clock,
            config,
        }
    }

    /// Fetches and applies one batch. Returns the number of events fetched.
    ///
    /// # Errors
    ///
    /// Propagates store errors; the processed position is left untouched.
    pub async fn run_once(&self) -> Result<usize, DomainError> {
        let position = self.store.processed_position()?;
        let batch = self
            .repo
            .load_events_after(position, self.config.batch_size.max(1))
            .await?;
        if !batch.is_empty() && !self.config.delay.is_zero() {
            time::sleep(self.config.delay).await;
        }
        self.store.apply_batch(&batch, self.clock.now())?;
        if let Some(last) = batch.last() {
            debug!(from = position, to = last.position, count = batch.len(), "projected batch");
        }
        Ok(batch.len())
    }

    /// Polls until a batch comes back short, i.e. the log is drained.
    /// Returns the total number of events fetched.
    ///
    /// # Errors
    ///
    /// Propagates the first failing poll.
    pub async fn catch_up(&self) -> Result<usize, DomainError> {
        let mut total = 0;
        loop {
            let fetched = self.run_once().await?;
            total += fetched;
            if fetched < self.config.batch_size.max(1) {
                return Ok(total);
            }
        }
    }

    /// Runs the projector on a background task until `token` is cancelled.
    /// Failed polls are logged and retried on the next tick.
    #[must_use]
    pub fn spawn(self, token: CancellationToken) -> ProjectorHandle {
        let child = token.clone();
        let task = tokio::spawn(async move {
            let mut ticker = time::interval(self.config.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(poll_interval = ?self.config.poll_interval, "projector started");
            loop {
                tokio::select! {
                    biased;
                    () = child.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(err) = self.catch_up().await {
                            error!(error = %err, "projection poll failed");
                        }
                    }
                }
            }
            info!("projector stopped");
        });
        ProjectorHandle {
            token,
            task: Some(task),
        }
    }
}

/// Owns the background projector task. Dropping the handle cancels it.
#[derive(Debug)]
pub struct ProjectorHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ProjectorHandle {
    /// Signals the projector to stop after its current poll.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancels the projector and waits for the task to finish.
    pub async fn join(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                error!(error = %err, "projector task panicked");
            }
        }
    }
}

impl Drop for ProjectorHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
