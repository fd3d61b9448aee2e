//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use bastion_core::clock::Clock;
use bastion_core::id::IdGenerator;
use bastion_core::repository::EventRepository;
use bastion_projection::ProjectionStore;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Write side: the event log.
    pub event_repository: Arc<dyn EventRepository>,
    /// Read side, fed by the projector.
    pub projection: Arc<ProjectionStore>,
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGenerator>,
    /// Deadline granted to each write request.
    pub request_timeout: Duration,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        event_repository: Arc<dyn EventRepository>,
        projection: Arc<ProjectionStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            event_repository,
            projection,
            clock,
            ids,
            request_timeout,
        }
    }
}
