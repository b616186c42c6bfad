//! Shared application state.

use std::sync::Arc;
use std::time::Instant;

use contentflow_engine::{EventBroadcaster, WorkflowOrchestrator};
use contentflow_store::RecordStore;

/// State shared by every request handler.
pub struct AppState {
    /// Workflow engine.
    pub orchestrator: Arc<WorkflowOrchestrator>,
    /// Stream event fan-out.
    pub broadcaster: Arc<EventBroadcaster>,
    /// Record store, also served by the passthrough routes.
    pub store: Arc<dyn RecordStore>,
    /// Process start, for health uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    /// Bundle the engine pieces into shared state.
    pub fn new(
        orchestrator: Arc<WorkflowOrchestrator>,
        broadcaster: Arc<EventBroadcaster>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            orchestrator,
            broadcaster,
            store,
            started_at: Instant::now(),
        }
    }
}
