//! HTTP route definitions.
//!
//! ```text
//! /workflows
//!   POST   /workflows          - Start a workflow
//!   GET    /workflows/{id}     - Query workflow status
//!   GET    /workflows/stream   - Subscribe to progress events (SSE)
//!
//! /records
//!   GET    /records            - List checkpoint records
//!   POST   /records            - Create a record
//!
//! GET /health                  - Health check
//! ```

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    create_record, health, list_records, start_workflow, workflow_status, workflow_stream,
};
use crate::state::AppState;

/// Create the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/workflows", post(start_workflow))
        .route("/workflows/stream", get(workflow_stream))
        .route("/workflows/{id}", get(workflow_status))
        .route("/records", get(list_records).post(create_record))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
