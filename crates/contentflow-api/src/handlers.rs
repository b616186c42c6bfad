//! Request handlers.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use contentflow_engine::{EventBroadcaster, StartRequest};
use contentflow_protocols::{StreamEvent, WorkflowStatus};
use contentflow_store::{Fields, ListOptions, Record, RecordPage};

use crate::error::ApiError;
use crate::state::AppState;

/// Request to start a workflow.
#[derive(Debug, Deserialize)]
pub struct StartWorkflowRequest {
    /// Topic to generate content about.
    pub topic: String,

    /// Optional generation parameters, stored with the checkpoint.
    pub parameters: Option<serde_json::Value>,

    /// Optional requester identity.
    pub created_by: Option<String>,
}

/// Response from starting a workflow.
#[derive(Debug, Serialize)]
pub struct StartWorkflowResponse {
    /// Id of the started workflow.
    pub workflow_id: String,

    /// Always "started"; the pipeline runs in the background.
    pub status: String,

    /// Route serving progress events for this and all other workflows.
    pub stream: String,
}

/// Start a workflow.
///
/// POST /workflows
pub async fn start_workflow(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartWorkflowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!(topic = %req.topic, "workflow start request");

    let workflow_id = state
        .orchestrator
        .start(StartRequest {
            topic: req.topic,
            parameters: req.parameters,
            created_by: req.created_by,
        })
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(StartWorkflowResponse {
            workflow_id,
            status: "started".to_string(),
            stream: "/workflows/stream".to_string(),
        }),
    ))
}

/// Query a workflow's status.
///
/// GET /workflows/{id}
pub async fn workflow_status(
    State(state): State<Arc<AppState>>,
    Path(workflow_id): Path<String>,
) -> Result<Json<WorkflowStatus>, ApiError> {
    let status = state.orchestrator.get_status(&workflow_id).await?;
    Ok(Json(status))
}

/// Event stream for a single subscriber.
///
/// Unsubscribes from the broadcaster when the client goes away and the
/// stream is dropped.
struct SubscriberStream {
    connection_id: String,
    inner: ReceiverStream<StreamEvent>,
    broadcaster: Arc<EventBroadcaster>,
}

impl Stream for SubscriberStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        Pin::new(&mut this.inner).poll_next(cx).map(|item| {
            item.map(|event| {
                Ok(Event::default()
                    .event(event.kind.as_str())
                    .data(event.data.to_string()))
            })
        })
    }
}

impl Drop for SubscriberStream {
    fn drop(&mut self) {
        self.broadcaster.unsubscribe(&self.connection_id);
    }
}

/// Subscribe to workflow progress events.
///
/// GET /workflows/stream
pub async fn workflow_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (connection_id, rx) = state.broadcaster.subscribe();
    info!(connection_id = %connection_id, "stream subscriber connected");

    Sse::new(SubscriberStream {
        connection_id,
        inner: ReceiverStream::new(rx),
        broadcaster: Arc::clone(&state.broadcaster),
    })
}

/// Paging parameters for record listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListRecordsQuery {
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
}

/// List checkpoint records.
///
/// GET /records
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRecordsQuery>,
) -> Result<Json<RecordPage>, ApiError> {
    let page = state
        .store
        .list_records(&ListOptions {
            page_size: query.page_size,
            page_token: query.page_token,
        })
        .await?;
    Ok(Json(page))
}

/// Create a record directly in the store.
///
/// POST /records
pub async fn create_record(
    State(state): State<Arc<AppState>>,
    Json(fields): Json<Fields>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let record = state.store.create_record(fields).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" when the process is serving.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since the server started.
    pub uptime_seconds: u64,
    /// Tracked workflows, terminal ones included.
    pub active_workflows: usize,
    /// Connected stream subscribers.
    pub active_connections: usize,
}

/// Health check.
///
/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        active_workflows: state.orchestrator.workflow_count(),
        active_connections: state.broadcaster.connection_count(),
    })
}
