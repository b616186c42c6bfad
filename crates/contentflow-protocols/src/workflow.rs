//! Workflow run status and the status query snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::stage::WorkflowStage;

/// Overall run status of a workflow.
///
/// `Completed` and `Error` are terminal: once reached, the workflow's
/// in-memory entry is never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The pipeline is executing.
    Running,
    /// The pipeline reached the final stage.
    Completed,
    /// The pipeline was halted by a stage failure.
    Error,
}

impl RunStatus {
    /// Whether no further transitions occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => f.write_str("running"),
            Self::Completed => f.write_str("completed"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Snapshot returned by a workflow status query.
///
/// Merges in-memory run metadata with the latest checkpoint fetched
/// from the record store (`checkpoint` is `None` only when the store
/// holds no matching record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStatus {
    /// The workflow id.
    pub workflow_id: String,
    /// Current run status.
    pub status: RunStatus,
    /// Current pipeline stage.
    pub stage: WorkflowStage,
    /// Caller-supplied topic.
    pub topic: String,
    /// Record store handle for the workflow's checkpoint.
    pub record_id: String,
    /// When the workflow started.
    pub started_at: DateTime<Utc>,
    /// When the workflow reached a terminal status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Total run duration in milliseconds, set on terminal transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Latest checkpoint fields from the record store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<serde_json::Value>,
}
