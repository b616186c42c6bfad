//! Stage-sequenced workflow orchestration.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use contentflow_protocols::{
    EventKind, RunStatus, StreamEvent, WorkflowStage, WorkflowStatus,
};
use contentflow_store::{Fields, RecordFilter, RecordStore};

use crate::broadcast::EventBroadcaster;
use crate::config::OrchestratorConfig;
use crate::error::EngineError;
use crate::worker::{StageContext, StageWorker};

/// Caller input for starting a workflow.
#[derive(Debug, Clone, Default)]
pub struct StartRequest {
    /// Topic to generate content about. Must be non-empty.
    pub topic: String,
    /// Free-form generation parameters, persisted with the checkpoint.
    pub parameters: Option<Value>,
    /// Who requested the run.
    pub created_by: Option<String>,
}

/// In-memory run metadata for one workflow.
struct WorkflowEntry {
    topic: String,
    record_id: String,
    status: RunStatus,
    stage: WorkflowStage,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

/// Drives workflows through the fixed stage pipeline.
///
/// Each started workflow runs on its own task and is the only writer
/// of its registry entry and checkpoint record. A failure in one
/// workflow never affects another.
pub struct WorkflowOrchestrator {
    store: Arc<dyn RecordStore>,
    broadcaster: Arc<EventBroadcaster>,
    worker: Arc<dyn StageWorker>,
    workflows: DashMap<String, WorkflowEntry>,
    config: OrchestratorConfig,
}

impl WorkflowOrchestrator {
    /// Create an orchestrator over the given store, fan-out, and
    /// worker.
    pub fn new(
        store: Arc<dyn RecordStore>,
        broadcaster: Arc<EventBroadcaster>,
        worker: Arc<dyn StageWorker>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            broadcaster,
            worker,
            workflows: DashMap::new(),
            config,
        }
    }

    /// Start a workflow and return its id without waiting for it to
    /// run.
    ///
    /// The checkpoint record is created before the pipeline task is
    /// spawned, so a store failure here surfaces to the caller and no
    /// orphan run is left behind.
    pub async fn start(self: &Arc<Self>, request: StartRequest) -> Result<String, EngineError> {
        let topic = request.topic.trim().to_string();
        if topic.is_empty() {
            return Err(EngineError::InvalidInput("topic is required".to_string()));
        }

        let workflow_id = format!("wf_{}", Uuid::new_v4().simple());
        let parameters = request.parameters.unwrap_or_else(|| json!({}));

        let mut fields = Fields::new();
        fields.insert("workflow_id".to_string(), workflow_id.clone().into());
        fields.insert("topic".to_string(), topic.clone().into());
        fields.insert("status".to_string(), "initializing".into());
        fields.insert(
            "stage".to_string(),
            WorkflowStage::Initialization.id().into(),
        );
        fields.insert("progress".to_string(), 0.into());
        fields.insert(
            "parameters".to_string(),
            serde_json::to_string(&parameters)
                .map_err(|e| EngineError::InvalidInput(e.to_string()))?
                .into(),
        );
        fields.insert(
            "created_by".to_string(),
            request.created_by.unwrap_or_else(|| "api".to_string()).into(),
        );
        let record = self.store.create_record(fields).await?;

        self.workflows.insert(
            workflow_id.clone(),
            WorkflowEntry {
                topic: topic.clone(),
                record_id: record.record_id.clone(),
                status: RunStatus::Running,
                stage: WorkflowStage::Initialization,
                started_at: Utc::now(),
                ended_at: None,
            },
        );
        info!(workflow_id = %workflow_id, topic = %topic, "workflow started");

        let orchestrator = Arc::clone(self);
        let id = workflow_id.clone();
        tokio::spawn(async move {
            orchestrator
                .run_pipeline(id, topic, parameters, record.record_id)
                .await;
        });

        Ok(workflow_id)
    }

    async fn run_pipeline(
        self: Arc<Self>,
        workflow_id: String,
        topic: String,
        parameters: Value,
        record_id: String,
    ) {
        let started_at = self
            .workflows
            .get(&workflow_id)
            .map(|e| e.started_at)
            .unwrap_or_else(Utc::now);
        let ctx = StageContext {
            workflow_id: workflow_id.clone(),
            topic,
            parameters,
            record_id: record_id.clone(),
            started_at,
            store: Arc::clone(&self.store),
            broadcaster: Arc::clone(&self.broadcaster),
            sections: self.config.sections,
            section_delay: self.config.section_delay,
        };

        for stage in WorkflowStage::PIPELINE {
            self.set_stage(&workflow_id, stage);
            let result = if stage.is_terminal() {
                self.finish(&ctx).await
            } else {
                self.execute_stage(&ctx, stage).await
            };
            if let Err(err) = result {
                self.fail(&workflow_id, &record_id, stage, err).await;
                return;
            }
            if !stage.is_terminal() && !self.config.stage_delay.is_zero() {
                tokio::time::sleep(self.config.stage_delay).await;
            }
        }

        if let Some(mut entry) = self.workflows.get_mut(&workflow_id) {
            entry.status = RunStatus::Completed;
            entry.ended_at = Some(Utc::now());
        }
        info!(workflow_id = %workflow_id, "workflow completed");
    }

    async fn execute_stage(
        &self,
        ctx: &StageContext,
        stage: WorkflowStage,
    ) -> Result<(), EngineError> {
        let mut fields = Fields::new();
        fields.insert("stage".to_string(), stage.id().into());
        fields.insert("stage_name".to_string(), stage.display_name().into());
        fields.insert("progress".to_string(), stage.progress().into());
        fields.insert("status".to_string(), "processing".into());
        self.store.update_record(&ctx.record_id, fields).await?;

        self.broadcaster.broadcast(&StreamEvent::new(
            EventKind::StageUpdate,
            json!({
                "workflow_id": ctx.workflow_id,
                "stage": stage.id(),
                "stage_name": stage.display_name(),
                "progress": stage.progress(),
                "status": "processing",
                "timestamp": StreamEvent::timestamp(),
            }),
        ));

        let data = self.worker.run(ctx, stage).await?;

        let mut fields = Fields::new();
        fields.insert(
            format!("{stage}_data"),
            serde_json::to_string(&data)
                .map_err(|e| EngineError::Stage {
                    stage,
                    reason: e.to_string(),
                })?
                .into(),
        );
        fields.insert(format!("{stage}_completed_at"), StreamEvent::timestamp().into());
        self.store.update_record(&ctx.record_id, fields).await?;

        self.broadcaster.broadcast(&StreamEvent::new(
            EventKind::StageData,
            json!({
                "workflow_id": ctx.workflow_id,
                "stage": stage.id(),
                "data": data,
                "timestamp": StreamEvent::timestamp(),
            }),
        ));
        Ok(())
    }

    /// Terminal stage: run its work unit, persist the completion
    /// checkpoint, and emit the closing events.
    async fn finish(&self, ctx: &StageContext) -> Result<(), EngineError> {
        let stage = WorkflowStage::Complete;
        let data = self.worker.run(ctx, stage).await?;

        let mut fields = Fields::new();
        fields.insert("stage".to_string(), stage.id().into());
        fields.insert("stage_name".to_string(), stage.display_name().into());
        fields.insert("progress".to_string(), stage.progress().into());
        fields.insert("status".to_string(), "completed".into());
        fields.insert("completed_at".to_string(), StreamEvent::timestamp().into());
        fields.insert(
            format!("{stage}_data"),
            serde_json::to_string(&data)
                .map_err(|e| EngineError::Stage {
                    stage,
                    reason: e.to_string(),
                })?
                .into(),
        );
        fields.insert(format!("{stage}_completed_at"), StreamEvent::timestamp().into());
        self.store.update_record(&ctx.record_id, fields).await?;

        self.broadcaster.broadcast(&StreamEvent::new(
            EventKind::StageData,
            json!({
                "workflow_id": ctx.workflow_id,
                "stage": stage.id(),
                "data": data,
                "timestamp": StreamEvent::timestamp(),
            }),
        ));
        self.broadcaster.broadcast(&StreamEvent::new(
            EventKind::StageUpdate,
            json!({
                "workflow_id": ctx.workflow_id,
                "stage": stage.id(),
                "stage_name": stage.display_name(),
                "progress": stage.progress(),
                "status": "completed",
                "timestamp": StreamEvent::timestamp(),
            }),
        ));
        Ok(())
    }

    async fn fail(
        &self,
        workflow_id: &str,
        record_id: &str,
        stage: WorkflowStage,
        err: EngineError,
    ) {
        error!(workflow_id, stage = %stage, error = %err, "workflow failed");

        let mut fields = Fields::new();
        fields.insert("status".to_string(), "error".into());
        fields.insert("error_stage".to_string(), stage.id().into());
        fields.insert("error_message".to_string(), err.to_string().into());
        if let Err(store_err) = self.store.update_record(record_id, fields).await {
            warn!(workflow_id, error = %store_err, "error checkpoint write failed");
        }

        self.broadcaster.broadcast(&StreamEvent::new(
            EventKind::Error,
            json!({
                "workflow_id": workflow_id,
                "stage": stage.id(),
                "message": err.to_string(),
                "timestamp": StreamEvent::timestamp(),
            }),
        ));

        if let Some(mut entry) = self.workflows.get_mut(workflow_id) {
            entry.status = RunStatus::Error;
            entry.ended_at = Some(Utc::now());
        }
    }

    fn set_stage(&self, workflow_id: &str, stage: WorkflowStage) {
        if let Some(mut entry) = self.workflows.get_mut(workflow_id) {
            entry.stage = stage;
        }
    }

    /// Current status of a workflow, merging run metadata with the
    /// latest checkpoint from the store.
    pub async fn get_status(&self, workflow_id: &str) -> Result<WorkflowStatus, EngineError> {
        let (topic, record_id, status, stage, started_at, ended_at) = {
            let entry = self
                .workflows
                .get(workflow_id)
                .ok_or_else(|| EngineError::NotFound(workflow_id.to_string()))?;
            (
                entry.topic.clone(),
                entry.record_id.clone(),
                entry.status,
                entry.stage,
                entry.started_at,
                entry.ended_at,
            )
        };

        let page = self
            .store
            .query_records(&RecordFilter::workflow_id(workflow_id))
            .await?;
        let checkpoint = page
            .items
            .into_iter()
            .next()
            .map(|r| Value::Object(r.fields));

        let duration_ms = ended_at
            .map(|end| (end - started_at).num_milliseconds().max(0) as u64);

        Ok(WorkflowStatus {
            workflow_id: workflow_id.to_string(),
            status,
            stage,
            topic,
            record_id,
            started_at,
            ended_at,
            duration_ms,
            checkpoint,
        })
    }

    /// Number of workflows currently tracked, terminal ones included.
    pub fn workflow_count(&self) -> usize {
        self.workflows.len()
    }

    /// Evict terminal workflows whose grace period has elapsed.
    ///
    /// Returns the number of evicted entries. Running workflows are
    /// never touched.
    pub fn prune_terminal(&self, grace: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(grace).unwrap_or_else(|_| chrono::Duration::zero());
        let before = self.workflows.len();
        self.workflows.retain(|_, entry| {
            !(entry.status.is_terminal()
                && entry.ended_at.is_some_and(|ended| ended <= cutoff))
        });
        before - self.workflows.len()
    }

    /// Periodically evict terminal workflows using the configured
    /// retention. Does nothing when retention is unset.
    pub fn spawn_pruner(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let retention = self.config.completed_retention?;
        let orchestrator = Arc::clone(self);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(retention);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = orchestrator.prune_terminal(retention);
                if evicted > 0 {
                    info!(evicted, "terminal workflows evicted");
                }
            }
        }))
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
