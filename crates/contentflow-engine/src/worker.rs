//! Per-stage work behind a swappable trait.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::debug;

use contentflow_protocols::{EventKind, StreamEvent, WorkflowStage};
use contentflow_store::{Fields, RecordStore};

use crate::broadcast::EventBroadcaster;
use crate::error::EngineError;

/// Everything a stage needs to do its work and report progress.
pub struct StageContext {
    /// The workflow id.
    pub workflow_id: String,
    /// Caller-supplied topic.
    pub topic: String,
    /// Caller-supplied generation parameters.
    pub parameters: Value,
    /// Checkpoint record for this workflow.
    pub record_id: String,
    /// When the run started, for completion stats.
    pub started_at: DateTime<Utc>,
    /// Checkpoint store.
    pub store: Arc<dyn RecordStore>,
    /// Progress event fan-out.
    pub broadcaster: Arc<EventBroadcaster>,
    /// Number of sections to generate during content generation.
    pub sections: u32,
    /// Pause between generated sections.
    pub section_delay: Duration,
}

/// Produces the data payload for one pipeline stage.
///
/// The orchestrator owns checkpointing and stage sequencing; a worker
/// only does the stage's work and returns its data payload. The
/// content generation stage additionally reports per-section progress
/// through the context's store and broadcaster.
#[async_trait]
pub trait StageWorker: Send + Sync {
    /// Run one stage, returning the payload persisted as that stage's
    /// checkpoint data.
    async fn run(&self, ctx: &StageContext, stage: WorkflowStage) -> Result<Value, EngineError>;
}

/// Built-in worker producing deterministic placeholder content.
///
/// Stands in for model-backed generation so the pipeline, checkpoint
/// schema, and event stream can be exercised end to end.
pub struct ContentWorker;

impl ContentWorker {
    fn section_title(index: u32, topic: &str) -> String {
        match index {
            1 => format!("Introduction to {topic}"),
            2 => format!("Background and context of {topic}"),
            3 => format!("Core concepts in {topic}"),
            4 => format!("Practical applications of {topic}"),
            _ => format!("Conclusions on {topic} (part {index})"),
        }
    }

    async fn generate_sections(&self, ctx: &StageContext) -> Result<Value, EngineError> {
        let span = WorkflowStage::Review.progress() - WorkflowStage::ContentGeneration.progress();
        let step = u32::from(span) / ctx.sections.max(1);

        let mut sections = Vec::with_capacity(ctx.sections as usize);
        for index in 1..=ctx.sections {
            let title = Self::section_title(index, &ctx.topic);
            let body = format!(
                "{title}. This section covers the topic in roughly three hundred words, \
                 expanding on the outline with supporting detail and examples."
            );
            let progress = u32::from(WorkflowStage::ContentGeneration.progress()) + step * index;

            let mut fields = Fields::new();
            fields.insert("progress".to_string(), progress.into());
            fields.insert("current_section".to_string(), index.into());
            fields.insert("total_sections".to_string(), ctx.sections.into());
            ctx.store.update_record(&ctx.record_id, fields).await?;

            ctx.broadcaster.broadcast(&StreamEvent::new(
                EventKind::ContentProgress,
                json!({
                    "workflow_id": ctx.workflow_id,
                    "stage": WorkflowStage::ContentGeneration.id(),
                    "section": index,
                    "total_sections": ctx.sections,
                    "section_title": title,
                    "progress": progress,
                    "timestamp": StreamEvent::timestamp(),
                }),
            ));
            debug!(workflow_id = %ctx.workflow_id, section = index, "section generated");

            sections.push(json!({
                "index": index,
                "title": title,
                "word_count": 300,
                "content": body,
            }));

            if index < ctx.sections && !ctx.section_delay.is_zero() {
                tokio::time::sleep(ctx.section_delay).await;
            }
        }

        Ok(json!({
            "sections": sections,
            "total_words": 300 * ctx.sections,
        }))
    }
}

#[async_trait]
impl StageWorker for ContentWorker {
    async fn run(&self, ctx: &StageContext, stage: WorkflowStage) -> Result<Value, EngineError> {
        let data = match stage {
            WorkflowStage::Initialization => json!({
                "message": "Workflow initialized",
                "topic": ctx.topic,
                "parameters": ctx.parameters,
            }),
            WorkflowStage::Research => json!({
                "sources_found": 12,
                "key_points": [
                    format!("Current state of {}", ctx.topic),
                    format!("Common pitfalls around {}", ctx.topic),
                    format!("Open questions in {}", ctx.topic),
                ],
                "summary": format!(
                    "Collected reference material and recent publications on {}.",
                    ctx.topic
                ),
            }),
            WorkflowStage::OutlineCreation => json!({
                "sections": (1..=ctx.sections)
                    .map(|i| Self::section_title(i, &ctx.topic))
                    .collect::<Vec<_>>(),
                "estimated_words": 300 * ctx.sections,
            }),
            WorkflowStage::ContentGeneration => return self.generate_sections(ctx).await,
            WorkflowStage::Review => json!({
                "readability_score": 82,
                "issues_fixed": 3,
                "notes": "Tightened transitions and removed repeated phrasing.",
            }),
            WorkflowStage::Finalization => json!({
                "format": "markdown",
                "word_count": 300 * ctx.sections,
                "metadata": {
                    "topic": ctx.topic,
                    "sections": ctx.sections,
                },
            }),
            WorkflowStage::Complete => json!({
                "message": "Workflow completed successfully",
                "topic": ctx.topic,
                "total_sections": ctx.sections,
                "total_words": 300 * ctx.sections,
                "duration_ms": (Utc::now() - ctx.started_at).num_milliseconds().max(0),
            }),
        };
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentflow_store::MemoryRecordStore;

    fn context(store: Arc<MemoryRecordStore>, record_id: String) -> StageContext {
        StageContext {
            workflow_id: "wf_test".to_string(),
            topic: "Rust async runtimes".to_string(),
            parameters: json!({}),
            record_id,
            started_at: Utc::now(),
            store,
            broadcaster: Arc::new(EventBroadcaster::new()),
            sections: 5,
            section_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn research_payload_mentions_the_topic() {
        let store = Arc::new(MemoryRecordStore::new());
        let record = store.create_record(Fields::new()).await.unwrap();
        let ctx = context(store, record.record_id);

        let data = ContentWorker
            .run(&ctx, WorkflowStage::Research)
            .await
            .unwrap();
        assert_eq!(data["sources_found"], 12);
        assert!(
            data["summary"]
                .as_str()
                .unwrap()
                .contains("Rust async runtimes")
        );
    }

    #[tokio::test]
    async fn terminal_stage_reports_completion_stats() {
        let store = Arc::new(MemoryRecordStore::new());
        let record = store.create_record(Fields::new()).await.unwrap();
        let ctx = context(store, record.record_id);

        let data = ContentWorker
            .run(&ctx, WorkflowStage::Complete)
            .await
            .unwrap();
        assert_eq!(data["message"], "Workflow completed successfully");
        assert_eq!(data["total_sections"], 5);
        assert!(data["duration_ms"].as_i64().unwrap() >= 0);
    }

    #[tokio::test]
    async fn content_generation_records_section_progress() {
        let store = Arc::new(MemoryRecordStore::new());
        let record = store.create_record(Fields::new()).await.unwrap();
        let ctx = context(Arc::clone(&store), record.record_id.clone());

        let (_, mut rx) = ctx.broadcaster.subscribe();
        rx.recv().await.unwrap(); // connected

        let data = ContentWorker
            .run(&ctx, WorkflowStage::ContentGeneration)
            .await
            .unwrap();
        assert_eq!(data["sections"].as_array().unwrap().len(), 5);
        assert_eq!(data["total_words"], 1500);

        for expected in 1..=5u32 {
            let ev = rx.recv().await.unwrap();
            assert_eq!(ev.kind, EventKind::ContentProgress);
            assert_eq!(ev.data["stage"], "content_generation");
            assert_eq!(ev.data["section"], expected);
            assert_eq!(ev.data["progress"], 50 + 5 * expected);
        }

        let page = store
            .query_records(&contentflow_store::RecordFilter::eq("current_section", 5))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].fields["progress"], 75);
        assert_eq!(page.items[0].fields["total_sections"], 5);
    }
}
