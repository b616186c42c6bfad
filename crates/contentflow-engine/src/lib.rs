//! Workflow orchestration engine.
//!
//! Runs workflows through the fixed stage pipeline, persisting a
//! checkpoint record after every stage and fanning progress events out
//! to stream subscribers. The engine owns three seams: the record
//! store behind [`contentflow_store::RecordStore`], the event fan-out
//! in [`EventBroadcaster`], and the per-stage work behind
//! [`StageWorker`].

pub mod broadcast;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod worker;

pub use broadcast::EventBroadcaster;
pub use config::OrchestratorConfig;
pub use error::EngineError;
pub use orchestrator::{StartRequest, WorkflowOrchestrator};
pub use worker::{ContentWorker, StageContext, StageWorker};
