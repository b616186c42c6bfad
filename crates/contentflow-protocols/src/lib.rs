//! Shared type definitions for the contentflow workspace.
//!
//! This crate holds the vocabulary every other crate speaks: the fixed
//! stage pipeline, workflow run status, the stream event types pushed to
//! subscribers, and the status snapshot returned by status queries.

pub mod event;
pub mod stage;
pub mod workflow;

pub use event::{EventKind, StreamEvent};
pub use stage::WorkflowStage;
pub use workflow::{RunStatus, WorkflowStatus};
