//! Engine error types.

use thiserror::Error;

use contentflow_protocols::WorkflowStage;
use contentflow_store::StoreError;

/// Engine error types.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Workflow not found in the in-memory registry.
    #[error("Workflow not found: {0}")]
    NotFound(String),

    /// Caller-supplied input rejected before the workflow was started.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A pipeline stage failed.
    #[error("Stage {stage} failed: {reason}")]
    Stage {
        stage: WorkflowStage,
        reason: String,
    },

    /// Record store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_error_names_the_stage() {
        let err = EngineError::Stage {
            stage: WorkflowStage::Review,
            reason: "quality gate rejected draft".to_string(),
        };
        assert_eq!(err.to_string(), "Stage review failed: quality gate rejected draft");
    }

    #[test]
    fn store_error_is_transparent() {
        let err = EngineError::from(StoreError::Network("connection refused".to_string()));
        assert!(err.to_string().contains("connection refused"));
    }
}
