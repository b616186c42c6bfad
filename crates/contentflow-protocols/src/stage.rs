//! The fixed workflow stage pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One stage of the fixed content workflow pipeline.
///
/// The pipeline order is total and immutable: every workflow passes
/// through these stages in declaration order, and progress percentages
/// are cumulative and non-decreasing (0 at the first stage, 100 at the
/// last).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    /// Workflow setup and checkpoint record creation.
    Initialization,
    /// Topic research and source gathering.
    Research,
    /// Content outline creation.
    OutlineCreation,
    /// Section-by-section content generation.
    ContentGeneration,
    /// Review and optimization pass.
    Review,
    /// Output formatting and metadata.
    Finalization,
    /// Terminal success stage.
    Complete,
}

impl WorkflowStage {
    /// The full pipeline in execution order.
    pub const PIPELINE: [WorkflowStage; 7] = [
        Self::Initialization,
        Self::Research,
        Self::OutlineCreation,
        Self::ContentGeneration,
        Self::Review,
        Self::Finalization,
        Self::Complete,
    ];

    /// Stable identifier used in checkpoints and events.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Initialization => "initialization",
            Self::Research => "research",
            Self::OutlineCreation => "outline_creation",
            Self::ContentGeneration => "content_generation",
            Self::Review => "review",
            Self::Finalization => "finalization",
            Self::Complete => "complete",
        }
    }

    /// Human-readable stage name used in checkpoints and events.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initialization => "Initialization",
            Self::Research => "Research",
            Self::OutlineCreation => "Outline creation",
            Self::ContentGeneration => "Content generation",
            Self::Review => "Review",
            Self::Finalization => "Finalization",
            Self::Complete => "Complete",
        }
    }

    /// Cumulative progress percentage reached when this stage begins.
    pub fn progress(&self) -> u8 {
        match self {
            Self::Initialization => 0,
            Self::Research => 15,
            Self::OutlineCreation => 30,
            Self::ContentGeneration => 50,
            Self::Review => 75,
            Self::Finalization => 90,
            Self::Complete => 100,
        }
    }

    /// The stage that follows this one, or `None` at the end of the
    /// pipeline.
    pub fn next(&self) -> Option<WorkflowStage> {
        let idx = Self::PIPELINE.iter().position(|s| s == self)?;
        Self::PIPELINE.get(idx + 1).copied()
    }

    /// Whether this is the final pipeline stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_order_and_bounds() {
        assert_eq!(WorkflowStage::PIPELINE.len(), 7);
        assert_eq!(WorkflowStage::PIPELINE[0], WorkflowStage::Initialization);
        assert_eq!(WorkflowStage::PIPELINE[6], WorkflowStage::Complete);
        assert_eq!(WorkflowStage::PIPELINE[0].progress(), 0);
        assert_eq!(WorkflowStage::PIPELINE[6].progress(), 100);
    }

    #[test]
    fn test_progress_monotonically_non_decreasing() {
        let mut last = 0;
        for stage in WorkflowStage::PIPELINE {
            assert!(stage.progress() >= last, "progress regressed at {stage}");
            last = stage.progress();
        }
    }

    #[test]
    fn test_next_walks_full_pipeline() {
        let mut stage = WorkflowStage::Initialization;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            visited.push(next);
            stage = next;
        }
        assert_eq!(visited, WorkflowStage::PIPELINE);
        assert!(stage.is_terminal());
    }

    #[test]
    fn test_only_complete_is_terminal() {
        for stage in WorkflowStage::PIPELINE {
            assert_eq!(stage.is_terminal(), stage == WorkflowStage::Complete);
        }
    }

    #[test]
    fn test_stage_serializes_as_id() {
        let json = serde_json::to_string(&WorkflowStage::OutlineCreation).unwrap();
        assert_eq!(json, r#""outline_creation""#);

        let parsed: WorkflowStage = serde_json::from_str(r#""content_generation""#).unwrap();
        assert_eq!(parsed, WorkflowStage::ContentGeneration);
    }

    #[test]
    fn test_display_matches_id() {
        for stage in WorkflowStage::PIPELINE {
            assert_eq!(stage.to_string(), stage.id());
        }
    }
}
