//! Runtime tuning for the orchestrator.

use std::time::Duration;

/// Pacing and fan-out parameters for workflow runs.
///
/// Defaults match the production pacing. Tests zero the delays so a
/// full pipeline run completes immediately.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Pause between consecutive pipeline stages.
    pub stage_delay: Duration,
    /// Pause between generated content sections.
    pub section_delay: Duration,
    /// Number of sections produced during content generation.
    pub sections: u32,
    /// How long terminal workflows stay queryable before eviction.
    /// `None` keeps them for the life of the process.
    pub completed_retention: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            stage_delay: Duration::from_millis(1500),
            section_delay: Duration::from_millis(500),
            sections: 5,
            completed_retention: None,
        }
    }
}

impl OrchestratorConfig {
    /// Configuration with all pacing delays removed, for tests.
    pub fn immediate() -> Self {
        Self {
            stage_delay: Duration::ZERO,
            section_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
