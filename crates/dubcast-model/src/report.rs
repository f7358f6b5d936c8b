//! `RunSummary` — the ambient, machine-readable record of what a run did:
//! per-phase outcomes and per-item synthesis failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseRunOutcome {
    Ran,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub phase: String,
    pub outcome: PhaseRunOutcome,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub phases: Vec<PhaseSummary>,
    /// `utt_id`s whose synthesis failed and were replaced with silence.
    pub failed_synthesis_items: Vec<String>,
}

impl RunSummary {
    pub fn succeeded(&self) -> bool {
        self.phases
            .iter()
            .all(|p| p.outcome != PhaseRunOutcome::Failed)
    }
}
