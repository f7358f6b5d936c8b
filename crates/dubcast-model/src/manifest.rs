//! Manifest — one JSON file per episode workspace, keyed by phase name,
//! tracking enough state for the runner's should-run rules and `bless`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub status: PhaseStatus,
    pub version: u32,
    pub config_fingerprint: String,
    pub input_fingerprints: BTreeMap<String, String>,
    pub output_fingerprints: BTreeMap<String, String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `phase_name → PhaseRecord`, one per episode workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(flatten)]
    pub phases: BTreeMap<String, PhaseRecord>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_for(&self, phase_name: &str) -> Option<&PhaseRecord> {
        self.phases.get(phase_name)
    }

    pub fn set_record(&mut self, phase_name: impl Into<String>, record: PhaseRecord) {
        self.phases.insert(phase_name.into(), record);
    }

    pub fn succeeded(&self, phase_name: &str) -> bool {
        matches!(
            self.record_for(phase_name),
            Some(PhaseRecord {
                status: PhaseStatus::Succeeded,
                ..
            })
        )
    }
}
