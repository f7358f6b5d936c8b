//! Voice assignment snapshot — derived, persisted so later runs can audit
//! which resolution branch was taken for each speaker.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceSource {
    Mapped,
    GenderFallback,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceAssignment {
    pub role_id: String,
    pub voice_id: String,
    pub source: VoiceSource,
}

/// `speaker_id → VoiceAssignment`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceAssignmentSnapshot {
    #[serde(flatten)]
    pub assignments: BTreeMap<String, VoiceAssignment>,
}

impl VoiceAssignmentSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, speaker_id: impl Into<String>, assignment: VoiceAssignment) {
        self.assignments.insert(speaker_id.into(), assignment);
    }
}
