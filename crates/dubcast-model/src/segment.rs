//! Segment index — derived mapping from `utt_id` to the synthesized audio
//! segment's location and provenance. Recreated every time the synthesize
//! phase runs.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentEntry {
    pub wav_path: PathBuf,
    pub voice_id: String,
    pub duration_ms: u64,
    pub rate: f64,
    pub content_hash: String,
    pub status: SegmentStatus,
}

/// `utt_id → SegmentEntry`, keyed with a `BTreeMap` so the persisted JSON
/// has deterministic key order regardless of synthesis concurrency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentIndex {
    #[serde(flatten)]
    pub entries: BTreeMap<String, SegmentEntry>,
}

impl SegmentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, utt_id: impl Into<String>, entry: SegmentEntry) {
        self.entries.insert(utt_id.into(), entry);
    }

    pub fn failed_utterances(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, e)| e.status == SegmentStatus::Failed)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}
