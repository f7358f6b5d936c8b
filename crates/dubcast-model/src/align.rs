//! Subtitle alignment — derived, persisted to `derive/subtitle_align.json`.
//! Holds the cue rebuild the aligner produces from the dub model's
//! translated text, keyed by `utt_id`. The subtitle model itself (SSOT #1)
//! is never mutated in place; this is where the rebuilt cues live instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::subtitle::Cue;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubtitleAlignment {
    #[serde(flatten)]
    pub cues_by_utterance: BTreeMap<String, Vec<Cue>>,
}

impl SubtitleAlignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, utt_id: impl Into<String>, cues: Vec<Cue>) {
        self.cues_by_utterance.insert(utt_id.into(), cues);
    }

    /// No cue may start before or end after its utterance's declared span —
    /// the invariant "no cue crosses an utterance boundary".
    pub fn cues_within_bounds(&self, utt_id: &str, start_ms: u64, end_ms: u64) -> bool {
        match self.cues_by_utterance.get(utt_id) {
            Some(cues) => cues
                .iter()
                .all(|c| c.start_ms >= start_ms && c.end_ms <= end_ms),
            None => true,
        }
    }
}
