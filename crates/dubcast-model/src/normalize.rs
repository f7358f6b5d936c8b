//! The transient, in-memory representation produced by the utterance
//! normalizer before the subtitle-model builder turns it into SSOT #1.

use serde::{Deserialize, Serialize};

use crate::recognition::{Gender, Word};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedUtterance {
    pub utt_id: String,
    pub speaker_id: String,
    pub gender: Gender,
    pub start_ms: u64,
    pub end_ms: u64,
    pub words: Vec<Word>,
    pub text: String,
}

impl NormalizedUtterance {
    /// `start_ms < end_ms` and every word shares this utterance's
    /// `speaker_id` — the two invariants the normalizer must never violate.
    pub fn is_well_formed(&self) -> bool {
        self.start_ms < self.end_ms
            && !self.words.is_empty()
            && self.words.iter().all(|w| w.speaker_id == self.speaker_id)
    }
}
