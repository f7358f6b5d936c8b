//! Dub model — SSOT #2. Produced by the aligner from the subtitle model
//! and per-utterance translations; drives synthesis and mixing.

use serde::{Deserialize, Serialize};

use crate::recognition::Gender;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TtsPolicy {
    pub max_rate: f64,
}

impl Default for TtsPolicy {
    fn default() -> Self {
        Self { max_rate: 1.3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DubUtterance {
    pub utt_id: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub budget_ms: u64,
    pub text_source: String,
    pub text_target: String,
    pub speaker_id: String,
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    pub tts_policy: TtsPolicy,
}

impl DubUtterance {
    pub fn budget_matches_span(&self) -> bool {
        self.budget_ms == self.end_ms - self.start_ms
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DubModel {
    pub audio_duration_ms: u64,
    pub utterances: Vec<DubUtterance>,
}

impl DubModel {
    /// `1.0 ≤ max_rate ≤ 1.5` for every utterance and `budget_ms` agrees
    /// with `end_ms − start_ms` — the two per-utterance invariants the
    /// aligner must uphold.
    pub fn utterances_well_formed(&self) -> bool {
        self.utterances.iter().all(|u| {
            u.budget_matches_span() && (1.0..=1.5).contains(&u.tts_policy.max_rate)
        })
    }

    /// For every adjacent pair `(u, u+1)`, `u.end_ms ≤ (u+1).start_ms` —
    /// the no-overlap-after-extension invariant the aligner must uphold.
    pub fn no_overlap_extension(&self) -> bool {
        self.utterances
            .windows(2)
            .all(|pair| pair[0].end_ms <= pair[1].start_ms)
    }
}
