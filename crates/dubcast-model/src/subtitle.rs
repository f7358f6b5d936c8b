//! Subtitle model — SSOT #1. Produced by the subtitle-model builder from
//! normalized utterances, hand-editable by a human, consumed by translate
//! and align.

use serde::{Deserialize, Serialize};

use crate::recognition::Gender;

pub const SUBTITLE_SCHEMA_NAME: &str = "dubcast.subtitle_model";
pub const SUBTITLE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub version: u32,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            name: SUBTITLE_SCHEMA_NAME.to_string(),
            version: SUBTITLE_SCHEMA_VERSION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioInfo {
    pub lang: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerInfo {
    pub id: String,
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueSource {
    pub lang: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub source: CueSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleUtterance {
    pub utt_id: String,
    pub speaker: SpeakerInfo,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
    pub cues: Vec<Cue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleModel {
    pub schema: Schema,
    pub audio: AudioInfo,
    pub utterances: Vec<SubtitleUtterance>,
}

impl SubtitleModel {
    /// Utterances ordered by `start_ms`, and no two utterances from the
    /// same speaker overlap — the invariant that lets the aligner and
    /// mixer reason about each speaker's timeline independently.
    pub fn is_well_formed(&self) -> bool {
        let ordered = self
            .utterances
            .windows(2)
            .all(|pair| pair[0].start_ms <= pair[1].start_ms);
        if !ordered {
            return false;
        }

        for i in 0..self.utterances.len() {
            for j in (i + 1)..self.utterances.len() {
                let a = &self.utterances[i];
                let b = &self.utterances[j];
                if a.speaker.id != b.speaker.id {
                    continue;
                }
                let overlap = a.start_ms < b.end_ms && b.start_ms < a.end_ms;
                if overlap {
                    return false;
                }
            }
        }
        true
    }
}
