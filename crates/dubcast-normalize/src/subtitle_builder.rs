//! Builds the subtitle model (SSOT #1) from normalized utterances. Pure
//! transformation: each normalized utterance becomes a subtitle utterance
//! with a single cue spanning its full range. The only side effect is
//! ensuring every speaker seen this episode has an entry in the show-level
//! `speaker_to_role` registry.

use dubcast_model::normalize::NormalizedUtterance;
use dubcast_model::recognition::Gender;
use dubcast_model::registry::SpeakerToRole;
use dubcast_model::subtitle::{
    AudioInfo, Cue, CueSource, Schema, SpeakerInfo, SubtitleModel, SubtitleUtterance,
};

/// Per-speaker metadata the subtitle model carries beyond what the
/// normalizer already knows (speech rate, emotion), keyed by `speaker_id`.
#[derive(Debug, Clone, Default)]
pub struct SpeakerMetadata {
    pub speech_rate: Option<f64>,
    pub emotion: Option<String>,
}

/// Turns normalized utterances into the subtitle model and records any
/// newly seen speakers in `registry` under `episode_key`. Does not
/// overwrite a role a human has already assigned.
pub fn build_subtitle_model(
    utterances: &[NormalizedUtterance],
    lang: &str,
    audio_duration_ms: u64,
    speaker_metadata: impl Fn(&str) -> SpeakerMetadata,
    registry: &mut SpeakerToRole,
    episode_key: &str,
) -> SubtitleModel {
    let speaker_ids = utterances.iter().map(|u| u.speaker_id.clone());
    registry.ensure_speakers(episode_key, speaker_ids);

    let subtitle_utterances = utterances
        .iter()
        .map(|u| to_subtitle_utterance(u, lang, &speaker_metadata(&u.speaker_id)))
        .collect();

    SubtitleModel {
        schema: Schema::default(),
        audio: AudioInfo {
            lang: lang.to_string(),
            duration_ms: audio_duration_ms,
        },
        utterances: subtitle_utterances,
    }
}

fn to_subtitle_utterance(
    u: &NormalizedUtterance,
    lang: &str,
    metadata: &SpeakerMetadata,
) -> SubtitleUtterance {
    SubtitleUtterance {
        utt_id: u.utt_id.clone(),
        speaker: SpeakerInfo {
            id: u.speaker_id.clone(),
            gender: u.gender,
            speech_rate: metadata.speech_rate,
            emotion: metadata.emotion.clone(),
        },
        start_ms: u.start_ms,
        end_ms: u.end_ms,
        text: u.text.clone(),
        cues: vec![Cue {
            start_ms: u.start_ms,
            end_ms: u.end_ms,
            source: CueSource {
                lang: lang.to_string(),
                text: u.text.clone(),
            },
        }],
    }
}

/// Convenience wrapper for callers that have no per-speaker metadata to
/// supply (e.g. early-stage episodes with no speech-rate estimate yet).
pub fn no_speaker_metadata(_speaker_id: &str) -> SpeakerMetadata {
    SpeakerMetadata::default()
}
