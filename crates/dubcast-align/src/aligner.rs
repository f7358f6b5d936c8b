//! Produces the dub model (SSOT #2) from the subtitle model and the
//! translator's per-utterance output, and rebuilds cues time-proportionally
//! from the translated text.

use std::collections::BTreeMap;

use dubcast_foundation::error::ModelError;
use dubcast_model::align::SubtitleAlignment;
use dubcast_model::dub::{DubModel, DubUtterance, TtsPolicy};
use dubcast_model::subtitle::{Cue, CueSource, SubtitleModel};

#[derive(Debug, Clone)]
pub struct AlignerConfig {
    pub default_max_rate: f64,
    pub cue_chars: usize,
    pub end_extension_ms: u64,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            default_max_rate: 1.3,
            cue_chars: 42,
            end_extension_ms: 200,
        }
    }
}

pub struct AlignmentResult {
    pub dub_model: DubModel,
    pub subtitle_align: SubtitleAlignment,
}

/// Builds the dub model and the derived cue alignment. `translations` maps
/// `utt_id -> text_target`; `rate_overrides` optionally overrides
/// `default_max_rate` for specific utterances.
pub fn align(
    model: &SubtitleModel,
    translations: &BTreeMap<String, String>,
    target_lang: &str,
    config: &AlignerConfig,
    rate_overrides: &BTreeMap<String, f64>,
) -> Result<AlignmentResult, ModelError> {
    let mut dub_utterances = Vec::with_capacity(model.utterances.len());
    let mut subtitle_align = SubtitleAlignment::new();

    for (index, utterance) in model.utterances.iter().enumerate() {
        let text_target = translations.get(&utterance.utt_id).ok_or_else(|| {
            ModelError::InvalidSequence(format!(
                "no translation found for utterance {}",
                utterance.utt_id
            ))
        })?;

        let next_start_ms = model.utterances.get(index + 1).map(|u| u.start_ms);
        let extended_end_ms = extend_end(utterance.end_ms, config.end_extension_ms, next_start_ms);
        let budget_ms = extended_end_ms - utterance.start_ms;

        let max_rate = rate_overrides
            .get(&utterance.utt_id)
            .copied()
            .unwrap_or(config.default_max_rate)
            .clamp(1.0, 1.5);

        dub_utterances.push(DubUtterance {
            utt_id: utterance.utt_id.clone(),
            start_ms: utterance.start_ms,
            end_ms: extended_end_ms,
            budget_ms,
            text_source: utterance.text.clone(),
            text_target: text_target.clone(),
            speaker_id: utterance.speaker.id.clone(),
            gender: utterance.speaker.gender,
            emotion: utterance.speaker.emotion.clone(),
            tts_policy: TtsPolicy { max_rate },
        });

        let cues = rebuild_cues(
            text_target,
            utterance.start_ms,
            extended_end_ms,
            target_lang,
            config.cue_chars,
        );
        subtitle_align.insert(utterance.utt_id.clone(), cues);
    }

    let dub_model = DubModel {
        audio_duration_ms: model.audio.duration_ms,
        utterances: dub_utterances,
    };

    Ok(AlignmentResult {
        dub_model,
        subtitle_align,
    })
}

/// Extends `end_ms` by at most `extension_ms`, but never past `next_start_ms`
/// — the no-overlap invariant required of every adjacent pair.
fn extend_end(end_ms: u64, extension_ms: u64, next_start_ms: Option<u64>) -> u64 {
    let extended = end_ms + extension_ms;
    match next_start_ms {
        Some(next_start) => extended.min(next_start),
        None => extended,
    }
}

/// Splits `text` into cue fragments of at most `cue_chars` characters,
/// distributing `[start_ms, end_ms]` time-proportionally to each fragment's
/// share of the total character count. No fragment crosses the utterance's
/// own span.
fn rebuild_cues(text: &str, start_ms: u64, end_ms: u64, lang: &str, cue_chars: usize) -> Vec<Cue> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![Cue {
            start_ms,
            end_ms,
            source: CueSource {
                lang: lang.to_string(),
                text: String::new(),
            },
        }];
    }

    let fragments = split_into_fragments(&chars, cue_chars);
    let total_chars: usize = fragments.iter().map(|f| f.len()).sum();
    let span_ms = end_ms - start_ms;

    let mut cues = Vec::with_capacity(fragments.len());
    let mut cursor_ms = start_ms;
    let mut chars_consumed = 0usize;

    for (index, fragment) in fragments.iter().enumerate() {
        chars_consumed += fragment.len();
        let fragment_end_ms = if index == fragments.len() - 1 {
            end_ms
        } else {
            start_ms + (span_ms * chars_consumed as u64) / (total_chars as u64)
        };
        cues.push(Cue {
            start_ms: cursor_ms,
            end_ms: fragment_end_ms,
            source: CueSource {
                lang: lang.to_string(),
                text: fragment.iter().collect(),
            },
        });
        cursor_ms = fragment_end_ms;
    }
    cues
}

fn split_into_fragments(chars: &[char], cue_chars: usize) -> Vec<Vec<char>> {
    if cue_chars == 0 {
        return vec![chars.to_vec()];
    }
    chars.chunks(cue_chars).map(|c| c.to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dubcast_model::recognition::Gender;
    use dubcast_model::subtitle::{AudioInfo, Cue as SubtitleCue, CueSource as SubtitleCueSource, Schema, SpeakerInfo, SubtitleUtterance};

    fn model_with_two_utterances() -> SubtitleModel {
        SubtitleModel {
            schema: Schema::default(),
            audio: AudioInfo {
                lang: "zh".into(),
                duration_ms: 10_000,
            },
            utterances: vec![
                SubtitleUtterance {
                    utt_id: "utt_0001".into(),
                    speaker: SpeakerInfo {
                        id: "spk_1".into(),
                        gender: Gender::Female,
                        speech_rate: None,
                        emotion: None,
                    },
                    start_ms: 0,
                    end_ms: 1000,
                    text: "你好".into(),
                    cues: vec![SubtitleCue {
                        start_ms: 0,
                        end_ms: 1000,
                        source: SubtitleCueSource {
                            lang: "zh".into(),
                            text: "你好".into(),
                        },
                    }],
                },
                SubtitleUtterance {
                    utt_id: "utt_0002".into(),
                    speaker: SpeakerInfo {
                        id: "spk_1".into(),
                        gender: Gender::Female,
                        speech_rate: None,
                        emotion: None,
                    },
                    start_ms: 1100,
                    end_ms: 2000,
                    text: "世界".into(),
                    cues: vec![],
                },
            ],
        }
    }

    #[test]
    fn end_extension_never_passes_next_start() {
        let model = model_with_two_utterances();
        let translations = BTreeMap::from([
            ("utt_0001".to_string(), "hello".to_string()),
            ("utt_0002".to_string(), "world".to_string()),
        ]);
        let result = align(&model, &translations, "en", &AlignerConfig::default(), &BTreeMap::new()).unwrap();
        assert!(result.dub_model.no_overlap_extension());
        assert_eq!(result.dub_model.utterances[0].end_ms, 1100);
    }

    #[test]
    fn budget_matches_span_for_every_utterance() {
        let model = model_with_two_utterances();
        let translations = BTreeMap::from([
            ("utt_0001".to_string(), "hello".to_string()),
            ("utt_0002".to_string(), "world".to_string()),
        ]);
        let result = align(&model, &translations, "en", &AlignerConfig::default(), &BTreeMap::new()).unwrap();
        assert!(result.dub_model.utterances_well_formed());
    }

    #[test]
    fn missing_translation_is_an_error() {
        let model = model_with_two_utterances();
        let translations = BTreeMap::from([("utt_0001".to_string(), "hello".to_string())]);
        let result = align(&model, &translations, "en", &AlignerConfig::default(), &BTreeMap::new());
        assert!(result.is_err());
    }

    #[test]
    fn long_text_is_split_into_multiple_cues_without_crossing_bounds() {
        let mut model = model_with_two_utterances();
        model.utterances.truncate(1);
        model.utterances[0].end_ms = 10_000;
        let long_text = "a".repeat(100);
        let translations = BTreeMap::from([("utt_0001".to_string(), long_text)]);
        let config = AlignerConfig {
            cue_chars: 42,
            ..AlignerConfig::default()
        };
        let result = align(&model, &translations, "en", &config, &BTreeMap::new()).unwrap();
        let cues = result.subtitle_align.cues_by_utterance.get("utt_0001").unwrap();
        assert_eq!(cues.len(), 3);
        assert!(result.subtitle_align.cues_within_bounds("utt_0001", 0, 10_000));
    }

    #[test]
    fn rate_override_is_clamped_to_policy_bounds() {
        let mut model = model_with_two_utterances();
        model.utterances.truncate(1);
        let translations = BTreeMap::from([("utt_0001".to_string(), "hello".to_string())]);
        let overrides = BTreeMap::from([("utt_0001".to_string(), 5.0)]);
        let result = align(&model, &translations, "en", &AlignerConfig::default(), &overrides).unwrap();
        assert_eq!(result.dub_model.utterances[0].tts_policy.max_rate, 1.5);
    }
}
