//! Groups the flat word stream into utterances and reattaches punctuation
//! the provider carries only at the utterance level.

use std::collections::HashMap;

use dubcast_model::normalize::NormalizedUtterance;
use dubcast_model::recognition::{Gender, ProviderUtterance, Word};

#[derive(Debug, Clone, Copy)]
pub struct NormalizerConfig {
    pub silence_gap_ms: u64,
    pub max_utterance_ms: u64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            silence_gap_ms: 450,
            max_utterance_ms: 8_000,
        }
    }
}

/// Walks `words` in order, grouping them into utterances, reattaching
/// trailing punctuation from the closest-overlapping provider utterance,
/// and assigning stable-within-this-run `utt_NNNN` identifiers.
pub fn normalize(
    words: &[Word],
    provider_utterances: &[ProviderUtterance],
    speaker_genders: &HashMap<String, Gender>,
    config: &NormalizerConfig,
) -> Vec<NormalizedUtterance> {
    let candidates = group_candidates(words, config.silence_gap_ms, config.max_utterance_ms);

    let mut utterances = Vec::with_capacity(candidates.len());
    let mut next_id = 1u32;
    for candidate in candidates {
        if candidate.is_empty() {
            continue;
        }
        let speaker_id = candidate[0].speaker_id.clone();
        let start_ms = candidate[0].start_ms;
        let end_ms = candidate.last().expect("non-empty candidate").end_ms;
        let gender = speaker_genders.get(&speaker_id).copied().unwrap_or_default();

        let reattached = reattach_punctuation(candidate, start_ms, end_ms, provider_utterances);
        let text: String = reattached.iter().map(|w| w.text.as_str()).collect();

        utterances.push(NormalizedUtterance {
            utt_id: format!("utt_{:04}", next_id),
            speaker_id,
            gender,
            start_ms,
            end_ms,
            words: reattached,
            text,
        });
        next_id += 1;
    }

    utterances
}

/// Opens a new candidate whenever the inter-word gap reaches the silence
/// threshold, the speaker changes (a hard boundary that overrides the
/// other two rules), or the candidate would otherwise exceed its maximum
/// duration.
fn group_candidates(words: &[Word], silence_gap_ms: u64, max_utterance_ms: u64) -> Vec<Vec<Word>> {
    let mut candidates: Vec<Vec<Word>> = Vec::new();

    for word in words {
        let open_new = match candidates.last() {
            None => true,
            Some(current) => {
                let last_word = current.last().expect("a candidate is never left empty");
                let gap = word.start_ms.saturating_sub(last_word.end_ms);
                let speaker_change = word.speaker_id != last_word.speaker_id;
                let prospective_span = word.end_ms.saturating_sub(current[0].start_ms);
                speaker_change || gap >= silence_gap_ms || prospective_span > max_utterance_ms
            }
        };

        if open_new {
            candidates.push(vec![word.clone()]);
        } else {
            candidates.last_mut().expect("just checked").push(word.clone());
        }
    }

    candidates
}

fn is_punctuation(ch: char) -> bool {
    matches!(
        ch,
        '，' | '。'
            | '！'
            | '？'
            | '、'
            | '；'
            | '：'
            | '\u{201c}'
            | '\u{201d}'
            | '\u{2018}'
            | '\u{2019}'
            | '（'
            | '）'
            | '《'
            | '》'
            | '…'
            | '—'
            | ','
            | '.'
            | '!'
            | '?'
            | ';'
            | ':'
            | '\''
            | '"'
            | '('
            | ')'
    )
}

/// Finds the provider utterance whose time range overlaps the candidate's
/// the most. Returns `None` if no provider utterance overlaps at all, in
/// which case words keep no trailing punctuation.
fn best_overlapping_utterance<'a>(
    start_ms: u64,
    end_ms: u64,
    provider_utterances: &'a [ProviderUtterance],
) -> Option<&'a ProviderUtterance> {
    provider_utterances
        .iter()
        .filter_map(|utterance| {
            let overlap_start = start_ms.max(utterance.start_ms);
            let overlap_end = end_ms.min(utterance.end_ms);
            let overlap = overlap_end.saturating_sub(overlap_start);
            (overlap > 0).then_some((overlap, utterance))
        })
        .max_by_key(|(overlap, _)| *overlap)
        .map(|(_, utterance)| utterance)
}

/// For each word, if it can be located in the overlap-matched provider
/// text from the current cursor onward, appends whatever punctuation
/// characters immediately follow the match.
fn reattach_punctuation(
    words: Vec<Word>,
    start_ms: u64,
    end_ms: u64,
    provider_utterances: &[ProviderUtterance],
) -> Vec<Word> {
    let Some(utterance) = best_overlapping_utterance(start_ms, end_ms, provider_utterances) else {
        return words;
    };
    let chars: Vec<char> = utterance.text.chars().collect();
    let mut cursor = 0usize;

    words
        .into_iter()
        .map(|mut word| {
            let token: Vec<char> = word.text.chars().collect();
            if token.is_empty() || token.len() > chars.len() {
                return word;
            }
            if let Some(match_start) = find_from(&chars, &token, cursor) {
                let mut i = match_start + token.len();
                let mut suffix = String::new();
                while i < chars.len() && is_punctuation(chars[i]) {
                    suffix.push(chars[i]);
                    i += 1;
                }
                word.text.push_str(&suffix);
                cursor = i;
            }
            word
        })
        .collect()
}

fn find_from(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || from + needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| &haystack[i..i + needle.len()] == needle)
}

#[cfg(test)]
fn word(start: u64, end: u64, text: &str, speaker: &str) -> Word {
    Word {
        start_ms: start,
        end_ms: end,
        text: text.to_string(),
        speaker_id: speaker.to_string(),
        gender: None,
        emotion: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_gap_opens_a_new_candidate() {
        let words = vec![
            word(0, 300, "a", "spk_1"),
            word(310, 600, "b", "spk_1"),
            word(1200, 1500, "c", "spk_1"),
        ];
        let genders = HashMap::new();
        let utterances = normalize(&words, &[], &genders, &NormalizerConfig::default());
        assert_eq!(utterances.len(), 2);
        assert_eq!(utterances[0].words.len(), 2);
        assert_eq!(utterances[1].words.len(), 1);
    }

    #[test]
    fn speaker_change_is_a_hard_boundary_even_without_a_gap() {
        let words = vec![word(0, 300, "a", "spk_1"), word(300, 600, "b", "spk_2")];
        let genders = HashMap::new();
        let utterances = normalize(&words, &[], &genders, &NormalizerConfig::default());
        assert_eq!(utterances.len(), 2);
        assert_eq!(utterances[0].speaker_id, "spk_1");
        assert_eq!(utterances[1].speaker_id, "spk_2");
    }

    #[test]
    fn max_utterance_duration_forces_a_split() {
        let words = vec![
            word(0, 5_000, "a", "spk_1"),
            word(5_050, 9_000, "b", "spk_1"),
        ];
        let genders = HashMap::new();
        let config = NormalizerConfig {
            silence_gap_ms: 450,
            max_utterance_ms: 8_000,
        };
        let utterances = normalize(&words, &[], &genders, &config);
        assert_eq!(utterances.len(), 2, "second word would push the span past 8000ms");
    }

    #[test]
    fn punctuation_is_reattached_from_the_overlapping_provider_utterance() {
        let words = vec![word(0, 300, "你好", "spk_1"), word(310, 600, "世界", "spk_1")];
        let provider = vec![ProviderUtterance {
            start_ms: 0,
            end_ms: 600,
            text: "你好，世界。".to_string(),
        }];
        let genders = HashMap::new();
        let utterances = normalize(&words, &provider, &genders, &NormalizerConfig::default());
        assert_eq!(utterances.len(), 1);
        assert_eq!(utterances[0].words[0].text, "你好，");
        assert_eq!(utterances[0].words[1].text, "世界。");
        assert_eq!(utterances[0].text, "你好，世界。");
    }

    #[test]
    fn no_overlapping_provider_utterance_leaves_words_unpunctuated() {
        let words = vec![word(0, 300, "你好", "spk_1")];
        let provider = vec![ProviderUtterance {
            start_ms: 10_000,
            end_ms: 10_300,
            text: "你好。".to_string(),
        }];
        let genders = HashMap::new();
        let utterances = normalize(&words, &provider, &genders, &NormalizerConfig::default());
        assert_eq!(utterances[0].words[0].text, "你好");
    }

    #[test]
    fn single_word_candidate_is_kept() {
        let words = vec![word(0, 300, "a", "spk_1")];
        let genders = HashMap::new();
        let utterances = normalize(&words, &[], &genders, &NormalizerConfig::default());
        assert_eq!(utterances.len(), 1);
    }

    #[test]
    fn gender_falls_back_to_unknown_when_speaker_absent_from_map() {
        let words = vec![word(0, 300, "a", "spk_1")];
        let genders = HashMap::new();
        let utterances = normalize(&words, &[], &genders, &NormalizerConfig::default());
        assert_eq!(utterances[0].gender, Gender::Unknown);
    }
}

/// Property tests over arbitrary single-speaker word streams, checking
/// that the three splitting rules hold no matter how durations and gaps
/// are shuffled.
#[cfg(test)]
mod invariant_tests {
    use super::*;
    use proptest::collection::vec as vec_strategy;
    use proptest::prelude::*;

    fn word_stream() -> impl Strategy<Value = Vec<Word>> {
        vec_strategy((1u64..=400, 0u64..=900), 1..30).prop_map(|steps| {
            let mut words = Vec::with_capacity(steps.len());
            let mut cursor = 0u64;
            for (duration, gap) in steps {
                let start = cursor + gap;
                let end = start + duration;
                words.push(word(start, end, "x", "spk_1"));
                cursor = end;
            }
            words
        })
    }

    proptest! {
        #[test]
        fn no_utterance_mixes_speakers(words in word_stream()) {
            let genders = HashMap::new();
            let utterances = normalize(&words, &[], &genders, &NormalizerConfig::default());
            for utt in &utterances {
                prop_assert!(utt.words.iter().all(|w| w.speaker_id == utt.speaker_id));
            }
        }

        #[test]
        fn inter_word_gaps_within_an_utterance_stay_below_the_silence_threshold(words in word_stream()) {
            let config = NormalizerConfig::default();
            let genders = HashMap::new();
            let utterances = normalize(&words, &[], &genders, &config);
            for utt in &utterances {
                for pair in utt.words.windows(2) {
                    let gap = pair[1].start_ms.saturating_sub(pair[0].end_ms);
                    prop_assert!(gap < config.silence_gap_ms);
                }
            }
        }

        #[test]
        fn utterance_span_respects_the_max_duration_unless_a_single_word_exceeds_it(words in word_stream()) {
            let config = NormalizerConfig::default();
            let genders = HashMap::new();
            let utterances = normalize(&words, &[], &genders, &config);
            for utt in &utterances {
                let span = utt.end_ms.saturating_sub(utt.start_ms);
                prop_assert!(span <= config.max_utterance_ms || utt.words.len() == 1);
            }
        }

        #[test]
        fn every_input_word_survives_into_exactly_one_utterance(words in word_stream()) {
            let genders = HashMap::new();
            let input_count = words.len();
            let utterances = normalize(&words, &[], &genders, &NormalizerConfig::default());
            let output_count: usize = utterances.iter().map(|u| u.words.len()).sum();
            prop_assert_eq!(input_count, output_count);
        }
    }
}
