//! The raw recognition response: opaque provider JSON persisted verbatim,
//! parsed only far enough to extract the word stream the normalizer needs.
//! Unknown fields are preserved in the original `serde_json::Value` so a
//! human can inspect `source/recognition_raw.json` in full.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use dubcast_foundation::error::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Default for Gender {
    fn default() -> Self {
        Gender::Unknown
    }
}

/// A single recognized word, carrying its own timing and speaker id. This
/// is the atomic unit the normalizer groups into utterances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
    pub speaker_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
}

/// A provider-reported utterance string, used only to source punctuation
/// during reattachment — its own segmentation is not trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderUtterance {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// The raw recognition response as persisted to
/// `source/recognition_raw.json`: the full provider payload, plus the
/// narrow view the rest of the pipeline actually consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecognitionResponse {
    /// The complete, unmodified provider payload.
    pub raw: serde_json::Value,
    pub words: Vec<Word>,
    #[serde(default)]
    pub provider_utterances: Vec<ProviderUtterance>,
}

impl RawRecognitionResponse {
    /// Parses a provider payload into the narrow shape the normalizer
    /// needs, preserving the full document for human inspection. Only the
    /// fields the normalizer actually reads are validated; anything else
    /// in `payload` is carried through untouched in `raw`.
    pub fn from_provider_payload(payload: serde_json::Value) -> Result<Self, ModelError> {
        let words_value = payload.get("words").ok_or_else(|| {
            ModelError::InvalidSequence("recognition response has no \"words\" field".into())
        })?;
        let words: Vec<Word> = serde_json::from_value(words_value.clone())?;

        let provider_utterances = payload
            .get("utterances")
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            raw: payload,
            words,
            provider_utterances,
        })
    }

    /// Builds the `speaker_id → gender` map used by the normalizer and the
    /// subtitle-model builder. The recognition response is the sole ground
    /// truth for a speaker's gender; later words for a speaker with no
    /// gender do not overwrite an already-known value.
    pub fn speaker_genders(&self) -> HashMap<String, Gender> {
        let mut known: HashMap<String, Option<Gender>> = HashMap::new();
        for word in &self.words {
            let entry = known.entry(word.speaker_id.clone()).or_insert(None);
            if entry.is_none() {
                *entry = word.gender;
            }
        }
        known
            .into_iter()
            .map(|(speaker_id, gender)| (speaker_id, gender.unwrap_or_default()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_minimal_payload() {
        let payload = json!({
            "words": [
                {"start_ms": 0, "end_ms": 300, "text": "你好", "speaker_id": "spk_1", "gender": "female"}
            ],
            "extra_provider_field": {"debug": true}
        });
        let response = RawRecognitionResponse::from_provider_payload(payload).unwrap();
        assert_eq!(response.words.len(), 1);
        assert_eq!(response.words[0].speaker_id, "spk_1");
        assert!(response.raw.get("extra_provider_field").is_some());
    }

    #[test]
    fn missing_words_field_is_invalid_sequence() {
        let payload = json!({"not_words": []});
        let err = RawRecognitionResponse::from_provider_payload(payload).unwrap_err();
        assert!(matches!(err, ModelError::InvalidSequence(_)));
    }

    #[test]
    fn speaker_genders_prefers_first_known_value() {
        let payload = json!({
            "words": [
                {"start_ms": 0, "end_ms": 100, "text": "a", "speaker_id": "spk_1", "gender": "male"},
                {"start_ms": 100, "end_ms": 200, "text": "b", "speaker_id": "spk_1"}
            ]
        });
        let response = RawRecognitionResponse::from_provider_payload(payload).unwrap();
        let genders = response.speaker_genders();
        assert_eq!(genders.get("spk_1"), Some(&Gender::Male));
    }

    #[test]
    fn speaker_genders_lets_a_later_word_supply_a_gender_the_first_word_lacked() {
        let payload = json!({
            "words": [
                {"start_ms": 0, "end_ms": 100, "text": "a", "speaker_id": "spk_1"},
                {"start_ms": 100, "end_ms": 200, "text": "b", "speaker_id": "spk_1", "gender": "female"}
            ]
        });
        let response = RawRecognitionResponse::from_provider_payload(payload).unwrap();
        let genders = response.speaker_genders();
        assert_eq!(genders.get("spk_1"), Some(&Gender::Female));
    }

    #[test]
    fn speaker_genders_defaults_to_unknown_when_no_word_ever_carries_one() {
        let payload = json!({
            "words": [
                {"start_ms": 0, "end_ms": 100, "text": "a", "speaker_id": "spk_1"}
            ]
        });
        let response = RawRecognitionResponse::from_provider_payload(payload).unwrap();
        let genders = response.speaker_genders();
        assert_eq!(genders.get("spk_1"), Some(&Gender::Unknown));
    }
}
