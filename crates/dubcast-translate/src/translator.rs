//! Orchestrates per-utterance translation over the subtitle model: builds
//! each utterance's prompt, calls the translation client with bounded
//! exponential backoff on transient failures, and emits the `mt/input.jsonl`
//! / `mt/output.jsonl` records the translate phase persists.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use backoff::{future::retry, Error as BackoffError, ExponentialBackoffBuilder};
use serde::{Deserialize, Serialize};

use dubcast_foundation::error::{DubError, ExternalError};
use dubcast_model::glossary::{DomainHints, Glossary};
use dubcast_model::subtitle::SubtitleModel;

use crate::client::{TranslationClient, TranslationRequest};
use crate::prompt::build_prompt;

#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MtInputRecord {
    pub utt_id: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MtOutputRecord {
    pub utt_id: String,
    pub text_target: String,
}

pub struct TranslationRun {
    pub translations: BTreeMap<String, String>,
    pub input_records: Vec<MtInputRecord>,
    pub output_records: Vec<MtOutputRecord>,
}

/// Translates every utterance in `model`, in order. `episode_context`, when
/// `include_episode_context` is true, is the concatenation of every
/// utterance's source text — the same string for every prompt in the run.
pub async fn translate_subtitle_model(
    model: &SubtitleModel,
    client: &dyn TranslationClient,
    glossary: &Glossary,
    domain_hints: Option<&DomainHints>,
    include_episode_context: bool,
    retry: RetryConfig,
) -> Result<TranslationRun, DubError> {
    let episode_context = include_episode_context.then(|| {
        model
            .utterances
            .iter()
            .map(|u| u.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    });

    let mut translations = BTreeMap::new();
    let mut input_records = Vec::with_capacity(model.utterances.len());
    let mut output_records = Vec::with_capacity(model.utterances.len());

    for utterance in &model.utterances {
        let prompt = build_prompt(
            &utterance.text,
            episode_context.as_deref(),
            include_episode_context,
            glossary,
            domain_hints,
        );
        let rendered = prompt.render();
        input_records.push(MtInputRecord {
            utt_id: utterance.utt_id.clone(),
            prompt: rendered.clone(),
        });

        let request = TranslationRequest { prompt: rendered };
        let text_target = translate_with_retry(client, &request, retry).await?;

        output_records.push(MtOutputRecord {
            utt_id: utterance.utt_id.clone(),
            text_target: text_target.clone(),
        });
        translations.insert(utterance.utt_id.clone(), text_target);
    }

    Ok(TranslationRun {
        translations,
        input_records,
        output_records,
    })
}

/// Retries only `ExternalError::Transient`, up to `retry.max_attempts`,
/// with exponential backoff; permanent and malformed-response errors fail
/// the phase immediately, per the error recovery taxonomy.
async fn translate_with_retry(
    client: &dyn TranslationClient,
    request: &TranslationRequest,
    retry: RetryConfig,
) -> Result<String, DubError> {
    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(retry.base_delay_ms))
        .with_max_elapsed_time(None)
        .build();
    let attempts = Arc::new(AtomicU32::new(0));

    let outcome = retry(policy, || {
        let attempts = attempts.clone();
        async move {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            match client.translate(request).await {
                Ok(text) => Ok(text),
                Err(err @ ExternalError::Transient { .. }) if attempt < retry.max_attempts => {
                    tracing::warn!(
                        target: "dubcast::translate",
                        attempt,
                        error = %err,
                        "transient translation failure, retrying"
                    );
                    Err(BackoffError::transient(err))
                }
                Err(err) => Err(BackoffError::permanent(err)),
            }
        }
    })
    .await;

    outcome.map_err(DubError::External)
}

/// Renders `input_records`/`output_records` as newline-delimited JSON, the
/// format `mt/input.jsonl` and `mt/output.jsonl` are persisted in.
pub fn render_jsonl<T: Serialize>(records: &[T]) -> Result<String, DubError> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record).map_err(dubcast_foundation::error::ModelError::from)?);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dubcast_model::recognition::Gender;
    use dubcast_model::subtitle::{AudioInfo, Cue, CueSource, Schema, SpeakerInfo, SubtitleUtterance};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FlakyClient {
        failures_before_success: usize,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TranslationClient for FlakyClient {
        async fn translate(&self, request: &TranslationRequest) -> Result<String, ExternalError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                return Err(ExternalError::Transient {
                    service: "translation".into(),
                    reason: "simulated 503".into(),
                });
            }
            Ok(format!("translated: {}", request.prompt.lines().last().unwrap_or_default()))
        }
    }

    struct PermanentFailureClient;

    #[async_trait]
    impl TranslationClient for PermanentFailureClient {
        async fn translate(&self, _request: &TranslationRequest) -> Result<String, ExternalError> {
            Err(ExternalError::Permanent {
                service: "translation".into(),
                reason: "bad api key".into(),
            })
        }
    }

    fn sample_model() -> SubtitleModel {
        SubtitleModel {
            schema: Schema::default(),
            audio: AudioInfo {
                lang: "zh".into(),
                duration_ms: 10_000,
            },
            utterances: vec![SubtitleUtterance {
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
                cues: vec![Cue {
                    start_ms: 0,
                    end_ms: 1000,
                    source: CueSource {
                        lang: "zh".into(),
                        text: "你好".into(),
                    },
                }],
            }],
        }
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let client = FlakyClient {
            failures_before_success: 2,
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let run = translate_subtitle_model(
            &sample_model(),
            &client,
            &Glossary::default(),
            None,
            false,
            RetryConfig {
                max_attempts: 4,
                base_delay_ms: 1,
            },
        )
        .await
        .unwrap();
        assert_eq!(run.translations.get("utt_0001").unwrap(), "translated: 你好");
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let client = PermanentFailureClient;
        let result = translate_subtitle_model(
            &sample_model(),
            &client,
            &Glossary::default(),
            None,
            false,
            RetryConfig {
                max_attempts: 4,
                base_delay_ms: 1,
            },
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn jsonl_records_round_trip() {
        let records = vec![
            MtInputRecord {
                utt_id: "utt_0001".into(),
                prompt: "hi".into(),
            },
            MtInputRecord {
                utt_id: "utt_0002".into(),
                prompt: "there".into(),
            },
        ];
        let rendered = render_jsonl(&records).unwrap();
        assert_eq!(rendered.lines().count(), 2);
    }
}
