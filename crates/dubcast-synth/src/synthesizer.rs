//! Per-utterance synthesis, independently and concurrently: cache
//! lookup by content hash, trim, measure, compress into budget, record in
//! the segment index. A per-item synthesis failure degrades to a recorded
//! `status=failed` entry and a silence blob — it never fails the phase.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use backoff::{future::retry, Error as BackoffError, ExponentialBackoffBuilder};
use tokio::sync::Semaphore;

use dubcast_foundation::error::{DubError, ExternalError};
use dubcast_model::audio::AudioBuffer;
use dubcast_model::dub::DubModel;
use dubcast_model::segment::{SegmentEntry, SegmentIndex, SegmentStatus};
use dubcast_model::voice::VoiceAssignmentSnapshot;

use crate::cache::{cache_path, content_hash, segment_path};
use crate::client::{SynthesisClient, SynthesisRequest};
use crate::ola::time_compress;

#[derive(Debug, Clone)]
pub struct SynthesizerConfig {
    pub concurrency: usize,
    pub synthesizer_version: u32,
    pub silence_threshold: f32,
    pub sample_rate: u32,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            synthesizer_version: 1,
            silence_threshold: 0.01,
            sample_rate: 24_000,
            retry_max_attempts: 4,
            retry_base_delay_ms: 500,
        }
    }
}

/// Synthesizes every utterance in `model`, up to `config.concurrency` at a
/// time. No utterance's synthesis depends on another's — this is the only
/// phase in the pipeline permitted internal parallelism.
pub async fn synthesize_dub_model(
    model: &DubModel,
    voices: &VoiceAssignmentSnapshot,
    client: Arc<dyn SynthesisClient>,
    workspace: &Path,
    config: SynthesizerConfig,
) -> Result<SegmentIndex, DubError> {
    tokio::fs::create_dir_all(workspace.join("tts").join("cache")).await?;
    tokio::fs::create_dir_all(workspace.join("tts").join("segments")).await?;

    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let workspace = workspace.to_path_buf();
    let config = Arc::new(config);

    let mut tasks = Vec::with_capacity(model.utterances.len());
    for utterance in model.utterances.clone() {
        let voice_id = voices
            .assignments
            .get(&utterance.speaker_id)
            .map(|a| a.voice_id.clone())
            .ok_or_else(|| {
                DubError::Model(dubcast_foundation::error::ModelError::UnresolvedVoice(
                    utterance.speaker_id.clone(),
                ))
            })?;

        let semaphore = semaphore.clone();
        let client = client.clone();
        let workspace = workspace.clone();
        let config = config.clone();

        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
            let utt_id = utterance.utt_id.clone();
            let entry = synthesize_one(&utterance, &voice_id, &client, &workspace, &config).await;
            (utt_id, entry)
        }));
    }

    let mut index = SegmentIndex::new();
    for task in tasks {
        let (utt_id, entry) = task.await?;
        index.insert(utt_id, entry);
    }
    Ok(index)
}

async fn synthesize_one(
    utterance: &dubcast_model::dub::DubUtterance,
    voice_id: &str,
    client: &Arc<dyn SynthesisClient>,
    workspace: &Path,
    config: &SynthesizerConfig,
) -> SegmentEntry {
    let hash = content_hash(
        &utterance.text_target,
        voice_id,
        utterance.emotion.as_deref(),
        config.synthesizer_version,
    );
    let blob_path = cache_path(workspace, &hash);
    let out_path = segment_path(workspace, &utterance.utt_id);

    let raw = if blob_path.exists() {
        tracing::debug!(target: "dubcast::synth", utt_id = %utterance.utt_id, %hash, "cache hit");
        match AudioBuffer::read_wav(&blob_path) {
            Ok(buffer) => Some(buffer),
            Err(_) => None,
        }
    } else {
        None
    };

    let buffer = match raw {
        Some(buffer) => buffer,
        None => match fetch_and_process(utterance, voice_id, client, config).await {
            Ok(buffer) => {
                if let Err(err) = write_atomic(&buffer, &blob_path) {
                    tracing::warn!(target: "dubcast::synth", utt_id = %utterance.utt_id, error = %err, "failed to write cache blob");
                }
                buffer
            }
            Err(err) => {
                tracing::warn!(target: "dubcast::synth", utt_id = %utterance.utt_id, error = %err, "synthesis failed, substituting silence");
                let silence = AudioBuffer::silent(config.sample_rate, utterance.budget_ms);
                if let Err(write_err) = write_atomic(&silence, &out_path) {
                    tracing::error!(target: "dubcast::synth", utt_id = %utterance.utt_id, error = %write_err, "failed to write silence fallback");
                }
                return SegmentEntry {
                    wav_path: out_path,
                    voice_id: voice_id.to_string(),
                    duration_ms: silence.duration_ms(),
                    rate: 1.0,
                    content_hash: hash,
                    status: SegmentStatus::Failed,
                };
            }
        },
    };

    if let Err(err) = write_atomic(&buffer, &out_path) {
        tracing::error!(target: "dubcast::synth", utt_id = %utterance.utt_id, error = %err, "failed to write segment file");
    }

    let rate = (buffer.duration_ms() as f64 / utterance.budget_ms.max(1) as f64).max(1.0);
    let applied_rate = rate.min(utterance.tts_policy.max_rate);

    SegmentEntry {
        wav_path: out_path,
        voice_id: voice_id.to_string(),
        duration_ms: buffer.duration_ms(),
        rate: applied_rate,
        content_hash: hash,
        status: SegmentStatus::Succeeded,
    }
}

/// Calls the synthesis service with bounded retry, trims silence, and
/// compresses the result into the utterance's budget if it runs over.
async fn fetch_and_process(
    utterance: &dubcast_model::dub::DubUtterance,
    voice_id: &str,
    client: &Arc<dyn SynthesisClient>,
    config: &SynthesizerConfig,
) -> Result<AudioBuffer, ExternalError> {
    let request = SynthesisRequest {
        text: utterance.text_target.clone(),
        voice_id: voice_id.to_string(),
        emotion: utterance.emotion.clone(),
        rate_hint: None,
    };

    let bytes = synthesize_with_retry(client, &request, config).await?;
    let raw = dubcast_model::audio::AudioBuffer::read_wav_bytes(&bytes).map_err(|e| ExternalError::MalformedResponse {
        service: "synthesis".into(),
        reason: e.to_string(),
    })?;
    let trimmed = raw.trim_silence(config.silence_threshold);

    let duration_ms = trimmed.duration_ms();
    let rate = (duration_ms as f64 / utterance.budget_ms.max(1) as f64).max(1.0);
    if rate <= 1.0 {
        return Ok(trimmed);
    }

    let applied_rate = rate.min(utterance.tts_policy.max_rate);
    let compressed_samples = time_compress(&trimmed.samples, applied_rate);
    Ok(AudioBuffer {
        sample_rate: trimmed.sample_rate,
        samples: compressed_samples,
    })
}

async fn synthesize_with_retry(
    client: &Arc<dyn SynthesisClient>,
    request: &SynthesisRequest,
    config: &SynthesizerConfig,
) -> Result<Vec<u8>, ExternalError> {
    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(config.retry_base_delay_ms))
        .with_max_elapsed_time(None)
        .build();
    let attempts = Arc::new(std::sync::atomic::AtomicU32::new(0));
    let max_attempts = config.retry_max_attempts;

    retry(policy, || {
        let attempts = attempts.clone();
        async move {
            let attempt = attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            match client.synthesize(request).await {
                Ok(bytes) => Ok(bytes),
                Err(err @ ExternalError::Transient { .. }) if attempt < max_attempts => {
                    Err(BackoffError::transient(err))
                }
                Err(err) => Err(BackoffError::permanent(err)),
            }
        }
    })
    .await
}

fn write_atomic(buffer: &AudioBuffer, path: &Path) -> Result<(), dubcast_foundation::error::ModelError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            dubcast_foundation::error::ModelError::InvalidSequence(format!("cannot create {parent:?}: {e}"))
        })?;
    }
    let tmp_path = path.with_extension("wav.tmp");
    buffer.write_wav(&tmp_path)?;
    std::fs::rename(&tmp_path, path)
        .map_err(|e| dubcast_foundation::error::ModelError::InvalidSequence(format!("cannot rename into {path:?}: {e}")))
}
