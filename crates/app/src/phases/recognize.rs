//! Calls the speech-recognition provider over `audio/vocals.wav` and
//! persists its response as `source/recognition_raw.json`. No dedicated
//! library crate backs this phase — unlike translation and synthesis, the
//! provider's wire format is not otherwise reused, so the client lives here.
//!
//! Recognition is asynchronous on the provider side: a submit call returns
//! a job id, and the result is only available by polling a status endpoint
//! until the job completes or a wall-clock deadline elapses.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use backoff::{future::retry, Error as BackoffError, ExponentialBackoffBuilder};
use base64::Engine;

use dubcast_foundation::error::{DubError, ExternalError};
use dubcast_model::recognition::RawRecognitionResponse;
use dubcast_pipeline::phase::{OutputSpec, Phase, PhaseContext};

use crate::workspace::{AUDIO_VOCALS, RECOGNITION_RAW};

/// The outcome of a single poll against a recognition job.
pub enum RecognitionPoll {
    Pending,
    Done(serde_json::Value),
}

#[async_trait]
pub trait RecognitionClient: Send + Sync {
    /// Submits audio for recognition, returning the provider's job id.
    async fn submit(&self, audio_bytes: &[u8]) -> Result<String, ExternalError>;
    /// Checks a previously submitted job's status.
    async fn poll(&self, job_id: &str) -> Result<RecognitionPoll, ExternalError>;
}

pub struct HttpRecognitionClient {
    http: reqwest::Client,
    endpoint: String,
    app_id: String,
    token: String,
}

impl HttpRecognitionClient {
    pub fn new(endpoint: impl Into<String>, app_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            app_id: app_id.into(),
            token: token.into(),
        }
    }
}

#[derive(serde::Serialize)]
struct RecognizeBody<'a> {
    app_id: &'a str,
    audio_base64: String,
}

#[derive(serde::Deserialize)]
struct SubmitResponse {
    job_id: String,
}

fn classify_http_status(service: &str, status: reqwest::StatusCode) -> Option<ExternalError> {
    if status.is_server_error() || status.as_u16() == 429 {
        return Some(ExternalError::Transient {
            service: service.to_string(),
            reason: format!("http {status}"),
        });
    }
    if !status.is_success() {
        return Some(ExternalError::Permanent {
            service: service.to_string(),
            reason: format!("http {status}"),
        });
    }
    None
}

#[async_trait]
impl RecognitionClient for HttpRecognitionClient {
    async fn submit(&self, audio_bytes: &[u8]) -> Result<String, ExternalError> {
        let body = RecognizeBody {
            app_id: &self.app_id,
            audio_base64: base64::engine::general_purpose::STANDARD.encode(audio_bytes),
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExternalError::Transient {
                service: "recognition".into(),
                reason: e.to_string(),
            })?;

        if let Some(err) = classify_http_status("recognition", response.status()) {
            return Err(err);
        }

        let submitted: SubmitResponse =
            response.json().await.map_err(|e| ExternalError::MalformedResponse {
                service: "recognition".into(),
                reason: e.to_string(),
            })?;
        Ok(submitted.job_id)
    }

    async fn poll(&self, job_id: &str) -> Result<RecognitionPoll, ExternalError> {
        let url = format!("{}/jobs/{}", self.endpoint, job_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ExternalError::Transient {
                service: "recognition".into(),
                reason: e.to_string(),
            })?;

        if let Some(err) = classify_http_status("recognition", response.status()) {
            return Err(err);
        }

        let body: serde_json::Value = response.json().await.map_err(|e| ExternalError::MalformedResponse {
            service: "recognition".into(),
            reason: e.to_string(),
        })?;

        match body.get("status").and_then(|v| v.as_str()) {
            Some("pending") => Ok(RecognitionPoll::Pending),
            Some("done") => Ok(RecognitionPoll::Done(body)),
            other => Err(ExternalError::MalformedResponse {
                service: "recognition".into(),
                reason: format!("unexpected job status field: {other:?}"),
            }),
        }
    }
}

pub struct RecognizePhase {
    pub client: Arc<dyn RecognitionClient>,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    /// Initial delay between polls; doubles after each pending response, up
    /// to `POLL_BACKOFF_CAP_MS`.
    pub poll_interval_ms: u64,
    /// Total wall-clock budget for the submit-to-done poll loop. Exceeding
    /// it is a phase failure distinct from ordinary retry exhaustion.
    pub poll_deadline_secs: u64,
}

#[async_trait]
impl Phase for RecognizePhase {
    fn name(&self) -> &str {
        "recognize"
    }

    fn version(&self) -> u32 {
        2
    }

    fn requires(&self) -> Vec<String> {
        vec!["audio.vocals".to_string()]
    }

    fn provides(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::file("recognition_raw", RECOGNITION_RAW)]
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<(), DubError> {
        let vocals_path = ctx.resolve(Path::new(AUDIO_VOCALS));
        let audio_bytes = tokio::fs::read(&vocals_path).await?;

        let job_id = submit_with_retry(
            self.client.as_ref(),
            &audio_bytes,
            self.retry_max_attempts,
            self.retry_base_delay_ms,
        )
        .await?;

        let payload = poll_until_done(
            self.client.as_ref(),
            &job_id,
            ctx,
            self.poll_interval_ms,
            self.poll_deadline_secs,
        )
        .await?;
        let response = RawRecognitionResponse::from_provider_payload(payload)?;

        let out_path = ctx.resolve(Path::new(RECOGNITION_RAW));
        if let Some(parent) = out_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(&response).map_err(dubcast_foundation::error::ModelError::from)?;
        tokio::fs::write(&out_path, json).await?;
        Ok(())
    }
}

async fn submit_with_retry(
    client: &dyn RecognitionClient,
    audio_bytes: &[u8],
    max_attempts: u32,
    base_delay_ms: u64,
) -> Result<String, DubError> {
    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(base_delay_ms))
        .with_max_elapsed_time(None)
        .build();
    let attempts = Arc::new(AtomicU32::new(0));

    let outcome = retry(policy, || {
        let attempts = attempts.clone();
        async move {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            match client.submit(audio_bytes).await {
                Ok(job_id) => Ok(job_id),
                Err(err @ ExternalError::Transient { .. }) if attempt < max_attempts => {
                    tracing::warn!(
                        target: "dubcast::recognize",
                        attempt,
                        error = %err,
                        "transient recognition submit failure, retrying"
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

const POLL_BACKOFF_CAP_MS: u64 = 30_000;

/// Polls a submitted recognition job until it completes, using bounded
/// exponential backoff between attempts and a total wall-clock deadline.
/// The `sleep` below is the canonical suspension point for cancellation:
/// every iteration checks `ctx.cancelled()` before waiting on the provider
/// again.
async fn poll_until_done(
    client: &dyn RecognitionClient,
    job_id: &str,
    ctx: &PhaseContext,
    poll_interval_ms: u64,
    poll_deadline_secs: u64,
) -> Result<serde_json::Value, DubError> {
    let deadline = Duration::from_secs(poll_deadline_secs);
    let started = Instant::now();
    let mut interval_ms = poll_interval_ms.max(1);

    loop {
        if ctx.cancelled() {
            return Err(DubError::ShutdownRequested);
        }

        let elapsed = started.elapsed();
        if elapsed >= deadline {
            return Err(DubError::External(ExternalError::Timeout {
                service: "recognition".into(),
                elapsed,
            }));
        }

        match client.poll(job_id).await {
            Ok(RecognitionPoll::Done(payload)) => return Ok(payload),
            Ok(RecognitionPoll::Pending) => {
                tracing::debug!(target: "dubcast::recognize", job_id, "recognition job still pending");
            }
            Err(err @ ExternalError::Transient { .. }) => {
                tracing::warn!(
                    target: "dubcast::recognize",
                    error = %err,
                    "transient recognition poll failure, retrying"
                );
            }
            Err(err) => return Err(DubError::External(err)),
        }

        let remaining = deadline.saturating_sub(started.elapsed());
        let wait = Duration::from_millis(interval_ms).min(remaining);
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        interval_ms = (interval_ms * 2).min(POLL_BACKOFF_CAP_MS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    struct FakeClient {
        poll_results: Mutex<Vec<Result<RecognitionPoll, ExternalError>>>,
        poll_count: AtomicUsize,
    }

    #[async_trait]
    impl RecognitionClient for FakeClient {
        async fn submit(&self, _audio_bytes: &[u8]) -> Result<String, ExternalError> {
            Ok("job-1".to_string())
        }

        async fn poll(&self, _job_id: &str) -> Result<RecognitionPoll, ExternalError> {
            self.poll_count.fetch_add(1, Ordering::SeqCst);
            let mut results = self.poll_results.lock().unwrap();
            if results.is_empty() {
                return Ok(RecognitionPoll::Pending);
            }
            results.remove(0)
        }
    }

    async fn phase_context() -> PhaseContext {
        PhaseContext {
            workspace: std::env::temp_dir(),
            shutdown: dubcast_foundation::shutdown::ShutdownHandler::new().install().await,
        }
    }

    #[tokio::test]
    async fn polling_retries_on_pending_until_done() {
        let client = FakeClient {
            poll_results: Mutex::new(vec![
                Ok(RecognitionPoll::Pending),
                Ok(RecognitionPoll::Pending),
                Ok(RecognitionPoll::Done(serde_json::json!({"words": []}))),
            ]),
            poll_count: AtomicUsize::new(0),
        };
        let ctx = phase_context().await;
        let result = poll_until_done(&client, "job-1", &ctx, 1, 30).await.unwrap();
        assert_eq!(result, serde_json::json!({"words": []}));
        assert_eq!(client.poll_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exceeding_the_deadline_surfaces_a_timeout_error() {
        let client = FakeClient {
            poll_results: Mutex::new(Vec::new()),
            poll_count: AtomicUsize::new(0),
        };
        let ctx = phase_context().await;
        let err = poll_until_done(&client, "job-1", &ctx, 10, 0).await.unwrap_err();
        assert!(matches!(err, DubError::External(ExternalError::Timeout { .. })));
    }

    #[tokio::test]
    async fn a_permanent_poll_error_is_not_retried() {
        let client = FakeClient {
            poll_results: Mutex::new(vec![Err(ExternalError::Permanent {
                service: "recognition".into(),
                reason: "job not found".into(),
            })]),
            poll_count: AtomicUsize::new(0),
        };
        let ctx = phase_context().await;
        let err = poll_until_done(&client, "job-1", &ctx, 10, 30).await.unwrap_err();
        assert!(matches!(err, DubError::External(ExternalError::Permanent { .. })));
        assert_eq!(client.poll_count.load(Ordering::SeqCst), 1);
    }
}
