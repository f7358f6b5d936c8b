//! The synthesis service contract: text plus a voice id (and
//! optional emotion/rate) in, raw audio at a known sample rate out.

use async_trait::async_trait;
use dubcast_foundation::error::ExternalError;

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: String,
    pub emotion: Option<String>,
    pub rate_hint: Option<f64>,
}

#[async_trait]
pub trait SynthesisClient: Send + Sync {
    /// Returns raw WAV bytes at a provider-known sample rate.
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, ExternalError>;
}

pub struct HttpSynthesisClient {
    http: reqwest::Client,
    endpoint: String,
    app_id: String,
    token: String,
}

impl HttpSynthesisClient {
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
struct SynthesizeBody<'a> {
    app_id: &'a str,
    text: &'a str,
    voice_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    emotion: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rate_hint: Option<f64>,
}

#[async_trait]
impl SynthesisClient for HttpSynthesisClient {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, ExternalError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&SynthesizeBody {
                app_id: &self.app_id,
                text: &request.text,
                voice_id: &request.voice_id,
                emotion: request.emotion.as_deref(),
                rate_hint: request.rate_hint,
            })
            .send()
            .await
            .map_err(|e| ExternalError::Transient {
                service: "synthesis".into(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(ExternalError::Transient {
                service: "synthesis".into(),
                reason: format!("http {status}"),
            });
        }
        if !status.is_success() {
            return Err(ExternalError::Permanent {
                service: "synthesis".into(),
                reason: format!("http {status}"),
            });
        }

        response.bytes().await.map(|b| b.to_vec()).map_err(|e| ExternalError::MalformedResponse {
            service: "synthesis".into(),
            reason: e.to_string(),
        })
    }
}
