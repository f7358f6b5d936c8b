//! The translation service contract: accepts a source string plus
//! optional context and glossary fragments, returns a single target
//! string. The caller must not depend on determinism — identical inputs
//! may legitimately produce different outputs across calls.

use async_trait::async_trait;
use dubcast_foundation::error::ExternalError;

#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    pub prompt: String,
}

#[async_trait]
pub trait TranslationClient: Send + Sync {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ExternalError>;
}

/// Talks to the configured translation endpoint over HTTP. The wire
/// format is provider-specific and out of this crate's scope; only
/// the request/response shape the normalizer and aligner actually need is
/// modeled here.
pub struct HttpTranslationClient {
    http: reqwest::Client,
    endpoint: String,
    app_id: String,
    token: String,
}

impl HttpTranslationClient {
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
struct TranslateBody<'a> {
    app_id: &'a str,
    prompt: &'a str,
}

#[derive(serde::Deserialize)]
struct TranslateResponse {
    text_target: String,
}

#[async_trait]
impl TranslationClient for HttpTranslationClient {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ExternalError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&TranslateBody {
                app_id: &self.app_id,
                prompt: &request.prompt,
            })
            .send()
            .await
            .map_err(|e| ExternalError::Transient {
                service: "translation".into(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(ExternalError::Transient {
                service: "translation".into(),
                reason: format!("http {status}"),
            });
        }
        if !status.is_success() {
            return Err(ExternalError::Permanent {
                service: "translation".into(),
                reason: format!("http {status}"),
            });
        }

        let body: TranslateResponse = response.json().await.map_err(|e| ExternalError::MalformedResponse {
            service: "translation".into(),
            reason: e.to_string(),
        })?;
        Ok(body.text_target)
    }
}
