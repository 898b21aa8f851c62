//! Gemini `generateContent` REST backend.
//!
//! Maps the provider-neutral [`GenerateRequest`] onto the Gemini wire format
//! and converts service error bodies into classified [`BackendError`]s. All
//! retry and fallback logic lives in the orchestrator; this module performs
//! exactly one HTTP request per call.
//!
//! The API key travels in the `x-goog-api-key` header rather than a query
//! parameter so it never appears in transport logs or proxy access logs.

use super::{BackendError, GenerateBackend, GenerateRequest, RequestPart};
use crate::error::DocsumError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the API key when none is configured explicitly.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

// ── Wire types ───────────────────────────────────────────────────────────

/// Gemini content container used in both requests and responses.
///
/// `parts` defaults to empty on deserialization: a safety-stopped response
/// candidate can omit the field entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

/// Untagged union of text and inline media content parts.
///
/// Variant order matters for `#[serde(untagged)]` decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

/// Base64 inline payload used for document/vision requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    // The REST endpoint takes `contents` as a repeated field; a bare object
    // is rejected with 400 INVALID_ARGUMENT.
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// Top-level `generateContent` response envelope.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

/// Error body shape: `{"error": {"code": 503, "status": "UNAVAILABLE", ...}}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: Option<i64>,
    status: Option<String>,
    message: Option<String>,
}

// ── Backend ──────────────────────────────────────────────────────────────

/// REST client for the Gemini content-generation endpoint.
pub struct GeminiBackend {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiBackend {
    /// Create a backend with an explicit API key.
    ///
    /// An empty key is treated the same as a missing one: a configuration
    /// error, reported before any request is attempted.
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self, DocsumError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(DocsumError::ApiKeyMissing);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create a backend from the `GEMINI_API_KEY` environment variable.
    pub fn from_env(timeout_secs: u64) -> Result<Self, DocsumError> {
        let key = std::env::var(API_KEY_ENV).unwrap_or_default();
        Self::new(key, timeout_secs)
    }

    /// Point the backend at a different endpoint (mock servers in tests,
    /// regional or proxied deployments in production).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_body(request: &GenerateRequest) -> GenerateContentRequest {
        let parts = request
            .parts
            .iter()
            .map(|p| match p {
                RequestPart::Text(text) => Part::Text { text: text.clone() },
                RequestPart::InlineData { mime_type, data } => Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.clone(),
                        data: data.clone(),
                    },
                },
            })
            .collect();

        let generation_config = request.json_envelope.then(|| GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(json!({
                "type": "object",
                "properties": {
                    "extractedText": { "type": "string" },
                    "summary": { "type": "string" }
                },
                "required": ["extractedText", "summary"]
            })),
        });

        GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config,
        }
    }

    /// Join the text parts of the first candidate into the response text.
    fn response_text(response: GenerateContentResponse) -> Result<String, BackendError> {
        let candidate = response.candidates.into_iter().next().ok_or_else(|| {
            BackendError::transport("response contained no candidates")
        })?;
        if candidate.content.parts.is_empty() {
            return Err(BackendError::transport(
                "response candidate contained no parts",
            ));
        }
        let text: String = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text),
                Part::InlineData { .. } => None,
            })
            .collect();
        Ok(text)
    }
}

#[async_trait]
impl GenerateBackend for GeminiBackend {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<String, BackendError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let body = Self::build_body(request);

        debug!(model, parts = request.parts.len(), json_envelope = request.json_envelope, "issuing generateContent request");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::transport(e.to_string()))?;

        let http_status = response.status();
        if !http_status.is_success() {
            let text = response.text().await.unwrap_or_default();
            // Prefer the structured error body; fall back to the bare HTTP
            // status so a 503 without a JSON body still classifies correctly.
            let err = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(parsed) => BackendError {
                    code: parsed.error.code.or(Some(i64::from(http_status.as_u16()))),
                    status: parsed.error.status,
                    message: parsed
                        .error
                        .message
                        .unwrap_or_else(|| format!("HTTP {http_status}")),
                },
                Err(_) => BackendError {
                    code: Some(i64::from(http_status.as_u16())),
                    status: None,
                    message: format!("HTTP {http_status}: {}", text.trim()),
                },
            };
            return Err(err);
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| BackendError::transport(format!("invalid response body: {e}")))?;

        Self::response_text(parsed)
    }
}
