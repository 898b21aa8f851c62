//! Generation-backend seam: the orchestrator talks to `dyn GenerateBackend`,
//! never to the wire directly.
//!
//! The orchestration semantics (candidate fallback, backoff, classification)
//! are tested against scripted implementations of this trait; the only
//! production implementation is [`gemini::GeminiBackend`].

pub mod gemini;

use async_trait::async_trait;
use std::fmt;

pub use gemini::GeminiBackend;

/// One provider-neutral generation request.
///
/// The backend maps this onto its own wire format. `json_envelope` asks the
/// service to constrain the response to the two-field extraction envelope
/// (`extractedText` / `summary`); when false the reply is free-form text.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Ordered request parts: inline document bytes and/or text segments.
    pub parts: Vec<RequestPart>,
    /// Constrain the response to the two-field JSON extraction envelope.
    pub json_envelope: bool,
}

impl GenerateRequest {
    /// A plain text-parts request with no response-schema constraint.
    pub fn text(parts: Vec<String>) -> Self {
        Self {
            parts: parts.into_iter().map(RequestPart::Text).collect(),
            json_envelope: false,
        }
    }
}

/// A single part of a multimodal request body.
#[derive(Debug, Clone)]
pub enum RequestPart {
    /// A text segment (instruction or source text).
    Text(String),
    /// Inline binary content, already base64-encoded.
    InlineData { mime_type: String, data: String },
}

/// A failure reported by the generation service or its transport.
///
/// Carries the raw numeric code and status keyword so the orchestrator can
/// classify it; the classification methods below are the single place that
/// knows which codes mean what.
#[derive(Debug, Clone)]
pub struct BackendError {
    /// Numeric error code from the service error body (or the bare HTTP
    /// status when the body was unparseable). `None` for transport failures.
    pub code: Option<i64>,
    /// Status keyword from the service error body, e.g. `"UNAVAILABLE"`.
    pub status: Option<String>,
    /// Human-readable detail for the log.
    pub message: String,
}

impl BackendError {
    /// A transport-level failure with no service classification.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: None,
            status: None,
            message: message.into(),
        }
    }

    /// The model identifier is unknown to the service → fallback trigger.
    pub fn is_not_found(&self) -> bool {
        self.code == Some(404) || self.status.as_deref() == Some("NOT_FOUND")
    }

    /// The service is overloaded/unavailable → retry trigger, and after
    /// retries are exhausted, fallback trigger.
    pub fn is_overloaded(&self) -> bool {
        self.code == Some(503) || self.status.as_deref() == Some("UNAVAILABLE")
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.status.as_deref()) {
            (Some(code), Some(status)) => write!(f, "{} ({status}): {}", code, self.message),
            (Some(code), None) => write!(f, "{}: {}", code, self.message),
            (None, Some(status)) => write!(f, "{status}: {}", self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for BackendError {}

/// A multimodal content-generation endpoint.
///
/// One call produces the full response text or a classified failure; no
/// partial or streaming output is surfaced. Implementations must be
/// `Send + Sync` so a backend can be shared behind an `Arc`.
#[async_trait]
pub trait GenerateBackend: Send + Sync {
    /// Issue one generation request against `model` and return the response
    /// text. Retry and fallback are the orchestrator's concern, not the
    /// backend's: a single call maps to at most one network request.
    async fn generate(&self, model: &str, request: &GenerateRequest)
        -> Result<String, BackendError>;
}
