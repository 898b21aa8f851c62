//! Error types for the docsum library.
//!
//! Every failure a generation call can hit is a [`DocsumError`] variant, so
//! callers match on one enum at the orchestrator boundary. The taxonomy
//! mirrors how the orchestrator treats each failure:
//!
//! * configuration and input errors fail **before** any network call;
//! * [`DocsumError::Overloaded`] means retries and fallbacks were exhausted
//!   against busy models — worth trying again later;
//! * [`DocsumError::ModelNotFound`] is what remains when every candidate in
//!   the fallback list was unknown to the service;
//! * everything else is fatal for the call and not retried.
//!
//! UI-facing callers should not show raw error strings: [`DocsumError::user_message`]
//! projects every variant onto a short, stable, user-safe sentence while the
//! classification detail goes to the `tracing` log.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the docsum library.
#[derive(Debug, Error)]
pub enum DocsumError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// No API key was configured and `GEMINI_API_KEY` is unset.
    #[error("API key is not configured.\nSet GEMINI_API_KEY or provide a key via SummaryConfig.")]
    ApiKeyMissing,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file contents match none of the accepted formats (PDF, PNG, JPEG).
    #[error("'{path}' is not a PDF, PNG, or JPEG document.\nFirst bytes: {magic:?}")]
    UnrecognisedDocument { path: PathBuf, magic: [u8; 4] },

    /// A caller-supplied MIME type is outside the accepted set.
    #[error("Unsupported media type '{mime}': expected application/pdf, image/png, or image/jpeg")]
    UnsupportedMediaType { mime: String },

    /// `resummarize` was called with nothing to summarize.
    ///
    /// This is a caller-level validation failure; no request is issued.
    #[error("Cannot generate a summary without extracted text")]
    EmptyExtractedText,

    // ── Generation errors ─────────────────────────────────────────────────
    /// The service did not recognise the model identifier.
    ///
    /// Surfaced only after every candidate in the fallback list failed; a
    /// single unknown candidate silently falls through to the next one.
    #[error("Model '{model}' was not found by the generation service")]
    ModelNotFound { model: String },

    /// The service reported overloaded/unavailable and retries are exhausted.
    #[error("Model '{model}' is overloaded; gave up after {attempts} attempts")]
    Overloaded { model: String, attempts: u32 },

    /// The extraction response was not the required two-field JSON envelope.
    ///
    /// Fatal for the call: a model that answered but answered wrongly will
    /// not be retried, and no fallback candidate is tried.
    #[error("Model '{model}' returned a malformed response: {detail}")]
    MalformedResponse { model: String, detail: String },

    /// The service returned an error that is neither retryable nor a
    /// fallback trigger (bad request, auth failure, content policy, …).
    #[error("Generation request to '{model}' failed: {message}")]
    Api {
        model: String,
        code: Option<i64>,
        status: Option<String>,
        message: String,
    },

    /// The HTTP transport failed before a service response was received.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocsumError {
    /// The short, stable sentence shown to end users.
    ///
    /// Classification detail (model names, status codes, parse positions)
    /// belongs in the log, not on screen. Only three messages exist: the
    /// configuration message, the try-again-later overload message, and a
    /// generic processing failure for everything else.
    pub fn user_message(&self) -> &'static str {
        match self {
            DocsumError::ApiKeyMissing => "API key is not configured.",
            DocsumError::Overloaded { .. } => {
                "The model is temporarily overloaded. Please try again in a moment."
            }
            DocsumError::EmptyExtractedText => "Cannot generate summary without extracted text.",
            _ => "Failed to process the document. Please try again.",
        }
    }

    /// True when the failure is worth presenting as transient to the user.
    pub fn is_transient(&self) -> bool {
        matches!(self, DocsumError::Overloaded { .. })
    }
}
