//! Public entry points: one logical generation call per function.
//!
//! Two operations exist, matching the two things a caller can ask for:
//!
//! * [`extract_and_summarize`] — document in, verbatim text + Markdown
//!   summary out, via the constrained JSON envelope.
//! * [`resummarize`] — previously extracted text in, a fresh Markdown summary
//!   at a different target length out, no envelope.
//!
//! Both run the same candidate/retry/fallback orchestration underneath
//! ([`crate::pipeline::orchestrate`]); the only differences are the request
//! parts and how the response text is interpreted.

use crate::backend::{GenerateBackend, GenerateRequest, GeminiBackend, RequestPart};
use crate::config::{LengthBucket, SummaryConfig};
use crate::error::DocsumError;
use crate::output::{DocumentSummary, Extraction, SummaryText};
use crate::pipeline::{encode, input::Document, orchestrate};
use crate::prompts;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Extract the document's text and produce a Markdown summary in one call.
///
/// Builds a single multimodal request (inline document + instruction),
/// drives it across the model candidate list with retry and fallback, and
/// parses the constrained two-field JSON envelope. A response that is not
/// valid JSON or is missing a field is a fatal [`DocsumError::MalformedResponse`]:
/// it is neither retried nor a fallback trigger, because a model that answered
/// in the wrong shape once will do so again.
pub async fn extract_and_summarize(
    document: &Document,
    length: LengthBucket,
    config: &SummaryConfig,
) -> Result<DocumentSummary, DocsumError> {
    let backend = resolve_backend(config)?;
    let candidates = config.candidate_models();
    let request = extraction_request(document, length);

    info!(
        mime = document.media_type().mime_type(),
        %length,
        candidates = candidates.len(),
        "starting extraction call"
    );

    let (text, stats) =
        orchestrate::generate(backend.as_ref(), &candidates, &config.retry, &request).await?;

    let envelope: Extraction =
        serde_json::from_str(text.trim()).map_err(|e| DocsumError::MalformedResponse {
            model: stats.model.clone(),
            detail: e.to_string(),
        })?;

    debug!(
        model = %stats.model,
        extracted_len = envelope.extracted_text.len(),
        summary_len = envelope.summary.len(),
        duration_ms = stats.duration_ms,
        "extraction call complete"
    );

    Ok(DocumentSummary {
        extracted_text: envelope.extracted_text,
        summary: envelope.summary,
        stats,
    })
}

/// Regenerate a summary from previously extracted text at a different length.
///
/// The raw response text is the summary — no envelope, no post-processing.
///
/// # Preconditions
/// `extracted_text` must be non-empty; an empty (or whitespace-only) input is
/// a caller-level validation error raised before any network activity.
pub async fn resummarize(
    extracted_text: &str,
    length: LengthBucket,
    config: &SummaryConfig,
) -> Result<SummaryText, DocsumError> {
    if extracted_text.trim().is_empty() {
        return Err(DocsumError::EmptyExtractedText);
    }

    let backend = resolve_backend(config)?;
    let candidates = config.candidate_models();
    let request = summary_request(extracted_text, length);

    info!(%length, candidates = candidates.len(), "starting resummarize call");

    let (markdown, stats) =
        orchestrate::generate(backend.as_ref(), &candidates, &config.retry, &request).await?;

    debug!(
        model = %stats.model,
        summary_len = markdown.len(),
        duration_ms = stats.duration_ms,
        "resummarize call complete"
    );

    Ok(SummaryText { markdown, stats })
}

/// Summarize a document and write the Markdown summary to a file.
///
/// Uses atomic write (temp file + rename) so a crash mid-write never leaves
/// a partial summary on disk.
pub async fn summarize_to_file(
    document: &Document,
    length: LengthBucket,
    config: &SummaryConfig,
    output_path: impl AsRef<Path>,
) -> Result<DocumentSummary, DocsumError> {
    let result = extract_and_summarize(document, length, config).await?;
    write_atomic(output_path.as_ref(), &result.summary).await?;
    Ok(result)
}

/// Regenerate a summary from extracted text and write the Markdown to a file.
///
/// Same atomic-write behaviour as [`summarize_to_file`].
pub async fn resummarize_to_file(
    extracted_text: &str,
    length: LengthBucket,
    config: &SummaryConfig,
    output_path: impl AsRef<Path>,
) -> Result<SummaryText, DocsumError> {
    let result = resummarize(extracted_text, length, config).await?;
    write_atomic(output_path.as_ref(), &result.markdown).await?;
    Ok(result)
}

/// Atomically write `contents` to `path` via a temp file + rename, creating
/// parent directories as needed.
async fn write_atomic(path: &Path, contents: &str) -> Result<(), DocsumError> {
    let write_failed = |e: std::io::Error| DocsumError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
        }
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_failed)
}

/// Synchronous wrapper around [`extract_and_summarize`].
///
/// Creates a temporary tokio runtime internally.
pub fn summarize_sync(
    document: &Document,
    length: LengthBucket,
    config: &SummaryConfig,
) -> Result<DocumentSummary, DocsumError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocsumError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(extract_and_summarize(document, length, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the generation backend, from most-specific to least-specific:
///
/// 1. **Pre-built backend** (`config.backend`) — used as-is; the test seam
///    and the hook for callers with custom middleware.
/// 2. **Explicit API key** (`config.api_key`).
/// 3. **`GEMINI_API_KEY` environment variable**.
///
/// A key missing from both places is a hard configuration failure raised
/// before any network call is attempted.
fn resolve_backend(config: &SummaryConfig) -> Result<Arc<dyn GenerateBackend>, DocsumError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    let backend = match config.api_key {
        Some(ref key) => GeminiBackend::new(key.clone(), config.api_timeout_secs)?,
        None => GeminiBackend::from_env(config.api_timeout_secs)?,
    };
    Ok(Arc::new(backend))
}

/// Build the multimodal extraction request: inline document first, then the
/// instruction, with the response constrained to the JSON envelope.
fn extraction_request(document: &Document, length: LengthBucket) -> GenerateRequest {
    GenerateRequest {
        parts: vec![
            encode::inline_part(document),
            RequestPart::Text(prompts::extraction_prompt(length)),
        ],
        json_envelope: true,
    }
}

/// Build the text-only resummarize request: instruction part, then the
/// quoted source text. No envelope constraint.
fn summary_request(extracted_text: &str, length: LengthBucket) -> GenerateRequest {
    GenerateRequest::text(vec![
        prompts::summary_prompt(length),
        prompts::summary_text_part(extracted_text),
    ])
}
