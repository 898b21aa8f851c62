//! # docsum
//!
//! Summarize PDF and image documents using Gemini multimodal models.
//!
//! ## Why this crate?
//!
//! Getting a reliable answer out of a hosted generation service is less about
//! the request and more about everything around it: busy endpoints return
//! 503s in bursts, model identifiers disappear between API versions, and a
//! "JSON-only" instruction is obeyed only most of the time. This crate wraps
//! one logical call — document in, extracted text and Markdown summary out —
//! in the retry, fallback, and response-validation glue that makes it
//! dependable, and nothing else.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / PNG / JPEG
//!  │
//!  ├─ 1. Input    validate media type by magic bytes
//!  ├─ 2. Encode   raw bytes → base64 inline part
//!  ├─ 3. Generate candidate models in order, 5 retries each on overload
//!  └─ 4. Parse    constrained JSON envelope → { extracted text, summary }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docsum::{extract_and_summarize, Document, LengthBucket, SummaryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key read from GEMINI_API_KEY
//!     let config = SummaryConfig::default();
//!     let document = Document::from_path("report.pdf")?;
//!     let result = extract_and_summarize(&document, LengthBucket::Medium, &config).await?;
//!     println!("{}", result.summary);
//!     eprintln!("model: {}  attempts: {}", result.stats.model, result.stats.attempts);
//!     Ok(())
//! }
//! ```
//!
//! ## Retry and fallback
//!
//! Each candidate model gets up to 5 attempts with exponential backoff
//! (1 s → 2 s → 4 s → 8 s, plus jitter) on overload. A model the service does
//! not recognise, or one that stays overloaded, falls through to the next
//! candidate in `[preference, gemini-2.0-flash, gemini-1.5-flash,
//! gemini-1.5-flash-8b]`; any other failure aborts immediately.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docsum` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! docsum = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod session;
pub mod summarize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{BackendError, GenerateBackend, GenerateRequest, GeminiBackend, RequestPart};
pub use config::{
    LengthBucket, RetryPolicy, SummaryConfig, SummaryConfigBuilder, FALLBACK_MODELS,
    PREFERRED_MODEL,
};
pub use error::DocsumError;
pub use output::{CallStats, DocumentSummary, Extraction, SummaryText};
pub use pipeline::input::{Document, MediaType};
pub use session::{Session, SessionState};
pub use summarize::{
    extract_and_summarize, resummarize, resummarize_to_file, summarize_sync, summarize_to_file,
};
