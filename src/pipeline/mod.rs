//! Pipeline stages for one logical generation call.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets the orchestration loop
//! be exercised against a scripted backend without touching input handling.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ orchestrate ──▶ parse
//! (path/bytes) (base64) (retry+fallback)  (JSON envelope)
//! ```
//!
//! 1. [`input`]       — load and validate the document (media-type sniffing)
//! 2. [`encode`]      — wrap the raw bytes as a base64 inline request part
//! 3. [`orchestrate`] — drive the generation call across the model candidate
//!    list with retry and backoff; the only stage with network I/O
//!
//! Envelope parsing lives with the public operations in [`crate::summarize`]
//! because a parse failure is fatal for the whole call, not a per-candidate
//! concern.

pub mod encode;
pub mod input;
pub mod orchestrate;
