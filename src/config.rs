//! Configuration types for document summarization.
//!
//! All behaviour is controlled through [`SummaryConfig`], built via its
//! [`SummaryConfigBuilder`]. Callers set only what they care about and rely
//! on documented defaults for the rest.

use crate::backend::GenerateBackend;
use crate::error::DocsumError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Model tried after the user's preference, before the static fallbacks.
pub const PREFERRED_MODEL: &str = "gemini-2.0-flash";

/// Static fallback models tried in order when earlier candidates fail with
/// a not-found or overloaded-after-retries classification.
pub const FALLBACK_MODELS: &[&str] = &["gemini-1.5-flash", "gemini-1.5-flash-8b"];

/// Coarse target size for a generated summary.
///
/// Each bucket maps to a fixed word-count range that is interpolated into the
/// instruction prompt verbatim; the model sees the range, not the bucket name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthBucket {
    /// Roughly 50–80 words.
    Short,
    /// Roughly 120–160 words. (default)
    #[default]
    Medium,
    /// Roughly 250–300 words.
    Long,
}

impl LengthBucket {
    /// The word-count range embedded in the prompt, e.g. `"120-160"`.
    pub fn word_range(self) -> &'static str {
        match self {
            LengthBucket::Short => "50-80",
            LengthBucket::Medium => "120-160",
            LengthBucket::Long => "250-300",
        }
    }
}

impl fmt::Display for LengthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthBucket::Short => write!(f, "short"),
            LengthBucket::Medium => write!(f, "medium"),
            LengthBucket::Long => write!(f, "long"),
        }
    }
}

/// Retry schedule applied to every individual model attempt.
///
/// Only overloaded failures (HTTP 503 / `UNAVAILABLE`) are retried; anything
/// else aborts the attempt immediately. The delay before attempt *n* (1-based,
/// no delay before attempt 0) is `base_delay_ms × 2^(n-1)` plus uniform jitter
/// in `[0, max_jitter_ms)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per model, including the first. Default: 5.
    pub max_attempts: u32,
    /// Base backoff delay in milliseconds. Default: 1000.
    pub base_delay_ms: u64,
    /// Exclusive upper bound of the uniform jitter in milliseconds. Default: 200.
    pub max_jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 1000,
            max_jitter_ms: 200,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay to sleep before attempt `next_attempt` (1-based).
    ///
    /// The deterministic part doubles per attempt: 1 s → 2 s → 4 s → 8 s with
    /// the defaults. Callers must not invoke this for attempt 0.
    pub fn delay_before(&self, next_attempt: u32) -> Duration {
        debug_assert!(next_attempt >= 1, "no delay precedes the first attempt");
        let exp = self
            .base_delay_ms
            .saturating_mul(1u64 << (next_attempt - 1).min(32));
        let jitter = if self.max_jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..self.max_jitter_ms)
        };
        Duration::from_millis(exp.saturating_add(jitter))
    }
}

/// Configuration for a summarization call.
///
/// Built via [`SummaryConfig::builder()`] or [`SummaryConfig::default()`].
///
/// # Example
/// ```rust
/// use docsum::SummaryConfig;
///
/// let config = SummaryConfig::builder()
///     .model("gemini-2.5-flash")
///     .max_attempts(3)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SummaryConfig {
    /// Explicit API key. If `None`, `GEMINI_API_KEY` is read from the
    /// environment when the backend is resolved; a key missing from both
    /// places is a hard configuration failure before any network call.
    pub api_key: Option<String>,

    /// User-selected model, tried as the first candidate. If `None`, the
    /// candidate list starts at [`PREFERRED_MODEL`].
    pub model: Option<String>,

    /// Default model tried after the user preference. Exposed so deployments
    /// can re-point the whole fallback chain without rebuilding.
    pub preferred_model: String,

    /// Static fallbacks tried last, in order.
    pub fallback_models: Vec<String>,

    /// Retry schedule for each individual model attempt.
    pub retry: RetryPolicy,

    /// Per-request transport timeout in seconds. Default: 120.
    ///
    /// The orchestrator enforces no timeout of its own beyond the retry
    /// schedule; this is the underlying HTTP client's timeout.
    pub api_timeout_secs: u64,

    /// Pre-constructed generation backend. Takes precedence over `api_key`.
    ///
    /// Useful in tests or when the caller wants custom middleware between
    /// the orchestrator and the wire.
    pub backend: Option<Arc<dyn GenerateBackend>>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            preferred_model: PREFERRED_MODEL.to_string(),
            fallback_models: FALLBACK_MODELS.iter().map(|m| m.to_string()).collect(),
            retry: RetryPolicy::default(),
            api_timeout_secs: 120,
            backend: None,
        }
    }
}

impl fmt::Debug for SummaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("preferred_model", &self.preferred_model)
            .field("fallback_models", &self.fallback_models)
            .field("retry", &self.retry)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn GenerateBackend>"))
            .finish()
    }
}

impl SummaryConfig {
    /// Create a new builder for `SummaryConfig`.
    pub fn builder() -> SummaryConfigBuilder {
        SummaryConfigBuilder {
            config: Self::default(),
        }
    }

    /// The ordered, de-duplicated model candidate list for one logical call:
    /// `[user preference, preferred default, ...static fallbacks]`.
    ///
    /// De-duplication preserves first occurrence, so a user preference equal
    /// to the default is tried exactly once and order never changes. Empty
    /// identifiers are skipped.
    pub fn candidate_models(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let chain = self
            .model
            .iter()
            .chain(std::iter::once(&self.preferred_model))
            .chain(self.fallback_models.iter());
        for m in chain {
            if !m.is_empty() && !out.iter().any(|seen| seen == m) {
                out.push(m.clone());
            }
        }
        out
    }
}

/// Builder for [`SummaryConfig`].
#[derive(Debug)]
pub struct SummaryConfigBuilder {
    config: SummaryConfig,
}

impl SummaryConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn preferred_model(mut self, model: impl Into<String>) -> Self {
        self.config.preferred_model = model.into();
        self
    }

    pub fn fallback_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.fallback_models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.retry.max_attempts = n.max(1);
        self
    }

    pub fn base_delay_ms(mut self, ms: u64) -> Self {
        self.config.retry.base_delay_ms = ms;
        self
    }

    pub fn max_jitter_ms(mut self, ms: u64) -> Self {
        self.config.retry.max_jitter_ms = ms;
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn backend(mut self, backend: Arc<dyn GenerateBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SummaryConfig, DocsumError> {
        let c = &self.config;
        if c.retry.max_attempts == 0 {
            return Err(DocsumError::InvalidConfig(
                "retry.max_attempts must be ≥ 1".into(),
            ));
        }
        if c.preferred_model.is_empty() && c.model.is_none() && c.fallback_models.is_empty() {
            return Err(DocsumError::InvalidConfig(
                "at least one candidate model is required".into(),
            ));
        }
        Ok(self.config)
    }
}
