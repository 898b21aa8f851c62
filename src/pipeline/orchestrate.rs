//! Call orchestration: retry with backoff, then fall back across models.
//!
//! One logical generation call fans out into at most
//! `candidates × max_attempts` sequential network requests:
//!
//! * **Inner loop** — a single model is attempted up to
//!   [`RetryPolicy::max_attempts`] times. Only overloaded failures
//!   (HTTP 503 / `UNAVAILABLE`) are retried; the backoff before attempt *n*
//!   is `base × 2^(n-1)` plus uniform jitter, so with the defaults a fully
//!   busy model costs 1 s + 2 s + 4 s + 8 s of waiting before we give up on it.
//!
//! * **Outer loop** — candidates are tried strictly in order. A model the
//!   service does not recognise (404 / `NOT_FOUND`) or one that stayed
//!   overloaded through all retries falls through to the next candidate.
//!   Any other failure is fatal: it aborts immediately without touching the
//!   remaining candidates, because a bad request or auth failure will fail
//!   identically everywhere.
//!
//! Requests are never issued concurrently; each attempt fully resolves before
//! the next begins, and the first success wins.

use crate::backend::{BackendError, GenerateBackend, GenerateRequest};
use crate::config::RetryPolicy;
use crate::error::DocsumError;
use crate::output::CallStats;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Run one logical generation call across the candidate list.
///
/// Returns the winning model's response text plus call statistics, or the
/// terminal failure after the loop above is exhausted.
pub(crate) async fn generate(
    backend: &dyn GenerateBackend,
    candidates: &[String],
    retry: &RetryPolicy,
    request: &GenerateRequest,
) -> Result<(String, CallStats), DocsumError> {
    let start = Instant::now();
    let mut requests_issued = 0u32;
    let mut last_failure: Option<(String, BackendError)> = None;

    for model in candidates {
        match attempt_with_retry(backend, model, retry, request, &mut requests_issued).await {
            Ok(text) => {
                debug!(%model, attempts = requests_issued, "generation succeeded");
                return Ok((
                    text,
                    CallStats {
                        model: model.clone(),
                        attempts: requests_issued,
                        duration_ms: start.elapsed().as_millis() as u64,
                    },
                ));
            }
            Err(err) if err.is_not_found() => {
                warn!(%model, %err, "model not found, falling back to next candidate");
                last_failure = Some((model.clone(), err));
            }
            Err(err) if err.is_overloaded() => {
                warn!(
                    %model,
                    attempts = retry.max_attempts,
                    %err,
                    "model stayed overloaded, falling back to next candidate"
                );
                last_failure = Some((model.clone(), err));
            }
            Err(err) => {
                // Fatal: abort without trying further candidates.
                warn!(%model, %err, "unrecoverable generation failure");
                return Err(fatal_error(model, err));
            }
        }
    }

    match last_failure {
        Some((model, err)) if err.is_overloaded() => Err(DocsumError::Overloaded {
            model,
            attempts: retry.max_attempts,
        }),
        Some((model, _)) => Err(DocsumError::ModelNotFound { model }),
        None => Err(DocsumError::InvalidConfig(
            "no candidate models to try".into(),
        )),
    }
}

/// Attempt a single model, retrying only on overload.
///
/// `requests_issued` counts every network request made, across retries,
/// for the caller's statistics.
async fn attempt_with_retry(
    backend: &dyn GenerateBackend,
    model: &str,
    retry: &RetryPolicy,
    request: &GenerateRequest,
    requests_issued: &mut u32,
) -> Result<String, BackendError> {
    let mut last_err: Option<BackendError> = None;

    for attempt in 0..retry.max_attempts {
        if attempt > 0 {
            let delay = retry.delay_before(attempt);
            warn!(
                model,
                attempt = attempt + 1,
                max = retry.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "retrying after overload"
            );
            sleep(delay).await;
        }

        *requests_issued += 1;
        match backend.generate(model, request).await {
            Ok(text) => return Ok(text),
            Err(err) if err.is_overloaded() => {
                last_err = Some(err);
            }
            // Everything else — not-found included — aborts the attempt loop
            // immediately and lets the candidate loop classify it.
            Err(err) => return Err(err),
        }
    }

    Err(last_err.unwrap_or_else(|| BackendError::transport("no attempt was made")))
}

/// Convert an unclassified backend failure into the caller-facing error.
fn fatal_error(model: &str, err: BackendError) -> DocsumError {
    DocsumError::Api {
        model: model.to_string(),
        code: err.code,
        status: err.status.clone(),
        message: err.message,
    }
}
