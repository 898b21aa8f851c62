//! Integration tests for the generation call orchestration.
//!
//! Every test runs against a scripted in-process backend injected through
//! `SummaryConfig::backend` — no network, no API key. The scripted backend
//! records every request it receives so tests can assert exactly how many
//! calls were made, against which models, and with which request shape.

use async_trait::async_trait;
use docsum::{
    extract_and_summarize, resummarize, resummarize_to_file, BackendError, Document, DocsumError,
    GenerateBackend, GenerateRequest, LengthBucket, RequestPart, SummaryConfig,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ── Scripted backend ─────────────────────────────────────────────────────────

#[derive(Clone)]
enum Reply {
    Ok(&'static str),
    NotFound,
    Overloaded,
    BadRequest,
}

/// Per-model scripted outcomes; a model not in the script always succeeds
/// with its last configured reply, and an exhausted script repeats its final
/// entry (so "always overloaded" needs only one entry).
struct ScriptedService {
    script: Mutex<HashMap<String, Vec<Reply>>>,
    calls: Mutex<Vec<(String, GenerateRequest)>>,
}

impl ScriptedService {
    fn new(script: &[(&str, &[Reply])]) -> Arc<Self> {
        let mut map = HashMap::new();
        for (model, replies) in script {
            let mut v: Vec<Reply> = replies.to_vec();
            v.reverse(); // pop() yields in script order
            map.insert(model.to_string(), v);
        }
        Arc::new(Self {
            script: Mutex::new(map),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn models_called(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }

    fn requests(&self) -> Vec<GenerateRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }
}

#[async_trait]
impl GenerateBackend for ScriptedService {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<String, BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), request.clone()));

        let mut script = self.script.lock().unwrap();
        let replies = script
            .get_mut(model)
            .unwrap_or_else(|| panic!("unscripted model called: {model}"));
        let reply = if replies.len() > 1 {
            replies.pop().unwrap()
        } else {
            replies.last().cloned().expect("script must be non-empty")
        };

        match reply {
            Reply::Ok(body) => Ok(body.to_string()),
            Reply::NotFound => Err(BackendError {
                code: Some(404),
                status: Some("NOT_FOUND".into()),
                message: format!("model {model} not found"),
            }),
            Reply::Overloaded => Err(BackendError {
                code: Some(503),
                status: Some("UNAVAILABLE".into()),
                message: "the model is overloaded".into(),
            }),
            Reply::BadRequest => Err(BackendError {
                code: Some(400),
                status: Some("INVALID_ARGUMENT".into()),
                message: "invalid request".into(),
            }),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

const ENVELOPE: &str = r###"{"extractedText": "Paragraph one.\n\nParagraph two.", "summary": "# Summary of Test\n\n## Key Takeaways\n- a point\n\n## Detailed Explanation\nBecause."}"###;

/// Config whose candidate list is exactly the given models, with the scripted
/// backend injected. Backoff is real but driven under paused tokio time where
/// a test needs the full schedule.
fn config_for(service: Arc<ScriptedService>, candidates: &[&str]) -> SummaryConfig {
    let mut config = SummaryConfig::builder()
        .backend(service)
        .preferred_model(candidates[0])
        .fallback_models(candidates[1..].iter().copied())
        .build()
        .unwrap();
    config.retry.base_delay_ms = 1;
    config.retry.max_jitter_ms = 0;
    config
}

fn png_document() -> Document {
    // Minimal PNG signature; content past the magic is irrelevant here.
    let bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    Document::from_bytes(bytes, "image/png").unwrap()
}

// ── Fallback scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn png_upload_falls_back_past_not_found_model() {
    // m1 returns 404 NOT_FOUND; m2 returns a valid JSON envelope.
    let service = ScriptedService::new(&[
        ("m1", &[Reply::NotFound]),
        ("m2", &[Reply::Ok(ENVELOPE)]),
    ]);
    let config = config_for(Arc::clone(&service), &["m1", "m2"]);

    let result = extract_and_summarize(&png_document(), LengthBucket::Medium, &config)
        .await
        .unwrap();

    // Result equals m2's parsed envelope, field for field.
    assert_eq!(result.extracted_text, "Paragraph one.\n\nParagraph two.");
    assert!(result.summary.starts_with("# Summary of Test"));
    assert_eq!(result.stats.model, "m2");

    // Exactly 2 network calls: m1 once (404 is not retried), m2 once.
    assert_eq!(service.call_count(), 2);
    assert_eq!(service.models_called(), vec!["m1", "m2"]);
}

#[tokio::test]
async fn first_k_failures_then_success_stops_trying() {
    let service = ScriptedService::new(&[
        ("m1", &[Reply::NotFound]),
        ("m2", &[Reply::NotFound]),
        ("m3", &[Reply::Ok(ENVELOPE)]),
        ("m4", &[Reply::Ok(ENVELOPE)]),
    ]);
    let config = config_for(Arc::clone(&service), &["m1", "m2", "m3", "m4"]);

    let result = extract_and_summarize(&png_document(), LengthBucket::Short, &config)
        .await
        .unwrap();

    assert_eq!(result.stats.model, "m3");
    // m4 is never touched once m3 succeeds.
    assert_eq!(service.models_called(), vec!["m1", "m2", "m3"]);
}

#[tokio::test(start_paused = true)]
async fn all_candidates_overloaded_exhausts_full_schedule() {
    // Default policy: 5 attempts per model with 1 s/2 s/4 s/8 s backoff.
    // Paused time makes the sleeps instant while keeping the schedule real.
    let service = ScriptedService::new(&[
        ("m1", &[Reply::Overloaded]),
        ("m2", &[Reply::Overloaded]),
        ("m3", &[Reply::Overloaded]),
    ]);
    let mut config = SummaryConfig::builder()
        .backend(Arc::clone(&service) as Arc<dyn GenerateBackend>)
        .preferred_model("m1")
        .fallback_models(["m2", "m3"])
        .build()
        .unwrap();
    config.retry.max_jitter_ms = 0;

    let err = extract_and_summarize(&png_document(), LengthBucket::Medium, &config)
        .await
        .unwrap_err();

    // 5 attempts × 3 candidates.
    assert_eq!(service.call_count(), 15);
    match &err {
        DocsumError::Overloaded { model, attempts } => {
            assert_eq!(model, "m3");
            assert_eq!(*attempts, 5);
        }
        other => panic!("expected Overloaded, got {other:?}"),
    }
    assert_eq!(
        err.user_message(),
        "The model is temporarily overloaded. Please try again in a moment."
    );
}

#[tokio::test]
async fn overloaded_then_recovered_stays_on_same_model() {
    let service = ScriptedService::new(&[(
        "m1",
        &[Reply::Overloaded, Reply::Overloaded, Reply::Ok(ENVELOPE)],
    )]);
    let config = config_for(Arc::clone(&service), &["m1", "m2"]);

    let result = extract_and_summarize(&png_document(), LengthBucket::Long, &config)
        .await
        .unwrap();

    assert_eq!(result.stats.model, "m1");
    assert_eq!(result.stats.attempts, 3);
    assert_eq!(service.models_called(), vec!["m1", "m1", "m1"]);
}

#[tokio::test]
async fn unclassified_failure_aborts_without_fallback() {
    let service = ScriptedService::new(&[
        ("m1", &[Reply::BadRequest]),
        ("m2", &[Reply::Ok(ENVELOPE)]),
    ]);
    let config = config_for(Arc::clone(&service), &["m1", "m2"]);

    let err = extract_and_summarize(&png_document(), LengthBucket::Medium, &config)
        .await
        .unwrap_err();

    assert!(matches!(err, DocsumError::Api { .. }));
    // No further candidates were tried.
    assert_eq!(service.call_count(), 1);
    assert_eq!(
        err.user_message(),
        "Failed to process the document. Please try again."
    );
}

// ── Envelope parsing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn envelope_fields_are_passed_through_verbatim() {
    let service = ScriptedService::new(&[("m1", &[Reply::Ok(ENVELOPE)])]);
    let config = config_for(Arc::clone(&service), &["m1"]);

    let result = extract_and_summarize(&png_document(), LengthBucket::Medium, &config)
        .await
        .unwrap();

    let expected: serde_json::Value = serde_json::from_str(ENVELOPE).unwrap();
    assert_eq!(result.extracted_text, expected["extractedText"]);
    assert_eq!(result.summary, expected["summary"]);
}

#[tokio::test]
async fn malformed_envelope_is_fatal_not_a_fallback_trigger() {
    let service = ScriptedService::new(&[
        ("m1", &[Reply::Ok("this is not JSON")]),
        ("m2", &[Reply::Ok(ENVELOPE)]),
    ]);
    let config = config_for(Arc::clone(&service), &["m1", "m2"]);

    let err = extract_and_summarize(&png_document(), LengthBucket::Medium, &config)
        .await
        .unwrap_err();

    assert!(matches!(err, DocsumError::MalformedResponse { .. }));
    // The answering model "succeeded" at the wire level; no fallback.
    assert_eq!(service.call_count(), 1);
}

#[tokio::test]
async fn envelope_missing_required_field_is_malformed() {
    let service = ScriptedService::new(&[(
        "m1",
        &[Reply::Ok(r#"{"extractedText": "text but no summary"}"#)],
    )]);
    let config = config_for(Arc::clone(&service), &["m1"]);

    let err = extract_and_summarize(&png_document(), LengthBucket::Medium, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, DocsumError::MalformedResponse { .. }));
}

// ── Request construction ─────────────────────────────────────────────────────

#[tokio::test]
async fn extraction_request_carries_document_and_word_range() {
    let service = ScriptedService::new(&[("m1", &[Reply::Ok(ENVELOPE)])]);
    let config = config_for(Arc::clone(&service), &["m1"]);

    for (bucket, range) in [
        (LengthBucket::Short, "50-80"),
        (LengthBucket::Medium, "120-160"),
        (LengthBucket::Long, "250-300"),
    ] {
        extract_and_summarize(&png_document(), bucket, &config)
            .await
            .unwrap();
        let request = service.requests().pop().unwrap();
        assert!(request.json_envelope);
        assert!(matches!(
            &request.parts[0],
            RequestPart::InlineData { mime_type, .. } if mime_type == "image/png"
        ));
        match &request.parts[1] {
            RequestPart::Text(text) => {
                assert!(
                    text.contains(&format!("approximately {range} words")),
                    "bucket {bucket:?} missing range {range}"
                );
            }
            other => panic!("expected text part, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn resummarize_sends_text_only_without_envelope() {
    let service = ScriptedService::new(&[("m1", &[Reply::Ok("# Regenerated\n\ncontent")])]);
    let config = config_for(Arc::clone(&service), &["m1"]);

    let result = resummarize("previously extracted text", LengthBucket::Short, &config)
        .await
        .unwrap();

    // Raw response text used directly as the summary.
    assert_eq!(result.markdown, "# Regenerated\n\ncontent");

    let request = service.requests().pop().unwrap();
    assert!(!request.json_envelope);
    assert!(request
        .parts
        .iter()
        .all(|p| matches!(p, RequestPart::Text(_))));
    match &request.parts[1] {
        RequestPart::Text(text) => assert!(text.contains("previously extracted text")),
        other => panic!("expected text part, got {other:?}"),
    }
}

#[tokio::test]
async fn resummarize_to_file_writes_the_markdown() {
    let service = ScriptedService::new(&[("m1", &[Reply::Ok("# Regenerated\n\ncontent")])]);
    let config = config_for(Arc::clone(&service), &["m1"]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("summary.md");
    let result = resummarize_to_file("previously extracted text", LengthBucket::Short, &config, &path)
        .await
        .unwrap();

    assert_eq!(result.markdown, "# Regenerated\n\ncontent");
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "# Regenerated\n\ncontent"
    );
    // No temp file left behind.
    assert!(!path.with_extension("md.tmp").exists());
}

#[tokio::test]
async fn resummarize_empty_text_makes_no_network_call() {
    let service = ScriptedService::new(&[("m1", &[Reply::Ok("unused")])]);
    let config = config_for(Arc::clone(&service), &["m1"]);

    let err = resummarize("", LengthBucket::Medium, &config)
        .await
        .unwrap_err();

    assert!(matches!(err, DocsumError::EmptyExtractedText));
    assert_eq!(service.call_count(), 0);
}

// ── Candidate list construction ──────────────────────────────────────────────

#[tokio::test]
async fn user_preference_is_tried_first_and_deduplicated() {
    let service = ScriptedService::new(&[
        ("preferred", &[Reply::NotFound]),
        ("fallback", &[Reply::Ok(ENVELOPE)]),
    ]);
    let mut config = config_for(Arc::clone(&service), &["preferred", "fallback"]);
    // Preference equal to an existing candidate must not duplicate it.
    config.model = Some("preferred".to_string());

    extract_and_summarize(&png_document(), LengthBucket::Medium, &config)
        .await
        .unwrap();

    assert_eq!(service.models_called(), vec!["preferred", "fallback"]);
}
