//! Explicit session state machine for interactive callers.
//!
//! A UI driving this library holds exactly one document and at most one
//! in-flight generation call. Instead of scattering that flow across ad-hoc
//! flags, [`Session`] makes it an explicit state machine:
//!
//! ```text
//! Idle ──upload──▶ Extracting ──ok──▶ AwaitingLengthChoice
//!                      │                      │
//!                      └──err──▶ Failed       │ summarize(length)
//!                                             ▼
//!                          Ready ◀──ok── Summarizing ──err──▶ Failed
//!                            │ summarize(length)  ▲
//!                            └────────────────────┘
//! ```
//!
//! The transition methods take `&mut self`, so a second call cannot start
//! while one is in flight — the at-most-one-outstanding-call rule is enforced
//! by the borrow checker rather than by runtime guards.
//!
//! Upload behaviour matches the interactive flow it models: the extraction
//! call requests a medium-length summary as part of its envelope, and the
//! session discards it, holding only the extracted text until the caller
//! picks a length and asks for the summary explicitly.

use crate::config::{LengthBucket, SummaryConfig};
use crate::error::DocsumError;
use crate::pipeline::input::Document;
use crate::summarize;
use tracing::{debug, warn};

/// Where a session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No document uploaded yet.
    Idle,
    /// Extraction call in flight.
    Extracting,
    /// Text extracted; waiting for the caller to choose a summary length.
    AwaitingLengthChoice,
    /// Summary call in flight.
    Summarizing,
    /// Extracted text and a summary are both available.
    Ready,
    /// The last call failed; see [`Session::user_message`].
    Failed,
}

/// One interactive document-summarization session.
pub struct Session {
    config: SummaryConfig,
    state: SessionState,
    extracted_text: Option<String>,
    summary: Option<String>,
    user_message: Option<&'static str>,
}

impl Session {
    pub fn new(config: SummaryConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            extracted_text: None,
            summary: None,
            user_message: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The extracted text, available from `AwaitingLengthChoice` onwards.
    pub fn extracted_text(&self) -> Option<&str> {
        self.extracted_text.as_deref()
    }

    /// The summary Markdown, available in `Ready`.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// The user-facing message for the `Failed` state.
    pub fn user_message(&self) -> Option<&'static str> {
        self.user_message
    }

    /// Upload a document: run the extraction call and keep the text.
    ///
    /// Replaces any previous document, summary, or failure. On success the
    /// session lands in `AwaitingLengthChoice` with the extracted text
    /// retained and the envelope's summary discarded; on failure it lands in
    /// `Failed` with a user-facing message, and the error is also returned
    /// for callers that want the classification.
    pub async fn upload(&mut self, document: Document) -> Result<&str, DocsumError> {
        self.reset();
        self.state = SessionState::Extracting;

        match summarize::extract_and_summarize(&document, LengthBucket::Medium, &self.config).await
        {
            Ok(result) => {
                debug!(
                    model = %result.stats.model,
                    extracted_len = result.extracted_text.len(),
                    "upload extraction complete, summary discarded pending length choice"
                );
                self.extracted_text = Some(result.extracted_text);
                self.state = SessionState::AwaitingLengthChoice;
                Ok(self.extracted_text.as_deref().unwrap_or_default())
            }
            Err(err) => {
                warn!(%err, "upload extraction failed");
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// Generate the summary at the chosen length from the extracted text.
    ///
    /// Valid from `AwaitingLengthChoice` and from `Ready` (regeneration at a
    /// different length). Calling it without extracted text is a validation
    /// error raised before any network activity; the session state is left
    /// unchanged in that case.
    pub async fn summarize(&mut self, length: LengthBucket) -> Result<&str, DocsumError> {
        let Some(text) = self.extracted_text.clone() else {
            return Err(DocsumError::EmptyExtractedText);
        };

        self.state = SessionState::Summarizing;
        match summarize::resummarize(&text, length, &self.config).await {
            Ok(result) => {
                self.summary = Some(result.markdown);
                self.user_message = None;
                self.state = SessionState::Ready;
                Ok(self.summary.as_deref().unwrap_or_default())
            }
            Err(err) => {
                warn!(%err, "summary generation failed");
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// Drop all session output and return to `Idle`.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.extracted_text = None;
        self.summary = None;
        self.user_message = None;
    }

    fn fail(&mut self, err: &DocsumError) {
        self.user_message = Some(err.user_message());
        self.state = SessionState::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, GenerateBackend, GenerateRequest};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Backend that always answers with a fixed envelope or fixed text.
    struct FixedBackend {
        calls: AtomicUsize,
        fail_overloaded: bool,
    }

    #[async_trait]
    impl GenerateBackend for FixedBackend {
        async fn generate(
            &self,
            _model: &str,
            request: &GenerateRequest,
        ) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_overloaded {
                return Err(BackendError {
                    code: Some(503),
                    status: Some("UNAVAILABLE".into()),
                    message: "overloaded".into(),
                });
            }
            if request.json_envelope {
                Ok(r###"{"extractedText": "the document text", "summary": "# Auto"}"###.into())
            } else {
                Ok("# Summary\n\n## Key Takeaways\n- point".into())
            }
        }
    }

    fn config_with(backend: Arc<dyn GenerateBackend>) -> SummaryConfig {
        SummaryConfig::builder()
            .backend(backend)
            .max_attempts(1)
            .build()
            .unwrap()
    }

    fn pdf() -> Document {
        Document::from_bytes(b"%PDF-1.4 x".to_vec(), "application/pdf").unwrap()
    }

    #[tokio::test]
    async fn upload_keeps_text_and_discards_auto_summary() {
        let backend = Arc::new(FixedBackend {
            calls: AtomicUsize::new(0),
            fail_overloaded: false,
        });
        let mut session = Session::new(config_with(backend));

        assert_eq!(session.state(), SessionState::Idle);
        let text = session.upload(pdf()).await.unwrap().to_string();
        assert_eq!(text, "the document text");
        assert_eq!(session.state(), SessionState::AwaitingLengthChoice);
        // The envelope's summary is discarded until a length is chosen.
        assert!(session.summary().is_none());
    }

    #[tokio::test]
    async fn summarize_after_upload_reaches_ready() {
        let backend = Arc::new(FixedBackend {
            calls: AtomicUsize::new(0),
            fail_overloaded: false,
        });
        let mut session = Session::new(config_with(backend));

        session.upload(pdf()).await.unwrap();
        let summary = session.summarize(LengthBucket::Long).await.unwrap().to_string();
        assert!(summary.starts_with("# Summary"));
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.summary(), Some(summary.as_str()));

        // Regeneration at another length is allowed from Ready.
        session.summarize(LengthBucket::Short).await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn summarize_without_upload_is_rejected_without_network() {
        let backend = Arc::new(FixedBackend {
            calls: AtomicUsize::new(0),
            fail_overloaded: false,
        });
        let calls = Arc::clone(&backend);
        let mut session = Session::new(config_with(backend));

        let err = session.summarize(LengthBucket::Medium).await.unwrap_err();
        assert!(matches!(err, DocsumError::EmptyExtractedText));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(calls.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_upload_sets_user_message() {
        let backend = Arc::new(FixedBackend {
            calls: AtomicUsize::new(0),
            fail_overloaded: true,
        });
        let mut session = Session::new(config_with(backend));

        let err = session.upload(pdf()).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(
            session.user_message(),
            Some("The model is temporarily overloaded. Please try again in a moment.")
        );
    }

    #[tokio::test]
    async fn reset_returns_to_idle() {
        let backend = Arc::new(FixedBackend {
            calls: AtomicUsize::new(0),
            fail_overloaded: false,
        });
        let mut session = Session::new(config_with(backend));
        session.upload(pdf()).await.unwrap();
        session.reset();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.extracted_text().is_none());
        assert!(session.summary().is_none());
    }
}
