//! Output types returned by the summarization operations.

use serde::{Deserialize, Serialize};

/// The constrained two-field JSON envelope returned by the extraction call.
///
/// Field names match the wire contract (`extractedText` / `summary`) and the
/// values are carried verbatim — no trimming, rewriting, or normalisation —
/// so a caller always sees exactly what the model produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    /// Verbatim text extracted from the document, paragraphs preserved.
    pub extracted_text: String,
    /// Markdown summary with the fixed heading/takeaways/explanation layout.
    pub summary: String,
}

/// Per-call statistics: which candidate won and what it cost to get there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallStats {
    /// The model that produced the result (or, on failure, the last one tried).
    pub model: String,
    /// Total network requests issued across all candidates and retries.
    pub attempts: u32,
    /// Wall-clock duration of the whole logical call, including backoff.
    pub duration_ms: u64,
}

/// Result of [`crate::summarize::extract_and_summarize`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Verbatim extracted text.
    pub extracted_text: String,
    /// Markdown summary at the requested length.
    pub summary: String,
    /// Call statistics.
    pub stats: CallStats,
}

/// Result of [`crate::summarize::resummarize`]: the raw response text is the
/// summary, with no envelope and no post-processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryText {
    /// Markdown summary at the requested length.
    pub markdown: String,
    /// Call statistics.
    pub stats: CallStats,
}
