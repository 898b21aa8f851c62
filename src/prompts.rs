//! Instruction prompts for document extraction and summarization.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the summary structure (e.g. adding
//!    a section or tweaking the envelope contract) requires editing exactly
//!    one place.
//!
//! 2. **Testability** — unit tests can inspect the exact text sent to the
//!    model without network access, so a regression in the word-count range
//!    or the JSON-envelope instruction is caught immediately.

use crate::config::LengthBucket;

/// Instruction sent alongside the inline document for the extraction call.
///
/// Demands three things: verbatim text extraction preserving paragraph
/// structure, a Markdown summary of the given word range with the fixed
/// section layout, and a bare two-field JSON object with no surrounding
/// prose or code fences. The response-schema constraint set by the backend
/// reinforces the same contract at the API level.
pub fn extraction_prompt(length: LengthBucket) -> String {
    format!(
        r###"You are a document analysis expert.
1. First, meticulously extract all text from the provided document. Preserve formatting like paragraphs.
2. Then, based on the extracted text, generate a smart summary. The summary should be approximately {words} words.
3. Structure the summary using Markdown with the following format:
   - A main title as a heading (e.g., "# Summary of [Document Topic]").
   - A section "## Key Takeaways" with a bulleted list of the most important points.
   - A section "## Detailed Explanation" with a concise paragraph.
4. Return a single, valid JSON object with two keys: "extractedText" and "summary". The "summary" value should be the Markdown string. Do not include any other text, markdown formatting, or code fences around the JSON."###,
        words = length.word_range()
    )
}

/// Instruction for regenerating a summary from already-extracted text.
///
/// No JSON envelope: the raw response text is the summary.
pub fn summary_prompt(length: LengthBucket) -> String {
    format!(
        "Based on the following text, generate a smart summary of approximately {words} words. \
         Structure it using Markdown with a main title, \"## Key Takeaways\" with bullets, \
         and a \"## Detailed Explanation\" paragraph.",
        words = length.word_range()
    )
}

/// The second text part of a resummarize request, carrying the source text.
pub fn summary_text_part(extracted_text: &str) -> String {
    format!("\n\nTEXT: \"{extracted_text}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_prompt_embeds_word_range() {
        assert!(extraction_prompt(LengthBucket::Short).contains("approximately 50-80 words"));
        assert!(extraction_prompt(LengthBucket::Medium).contains("approximately 120-160 words"));
        assert!(extraction_prompt(LengthBucket::Long).contains("approximately 250-300 words"));
    }

    #[test]
    fn extraction_prompt_demands_bare_json_envelope() {
        let p = extraction_prompt(LengthBucket::Medium);
        assert!(p.contains("\"extractedText\""));
        assert!(p.contains("\"summary\""));
        assert!(p.contains("code fences"));
    }

    #[test]
    fn extraction_prompt_keeps_quoted_markdown_headings_intact() {
        let p = extraction_prompt(LengthBucket::Medium);
        assert!(p.contains(r###"(e.g., "# Summary of [Document Topic]")"###));
        assert!(p.contains(r###"A section "## Key Takeaways""###));
        assert!(p.contains(r###"A section "## Detailed Explanation""###));
    }

    #[test]
    fn summary_prompt_embeds_word_range_and_sections() {
        let p = summary_prompt(LengthBucket::Long);
        assert!(p.contains("250-300"));
        assert!(p.contains("## Key Takeaways"));
        assert!(p.contains("## Detailed Explanation"));
    }

    #[test]
    fn text_part_quotes_the_source() {
        let part = summary_text_part("some extracted text");
        assert_eq!(part, "\n\nTEXT: \"some extracted text\"");
    }
}
