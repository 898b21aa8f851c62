//! Document encoding: raw bytes → base64 inline request part.
//!
//! The generation API accepts documents as base64 data embedded in the JSON
//! request body. The bytes are sent exactly as read — no re-encoding or
//! downscaling — so what the model sees is what the user uploaded.

use crate::backend::RequestPart;
use crate::pipeline::input::Document;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Encode a document as a base64 inline-data part ready for the request body.
pub fn inline_part(document: &Document) -> RequestPart {
    let data = STANDARD.encode(document.bytes());
    debug!(
        mime = document.media_type().mime_type(),
        encoded_len = data.len(),
        "encoded document"
    );
    RequestPart::InlineData {
        mime_type: document.media_type().mime_type().to_string(),
        data,
    }
}
