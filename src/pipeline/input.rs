//! Input handling: load a document and pin down its media type.
//!
//! ## Why sniff magic bytes?
//!
//! File extensions lie and HTTP uploads arrive with whatever MIME type the
//! sender claimed. The generation service rejects or silently mangles
//! mislabelled content, so we classify by the first bytes of the file
//! (`%PDF`, the PNG signature, the JPEG SOI marker) and refuse anything we
//! cannot recognise before a single network byte is spent.

use crate::error::DocsumError;
use std::path::Path;
use tracing::debug;

/// Accepted document media types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Pdf,
    Png,
    Jpeg,
}

impl MediaType {
    /// The MIME type string sent with the inline request part.
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaType::Pdf => "application/pdf",
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
        }
    }

    /// Parse a caller-supplied MIME type. `image/jpg` is tolerated because
    /// browser drag-and-drop surfaces commonly report it.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "application/pdf" => Some(MediaType::Pdf),
            "image/png" => Some(MediaType::Png),
            "image/jpeg" | "image/jpg" => Some(MediaType::Jpeg),
            _ => None,
        }
    }

    /// Classify content by its leading bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF") {
            Some(MediaType::Pdf)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(MediaType::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(MediaType::Jpeg)
        } else {
            None
        }
    }
}

/// A validated document ready to be sent to the generation service.
///
/// Immutable once constructed: the bytes and media type are fixed for the
/// lifetime of the request they feed.
#[derive(Debug, Clone)]
pub struct Document {
    bytes: Vec<u8>,
    media_type: MediaType,
}

impl Document {
    /// Load a document from disk, classifying it by magic bytes.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DocsumError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DocsumError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => DocsumError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => DocsumError::Internal(format!("failed to read '{}': {e}", path.display())),
        })?;

        let media_type =
            MediaType::sniff(&bytes).ok_or_else(|| DocsumError::UnrecognisedDocument {
                path: path.to_path_buf(),
                magic: leading_bytes(&bytes),
            })?;

        debug!(
            path = %path.display(),
            mime = media_type.mime_type(),
            size = bytes.len(),
            "loaded document"
        );
        Ok(Self { bytes, media_type })
    }

    /// Build a document from in-memory bytes and a caller-supplied MIME type.
    ///
    /// This is the entry point for callers that receive uploads rather than
    /// file paths. The MIME type must be in the accepted set; the bytes are
    /// taken at face value.
    pub fn from_bytes(bytes: Vec<u8>, mime: &str) -> Result<Self, DocsumError> {
        let media_type = MediaType::from_mime(mime).ok_or_else(|| {
            DocsumError::UnsupportedMediaType {
                mime: mime.to_string(),
            }
        })?;
        Ok(Self { bytes, media_type })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }
}

fn leading_bytes(bytes: &[u8]) -> [u8; 4] {
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    magic
}
