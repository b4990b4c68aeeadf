//! Document ingestion — validates uploads and turns them into plain text.
//!
//! The screening core only ever sees `(text, filename)`; everything about file
//! types and byte limits stays here.

use thiserror::Error;

const ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".txt"];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("'{0}' must be a .pdf or .txt file")]
    UnsupportedFormat(String),

    #[error("'{filename}' exceeds {limit_mb} MB limit")]
    ContentTooLarge { filename: String, limit_mb: usize },

    #[error("Failed to parse '{filename}': {reason}")]
    Unreadable { filename: String, reason: String },

    #[error("No text found in '{0}'. PDF may be scanned/image-only")]
    Empty(String),
}

/// Seam between the transport layer and the pipeline, so tests can feed text directly.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8], filename: &str) -> Result<String, IngestError>;
}

/// Default extractor: `.txt` via lossy UTF-8, `.pdf` via `pdf-extract`.
#[derive(Debug, Clone)]
pub struct DocumentIngestor {
    max_upload_size_mb: usize,
}

impl DocumentIngestor {
    pub fn new(max_upload_size_mb: usize) -> Self {
        Self { max_upload_size_mb }
    }

    fn check_size(&self, bytes: &[u8], filename: &str) -> Result<(), IngestError> {
        if bytes.len() > self.max_upload_size_mb * 1024 * 1024 {
            return Err(IngestError::ContentTooLarge {
                filename: filename.to_string(),
                limit_mb: self.max_upload_size_mb,
            });
        }
        Ok(())
    }
}

impl TextExtractor for DocumentIngestor {
    fn extract_text(&self, bytes: &[u8], filename: &str) -> Result<String, IngestError> {
        let lower = filename.to_lowercase();
        if !ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            return Err(IngestError::UnsupportedFormat(filename.to_string()));
        }
        self.check_size(bytes, filename)?;

        if lower.ends_with(".txt") {
            return Ok(String::from_utf8_lossy(bytes).trim().to_string());
        }

        let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            IngestError::Unreadable {
                filename: filename.to_string(),
                reason: e.to_string(),
            }
        })?;

        let text = text.trim();
        if text.is_empty() {
            return Err(IngestError::Empty(filename.to_string()));
        }
        Ok(text.to_string())
    }
}
