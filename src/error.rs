//! Error types for the anonymization library.
//!
//! Errors are split by how far they reach: document-level failures abort the
//! call, page-level and metadata failures are recovered inside the service and
//! only surface through logs and [`crate::RedactionResult`] counters.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for anonymization operations.
pub type AnonymizerResult<T> = Result<T, AnonymizerError>;

/// Error type for all anonymization operations.
#[derive(Debug, Error)]
pub enum AnonymizerError {
    /// The input bytes could not be parsed as a PDF document.
    #[error("failed to open document: {message}")]
    DocumentOpen {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Text could not be extracted from one page (`page` is 1-based).
    #[error("text extraction failed on page {page}: {message}")]
    PageExtraction { page: usize, message: String },

    /// A page could not be mutated (`page` is 1-based).
    #[error("redaction failed on page {page}: {message}")]
    PageRedaction { page: usize, message: String },

    /// The processed document could not be written to bytes.
    #[error("failed to serialize document: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Document metadata could not be read or rewritten.
    #[error("metadata error: {message}")]
    Metadata { message: String },

    /// Reading or writing a file failed.
    #[error("IO error for path '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid configuration or parameters.
    #[error("invalid input for '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },

    /// Backend-specific error (lopdf, MuPDF).
    #[error("{backend} backend error: {message}")]
    Backend {
        backend: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl AnonymizerError {
    /// Returns true for the kinds the service recovers from locally.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PageExtraction { .. } | Self::PageRedaction { .. } | Self::Metadata { .. }
        )
    }

    /// Builds a [`AnonymizerError::Backend`] for a MuPDF failure.
    pub(crate) fn mupdf(message: impl Into<String>, err: mupdf::Error) -> Self {
        Self::Backend {
            backend: "MuPDF".to_string(),
            message: format!("{}: {}", message.into(), err),
            source: Some(Box::new(err)),
        }
    }
}
