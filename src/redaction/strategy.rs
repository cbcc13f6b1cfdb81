//! Redaction applier trait and supporting types.
//!
//! Detection, exclusion and planning are shared; an applier is the part that
//! differs per backend. It turns a [`ReplacementMapping`] into document
//! mutations while honoring the excluded regions in its own form.

use super::plan::ReplacementMapping;
use crate::document::{DocumentSession, DocumentText};
use crate::domain::ExcludedRegions;
use crate::error::{AnonymizerError, AnonymizerResult};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use super::plan::MaskPolicy;

/// The installed redaction backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Byte substitution in page content streams (lopdf).
    ContentStream,
    /// Cover-and-stamp over located glyphs (MuPDF + lopdf).
    Overlay,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Self::ContentStream => "content-stream",
            Self::Overlay => "overlay",
        }
    }

    /// Library providing the backend's document session.
    pub fn library(self) -> &'static str {
        match self {
            Self::ContentStream => "lopdf",
            Self::Overlay => "mupdf",
        }
    }

    pub fn default_mask_policy(self) -> MaskPolicy {
        match self {
            Self::ContentStream => MaskPolicy::ReferenceCode,
            Self::Overlay => MaskPolicy::FixedLength,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = AnonymizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "content-stream" => Ok(Self::ContentStream),
            "overlay" => Ok(Self::Overlay),
            other => Err(AnonymizerError::InvalidInput {
                parameter: "backend".to_string(),
                reason: format!("unknown backend '{}'", other),
            }),
        }
    }
}

/// What to do when part of the document cannot be redacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureMode {
    /// Keep going: failed pages pass through unmodified and a document that
    /// cannot be saved is returned as the original bytes.
    #[default]
    FailOpen,
    /// Any page or serialization failure aborts the request.
    FailClosed,
}

/// Statistics about an anonymization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RedactionResult {
    /// Occurrences masked
    pub instances_redacted: usize,

    /// Occurrences left alone because they fall in a protected region
    pub skipped_excluded: usize,

    /// Planned substitutions that could not be located in page content
    pub missed: usize,

    pub pages_processed: usize,

    /// Pages with at least one applied redaction
    pub pages_modified: usize,

    /// Pages passed through unmodified after an error
    pub pages_failed: usize,

    /// Whether the author metadata field was rewritten
    pub metadata_masked: bool,

    /// Whether the original bytes were returned instead of a modified document
    pub fell_back: bool,
}

impl RedactionResult {
    /// Creates a result indicating no redactions were needed.
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true if any redactions were applied.
    pub fn has_redactions(&self) -> bool {
        self.instances_redacted > 0 || self.metadata_masked
    }
}

/// Backend-specific half of the pipeline.
///
/// `D` is the document session type the backend operates on.
pub trait RedactionApplier<D: DocumentSession + ?Sized> {
    fn backend(&self) -> Backend;

    /// Protected regions in this backend's form.
    fn excluded_regions(&self, document: &D, text: &DocumentText) -> ExcludedRegions;

    /// Applies `mapping` to the document in place.
    fn apply(
        &self,
        document: &mut D,
        text: &DocumentText,
        mapping: &ReplacementMapping,
        regions: &ExcludedRegions,
    ) -> AnonymizerResult<RedactionResult>;
}

/// Rewrites the author metadata when names are being anonymized.
///
/// Metadata problems never fail the run; they are logged and skipped.
pub(crate) fn mask_author_metadata<D: DocumentSession + ?Sized>(
    document: &mut D,
    mapping: &ReplacementMapping,
) -> bool {
    if !mapping.is_enabled(crate::domain::EntityKind::Name) {
        return false;
    }

    let author = match document.metadata() {
        Ok(meta) => meta.author,
        Err(e) => {
            warn!(error = %e, "cannot read metadata, author left unchanged");
            return false;
        }
    };

    match author {
        Some(author) if !author.trim().is_empty() => {
            let masked = mapping.policy().author_mask(&author);
            match document.set_author(&masked) {
                Ok(()) => {
                    info!("author metadata anonymized");
                    true
                }
                Err(e) => {
                    warn!(error = %e, "cannot rewrite author metadata");
                    false
                }
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction_result() {
        let result = RedactionResult::none();
        assert!(!result.has_redactions());

        let result = RedactionResult {
            instances_redacted: 5,
            ..Default::default()
        };
        assert!(result.has_redactions());
    }

    #[test]
    fn test_backend_identity() {
        assert_eq!(Backend::Overlay.library(), "mupdf");
        assert_eq!("content-stream".parse::<Backend>().unwrap(), Backend::ContentStream);
        assert!("pymupdf".parse::<Backend>().is_err());
        assert_eq!(Backend::ContentStream.default_mask_policy(), MaskPolicy::ReferenceCode);
    }

    #[test]
    fn test_failure_mode_default() {
        assert_eq!(FailureMode::default(), FailureMode::FailOpen);
    }
}
