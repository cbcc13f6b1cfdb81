//! Redaction pipeline.
//!
//! Detection, exclusion and planning are shared by both backends; the
//! [`RedactionApplier`] installed for the active [`Backend`] applies the
//! resulting mapping to the document.

pub mod content_stream;
pub mod overlay;
pub mod plan;
pub mod strategy;

pub use content_stream::ContentStreamApplier;
pub use overlay::OverlayApplier;
pub use plan::{KindSelection, MaskPolicy, RedactionPlanner, ReplacementMapping};
pub use strategy::{Backend, FailureMode, RedactionApplier, RedactionResult};

use crate::config;
use crate::document::{DocumentSession, DocumentText, LopdfDocument, MupdfOverlayDocument};
use crate::domain::{DetectedEntities, EntityDetector};
use crate::error::{AnonymizerError, AnonymizerResult};
use crate::report::ExtractionReport;
use tracing::{error, info, warn};

/// Caller choices for one anonymization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonymizeOptions {
    pub anonymize_names: bool,
    pub anonymize_emails: bool,
    pub anonymize_institutions: bool,
    /// Defaults to the backend's policy when unset.
    pub mask_policy: Option<MaskPolicy>,
    pub failure_mode: FailureMode,
}

impl Default for AnonymizeOptions {
    fn default() -> Self {
        Self {
            anonymize_names: true,
            anonymize_emails: true,
            anonymize_institutions: true,
            mask_policy: None,
            failure_mode: FailureMode::FailOpen,
        }
    }
}

impl AnonymizeOptions {
    pub fn selection(&self) -> KindSelection {
        KindSelection {
            names: self.anonymize_names,
            emails: self.anonymize_emails,
            institutions: self.anonymize_institutions,
        }
    }
}

/// Result of [`AnonymizationService::anonymize`].
#[derive(Debug, Clone)]
pub struct AnonymizationOutput {
    /// The anonymized document, or the original bytes after a fail-open fallback.
    pub bytes: Vec<u8>,
    pub result: RedactionResult,
    pub report: ExtractionReport,
    pub backend: Backend,
}

/// Anonymization service bound to one backend.
///
/// Each call opens its own document session; nothing is shared between
/// calls.
#[derive(Debug, Clone)]
pub struct AnonymizationService {
    backend: Backend,
    detector: EntityDetector,
}

impl AnonymizationService {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            detector: EntityDetector::new(),
        }
    }

    pub fn with_content_stream() -> Self {
        Self::new(Backend::ContentStream)
    }

    pub fn with_overlay() -> Self {
        Self::new(Backend::Overlay)
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Detects entities and protected regions without modifying anything.
    pub fn extract(&self, bytes: &[u8]) -> AnonymizerResult<ExtractionReport> {
        check_size(bytes)?;
        match self.backend {
            Backend::ContentStream => {
                let document = LopdfDocument::load(bytes)?;
                Ok(self.report(&document, &ContentStreamApplier::new()).1)
            }
            Backend::Overlay => {
                let document = MupdfOverlayDocument::load(bytes)?;
                Ok(self.report(&document, &OverlayApplier::new()).1)
            }
        }
    }

    /// Produces an anonymized copy of `bytes`.
    pub fn anonymize(
        &self,
        bytes: &[u8],
        options: &AnonymizeOptions,
    ) -> AnonymizerResult<AnonymizationOutput> {
        check_size(bytes)?;
        info!(backend = %self.backend, bytes = bytes.len(), "anonymizing document");

        match self.backend {
            Backend::ContentStream => {
                let mut document = LopdfDocument::load(bytes)?;
                let applier = ContentStreamApplier::new().with_failure_mode(options.failure_mode);
                self.run(bytes, &mut document, &applier, options)
            }
            Backend::Overlay => {
                let mut document = MupdfOverlayDocument::load(bytes)?;
                let applier = OverlayApplier::new().with_failure_mode(options.failure_mode);
                self.run(bytes, &mut document, &applier, options)
            }
        }
    }

    fn report<D, A>(
        &self,
        document: &D,
        applier: &A,
    ) -> (DocumentText, ExtractionReport, DetectedEntities)
    where
        D: DocumentSession + ?Sized,
        A: RedactionApplier<D>,
    {
        let text = DocumentText::collect(document);
        info!(pages = text.page_count(), chars = text.full.len(), "document text collected");

        let entities = self.detector.detect(&text.full);
        let regions = applier.excluded_regions(document, &text);
        info!(regions = regions.len(), "protected regions located");

        let metadata = document.metadata().unwrap_or_else(|e| {
            warn!(error = %e, "metadata unreadable, reporting none");
            Default::default()
        });

        let report = ExtractionReport::new(metadata, &entities, regions);
        (text, report, entities)
    }

    /// Runs the shared pipeline on an opened document.
    pub fn run<D, A>(
        &self,
        original: &[u8],
        document: &mut D,
        applier: &A,
        options: &AnonymizeOptions,
    ) -> AnonymizerResult<AnonymizationOutput>
    where
        D: DocumentSession + ?Sized,
        A: RedactionApplier<D>,
    {
        let backend = applier.backend();
        let (text, report, entities) = self.report(&*document, applier);

        let policy = options
            .mask_policy
            .unwrap_or_else(|| backend.default_mask_policy());
        let mapping = RedactionPlanner::new(policy).plan(&entities, options.selection());

        let mut result = applier.apply(document, &text, &mapping, &report.excluded_regions)?;

        let bytes = match document.save() {
            Ok(bytes) => bytes,
            Err(e) => match options.failure_mode {
                FailureMode::FailOpen => {
                    error!(error = %e, "cannot serialize anonymized document, returning original");
                    result.fell_back = true;
                    original.to_vec()
                }
                FailureMode::FailClosed => return Err(e),
            },
        };

        info!(
            backend = %backend,
            redacted = result.instances_redacted,
            skipped = result.skipped_excluded,
            pages = result.pages_processed,
            fell_back = result.fell_back,
            "anonymization finished"
        );

        Ok(AnonymizationOutput {
            bytes,
            result,
            report,
            backend,
        })
    }
}

fn check_size(bytes: &[u8]) -> AnonymizerResult<()> {
    let limit = config::get().max_input_bytes;
    if bytes.len() > limit {
        return Err(AnonymizerError::InvalidInput {
            parameter: "input".to_string(),
            reason: format!("{} bytes exceeds the {} byte limit", bytes.len(), limit),
        });
    }
    Ok(())
}
