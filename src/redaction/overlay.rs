//! Geometric overlay redaction.
//!
//! Each occurrence found on the rendered page is covered by an opaque white
//! box and stamped with its mask. The underlying content bytes are not
//! altered.

use super::plan::ReplacementMapping;
use super::strategy::{mask_author_metadata, Backend, FailureMode, RedactionApplier, RedactionResult};
use crate::document::{DocumentText, OverlayDocument};
use crate::domain::{ExcludedRegions, GeometricSectionLocator, PageRegion};
use crate::error::{AnonymizerError, AnonymizerResult};
use tracing::{debug, info, warn};

/// Strings shorter than this (in characters) are never searched for.
pub const MIN_OVERLAY_LEN: usize = 4;

#[derive(Debug, Default)]
struct PageOutcome {
    redacted: usize,
    skipped: usize,
}

/// Applier that draws masks over located text.
#[derive(Debug, Clone, Default)]
pub struct OverlayApplier {
    failure_mode: FailureMode,
    locator: GeometricSectionLocator,
}

impl OverlayApplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_mode(mut self, failure_mode: FailureMode) -> Self {
        self.failure_mode = failure_mode;
        self
    }

    pub fn with_locator(mut self, locator: GeometricSectionLocator) -> Self {
        self.locator = locator;
        self
    }

    fn redact_page<D: OverlayDocument + ?Sized>(
        &self,
        document: &mut D,
        index: usize,
        mapping: &ReplacementMapping,
        regions: &[PageRegion],
    ) -> AnonymizerResult<PageOutcome> {
        let mut outcome = PageOutcome::default();

        for replacement in mapping.replacements() {
            if replacement.original.chars().count() < MIN_OVERLAY_LEN {
                continue;
            }

            for rect in document.find_occurrences(index, replacement.original)? {
                if let Some(region) = regions.iter().find(|region| region.rect.intersects(&rect)) {
                    debug!(
                        page = index + 1,
                        text = %replacement.original,
                        section = %region.title,
                        "occurrence in protected section"
                    );
                    outcome.skipped += 1;
                    continue;
                }
                document.cover_and_stamp(index, rect, replacement.mask)?;
                debug!(page = index + 1, kind = %replacement.kind, x0 = rect.x0, y0 = rect.y0, "overlay placed");
                outcome.redacted += 1;
            }
        }

        if outcome.redacted > 0 {
            document.commit_page(index)?;
        }
        Ok(outcome)
    }
}

impl<D: OverlayDocument + ?Sized> RedactionApplier<D> for OverlayApplier {
    fn backend(&self) -> Backend {
        Backend::Overlay
    }

    fn excluded_regions(&self, document: &D, _text: &DocumentText) -> ExcludedRegions {
        self.locator.locate(document)
    }

    fn apply(
        &self,
        document: &mut D,
        _text: &DocumentText,
        mapping: &ReplacementMapping,
        regions: &ExcludedRegions,
    ) -> AnonymizerResult<RedactionResult> {
        if let ExcludedRegions::Text(_) = regions {
            return Err(AnonymizerError::InvalidInput {
                parameter: "regions".to_string(),
                reason: "overlay redaction needs geometric regions".to_string(),
            });
        }

        let mut result = RedactionResult::none();

        for index in 0..document.page_count() {
            result.pages_processed += 1;

            match self.redact_page(document, index, mapping, regions.page(index)) {
                Ok(outcome) => {
                    result.instances_redacted += outcome.redacted;
                    result.skipped_excluded += outcome.skipped;
                    if outcome.redacted > 0 {
                        result.pages_modified += 1;
                    }
                }
                Err(e) => {
                    document.revert_page(index);
                    match self.failure_mode {
                        FailureMode::FailOpen => {
                            warn!(page = index + 1, error = %e, "page left unmodified");
                            result.pages_failed += 1;
                        }
                        FailureMode::FailClosed => return Err(e),
                    }
                }
            }
        }

        result.metadata_masked = mask_author_metadata(document, mapping);

        info!(
            redacted = result.instances_redacted,
            skipped = result.skipped_excluded,
            pages_modified = result.pages_modified,
            pages_failed = result.pages_failed,
            "overlay redaction finished"
        );
        Ok(result)
    }
}
