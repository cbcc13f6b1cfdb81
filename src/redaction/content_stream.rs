//! Content-stream redaction.
//!
//! Masks are written straight into the page's drawing instructions by
//! literal byte substitution. Text in a content stream is usually split
//! across positioning operators, so a phrase that reads as one run in the
//! extracted text is often absent from the raw bytes. Such misses are
//! counted and logged, not hidden.

use super::plan::ReplacementMapping;
use super::strategy::{mask_author_metadata, Backend, FailureMode, RedactionApplier, RedactionResult};
use crate::document::{encode_latin1, DocumentText, StreamDocument};
use crate::domain::{EntityKind, ExcludedRegions, TextRegion, TextSectionLocator};
use crate::error::{AnonymizerError, AnonymizerResult};
use tracing::{debug, info, warn};

/// One literal substitution planned for a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePair {
    pub kind: EntityKind,
    pub original: String,
    pub mask: String,
    /// One flag per occurrence of `original` in the page text, in order:
    /// `true` if that occurrence is redacted.
    pub redact: Vec<bool>,
}

impl PagePair {
    pub fn applied(&self) -> usize {
        self.redact.iter().filter(|r| **r).count()
    }

    pub fn excluded(&self) -> usize {
        self.redact.len() - self.applied()
    }
}

/// A page's text after substitution, and the pairs that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageEdit {
    pub modified_text: String,
    pub pairs: Vec<PagePair>,
    pub skipped_excluded: usize,
}

/// Plans the substitutions for one page.
///
/// `offset` is where the page starts in the concatenated text that
/// `regions` refer to. Occurrences overlapping a region are kept. When two
/// occurrences overlap, the one starting first wins; on a tie the longer.
pub fn plan_page(
    page_text: &str,
    offset: usize,
    mapping: &ReplacementMapping,
    regions: &[TextRegion],
) -> PageEdit {
    let mut pairs = Vec::new();
    let mut spans: Vec<(usize, usize, usize)> = Vec::new();
    let mut skipped = 0;

    for replacement in mapping.replacements() {
        if replacement.original.is_empty() {
            continue;
        }
        let mut redact = Vec::new();
        for (start, matched) in page_text.match_indices(replacement.original) {
            let end = start + matched.len();
            let excluded = regions
                .iter()
                .any(|region| region.overlaps(offset + start, offset + end));
            if excluded {
                debug!(text = %replacement.original, offset = offset + start, "occurrence in protected section");
                skipped += 1;
            } else {
                spans.push((start, end, pairs.len()));
            }
            redact.push(!excluded);
        }
        if !redact.is_empty() {
            pairs.push(PagePair {
                kind: replacement.kind,
                original: replacement.original.to_string(),
                mask: replacement.mask.to_string(),
                redact,
            });
        }
    }

    spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

    let mut modified_text = String::with_capacity(page_text.len());
    let mut cursor = 0;
    for (start, end, pair) in spans {
        if start < cursor {
            continue;
        }
        modified_text.push_str(&page_text[cursor..start]);
        modified_text.push_str(&pairs[pair].mask);
        cursor = end;
    }
    modified_text.push_str(&page_text[cursor..]);

    // Only pairs whose mask made it into the modified text are carried forward.
    pairs.retain(|pair| pair.applied() > 0 && modified_text.contains(pair.mask.as_str()));

    PageEdit {
        modified_text,
        pairs,
        skipped_excluded: skipped,
    }
}

/// Non-overlapping positions of `needle` in `haystack`.
fn find_all(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    let mut hits = Vec::new();
    if needle.is_empty() || needle.len() > haystack.len() {
        return hits;
    }
    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        if &haystack[i..i + needle.len()] == needle {
            hits.push(i);
            i += needle.len();
        } else {
            i += 1;
        }
    }
    hits
}

fn splice(content: &[u8], positions: &[usize], len: usize, mask: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len());
    let mut cursor = 0;
    for &pos in positions {
        out.extend_from_slice(&content[cursor..pos]);
        out.extend_from_slice(mask);
        cursor = pos + len;
    }
    out.extend_from_slice(&content[cursor..]);
    out
}

#[derive(Debug, Default)]
struct PageOutcome {
    redacted: usize,
    missed: usize,
}

/// Applier that substitutes mask bytes into page content streams.
#[derive(Debug, Clone, Default)]
pub struct ContentStreamApplier {
    failure_mode: FailureMode,
}

impl ContentStreamApplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_mode(mut self, failure_mode: FailureMode) -> Self {
        self.failure_mode = failure_mode;
        self
    }

    fn redact_page<D: StreamDocument + ?Sized>(
        &self,
        document: &mut D,
        index: usize,
        edit: &PageEdit,
    ) -> AnonymizerResult<PageOutcome> {
        let mut content = document.content(index)?;
        let mut outcome = PageOutcome::default();

        for pair in &edit.pairs {
            let (Some(original), Some(mask)) = (encode_latin1(&pair.original), encode_latin1(&pair.mask))
            else {
                debug!(page = index + 1, text = %pair.original, "not representable in content bytes");
                outcome.missed += pair.applied();
                continue;
            };

            let positions = find_all(&content, &original);
            let selected: Vec<usize> = if pair.excluded() == 0 {
                positions
            } else if positions.len() == pair.redact.len() {
                // Byte and text occurrences line up one-to-one; keep the
                // protected ones by ordinal.
                positions
                    .into_iter()
                    .zip(&pair.redact)
                    .filter_map(|(pos, redact)| redact.then_some(pos))
                    .collect()
            } else {
                debug!(
                    page = index + 1,
                    text = %pair.original,
                    found = positions.len(),
                    expected = pair.redact.len(),
                    "occurrences do not line up with protected text, left alone"
                );
                Vec::new()
            };

            if selected.is_empty() {
                debug!(page = index + 1, text = %pair.original, "literal not found in content stream");
                outcome.missed += pair.applied();
                continue;
            }

            content = splice(&content, &selected, original.len(), &mask);
            debug!(page = index + 1, kind = %pair.kind, count = selected.len(), "content substituted");
            outcome.redacted += selected.len();
            outcome.missed += pair.applied().saturating_sub(selected.len());
        }

        if outcome.redacted > 0 {
            document.replace_content(index, content)?;
        }
        Ok(outcome)
    }
}

impl<D: StreamDocument + ?Sized> RedactionApplier<D> for ContentStreamApplier {
    fn backend(&self) -> Backend {
        Backend::ContentStream
    }

    fn excluded_regions(&self, _document: &D, text: &DocumentText) -> ExcludedRegions {
        ExcludedRegions::Text(TextSectionLocator::new().locate(&text.full))
    }

    fn apply(
        &self,
        document: &mut D,
        text: &DocumentText,
        mapping: &ReplacementMapping,
        regions: &ExcludedRegions,
    ) -> AnonymizerResult<RedactionResult> {
        let ExcludedRegions::Text(regions) = regions else {
            return Err(AnonymizerError::InvalidInput {
                parameter: "regions".to_string(),
                reason: "content-stream redaction needs text-offset regions".to_string(),
            });
        };

        let mut result = RedactionResult::none();

        for index in 0..document.page_count() {
            result.pages_processed += 1;

            let (Some(page_text), Some(span)) = (text.pages.get(index), text.spans.get(index)) else {
                continue;
            };
            let edit = plan_page(page_text, span.start, mapping, regions);
            result.skipped_excluded += edit.skipped_excluded;
            if edit.pairs.is_empty() {
                continue;
            }

            match self.redact_page(document, index, &edit) {
                Ok(outcome) => {
                    result.instances_redacted += outcome.redacted;
                    result.missed += outcome.missed;
                    if outcome.redacted > 0 {
                        result.pages_modified += 1;
                    }
                }
                Err(e) => match self.failure_mode {
                    FailureMode::FailOpen => {
                        warn!(page = index + 1, error = %e, "page left unmodified");
                        result.pages_failed += 1;
                    }
                    FailureMode::FailClosed => return Err(e),
                },
            }
        }

        result.metadata_masked = mask_author_metadata(document, mapping);

        info!(
            redacted = result.instances_redacted,
            missed = result.missed,
            skipped = result.skipped_excluded,
            pages_modified = result.pages_modified,
            pages_failed = result.pages_failed,
            "content-stream redaction finished"
        );
        Ok(result)
    }
}
