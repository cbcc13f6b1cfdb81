//! Protected sections.
//!
//! Reference lists, acknowledgments and similar sections repeat author names
//! that must stay readable. Headings from fixed tables mark where such a
//! section begins; the region it covers is derived either from offsets in the
//! concatenated text or from page geometry, depending on the active backend.

use crate::document::{OverlayDocument, Rect};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Headings protected by both backends (Turkish and English).
pub const PROTECTED_HEADINGS: &[&str] = &[
    "giriş",
    "introduction",
    "ilgili çalışmalar",
    "related work",
    "referanslar",
    "references",
    "kaynakça",
    "kaynaklar",
    "bibliography",
    "teşekkür",
    "acknowledgments",
    "acknowledgements",
    "acknowledgment",
];

/// Paper-structure headings additionally protected by the geometric backend.
pub const EXTENDED_HEADINGS: &[&str] = &[
    "abstract",
    "özet",
    "materials and methods",
    "methodology",
    "yöntem",
    "experimental results and discussion",
    "results",
    "discussion",
    "conclusion",
    "sonuç",
    "thanks",
];

/// A protected span of the concatenated document text.
///
/// `start`/`end` are byte offsets used for slicing and overlap checks. The
/// serialized form carries character offsets, which differ once the text
/// before the span holds non-ASCII characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextRegion {
    #[serde(skip)]
    pub start: usize,
    #[serde(skip)]
    pub end: usize,
    #[serde(rename = "start")]
    pub char_start: usize,
    #[serde(rename = "end")]
    pub char_end: usize,
    pub title: String,
}

impl TextRegion {
    /// Region over the byte range `start..end` of `text`.
    pub fn new(text: &str, start: usize, end: usize, title: impl Into<String>) -> Self {
        let char_start = text[..start].chars().count();
        Self {
            start,
            end,
            char_start,
            char_end: char_start + text[start..end].chars().count(),
            title: title.into(),
        }
    }

    /// True if `start..end` overlaps this region.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        start < self.end && self.start < end
    }
}

/// A protected full-width band on one page, from a heading to the page bottom.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRegion {
    pub rect: Rect,
    pub title: String,
}

/// Protected regions in the form used by the active backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExcludedRegions {
    /// Offsets into the concatenated text (content-stream backend).
    Text(Vec<TextRegion>),
    /// Bands keyed by 0-based page index (overlay backend).
    Geometric(BTreeMap<usize, Vec<PageRegion>>),
}

impl ExcludedRegions {
    pub fn len(&self) -> usize {
        match self {
            Self::Text(regions) => regions.len(),
            Self::Geometric(pages) => pages.values().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn page(&self, index: usize) -> &[PageRegion] {
        match self {
            Self::Geometric(pages) => pages.get(&index).map(Vec::as_slice).unwrap_or(&[]),
            Self::Text(_) => &[],
        }
    }
}

struct HeadingPattern {
    regex: Regex,
}

/// Locates protected sections in concatenated text.
///
/// A region starts at a heading match and ends at the nearest later match of
/// any other heading, or at the end of the text.
pub struct TextSectionLocator {
    headings: &'static [HeadingPattern],
}

impl Default for TextSectionLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSectionLocator {
    pub fn new() -> Self {
        static HEADINGS: Lazy<Vec<HeadingPattern>> = Lazy::new(|| {
            PROTECTED_HEADINGS
                .iter()
                .map(|h| HeadingPattern {
                    regex: Regex::new(&heading_pattern(h)).expect("Valid heading regex"),
                })
                .collect()
        });
        Self {
            headings: &HEADINGS,
        }
    }

    pub fn locate(&self, text: &str) -> Vec<TextRegion> {
        let mut regions: Vec<TextRegion> = Vec::new();

        for (idx, heading) in self.headings.iter().enumerate() {
            for caps in heading.regex.captures_iter(text) {
                let Some(title) = caps.get(1) else { continue };
                let after = title.end();

                let end = self
                    .headings
                    .iter()
                    .enumerate()
                    .filter(|(other, _)| *other != idx)
                    .filter_map(|(_, h)| h.regex.find(&text[after..]).map(|m| after + m.start()))
                    .min()
                    .unwrap_or(text.len());

                let region = TextRegion::new(text, title.start(), end, title.as_str());
                if !regions.contains(&region) {
                    debug!(title = %region.title, start = region.start, end = region.end, "protected section");
                    regions.push(region);
                }
            }
        }

        regions.sort_by_key(|r| (r.start, r.end));
        info!(regions = regions.len(), "text-offset protected sections located");
        regions
    }
}

/// Builds the case-insensitive pattern for one heading: the heading words
/// (any whitespace between them) followed by `.`, `:` or whitespace.
fn heading_pattern(heading: &str) -> String {
    let words: Vec<String> = heading.split_whitespace().map(regex::escape).collect();
    format!(r"(?i)({})[\.:\s]", words.join(r"\s*"))
}

/// Locates protected sections page by page using glyph geometry.
#[derive(Debug, Clone)]
pub struct GeometricSectionLocator {
    headings: Vec<&'static str>,
}

impl Default for GeometricSectionLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometricSectionLocator {
    /// Uses the base table plus the paper-structure extension.
    pub fn new() -> Self {
        Self {
            headings: PROTECTED_HEADINGS
                .iter()
                .chain(EXTENDED_HEADINGS)
                .copied()
                .collect(),
        }
    }

    pub fn with_headings(headings: Vec<&'static str>) -> Self {
        Self { headings }
    }

    /// Literal and fully upper-cased search forms for a heading.
    pub fn search_forms(heading: &str) -> Vec<String> {
        let upper = heading.to_uppercase();
        if upper == heading {
            vec![upper]
        } else {
            vec![heading.to_string(), upper]
        }
    }

    pub fn locate<D: OverlayDocument + ?Sized>(&self, document: &D) -> ExcludedRegions {
        let mut pages = BTreeMap::new();

        for page in 0..document.page_count() {
            let bounds = match document.page_bounds(page) {
                Ok(bounds) => bounds,
                Err(e) => {
                    warn!(page = page + 1, error = %e, "cannot read page bounds, no protected sections");
                    continue;
                }
            };

            let mut regions: Vec<PageRegion> = Vec::new();
            for heading in &self.headings {
                for form in Self::search_forms(heading) {
                    let hits = match document.find_occurrences(page, &form) {
                        Ok(hits) => hits,
                        Err(e) => {
                            warn!(page = page + 1, heading = %form, error = %e, "heading search failed");
                            continue;
                        }
                    };
                    for hit in hits {
                        let region = PageRegion {
                            rect: Rect::new(bounds.x0, hit.y0, bounds.x1, bounds.y1),
                            title: form.clone(),
                        };
                        if !regions.contains(&region) {
                            debug!(page = page + 1, title = %form, y0 = hit.y0, "protected band");
                            regions.push(region);
                        }
                    }
                }
            }

            if !regions.is_empty() {
                info!(page = page + 1, regions = regions.len(), "protected sections on page");
                pages.insert(page, regions);
            }
        }

        ExcludedRegions::Geometric(pages)
    }
}
