//! Document primitives consumed by the anonymization core.
//!
//! The core never touches a PDF library directly. It works against two
//! session traits, one per redaction backend:
//!
//! - [`StreamDocument`]: raw page content streams that can be rewritten
//!   byte-for-byte (implemented on lopdf by [`LopdfDocument`]).
//! - [`OverlayDocument`]: glyph-position search plus cover-and-stamp drawing
//!   (implemented by [`MupdfOverlayDocument`]).
//!
//! Both extend [`DocumentSession`], which covers page text, metadata and
//! serialization.

pub mod lopdf_backend;
pub mod mupdf_backend;

pub use lopdf_backend::LopdfDocument;
pub use mupdf_backend::MupdfOverlayDocument;

use crate::error::{AnonymizerError, AnonymizerResult};
use serde::Serialize;
use std::ops::Range;
use std::path::Path;
use tracing::{debug, warn};

/// Axis-aligned rectangle in page space (origin top-left, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// True if the two rectangles share a non-empty area.
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x0 < other.x1
            && other.x0 < self.x1
            && self.y0 < other.y1
            && other.y0 < self.y1
    }
}

/// Document information fields reported by extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub title: Option<String>,
    pub subject: Option<String>,
}

/// Operations shared by every backend session.
pub trait DocumentSession {
    fn page_count(&self) -> usize;

    /// Extracted text of one page (`index` is 0-based).
    fn page_text(&self, index: usize) -> AnonymizerResult<String>;

    fn metadata(&self) -> AnonymizerResult<DocumentMetadata>;

    /// Rewrites the author field, leaving every other field untouched.
    fn set_author(&mut self, author: &str) -> AnonymizerResult<()>;

    /// Serializes the (possibly modified) document.
    fn save(&mut self) -> AnonymizerResult<Vec<u8>>;
}

/// Session whose pages expose raw content-stream bytes.
pub trait StreamDocument: DocumentSession {
    fn content(&self, index: usize) -> AnonymizerResult<Vec<u8>>;

    fn replace_content(&mut self, index: usize, content: Vec<u8>) -> AnonymizerResult<()>;
}

/// Session that can locate literal text geometrically and draw over it.
pub trait OverlayDocument: DocumentSession {
    fn page_bounds(&self, index: usize) -> AnonymizerResult<Rect>;

    /// Bounding boxes of every occurrence of `needle` on the page.
    fn find_occurrences(&self, index: usize, needle: &str) -> AnonymizerResult<Vec<Rect>>;

    /// Covers `rect` with an opaque white box and stamps `text` at its
    /// lower-left corner.
    fn cover_and_stamp(&mut self, index: usize, rect: Rect, text: &str) -> AnonymizerResult<()>;

    /// Writes the page's pending overlays into its content.
    ///
    /// The page is left untouched if any step fails.
    fn commit_page(&mut self, index: usize) -> AnonymizerResult<()>;

    /// Drops every pending overlay on the page so it is saved unmodified.
    fn revert_page(&mut self, index: usize);
}

/// Per-page text and its whole-document concatenation.
///
/// Each page contributes its text followed by a newline; `spans[i]` is the
/// byte range of page `i` inside `full`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentText {
    pub pages: Vec<String>,
    pub spans: Vec<Range<usize>>,
    pub full: String,
}

impl DocumentText {
    pub fn from_pages(pages: Vec<String>) -> Self {
        let mut full = String::new();
        let mut spans = Vec::with_capacity(pages.len());
        for text in &pages {
            let start = full.len();
            full.push_str(text);
            spans.push(start..full.len());
            full.push('\n');
        }
        Self { pages, spans, full }
    }

    /// Extracts every page, substituting empty text for pages that fail.
    pub fn collect<D: DocumentSession + ?Sized>(document: &D) -> Self {
        let pages = (0..document.page_count())
            .map(|index| match document.page_text(index) {
                Ok(text) => {
                    if text.trim().is_empty() {
                        warn!(page = index + 1, "page has no extractable text");
                    } else {
                        debug!(page = index + 1, chars = text.len(), "page text extracted");
                    }
                    text
                }
                Err(e) => {
                    warn!(page = index + 1, error = %e, "text extraction failed, using empty text");
                    String::new()
                }
            })
            .collect();
        Self::from_pages(pages)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Whole-document plain text via pdf-extract, independent of either backend.
pub fn extract_plain_text(bytes: &[u8]) -> AnonymizerResult<String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| AnonymizerError::Backend {
        backend: "pdf-extract".to_string(),
        message: e.to_string(),
        source: None,
    })
}

/// Reads a whole file, reporting failures against its path.
pub fn read_file(path: &Path) -> AnonymizerResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| AnonymizerError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `bytes` to `path`, replacing any existing file.
pub fn write_file(path: &Path, bytes: &[u8]) -> AnonymizerResult<()> {
    std::fs::write(path, bytes).map_err(|source| AnonymizerError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Decodes a PDF text string (UTF-16BE with BOM, otherwise Latin-1).
pub(crate) fn decode_pdf_text(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Encodes `text` as Latin-1, or `None` if any character falls outside it.
pub(crate) fn encode_latin1(text: &str) -> Option<Vec<u8>> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect()
}
