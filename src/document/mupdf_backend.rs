//! Geometric overlay session.
//!
//! MuPDF supplies glyph-accurate search and page bounds; the overlays
//! themselves (white box plus stamped mask text) are appended as extra
//! content streams through lopdf, which also serializes the result. Both
//! libraries open the same input bytes, so page indices line up.

use super::{DocumentMetadata, DocumentSession, LopdfDocument, OverlayDocument, Rect};
use crate::error::{AnonymizerError, AnonymizerResult};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use mupdf::pdf::PdfDocument;
use std::collections::BTreeMap;
use tracing::debug;

/// Resource name of the font used for stamped mask text.
const STAMP_FONT: &[u8] = b"AnonStamp";

/// Stamp font size in points.
pub const STAMP_FONT_SIZE: f32 = 8.0;

/// Upper bound on hits returned by one search on one page.
const MAX_HITS_PER_SEARCH: u32 = 500;

#[derive(Debug, Clone)]
struct Overlay {
    rect: Rect,
    text: String,
}

/// Overlay session over MuPDF (search) and lopdf (drawing, saving).
pub struct MupdfOverlayDocument {
    search: PdfDocument,
    writer: LopdfDocument,
    pending: BTreeMap<usize, Vec<Overlay>>,
    stamp_font: Option<ObjectId>,
}

impl MupdfOverlayDocument {
    /// Opens `bytes` with both libraries.
    pub fn load(bytes: &[u8]) -> AnonymizerResult<Self> {
        let search = PdfDocument::from_bytes(bytes).map_err(|e| AnonymizerError::DocumentOpen {
            message: format!("MuPDF could not parse input: {}", e),
            source: Some(Box::new(e)),
        })?;
        let writer = LopdfDocument::load(bytes)?;

        let mupdf_pages = search
            .page_count()
            .map_err(|e| AnonymizerError::mupdf("Failed to get page count", e))?;
        if mupdf_pages as usize != writer.page_count() {
            return Err(AnonymizerError::DocumentOpen {
                message: format!(
                    "page count mismatch: MuPDF sees {}, lopdf sees {}",
                    mupdf_pages,
                    writer.page_count()
                ),
                source: None,
            });
        }

        Ok(Self {
            search,
            writer,
            pending: BTreeMap::new(),
            stamp_font: None,
        })
    }

    fn load_page(&self, index: usize) -> AnonymizerResult<mupdf::Page> {
        self.search
            .load_page(index as i32)
            .map_err(|e| AnonymizerError::mupdf(format!("Failed to load page {}", index + 1), e))
    }

    fn stamp_font(&mut self) -> ObjectId {
        if let Some(id) = self.stamp_font {
            return id;
        }
        let id = self.writer.document_mut().add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        self.stamp_font = Some(id);
        id
    }
}

impl DocumentSession for MupdfOverlayDocument {
    fn page_count(&self) -> usize {
        self.writer.page_count()
    }

    fn page_text(&self, index: usize) -> AnonymizerResult<String> {
        self.writer.page_text(index)
    }

    fn metadata(&self) -> AnonymizerResult<DocumentMetadata> {
        self.writer.metadata()
    }

    fn set_author(&mut self, author: &str) -> AnonymizerResult<()> {
        self.writer.set_author(author)
    }

    fn save(&mut self) -> AnonymizerResult<Vec<u8>> {
        let pages: Vec<usize> = self.pending.keys().copied().collect();
        for index in pages {
            self.commit_page(index)
                .map_err(|e| AnonymizerError::Serialization {
                    message: e.to_string(),
                    source: Some(Box::new(e)),
                })?;
        }
        self.writer.save()
    }
}

impl OverlayDocument for MupdfOverlayDocument {
    fn page_bounds(&self, index: usize) -> AnonymizerResult<Rect> {
        let bounds = self
            .load_page(index)?
            .bounds()
            .map_err(|e| AnonymizerError::mupdf(format!("Failed to get bounds for page {}", index + 1), e))?;
        Ok(Rect::new(bounds.x0, bounds.y0, bounds.x1, bounds.y1))
    }

    fn find_occurrences(&self, index: usize, needle: &str) -> AnonymizerResult<Vec<Rect>> {
        let page = self.load_page(index)?;
        let hits = page
            .search(needle, MAX_HITS_PER_SEARCH)
            .map_err(|e| AnonymizerError::mupdf(format!("Search failed for pattern: {}", needle), e))?;

        Ok(hits
            .into_iter()
            .map(|quad| {
                Rect::new(
                    quad.ul.x.min(quad.ll.x).min(quad.ur.x).min(quad.lr.x),
                    quad.ul.y.min(quad.ll.y).min(quad.ur.y).min(quad.lr.y),
                    quad.ul.x.max(quad.ll.x).max(quad.ur.x).max(quad.lr.x),
                    quad.ul.y.max(quad.ll.y).max(quad.ur.y).max(quad.lr.y),
                )
            })
            .collect())
    }

    fn cover_and_stamp(&mut self, index: usize, rect: Rect, text: &str) -> AnonymizerResult<()> {
        if index >= self.page_count() {
            return Err(redaction_error(index, "page index out of range"));
        }
        self.pending.entry(index).or_default().push(Overlay {
            rect,
            text: text.to_string(),
        });
        Ok(())
    }

    fn commit_page(&mut self, index: usize) -> AnonymizerResult<()> {
        let Some(overlays) = self.pending.remove(&index) else {
            return Ok(());
        };
        if overlays.is_empty() {
            return Ok(());
        }

        let bounds = self.page_bounds(index)?;
        let (_, page_id) = self.writer.page(index)?;
        let font_id = self.stamp_font();
        let doc = self.writer.document_mut();

        let frame = page_frame(doc, page_id)
            .unwrap_or([bounds.x0, bounds.y0, bounds.x1, bounds.y1]);
        let encoded = overlay_content(&overlays, frame)
            .map_err(|e| redaction_error(index, format!("cannot encode overlay: {}", e)))?;

        let resources = stamped_resources(doc, page_id, font_id);
        let contents = wrapped_contents(doc, page_id, encoded)
            .map_err(|e| redaction_error(index, format!("cannot read page contents: {}", e)))?;

        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| redaction_error(index, format!("cannot update page: {}", e)))?;
        page.set("Resources", Object::Dictionary(resources));
        page.set("Contents", contents);

        debug!(page = index + 1, overlays = overlays.len(), "overlays committed");
        Ok(())
    }

    fn revert_page(&mut self, index: usize) {
        self.pending.remove(&index);
    }
}

fn redaction_error(index: usize, message: impl Into<String>) -> AnonymizerError {
    AnonymizerError::PageRedaction {
        page: index + 1,
        message: message.into(),
    }
}

/// Visible page frame `[x0, y0, x1, y1]` in PDF user space (CropBox, else
/// MediaBox, following `Parent` inheritance).
fn page_frame(doc: &Document, page_id: ObjectId) -> Option<[f32; 4]> {
    for key in [b"CropBox".as_slice(), b"MediaBox".as_slice()] {
        let mut current = Some(page_id);
        let mut depth = 0;
        while let Some(id) = current {
            let dict = doc.get_dictionary(id).ok()?;
            if let Some(frame) = dict.get(key).ok().and_then(|obj| box_values(doc, obj)) {
                return Some(frame);
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
            depth += 1;
            if depth > 32 {
                break;
            }
        }
    }
    None
}

fn box_values(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let items = match obj {
        Object::Array(items) => items,
        Object::Reference(id) => doc.get_object(*id).ok()?.as_array().ok()?,
        _ => return None,
    };
    let numbers: Vec<f32> = items
        .iter()
        .filter_map(|item| match item {
            Object::Integer(i) => Some(*i as f32),
            Object::Real(r) => Some(*r as f32),
            _ => None,
        })
        .collect();
    if numbers.len() != 4 {
        return None;
    }
    Some([
        numbers[0].min(numbers[2]),
        numbers[1].min(numbers[3]),
        numbers[0].max(numbers[2]),
        numbers[1].max(numbers[3]),
    ])
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

/// Encodes the drawing operators for a page's overlays.
///
/// Overlay rectangles are in page space (top-left origin), `frame` is the
/// page's visible box in PDF user space (bottom-left origin).
fn overlay_content(overlays: &[Overlay], frame: [f32; 4]) -> lopdf::Result<Vec<u8>> {
    let [left, _, _, top] = frame;
    let mut operations = vec![Operation::new("q", vec![])];

    for overlay in overlays {
        let r = overlay.rect;
        operations.push(Operation::new("rg", vec![real(1.0), real(1.0), real(1.0)]));
        operations.push(Operation::new(
            "re",
            vec![
                real(left + r.x0),
                real(top - r.y1),
                real(r.width()),
                real(r.height()),
            ],
        ));
        operations.push(Operation::new("f", vec![]));

        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![Object::Name(STAMP_FONT.to_vec()), real(STAMP_FONT_SIZE)],
        ));
        operations.push(Operation::new("rg", vec![real(0.0), real(0.0), real(0.0)]));
        operations.push(Operation::new(
            "Td",
            vec![real(left + r.x0), real(top - (r.y1 - 2.0))],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(overlay.text.as_bytes().to_vec())],
        ));
        operations.push(Operation::new("ET", vec![]));
    }

    operations.push(Operation::new("Q", vec![]));
    Content { operations }.encode()
}

/// The page's effective resources with the stamp font added.
fn stamped_resources(doc: &Document, page_id: ObjectId, font_id: ObjectId) -> Dictionary {
    let mut resources = inherited_dictionary(doc, page_id, b"Resources").unwrap_or_default();

    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).cloned().unwrap_or_default(),
        _ => Dictionary::new(),
    };
    fonts.set(STAMP_FONT.to_vec(), Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));
    resources
}

fn inherited_dictionary(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Dictionary> {
    let mut current = Some(page_id);
    let mut depth = 0;
    while let Some(id) = current {
        let dict = doc.get_dictionary(id).ok()?;
        match dict.get(key) {
            Ok(Object::Dictionary(found)) => return Some(found.clone()),
            Ok(Object::Reference(found)) => return doc.get_dictionary(*found).ok().cloned(),
            _ => {}
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
        if depth > 32 {
            break;
        }
    }
    None
}

/// New Contents array: `q`, the original streams, then `Q` plus the overlay.
///
/// The save/restore pair isolates the overlay from any graphics state the
/// original content leaves behind.
fn wrapped_contents(doc: &mut Document, page_id: ObjectId, overlay: Vec<u8>) -> lopdf::Result<Object> {
    let existing: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Array(items) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let open = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let mut body = b"Q\n".to_vec();
    body.extend(overlay);
    let close = doc.add_object(Stream::new(Dictionary::new(), body));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open));
    contents.extend(existing);
    contents.push(Object::Reference(close));
    Ok(Object::Array(contents))
}
