//! In-memory document for pipeline tests.
//!
//! Each page is a list of text lines stored as a tiny content stream, one
//! `(line) Tj` per line, so content-stream redaction changes what
//! `page_text` returns afterwards. Geometry is a fixed grid: line `i` sits
//! at `y = TOP + i * LINE_HEIGHT`, each character is `CHAR_WIDTH` wide.
//! Search is case-insensitive like MuPDF's.

use paper_anonymizer::document::{
    DocumentMetadata, DocumentSession, OverlayDocument, Rect, StreamDocument,
};
use paper_anonymizer::{AnonymizerError, AnonymizerResult};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const LEFT: f32 = 50.0;
pub const TOP: f32 = 50.0;
pub const LINE_HEIGHT: f32 = 20.0;
pub const GLYPH_HEIGHT: f32 = 12.0;
pub const CHAR_WIDTH: f32 = 6.0;

/// An overlay drawn on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamp {
    pub page: usize,
    pub rect: Rect,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct FakeDocument {
    contents: Vec<Vec<u8>>,
    pub metadata: DocumentMetadata,
    pub stamps: Vec<Stamp>,
    pending: Vec<Stamp>,
    pub fail_extract_on: Option<usize>,
    pub fail_write_on: Option<usize>,
    pub fail_search_on: Option<usize>,
    pub fail_metadata: bool,
    pub fail_save: bool,
}

impl FakeDocument {
    pub fn new(pages: &[&[&str]]) -> Self {
        Self {
            contents: pages.iter().map(|lines| encode_lines(lines)).collect(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.metadata.author = Some(author.to_string());
        self
    }

    pub fn lines(&self, index: usize) -> Vec<String> {
        decode_lines(&self.contents[index])
    }

    pub fn text(&self, index: usize) -> String {
        self.lines(index).join("\n")
    }

    pub fn raw_content(&self, index: usize) -> &[u8] {
        &self.contents[index]
    }

    pub fn pending_on(&self, index: usize) -> usize {
        self.pending.iter().filter(|s| s.page == index).count()
    }
}

fn encode_lines(lines: &[&str]) -> Vec<u8> {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("BT /F1 12 Tf 50 {} Td ({}) Tj ET\n", 742 - 20 * i, line))
        .collect::<String>()
        .into_bytes()
}

fn decode_lines(content: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(content)
        .lines()
        .filter_map(|line| {
            let start = line.find('(')?;
            let end = line.rfind(") Tj")?;
            Some(line[start + 1..end].to_string())
        })
        .collect()
}

fn out_of_range(index: usize) -> AnonymizerError {
    AnonymizerError::InvalidInput {
        parameter: "page".to_string(),
        reason: format!("no page {}", index),
    }
}

impl DocumentSession for FakeDocument {
    fn page_count(&self) -> usize {
        self.contents.len()
    }

    fn page_text(&self, index: usize) -> AnonymizerResult<String> {
        if self.fail_extract_on == Some(index) {
            return Err(AnonymizerError::PageExtraction {
                page: index + 1,
                message: "broken font".to_string(),
            });
        }
        if index >= self.contents.len() {
            return Err(out_of_range(index));
        }
        Ok(self.text(index))
    }

    fn metadata(&self) -> AnonymizerResult<DocumentMetadata> {
        if self.fail_metadata {
            return Err(AnonymizerError::Metadata {
                message: "Info dictionary is corrupt".to_string(),
            });
        }
        Ok(self.metadata.clone())
    }

    fn set_author(&mut self, author: &str) -> AnonymizerResult<()> {
        if self.fail_metadata {
            return Err(AnonymizerError::Metadata {
                message: "Info dictionary is corrupt".to_string(),
            });
        }
        self.metadata.author = Some(author.to_string());
        Ok(())
    }

    fn save(&mut self) -> AnonymizerResult<Vec<u8>> {
        if self.fail_save {
            return Err(AnonymizerError::Serialization {
                message: "disk full".to_string(),
                source: None,
            });
        }
        self.stamps.append(&mut self.pending);
        Ok(self.contents.concat())
    }
}

impl StreamDocument for FakeDocument {
    fn content(&self, index: usize) -> AnonymizerResult<Vec<u8>> {
        self.contents.get(index).cloned().ok_or_else(|| out_of_range(index))
    }

    fn replace_content(&mut self, index: usize, content: Vec<u8>) -> AnonymizerResult<()> {
        if self.fail_write_on == Some(index) {
            return Err(AnonymizerError::PageRedaction {
                page: index + 1,
                message: "content stream is locked".to_string(),
            });
        }
        let slot = self.contents.get_mut(index).ok_or_else(|| out_of_range(index))?;
        *slot = content;
        Ok(())
    }
}

impl OverlayDocument for FakeDocument {
    fn page_bounds(&self, index: usize) -> AnonymizerResult<Rect> {
        if index >= self.contents.len() {
            return Err(out_of_range(index));
        }
        Ok(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT))
    }

    fn find_occurrences(&self, index: usize, needle: &str) -> AnonymizerResult<Vec<Rect>> {
        if self.fail_search_on == Some(index) {
            return Err(AnonymizerError::Backend {
                backend: "fake".to_string(),
                message: "search failed".to_string(),
                source: None,
            });
        }
        let needle = needle.to_lowercase();
        let width = needle.chars().count() as f32 * CHAR_WIDTH;

        let mut hits = Vec::new();
        for (row, line) in self.lines(index).iter().enumerate() {
            let lower = line.to_lowercase();
            for (col, _) in lower.match_indices(&needle) {
                let x0 = LEFT + lower[..col].chars().count() as f32 * CHAR_WIDTH;
                let y0 = TOP + row as f32 * LINE_HEIGHT;
                hits.push(Rect::new(x0, y0, x0 + width, y0 + GLYPH_HEIGHT));
            }
        }
        Ok(hits)
    }

    fn cover_and_stamp(&mut self, index: usize, rect: Rect, text: &str) -> AnonymizerResult<()> {
        if index >= self.contents.len() {
            return Err(out_of_range(index));
        }
        self.pending.push(Stamp {
            page: index,
            rect,
            text: text.to_string(),
        });
        Ok(())
    }

    fn commit_page(&mut self, index: usize) -> AnonymizerResult<()> {
        let (page, rest): (Vec<Stamp>, Vec<Stamp>) =
            self.pending.drain(..).partition(|s| s.page == index);
        self.pending = rest;
        self.stamps.extend(page);
        Ok(())
    }

    fn revert_page(&mut self, index: usize) {
        self.pending.retain(|s| s.page != index);
    }
}
