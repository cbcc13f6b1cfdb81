//! Test fixtures and PDF builders.
//!
//! Papers are built directly with lopdf so the content stream holds one
//! `(line) Tj` per text line, which keeps byte-level substitution
//! predictable.

use anyhow::Result;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::fs;
use std::path::{Path, PathBuf};

/// Builder for creating test papers with custom content.
///
/// # Example
///
/// ```no_run
/// # use anyhow::Result;
/// # fn main() -> Result<()> {
/// let bytes = PaperPdfBuilder::new()
///     .with_author("Jane Doe")
///     .with_page(&["Jane Doe wrote this paper."])
///     .with_page(&["References", "[1] Jane Doe. A study. 2020."])
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PaperPdfBuilder {
    pages: Vec<Vec<String>>,
    author: Option<String>,
    producer: Option<String>,
}

impl PaperPdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a page with one text line per entry.
    pub fn with_page(mut self, lines: &[&str]) -> Self {
        self.pages.push(lines.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn with_producer(mut self, producer: &str) -> Self {
        self.producer = Some(producer.to_string());
        self
    }

    /// Builds the PDF in memory.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for lines in &self.pages {
            let mut operations = Vec::new();
            for (i, line) in lines.iter().enumerate() {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), Object::Integer(12)]));
                operations.push(Operation::new(
                    "Td",
                    vec![Object::Integer(72), Object::Integer(720 - 16 * i as i64)],
                ));
                operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if self.author.is_some() || self.producer.is_some() {
            let mut info = lopdf::Dictionary::new();
            if let Some(author) = &self.author {
                info.set("Author", Object::string_literal(author.as_str()));
            }
            if let Some(producer) = &self.producer {
                info.set("Producer", Object::string_literal(producer.as_str()));
            }
            let info_id = doc.add_object(info);
            doc.trailer.set("Info", info_id);
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;
        Ok(buffer)
    }

    /// Builds the PDF and writes it to the specified path.
    pub fn build_to(&self, output_path: &Path) -> Result<PathBuf> {
        fs::write(output_path, self.build()?)?;
        Ok(output_path.to_path_buf())
    }
}

/// Two pages: the author in the body, then a reference list citing them.
pub fn sample_paper() -> PaperPdfBuilder {
    PaperPdfBuilder::new()
        .with_author("Jane Doe")
        .with_producer("pdfTeX")
        .with_page(&["Jane Doe wrote this paper.", "Contact: jane.doe@lab.org"])
        .with_page(&["References", "[1] Jane Doe. A study. 2020."])
}

/// Extracted text of every page of a saved PDF.
pub fn page_texts(bytes: &[u8]) -> Result<Vec<String>> {
    let doc = Document::load_mem(bytes)?;
    let numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    numbers
        .into_iter()
        .map(|n| doc.extract_text(&[n]).map_err(anyhow::Error::from))
        .collect()
}

/// Author field of a saved PDF.
pub fn author_of(bytes: &[u8]) -> Result<Option<String>> {
    use paper_anonymizer::document::{DocumentSession, LopdfDocument};
    let doc = LopdfDocument::load(bytes)?;
    Ok(doc.metadata()?.author)
}
