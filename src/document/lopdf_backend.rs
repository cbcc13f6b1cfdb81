//! Content-stream session on lopdf.
//!
//! Pages are addressed by 0-based index; lopdf's own page numbers are
//! 1-based and are resolved once at load time.

use super::{
    decode_pdf_text, encode_latin1, DocumentMetadata, DocumentSession, StreamDocument,
};
use crate::error::{AnonymizerError, AnonymizerResult};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use tracing::debug;

/// A PDF loaded with lopdf whose page contents can be rewritten in place.
pub struct LopdfDocument {
    inner: Document,
    pages: Vec<(u32, ObjectId)>,
}

impl LopdfDocument {
    /// Parses `bytes` into a document.
    pub fn load(bytes: &[u8]) -> AnonymizerResult<Self> {
        let inner = Document::load_mem(bytes).map_err(|e| AnonymizerError::DocumentOpen {
            message: format!("lopdf could not parse input: {}", e),
            source: Some(Box::new(e)),
        })?;
        Ok(Self::from_document(inner))
    }

    pub fn from_document(inner: Document) -> Self {
        let pages: Vec<(u32, ObjectId)> = inner.get_pages().into_iter().collect();
        debug!(pages = pages.len(), "lopdf document loaded");
        Self { inner, pages }
    }

    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.inner
    }

    /// lopdf page number and object id for a 0-based index.
    pub(crate) fn page(&self, index: usize) -> AnonymizerResult<(u32, ObjectId)> {
        self.pages
            .get(index)
            .copied()
            .ok_or_else(|| AnonymizerError::InvalidInput {
                parameter: "page".to_string(),
                reason: format!(
                    "page index {} out of range ({} pages)",
                    index,
                    self.pages.len()
                ),
            })
    }
}

impl DocumentSession for LopdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> AnonymizerResult<String> {
        let (number, _) = self.page(index)?;
        self.inner
            .extract_text(&[number])
            .map_err(|e| AnonymizerError::PageExtraction {
                page: index + 1,
                message: e.to_string(),
            })
    }

    fn metadata(&self) -> AnonymizerResult<DocumentMetadata> {
        read_info(&self.inner)
    }

    fn set_author(&mut self, author: &str) -> AnonymizerResult<()> {
        write_author(&mut self.inner, author)
    }

    fn save(&mut self) -> AnonymizerResult<Vec<u8>> {
        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| AnonymizerError::Serialization {
                message: e.to_string(),
                source: Some(Box::new(e)),
            })?;
        Ok(buffer)
    }
}

impl StreamDocument for LopdfDocument {
    fn content(&self, index: usize) -> AnonymizerResult<Vec<u8>> {
        let (_, id) = self.page(index)?;
        self.inner
            .get_page_content(id)
            .map_err(|e| AnonymizerError::PageRedaction {
                page: index + 1,
                message: format!("cannot read content stream: {}", e),
            })
    }

    fn replace_content(&mut self, index: usize, content: Vec<u8>) -> AnonymizerResult<()> {
        let (_, id) = self.page(index)?;
        self.inner
            .change_page_content(id, content)
            .map_err(|e| AnonymizerError::PageRedaction {
                page: index + 1,
                message: format!("cannot write content stream: {}", e),
            })
    }
}

fn metadata_error(message: impl Into<String>) -> AnonymizerError {
    AnonymizerError::Metadata {
        message: message.into(),
    }
}

/// Reads the trailer's Info dictionary. A missing dictionary yields empty metadata.
pub(crate) fn read_info(doc: &Document) -> AnonymizerResult<DocumentMetadata> {
    let info = match doc.trailer.get(b"Info") {
        Err(_) => return Ok(DocumentMetadata::default()),
        Ok(Object::Reference(id)) => doc
            .get_dictionary(*id)
            .map_err(|e| metadata_error(format!("cannot resolve Info dictionary: {}", e)))?,
        Ok(Object::Dictionary(dict)) => dict,
        Ok(_) => return Err(metadata_error("Info entry is not a dictionary")),
    };

    let field = |key: &[u8]| -> Option<String> {
        let value = match info.get(key).ok()? {
            Object::Reference(id) => doc.get_object(*id).ok()?,
            other => other,
        };
        match value {
            Object::String(bytes, _) => Some(decode_pdf_text(bytes)),
            _ => None,
        }
    };

    Ok(DocumentMetadata {
        author: field(b"Author"),
        creator: field(b"Creator"),
        producer: field(b"Producer"),
        title: field(b"Title"),
        subject: field(b"Subject"),
    })
}

/// Sets the Info dictionary's Author entry, creating the dictionary if needed.
pub(crate) fn write_author(doc: &mut Document, author: &str) -> AnonymizerResult<()> {
    let value = Object::String(encode_text_string(author), StringFormat::Literal);

    let info_id = match doc.trailer.get(b"Info").ok().cloned() {
        Some(Object::Reference(id)) => id,
        Some(Object::Dictionary(mut dict)) => {
            dict.set("Author", value);
            doc.trailer.set("Info", Object::Dictionary(dict));
            return Ok(());
        }
        Some(_) => return Err(metadata_error("Info entry is not a dictionary")),
        None => {
            let id = doc.add_object(Dictionary::new());
            doc.trailer.set("Info", id);
            id
        }
    };

    doc.get_object_mut(info_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| metadata_error(format!("cannot update Info dictionary: {}", e)))?
        .set("Author", value);
    Ok(())
}

/// Latin-1 when possible, otherwise UTF-16BE with a byte-order mark.
fn encode_text_string(text: &str) -> Vec<u8> {
    encode_latin1(text).unwrap_or_else(|| {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        bytes
    })
}
