pub mod epub_parser;
pub mod pdf_parser;
pub mod sentences;
pub mod text_processor;

pub use epub_parser::extract_text_from_epub;
pub use pdf_parser::extract_text_from_pdf;
pub use sentences::{split_sentences, Sentences};
pub use text_processor::{format_lines, normalize, sanitize_and_format, word_count};

use anyhow::Result;
use std::path::Path;

/// Source document formats that can be converted to plain text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Epub,
    Pdf,
}

impl DocumentKind {
    /// Detect the format from the file extension, case-insensitively
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "epub" => Some(Self::Epub),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Extract the plain text of an EPUB or PDF, sections separated by a blank line
pub fn extract_document_text(path: &Path) -> Result<String> {
    match DocumentKind::from_path(path) {
        Some(DocumentKind::Epub) => extract_text_from_epub(path),
        Some(DocumentKind::Pdf) => extract_text_from_pdf(path),
        None => anyhow::bail!("Unsupported file format: {:?}", path),
    }
}
