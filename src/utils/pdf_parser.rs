use anyhow::{Context, Result};
use pdf_extract::extract_text;
use std::path::Path;
use tracing::{info, warn};

/// Extract the text of a PDF, pages joined by a blank line
pub fn extract_text_from_pdf(path: &Path) -> Result<String> {
    info!("Extracting text from PDF: {:?}", path);

    let text = extract_text(path)
        .with_context(|| format!("Failed to extract text from PDF: {:?}", path))?;

    if text.trim().is_empty() {
        warn!("PDF appears to be scanned or has no extractable text: {:?}", path);
    }

    let pages = split_pages(&text);
    info!("Extracted {} pages from PDF", pages.len());

    Ok(pages.join("\n\n"))
}

/// Split extracted text on form feeds, dropping blank pages
fn split_pages(text: &str) -> Vec<&str> {
    text.split('\x0C')
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .collect()
}
