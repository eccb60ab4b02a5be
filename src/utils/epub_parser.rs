use anyhow::{Context, Result};
use epub::doc::EpubDoc;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::info;

static SKIPPED_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|head)\b[^>]*>.*?</(script|style|head)\s*>")
        .expect("skipped element regex is valid")
});

static BLOCK_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|tr|blockquote|section)\s*>")
        .expect("block break regex is valid")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"));

/// Extract the text of every document in the EPUB spine, in reading order,
/// joined by a blank line
pub fn extract_text_from_epub(path: &Path) -> Result<String> {
    info!("Extracting text from EPUB: {:?}", path);

    let mut doc = EpubDoc::new(path)
        .with_context(|| format!("Failed to open EPUB file: {:?}", path))?;

    let mut chapters = Vec::new();
    let spine_len = doc.spine.len();

    for i in 0..spine_len {
        doc.set_current_page(i);

        if let Some((content, _mime)) = doc.get_current_str() {
            chapters.push(html_to_text(&content));
        }
    }

    info!("Extracted {} documents from EPUB", chapters.len());

    Ok(chapters.join("\n\n"))
}

/// Convert an XHTML document to plain text
///
/// Script, style and head elements are removed with their content, block
/// closers become line breaks and common entities are decoded.
pub fn html_to_text(html: &str) -> String {
    let text = SKIPPED_ELEMENT.replace_all(html, "");
    let text = BLOCK_BREAK.replace_all(&text, "\n");
    let text = TAG.replace_all(&text, "");
    decode_entities(&text)
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&rest[1..semi]).map(|ch| (ch, semi)));

        match decoded {
            Some((ch, semi)) => {
                result.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                result.push('&');
                rest = &rest[1..];
            }
        }
    }

    result.push_str(rest);
    result
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let hex = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X"));
            let code = if let Some(hex) = hex {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}
