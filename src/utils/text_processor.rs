use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

use super::sentences::split_sentences;
use crate::error::PrepError;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Count whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn is_kept_char(ch: char) -> bool {
    matches!(ch, ' '..='~' | '\n' | '\r')
}

fn ends_sentence(word: &str) -> bool {
    word.ends_with(['.', '!', '?'])
}

/// Reduce text to printable ASCII with single spaces between words
///
/// Accented and compatibility characters are decomposed first so that their
/// ASCII base survives; anything without an ASCII form is dropped. A changed
/// word count is reported as a warning, never as an error.
pub fn normalize(text: &str) -> String {
    let before = word_count(text);

    let ascii: String = text.nfkd().filter(|&ch| is_kept_char(ch)).collect();
    let normalized = WHITESPACE_RUN.replace_all(&ascii, " ").into_owned();

    let after = word_count(&normalized);
    if before != after {
        warn!("Word count changed during cleaning: {} -> {}", before, after);
    }

    normalized
}

/// Re-wrap text into lines of at least `min_words_per_line` words
///
/// A line closes on a word ending in `.`, `!` or `?` once the line already
/// holds `min_words_per_line` words, and is forced closed when it reaches
/// twice that many. Words are never dropped, duplicated or reordered; if the
/// output word sequence differs from the input the text is rejected.
///
/// The forced break is checked after every word, not only at sentence ends,
/// so a long sentence can be split across lines.
pub fn format_lines(text: &str, min_words_per_line: usize) -> Result<String, PrepError> {
    if min_words_per_line == 0 {
        return Err(PrepError::InvalidConfig("min_words_per_line must be > 0".into()));
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current_line: Vec<&str> = Vec::new();
    let mut words_in_line = 0;

    for sentence in split_sentences(text) {
        for word in sentence.split_whitespace() {
            current_line.push(word);

            if words_in_line >= min_words_per_line && ends_sentence(word) {
                lines.push(current_line.join(" "));
                current_line.clear();
                words_in_line = 0;
                continue;
            }

            words_in_line += 1;
            if words_in_line >= min_words_per_line * 2 {
                lines.push(current_line.join(" "));
                current_line.clear();
                words_in_line = 0;
            }
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line.join(" "));
    }

    let formatted = lines.join("\n");

    if !text.split_whitespace().eq(formatted.split_whitespace()) {
        return Err(PrepError::WordCountDrift {
            stage: "formatting",
            before: word_count(text),
            after: word_count(&formatted),
        });
    }

    debug!("Formatted {} words into {} lines", word_count(&formatted), lines.len());

    Ok(formatted)
}

/// Normalize then format a raw document
pub fn sanitize_and_format(text: &str, min_words_per_line: usize) -> Result<String, PrepError> {
    debug!("Sanitizing and formatting text of length {}", text.len());
    let normalized = normalize(text);
    format_lines(&normalized, min_words_per_line)
}
