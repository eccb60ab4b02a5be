use regex::Regex;
use std::sync::LazyLock;

/// Terminal punctuation followed by the whitespace run that separates sentences
static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence boundary regex is valid"));

/// Lazy iterator over the sentences of a text
///
/// A sentence ends at `.`, `!` or `?` when the next character is whitespace.
/// The punctuation stays with the sentence, the whitespace is dropped. Text
/// after the last boundary is yielded as the final sentence unless it is empty.
#[derive(Debug, Clone)]
pub struct Sentences<'a> {
    text: &'a str,
    start: usize,
    done: bool,
}

impl<'a> Sentences<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            start: 0,
            done: false,
        }
    }
}

impl<'a> Iterator for Sentences<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match SENTENCE_BOUNDARY.find_at(self.text, self.start) {
            Some(boundary) => {
                // The punctuation mark is a single ASCII byte
                let end = boundary.start() + 1;
                let sentence = &self.text[self.start..end];
                self.start = boundary.end();
                Some(sentence)
            }
            None => {
                self.done = true;
                let rest = &self.text[self.start..];
                if rest.trim().is_empty() {
                    None
                } else {
                    Some(rest)
                }
            }
        }
    }
}

/// Split text into sentences
pub fn split_sentences(text: &str) -> Sentences<'_> {
    Sentences::new(text)
}
