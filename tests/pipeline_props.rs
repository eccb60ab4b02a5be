//! Property tests for the sanitize, segment, chunk and interleave stages.
//!
//! Invariants checked:
//! - normalized text holds only printable ASCII, newline and carriage return
//! - sentences rejoined with spaces carry the same words as the input
//! - line formatting keeps every word in order
//! - chunks stay within budget unless they are a single oversized sentence
//! - chunks reconstruct the sentence sequence exactly
//! - interleaving has the expected length and is reproducible under a seed

use anyhow::Result;
use corpus_prep::data::{
    interleave, rng_from_seed, CharTokenizer, JsonRecord, TokenChunker, Tokenizer,
};
use corpus_prep::utils::{format_lines, normalize, split_sentences};
use proptest::prelude::*;
use serde_json::json;

// =============================================================================
// Test Generators
// =============================================================================

/// Words with optional terminal punctuation, separated by assorted whitespace
fn sentence_like_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        (
            prop::string::string_regex("[A-Za-z0-9',]{1,12}").unwrap(),
            prop::sample::select(vec!["", "", "", ".", "!", "?"]),
            prop::sample::select(vec![" ", " ", "  ", "\n", "\t ", " \r\n"]),
        ),
        0..60,
    )
    .prop_map(|words| {
        words
            .into_iter()
            .map(|(word, punct, space)| format!("{}{}{}", word, punct, space))
            .collect()
    })
}

/// Arbitrary unicode text, including control characters
fn noisy_text() -> impl Strategy<Value = String> {
    prop::string::string_regex("(?s).{0,200}").unwrap()
}

/// Counts one token per word, so budgets are easy to reason about
struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        Ok(text.split_whitespace().map(|_| 7).collect())
    }

    fn begin_marker(&self) -> &str {
        "<s>"
    }

    fn end_marker(&self) -> &str {
        "</s>"
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn normalized_text_is_printable_ascii(text in noisy_text()) {
        let normalized = normalize(&text);
        prop_assert!(normalized.chars().all(|c| matches!(c, ' '..='~' | '\n' | '\r')));
        prop_assert!(!normalized.contains("  "));
    }

    #[test]
    fn sentences_rejoin_to_same_words(text in sentence_like_text()) {
        let rejoined = split_sentences(&text).collect::<Vec<_>>().join(" ");
        prop_assert!(text.split_whitespace().eq(rejoined.split_whitespace()));
    }

    #[test]
    fn formatting_preserves_words(text in sentence_like_text(), min_words in 1usize..15) {
        let normalized = normalize(&text);
        let formatted = format_lines(&normalized, min_words).unwrap();
        prop_assert!(normalized.split_whitespace().eq(formatted.split_whitespace()));
        for line in formatted.lines() {
            prop_assert!(line.split_whitespace().count() <= min_words * 2);
        }
    }

    #[test]
    fn chunks_respect_budget(text in sentence_like_text(), budget in 1usize..40) {
        let tokenizer = WordTokenizer;
        let chunker = TokenChunker::new(&tokenizer, budget).unwrap();
        let chunks = chunker.chunk_sentences(&text).unwrap();

        for chunk in &chunks {
            prop_assert!(
                chunk.token_count() <= budget || chunk.sentences().len() == 1,
                "chunk of {} sentences has {} tokens over budget {}",
                chunk.sentences().len(),
                chunk.token_count(),
                budget
            );
            let measured: usize = chunk
                .sentences()
                .iter()
                .map(|s| tokenizer.count_tokens(s).unwrap())
                .sum();
            prop_assert_eq!(measured, chunk.token_count());
        }
    }

    #[test]
    fn chunks_reconstruct_sentences(text in sentence_like_text(), budget in 1usize..200) {
        let tokenizer = CharTokenizer::ascii("<s>", "</s>");
        let chunker = TokenChunker::new(&tokenizer, budget).unwrap();

        let sentences: Vec<&str> = split_sentences(&text).collect();
        let chunks = chunker.pack(sentences.iter().copied()).unwrap();

        let flattened: Vec<&str> = chunks
            .iter()
            .flat_map(|c| c.sentences().iter().map(String::as_str))
            .collect();
        prop_assert_eq!(flattened, sentences);
    }

    #[test]
    fn wrapped_chunks_carry_markers(text in sentence_like_text()) {
        let tokenizer = CharTokenizer::ascii("<|b|>", "<|e|>");
        let chunker = TokenChunker::new(&tokenizer, 50).unwrap();
        for chunk in chunker.chunk_text(&text).unwrap() {
            prop_assert!(chunk.starts_with("<|b|>"));
            prop_assert!(chunk.ends_with("<|e|>"));
        }
    }

    #[test]
    fn interleave_length_and_reproducibility(
        chunk_count in 0usize..20,
        record_count in 0usize..20,
        replication in 1usize..7,
        seed in any::<u64>(),
    ) {
        let chunks: Vec<String> = (0..chunk_count).map(|i| format!("<s>{}</s>", i)).collect();
        let records: Vec<JsonRecord> = (0..record_count)
            .map(|i| JsonRecord::from_value(&json!({ "id": i })).unwrap())
            .collect();

        let mut rng = rng_from_seed(Some(seed));
        let first = interleave(chunks.clone(), records.clone(), replication, &mut rng);
        let second = interleave(chunks, records, replication, &mut rng_from_seed(Some(seed)));

        prop_assert_eq!(first.len(), replication * chunk_count + record_count);
        prop_assert_eq!(first, second);
    }
}

#[test]
fn single_sentence_over_budget_is_its_own_chunk() {
    let sentence = vec!["word"; 1500].join(" ") + ".";
    let chunker = TokenChunker::new(&WordTokenizer, 1000).unwrap();

    let chunks = chunker.chunk_text(&sentence).unwrap();

    assert_eq!(chunks, vec![format!("<s>{}</s>", sentence)]);
}
