use anyhow::Result;
use tracing::debug;

use super::tokenizer::Tokenizer;
use crate::error::PrepError;
use crate::utils::split_sentences;

/// A group of consecutive sentences packed under a token budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    sentences: Vec<String>,
    token_count: usize,
}

impl Chunk {
    fn new() -> Self {
        Self {
            sentences: Vec::new(),
            token_count: 0,
        }
    }

    fn push(&mut self, sentence: &str, tokens: usize) {
        self.sentences.push(sentence.to_string());
        self.token_count += tokens;
    }

    fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    /// Sum of the per-sentence token counts
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// True for a lone sentence that exceeds the budget on its own
    pub fn is_oversized(&self, max_tokens: usize) -> bool {
        self.token_count > max_tokens
    }

    /// Sentences joined by single spaces
    pub fn content(&self) -> String {
        self.sentences.join(" ")
    }

    /// Content surrounded by the boundary markers
    pub fn wrap(&self, begin: &str, end: &str) -> String {
        format!("{}{}{}", begin, self.content(), end)
    }
}

/// Greedy packer of sentences into token-bounded chunks
///
/// The running length of a chunk is the sum of its sentences' token counts;
/// the joined text is never re-tokenized, so the real length of a chunk may
/// differ slightly from the figure used for packing. A sentence longer than
/// the budget is kept whole as its own chunk rather than truncated.
pub struct TokenChunker<'a, T: Tokenizer + ?Sized> {
    tokenizer: &'a T,
    max_tokens: usize,
}

impl<'a, T: Tokenizer + ?Sized> TokenChunker<'a, T> {
    pub fn new(tokenizer: &'a T, max_tokens: usize) -> Result<Self, PrepError> {
        if max_tokens == 0 {
            return Err(PrepError::InvalidConfig("max_tokens must be > 0".into()));
        }
        Ok(Self { tokenizer, max_tokens })
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Pack sentences, in order, into chunks
    pub fn pack<'s, I>(&self, sentences: I) -> Result<Vec<Chunk>>
    where
        I: IntoIterator<Item = &'s str>,
    {
        let mut chunks = Vec::new();
        let mut current = Chunk::new();

        for sentence in sentences {
            let sentence_len = self.tokenizer.count_tokens(sentence)?;

            if current.token_count + sentence_len > self.max_tokens {
                if !current.is_empty() {
                    chunks.push(std::mem::replace(&mut current, Chunk::new()));
                }

                if sentence_len > self.max_tokens {
                    debug!(
                        "Sentence of {} tokens exceeds budget of {}, emitting it alone",
                        sentence_len, self.max_tokens
                    );
                    let mut oversized = Chunk::new();
                    oversized.push(sentence, sentence_len);
                    chunks.push(oversized);
                } else {
                    current.push(sentence, sentence_len);
                }
            } else {
                current.push(sentence, sentence_len);
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        Ok(chunks)
    }

    /// Split text into sentences and pack them
    pub fn chunk_sentences(&self, text: &str) -> Result<Vec<Chunk>> {
        self.pack(split_sentences(text))
    }

    /// Split text into sentences, pack them and wrap each chunk in the
    /// tokenizer's boundary markers
    pub fn chunk_text(&self, text: &str) -> Result<Vec<String>> {
        let begin = self.tokenizer.begin_marker();
        let end = self.tokenizer.end_marker();

        Ok(self
            .chunk_sentences(text)?
            .iter()
            .map(|chunk| chunk.wrap(begin, end))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CharTokenizer;

    /// Counts one token per whitespace-separated word
    struct WordTokenizer;

    impl Tokenizer for WordTokenizer {
        fn encode(&self, text: &str) -> Result<Vec<u32>> {
            Ok(text.split_whitespace().map(|_| 1).collect())
        }

        fn begin_marker(&self) -> &str {
            "<s>"
        }

        fn end_marker(&self) -> &str {
            "</s>"
        }
    }

    fn words(n: usize, last: &str) -> String {
        let mut sentence = vec!["w"; n - 1].join(" ");
        sentence.push(' ');
        sentence.push_str(last);
        sentence
    }

    #[test]
    fn test_three_sentences_of_400_tokens() {
        let s1 = words(400, "one.");
        let s2 = words(400, "two.");
        let s3 = words(400, "three.");

        let chunker = TokenChunker::new(&WordTokenizer, 1000).unwrap();
        let chunks = chunker.pack([s1.as_str(), s2.as_str(), s3.as_str()]).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].sentences(), &[s1.clone(), s2.clone()]);
        assert_eq!(chunks[0].token_count(), 800);
        assert_eq!(chunks[1].sentences(), &[s3.clone()]);
    }

    #[test]
    fn test_oversized_sentence_is_kept_whole() {
        let long = words(1500, "end.");
        let chunker = TokenChunker::new(&WordTokenizer, 1000).unwrap();
        let chunks = chunker.chunk_sentences(&long).unwrap();

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_oversized(1000));
        assert_eq!(chunks[0].content(), long);
    }

    #[test]
    fn test_oversized_sentence_flushes_pending_chunk() {
        let short = "a b c.";
        let long = words(20, "z.");
        let chunker = TokenChunker::new(&WordTokenizer, 10).unwrap();
        let chunks = chunker.pack([short, long.as_str(), short]).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].content(), short);
        assert_eq!(chunks[1].content(), long);
        assert_eq!(chunks[2].content(), short);
    }

    #[test]
    fn test_chunk_text_wraps_with_markers() {
        let tokenizer = CharTokenizer::ascii("<|begin|>", "<|end|>");
        let chunker = TokenChunker::new(&tokenizer, 12).unwrap();
        let chunks = chunker.chunk_text("Hi there. Bye now. Ok.").unwrap();

        assert_eq!(
            chunks,
            vec!["<|begin|>Hi there.<|end|>", "<|begin|>Bye now. Ok.<|end|>"]
        );
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let chunker = TokenChunker::new(&WordTokenizer, 10).unwrap();
        assert!(chunker.chunk_text("").unwrap().is_empty());
    }

    #[test]
    fn test_zero_budget_rejected() {
        assert!(TokenChunker::new(&WordTokenizer, 0).is_err());
    }
}
