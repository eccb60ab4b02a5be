use anyhow::Result;
use std::collections::HashMap;
#[cfg(feature = "hf-tokenizer")]
use std::path::Path;

/// Trait for the tokenizer used to measure and wrap chunks
pub trait Tokenizer: Send + Sync {
    /// Encode text to token IDs, without special tokens
    fn encode(&self, text: &str) -> Result<Vec<u32>>;

    /// Marker placed before every chunk
    fn begin_marker(&self) -> &str;

    /// Marker placed after every chunk
    fn end_marker(&self) -> &str;

    /// Number of tokens `text` encodes to
    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(self.encode(text)?.len())
    }
}

impl<T: Tokenizer + ?Sized> Tokenizer for Box<T> {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        (**self).encode(text)
    }

    fn begin_marker(&self) -> &str {
        (**self).begin_marker()
    }

    fn end_marker(&self) -> &str {
        (**self).end_marker()
    }
}

/// Character-level tokenizer
///
/// Every character is one token; characters outside the vocabulary map to
/// the unknown ID. Useful offline and wherever an exact character budget is
/// wanted.
#[derive(Debug, Clone)]
pub struct CharTokenizer {
    char_to_id: HashMap<char, u32>,
    bos_token: String,
    eos_token: String,
}

impl CharTokenizer {
    const UNK_ID: u32 = 0;

    fn from_vocab(vocab: Vec<char>, bos_token: &str, eos_token: &str) -> Self {
        let mut char_to_id = HashMap::new();
        let mut next_id = Self::UNK_ID + 1;

        for ch in vocab {
            if let std::collections::hash_map::Entry::Vacant(entry) = char_to_id.entry(ch) {
                entry.insert(next_id);
                next_id += 1;
            }
        }

        Self {
            char_to_id,
            bos_token: bos_token.to_string(),
            eos_token: eos_token.to_string(),
        }
    }

    /// Tokenizer covering printable ASCII plus newline and carriage return
    pub fn ascii(bos_token: &str, eos_token: &str) -> Self {
        let vocab = (' '..='~').chain(['\n', '\r']).collect();
        Self::from_vocab(vocab, bos_token, eos_token)
    }
}

impl Tokenizer for CharTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        Ok(text
            .chars()
            .map(|ch| self.char_to_id.get(&ch).copied().unwrap_or(Self::UNK_ID))
            .collect())
    }

    fn begin_marker(&self) -> &str {
        &self.bos_token
    }

    fn end_marker(&self) -> &str {
        &self.eos_token
    }
}

/// Adapter over a HuggingFace `tokenizer.json`
#[cfg(feature = "hf-tokenizer")]
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
    bos_token: String,
    eos_token: String,
}

#[cfg(feature = "hf-tokenizer")]
impl HfTokenizer {
    pub fn from_file(path: &Path, bos_token: &str, eos_token: &str) -> Result<Self> {
        let inner = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            anyhow::anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e)
        })?;

        for marker in [bos_token, eos_token] {
            if inner.token_to_id(marker).is_none() {
                tracing::warn!("Marker {:?} is not a single token in {:?}", marker, path);
            }
        }

        Ok(Self {
            inner,
            bos_token: bos_token.to_string(),
            eos_token: eos_token.to_string(),
        })
    }
}

#[cfg(feature = "hf-tokenizer")]
impl Tokenizer for HfTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| crate::error::PrepError::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn begin_marker(&self) -> &str {
        &self.bos_token
    }

    fn end_marker(&self) -> &str {
        &self.eos_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_tokenizer_counts_characters() {
        let tokenizer = CharTokenizer::ascii("<s>", "</s>");
        assert_eq!(tokenizer.count_tokens("Hello, World!").unwrap(), 13);
        assert_eq!(tokenizer.count_tokens("").unwrap(), 0);
    }

    #[test]
    fn test_char_tokenizer_non_ascii_is_unknown() {
        let tokenizer = CharTokenizer::ascii("<s>", "</s>");
        let encoded = tokenizer.encode("a\u{e9}\t").unwrap();

        assert_eq!(encoded.len(), 3);
        assert_ne!(encoded[0], CharTokenizer::UNK_ID);
        assert_eq!(&encoded[1..], &[CharTokenizer::UNK_ID, CharTokenizer::UNK_ID]);
    }

    #[test]
    fn test_boxed_tokenizer_delegates() {
        let boxed: Box<dyn Tokenizer> = Box::new(CharTokenizer::ascii("[", "]"));
        assert_eq!(boxed.count_tokens("abc").unwrap(), 3);
        assert_eq!(boxed.begin_marker(), "[");
    }
}
