use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::OutputFormat;
use crate::error::PrepError;

/// Settings for one corpus build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    /// Token budget for the sentence content of a chunk
    pub max_chunk_tokens: usize,
    /// Minimum words per formatted line
    pub min_words_per_line: usize,
    /// How many times the chunk list is repeated before interleaving
    pub replication: usize,
    /// Seed for both shuffles; entropy-seeded when absent
    pub seed: Option<u64>,
    /// Marker written before every chunk
    pub bos_token: String,
    /// Marker written after every chunk
    pub eos_token: String,
    /// HuggingFace `tokenizer.json`; falls back to the character tokenizer when absent
    pub tokenizer_path: Option<PathBuf>,
    pub output_format: OutputFormat,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            max_chunk_tokens: 1000,
            min_words_per_line: 10,
            replication: 5,
            seed: None,
            bos_token: "<|begin_of_text|>".to_string(),
            eos_token: "<|end_of_text|>".to_string(),
            tokenizer_path: None,
            output_format: OutputFormat::Json,
        }
    }
}

impl PrepConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Self = serde_json::from_str(&config_str)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path))?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PrepError> {
        if self.max_chunk_tokens == 0 {
            return Err(PrepError::InvalidConfig("max_chunk_tokens must be > 0".into()));
        }
        if self.min_words_per_line == 0 {
            return Err(PrepError::InvalidConfig("min_words_per_line must be > 0".into()));
        }
        if self.replication == 0 {
            return Err(PrepError::InvalidConfig("replication must be > 0".into()));
        }
        Ok(())
    }
}

impl fmt::Display for PrepConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max_chunk_tokens={}, min_words_per_line={}, replication={}, seed={:?}, format={:?}",
            self.max_chunk_tokens,
            self.min_words_per_line,
            self.replication,
            self.seed,
            self.output_format,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = PrepConfig::default();
        assert_eq!(config.max_chunk_tokens, 1000);
        assert_eq!(config.min_words_per_line, 10);
        assert_eq!(config.replication, 5);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_file_takes_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();

        let config = PrepConfig::load(file.path()).unwrap();
        assert_eq!(config, PrepConfig::default());
    }

    #[test]
    fn test_load_partial_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"max_chunk_tokens": 256, "seed": 7, "output_format": "jsonl"}}"#
        )
        .unwrap();

        let config = PrepConfig::load(file.path()).unwrap();
        assert_eq!(config.max_chunk_tokens, 256);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.output_format, OutputFormat::Jsonl);
        assert_eq!(config.min_words_per_line, 10);
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let config = PrepConfig {
            max_chunk_tokens: 0,
            ..PrepConfig::default()
        };
        assert!(matches!(config.validate(), Err(PrepError::InvalidConfig(_))));
    }
}
