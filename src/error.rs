use std::path::PathBuf;

/// Errors raised by the preprocessing pipeline
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    /// A required input file or directory does not exist
    #[error("input path does not exist: {0:?}")]
    MissingInput(PathBuf),

    /// A transformation added, dropped or reordered words
    #[error("word sequence changed during {stage}: {before} -> {after} words")]
    WordCountDrift {
        stage: &'static str,
        before: usize,
        after: usize,
    },

    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The tokenizer failed to encode a piece of text
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// A JSON source file did not contain a top-level array
    #[error("expected a top-level JSON array in {0:?}")]
    NotAnArray(PathBuf),
}
