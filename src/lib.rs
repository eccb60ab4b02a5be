// Library exports for use in the binaries and tests

pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use config::PrepConfig;
pub use data::{Chunk, TokenChunker, Tokenizer, TrainingExample};
pub use error::PrepError;
pub use pipeline::{build_corpus, load_tokenizer, CorpusSummary};
