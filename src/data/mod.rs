mod chunker;
mod interleave;
mod loader;
mod record;
mod tokenizer;
mod writer;

pub use chunker::{Chunk, TokenChunker};
pub use interleave::{interleave, rng_from_seed, TrainingExample};
pub use loader::{chunk_text_file, load_json_records, load_text_chunks, read_json_records};
pub use record::JsonRecord;
#[cfg(feature = "hf-tokenizer")]
pub use tokenizer::HfTokenizer;
pub use tokenizer::{CharTokenizer, Tokenizer};
pub use writer::{write_corpus, write_examples, OutputFormat};
