use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use crate::config::PrepConfig;
use crate::data::{
    interleave, load_json_records, load_text_chunks, rng_from_seed, write_corpus, CharTokenizer,
    Tokenizer,
};
use crate::error::PrepError;

/// Counts reported after a corpus build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorpusSummary {
    pub chunks: usize,
    pub records: usize,
    pub examples: usize,
}

/// Build the tokenizer named by the configuration
///
/// Without a `tokenizer_path` a character tokenizer over printable ASCII is
/// used, which makes the chunk budget a character budget.
pub fn load_tokenizer(config: &PrepConfig) -> Result<Box<dyn Tokenizer>> {
    match &config.tokenizer_path {
        Some(path) => {
            if !path.exists() {
                return Err(PrepError::MissingInput(path.clone()).into());
            }
            load_tokenizer_file(path, config)
        }
        None => {
            warn!("No tokenizer given, falling back to character-level token counts");
            Ok(Box::new(CharTokenizer::ascii(&config.bos_token, &config.eos_token)))
        }
    }
}

#[cfg(feature = "hf-tokenizer")]
fn load_tokenizer_file(path: &Path, config: &PrepConfig) -> Result<Box<dyn Tokenizer>> {
    info!("Loading tokenizer from {:?}", path);
    let tokenizer =
        crate::data::HfTokenizer::from_file(path, &config.bos_token, &config.eos_token)?;
    Ok(Box::new(tokenizer))
}

#[cfg(not(feature = "hf-tokenizer"))]
fn load_tokenizer_file(path: &Path, _config: &PrepConfig) -> Result<Box<dyn Tokenizer>> {
    anyhow::bail!(
        "Cannot load {:?}: built without the `hf-tokenizer` feature",
        path
    )
}

/// Chunk the text files, load the JSON records, interleave and persist them
///
/// Missing input directories abort before any file is processed; individual
/// files that fail are skipped by the loaders.
pub fn build_corpus<T: Tokenizer + ?Sized>(
    config: &PrepConfig,
    tokenizer: &T,
    text_dir: &Path,
    json_dir: &Path,
    output: &Path,
) -> Result<CorpusSummary> {
    config.validate()?;

    for dir in [text_dir, json_dir] {
        if !dir.is_dir() {
            return Err(PrepError::MissingInput(dir.to_path_buf()).into());
        }
    }

    info!("Configuration: {}", config);
    if let Some(seed) = config.seed {
        info!("Set random seed to {}", seed);
    }
    let mut rng = rng_from_seed(config.seed);

    info!("Processing text files from {:?}", text_dir);
    let chunks = load_text_chunks(
        text_dir,
        tokenizer,
        config.max_chunk_tokens,
        config.min_words_per_line,
    )?;
    let chunk_count = chunks.len();

    info!("Processing JSON files from {:?}", json_dir);
    let records = load_json_records(json_dir)?;
    let record_count = records.len();

    info!("Interspersing chunks and JSON data");
    let examples = interleave(chunks, records, config.replication, &mut rng);

    info!("Saving output to {:?}", output);
    write_corpus(output, &examples, config.output_format)?;

    let summary = CorpusSummary {
        chunks: chunk_count,
        records: record_count,
        examples: examples.len(),
    };
    info!(
        "Processing complete. {} items saved to {:?} ({} chunks x {}, {} records)",
        summary.examples, output, summary.chunks, config.replication, summary.records
    );

    Ok(summary)
}
