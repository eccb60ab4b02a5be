use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use corpus_prep::data::{OutputFormat, TokenChunker};
use corpus_prep::utils::{sanitize_and_format, word_count};
use corpus_prep::{build_corpus, load_tokenizer, PrepConfig, PrepError};

#[derive(Debug, Parser)]
#[command(author, version, about = "Prepare text and JSON corpora for language-model training")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Chunk text files, interleave them with JSON records and save the corpus
    Build(BuildArgs),
    /// Sanitize and line-format a single text file
    Sanitize(SanitizeArgs),
    /// Report how a single text file would be chunked
    Chunk(ChunkArgs),
}

#[derive(Debug, Args)]
struct TokenizerArgs {
    /// HuggingFace tokenizer.json; character counts are used when omitted
    #[arg(long)]
    tokenizer: Option<PathBuf>,

    /// Marker placed before every chunk
    #[arg(long)]
    bos_token: Option<String>,

    /// Marker placed after every chunk
    #[arg(long)]
    eos_token: Option<String>,
}

#[derive(Debug, Args)]
struct BuildArgs {
    /// Directory containing the text files
    text_directory: PathBuf,

    /// Directory containing the JSON files
    json_directory: PathBuf,

    /// Output file name
    output: PathBuf,

    /// Path to a configuration JSON file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum chunk size in tokens [default: 1000]
    #[arg(short, long)]
    size: Option<usize>,

    /// Minimum words per line [default: 10]
    #[arg(short, long)]
    words: Option<usize>,

    /// Random seed for shuffling
    #[arg(long)]
    seed: Option<u64>,

    /// How many times text chunks are repeated [default: 5]
    #[arg(long)]
    multiplier: Option<usize>,

    /// Output layout [default: json]
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    #[command(flatten)]
    tokenizer: TokenizerArgs,
}

#[derive(Debug, Args)]
struct SanitizeArgs {
    /// Text file to sanitize
    input: PathBuf,

    /// Where to write the sanitized text
    output: PathBuf,

    /// Minimum words per line
    #[arg(short, long, default_value_t = 10)]
    words: usize,
}

#[derive(Debug, Args)]
struct ChunkArgs {
    /// Text file to chunk
    input: PathBuf,

    /// Maximum chunk size in tokens
    #[arg(short, long, default_value_t = 1000)]
    size: usize,

    /// Minimum words per line
    #[arg(short, long, default_value_t = 10)]
    words: usize,

    #[command(flatten)]
    tokenizer: TokenizerArgs,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => build_command(args),
        Commands::Sanitize(args) => sanitize_command(args),
        Commands::Chunk(args) => chunk_command(args),
    }
}

fn apply_tokenizer_args(config: &mut PrepConfig, args: TokenizerArgs) {
    if let Some(path) = args.tokenizer {
        config.tokenizer_path = Some(path);
    }
    if let Some(bos) = args.bos_token {
        config.bos_token = bos;
    }
    if let Some(eos) = args.eos_token {
        config.eos_token = eos;
    }
}

fn build_command(args: BuildArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {:?}", path);
            PrepConfig::load(path)?
        }
        None => PrepConfig::default(),
    };

    if let Some(size) = args.size {
        config.max_chunk_tokens = size;
    }
    if let Some(words) = args.words {
        config.min_words_per_line = words;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(multiplier) = args.multiplier {
        config.replication = multiplier;
    }
    if let Some(format) = args.format {
        config.output_format = format;
    }
    apply_tokenizer_args(&mut config, args.tokenizer);
    config.validate()?;

    let tokenizer = load_tokenizer(&config)?;
    build_corpus(
        &config,
        &*tokenizer,
        &args.text_directory,
        &args.json_directory,
        &args.output,
    )?;

    Ok(())
}

fn sanitize_command(args: SanitizeArgs) -> Result<()> {
    if !args.input.is_file() {
        return Err(PrepError::MissingInput(args.input).into());
    }

    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read text file: {:?}", args.input))?;
    let sanitized = sanitize_and_format(&text, args.words)?;

    fs::write(&args.output, &sanitized)
        .with_context(|| format!("Failed to write sanitized text: {:?}", args.output))?;

    info!(
        "Sanitized {:?}: {} -> {} words, {} lines",
        args.input,
        word_count(&text),
        word_count(&sanitized),
        sanitized.lines().count()
    );
    Ok(())
}

fn chunk_command(args: ChunkArgs) -> Result<()> {
    if !args.input.is_file() {
        return Err(PrepError::MissingInput(args.input).into());
    }

    let mut config = PrepConfig {
        max_chunk_tokens: args.size,
        min_words_per_line: args.words,
        ..PrepConfig::default()
    };
    apply_tokenizer_args(&mut config, args.tokenizer);
    config.validate()?;

    let tokenizer = load_tokenizer(&config)?;
    let chunker = TokenChunker::new(&*tokenizer, config.max_chunk_tokens)?;

    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read text file: {:?}", args.input))?;
    let sanitized = sanitize_and_format(&text, config.min_words_per_line)?;
    let chunks = chunker.chunk_sentences(&sanitized)?;

    let total_tokens: usize = chunks.iter().map(|c| c.token_count()).sum();
    let oversized = chunks
        .iter()
        .filter(|c| c.is_oversized(config.max_chunk_tokens))
        .count();
    let largest = chunks.iter().map(|c| c.token_count()).max().unwrap_or(0);

    info!("Chunks: {}", chunks.len());
    info!("  - Oversized (single sentence over budget): {}", oversized);
    info!("  - Sentence tokens: {}", total_tokens);
    info!("  - Largest chunk: {} tokens", largest);

    Ok(())
}
