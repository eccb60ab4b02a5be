use anyhow::{Context, Result};
use serde_json::value::RawValue;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use walkdir::WalkDir;

use super::chunker::TokenChunker;
use super::record::JsonRecord;
use super::tokenizer::Tokenizer;
use crate::error::PrepError;
use crate::utils::{sanitize_and_format, word_count};

/// Files directly inside `dir` with the given extension, sorted by name
fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PrepError::MissingInput(dir.to_path_buf()).into());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == extension) {
                    files.push(path.to_path_buf());
                }
            }
            Ok(_) => {}
            Err(e) => error!("Failed to read directory entry in {:?}: {}", dir, e),
        }
    }

    Ok(files)
}

/// Sanitize, format and chunk a single text file
pub fn chunk_text_file<T: Tokenizer + ?Sized>(
    path: &Path,
    chunker: &TokenChunker<'_, T>,
    min_words_per_line: usize,
) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read text file: {:?}", path))?;

    info!(
        "Read {} characters, {} words from {:?}",
        text.len(),
        word_count(&text),
        path
    );

    let sanitized = sanitize_and_format(&text, min_words_per_line)?;
    info!(
        "After sanitization: {} characters, {} words",
        sanitized.len(),
        word_count(&sanitized)
    );

    chunker.chunk_text(&sanitized)
}

/// Chunk every `.txt` file in `dir`
///
/// A file that cannot be read, formatted or tokenized is logged and skipped.
pub fn load_text_chunks<T: Tokenizer + ?Sized>(
    dir: &Path,
    tokenizer: &T,
    max_chunk_tokens: usize,
    min_words_per_line: usize,
) -> Result<Vec<String>> {
    let chunker = TokenChunker::new(tokenizer, max_chunk_tokens)?;
    let files = files_with_extension(dir, "txt")?;
    info!("Found {} text files in {:?}", files.len(), dir);

    let mut chunks = Vec::new();
    for path in &files {
        info!("Processing text file: {:?}", path);
        match chunk_text_file(path, &chunker, min_words_per_line) {
            Ok(file_chunks) => {
                info!("Created {} chunks from {:?}", file_chunks.len(), path);
                chunks.extend(file_chunks);
            }
            Err(e) => error!("Error processing {:?}: {:#}", path, e),
        }
    }

    info!("Total chunks created from text files: {}", chunks.len());
    Ok(chunks)
}

/// Parse one JSON file holding a top-level array of records
///
/// Each element is kept as its source text.
pub fn read_json_records(path: &Path) -> Result<Vec<JsonRecord>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON file: {:?}", path))?;

    let document: Box<RawValue> = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse JSON file: {:?}", path))?;
    if !document.get().trim_start().starts_with('[') {
        return Err(PrepError::NotAnArray(path.to_path_buf()).into());
    }

    let records: Vec<JsonRecord> = serde_json::from_str(document.get())
        .with_context(|| format!("Failed to parse JSON file: {:?}", path))?;
    Ok(records)
}

/// Concatenate the records of every `.json` file in `dir`
///
/// A file that cannot be read or parsed is logged and skipped.
pub fn load_json_records(dir: &Path) -> Result<Vec<JsonRecord>> {
    let files = files_with_extension(dir, "json")?;
    info!("Found {} JSON files in {:?}", files.len(), dir);

    let mut records = Vec::new();
    for path in &files {
        info!("Processing JSON file: {:?}", path);
        match read_json_records(path) {
            Ok(file_records) => {
                info!("Read {} items from {:?}", file_records.len(), path);
                records.extend(file_records);
            }
            Err(e) => error!("Error processing {:?}: {:#}", path, e),
        }
    }

    info!("Total items read from JSON files: {}", records.len());
    Ok(records)
}
