use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use corpus_prep::utils::{extract_document_text, DocumentKind};
use corpus_prep::PrepError;

#[derive(Debug, Parser)]
#[command(author, version, about = "Convert books (PDF/EPUB) to plain text")]
struct Args {
    /// A PDF/EPUB file, or a directory containing them
    input: PathBuf,

    /// Output text file, or output directory when the input is a directory
    output: PathBuf,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if !args.input.exists() {
        return Err(PrepError::MissingInput(args.input).into());
    }

    if args.input.is_dir() {
        convert_directory(&args.input, &args.output)
    } else {
        convert_file(&args.input, &args.output)?;
        info!("Converted {:?} to {:?}", args.input, args.output);
        Ok(())
    }
}

fn convert_file(input: &Path, output: &Path) -> Result<()> {
    let text = extract_document_text(input)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }

    fs::write(output, &text)
        .with_context(|| format!("Failed to write text file: {:?}", output))?;

    info!("Wrote {} characters to {:?}", text.len(), output);
    Ok(())
}

fn convert_directory(input: &Path, output: &Path) -> Result<()> {
    info!("Input directory: {:?}", input);
    info!("Output directory: {:?}", output);

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {:?}", output))?;

    let book_files: Vec<PathBuf> = WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| DocumentKind::from_path(path).is_some())
        .collect();

    info!("Found {} book files", book_files.len());

    if book_files.is_empty() {
        anyhow::bail!("No book files found in {:?}", input);
    }

    let mut converted = 0;
    for (idx, book_path) in book_files.iter().enumerate() {
        info!("Processing {}/{}: {:?}", idx + 1, book_files.len(), book_path);

        let filename = book_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown");
        let txt_path = output.join(format!("{}.txt", filename));

        match convert_file(book_path, &txt_path) {
            Ok(()) => converted += 1,
            Err(e) => warn!("Failed to process {:?}: {:#}", book_path, e),
        }
    }

    info!("Converted {}/{} books", converted, book_files.len());
    Ok(())
}
