use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

use super::interleave::TrainingExample;

/// Layout of the persisted corpus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A single indented JSON array
    #[default]
    Json,
    /// One JSON value per line
    Jsonl,
}

/// Open container while a raw record is re-emitted
enum Frame {
    Array { first: bool },
    Object { first: bool, key_next: bool },
}

/// JSON formatter that escapes every non-ASCII character as `\uXXXX`
///
/// Raw records are re-emitted token by token through the same formatter, so
/// they get the surrounding layout without their numbers or key order being
/// re-parsed.
struct AsciiFormatter<F> {
    inner: F,
}

impl<F: Formatter> AsciiFormatter<F> {
    fn new(inner: F) -> Self {
        Self { inner }
    }

    fn begin_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        stack: &mut [Frame],
    ) -> io::Result<()> {
        if let Some(Frame::Array { first }) = stack.last_mut() {
            let was_first = *first;
            *first = false;
            self.begin_array_value(writer, was_first)?;
        }
        Ok(())
    }

    fn end_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        stack: &mut [Frame],
    ) -> io::Result<()> {
        match stack.last_mut() {
            Some(Frame::Array { .. }) => self.end_array_value(writer),
            Some(Frame::Object { key_next, .. }) => {
                *key_next = true;
                self.end_object_value(writer)
            }
            None => Ok(()),
        }
    }

    /// Re-emit `raw`, which must already be valid JSON
    fn replay<W: ?Sized + Write>(&mut self, writer: &mut W, raw: &str) -> io::Result<()> {
        let bytes = raw.as_bytes();
        let mut stack: Vec<Frame> = Vec::new();
        let mut pos = 0;

        while pos < bytes.len() {
            match bytes[pos] {
                b' ' | b'\t' | b'\n' | b'\r' | b',' => pos += 1,
                b':' => {
                    self.begin_object_value(writer)?;
                    pos += 1;
                }
                b'[' => {
                    self.begin_value(writer, &mut stack)?;
                    self.begin_array(writer)?;
                    stack.push(Frame::Array { first: true });
                    pos += 1;
                }
                b'{' => {
                    self.begin_value(writer, &mut stack)?;
                    self.begin_object(writer)?;
                    stack.push(Frame::Object { first: true, key_next: true });
                    pos += 1;
                }
                b']' => {
                    stack.pop();
                    self.end_array(writer)?;
                    self.end_value(writer, &mut stack)?;
                    pos += 1;
                }
                b'}' => {
                    stack.pop();
                    self.end_object(writer)?;
                    self.end_value(writer, &mut stack)?;
                    pos += 1;
                }
                b'"' => {
                    let end = string_end(bytes, pos);
                    let body = &raw[pos + 1..end];

                    let key = match stack.last_mut() {
                        Some(Frame::Object { first, key_next }) if *key_next => {
                            let was_first = *first;
                            *first = false;
                            *key_next = false;
                            Some(was_first)
                        }
                        _ => None,
                    };

                    match key {
                        Some(first) => {
                            self.begin_object_key(writer, first)?;
                            self.write_raw_string(writer, body)?;
                            self.end_object_key(writer)?;
                        }
                        None => {
                            self.begin_value(writer, &mut stack)?;
                            self.write_raw_string(writer, body)?;
                            self.end_value(writer, &mut stack)?;
                        }
                    }
                    pos = end + 1;
                }
                _ => {
                    let end = bytes[pos..]
                        .iter()
                        .position(|&b| matches!(b, b',' | b']' | b'}') || b.is_ascii_whitespace())
                        .map_or(bytes.len(), |len| pos + len);

                    self.begin_value(writer, &mut stack)?;
                    writer.write_all(&bytes[pos..end])?;
                    self.end_value(writer, &mut stack)?;
                    pos = end;
                }
            }
        }

        Ok(())
    }

    /// Write an already-escaped string body between quotes
    fn write_raw_string<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        body: &str,
    ) -> io::Result<()> {
        self.begin_string(writer)?;
        self.write_string_fragment(writer, body)?;
        self.end_string(writer)
    }
}

/// Index of the quote closing the string that opens at `start`
fn string_end(bytes: &[u8], start: usize) -> usize {
    let mut pos = start + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'"' => return pos,
            _ => pos += 1,
        }
    }
    bytes.len()
}

impl<F: Formatter> Formatter for AsciiFormatter<F> {
    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..idx])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }

    fn write_raw_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        self.replay(writer, fragment)
    }

    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }
}

fn write_with<W: Write, F: Formatter, T: Serialize + ?Sized>(
    writer: &mut W,
    formatter: F,
    value: &T,
) -> Result<()> {
    let mut serializer =
        serde_json::Serializer::with_formatter(writer, AsciiFormatter::new(formatter));
    value
        .serialize(&mut serializer)
        .with_context(|| "Failed to serialize corpus")?;
    Ok(())
}

/// Serialize the corpus to `writer`, escaping all non-ASCII text
pub fn write_examples<W: Write>(
    writer: &mut W,
    examples: &[TrainingExample],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            write_with(writer, PrettyFormatter::with_indent(b"  "), examples)?;
            writer.write_all(b"\n")?;
        }
        OutputFormat::Jsonl => {
            for example in examples {
                write_with(writer, CompactFormatter, example)?;
                writer.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

/// Write the corpus to `path`
pub fn write_corpus(path: &Path, examples: &[TrainingExample], format: OutputFormat) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {:?}", path))?;
    let mut writer = BufWriter::new(file);

    write_examples(&mut writer, examples, format)?;
    writer
        .flush()
        .with_context(|| format!("Failed to write output file: {:?}", path))?;

    info!("Saved {} items to {:?}", examples.len(), path);
    Ok(())
}
