//! JSON and JSONL document files.
//!
//! The reader accepts either layout without being told which one it is
//! looking at:
//! - JSONL: one document mapping per line, or a list of mappings per line
//! - JSON: a single array of document mappings (or a single mapping)
//!
//! Records are decoded with [`Document::from_dict`], so files written by
//! [`write_documents_json`] or [`write_documents_jsonl`] read back equal.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::ConvertOptions;
use crate::error::QaLabelError;
use crate::schema::{Document, Interchange};

/// Reads documents from a JSON or JSONL file.
///
/// Invalid UTF-8 sequences are dropped rather than rejected.
///
/// # Errors
/// Returns an error if the file cannot be read, is neither valid JSONL nor
/// valid JSON, or if a record is not a valid document.
pub fn read_json_documents(
    path: &Path,
    opts: &ConvertOptions,
) -> Result<Vec<Document>, QaLabelError> {
    let bytes = fs::read(path).map_err(QaLabelError::Io)?;
    let docs = documents_from_bytes(&bytes, path, opts)?;
    debug!(path = %path.display(), documents = docs.len(), "read JSON documents");
    Ok(docs)
}

/// Reads documents from a JSON or JSONL string.
///
/// Useful for testing without file I/O.
pub fn from_json_documents_str(
    json: &str,
    opts: &ConvertOptions,
) -> Result<Vec<Document>, QaLabelError> {
    from_json_documents_slice(json.as_bytes(), opts)
}

/// Reads documents from JSON or JSONL bytes.
pub fn from_json_documents_slice(
    bytes: &[u8],
    opts: &ConvertOptions,
) -> Result<Vec<Document>, QaLabelError> {
    documents_from_bytes(bytes, Path::new("<bytes>"), opts)
}

/// Writes documents as a pretty-printed JSON array.
pub fn write_documents_json(path: &Path, documents: &[Document]) -> Result<(), QaLabelError> {
    let file = File::create(path).map_err(QaLabelError::Io)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, documents).map_err(|source| {
        QaLabelError::JsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush().map_err(QaLabelError::Io)
}

/// Writes documents as JSONL, one document per line.
pub fn write_documents_jsonl(path: &Path, documents: &[Document]) -> Result<(), QaLabelError> {
    let file = File::create(path).map_err(QaLabelError::Io)?;
    let mut writer = BufWriter::new(file);
    write_jsonl(&mut writer, documents, path)?;
    writer.flush().map_err(QaLabelError::Io)
}

/// Writes documents to a pretty-printed JSON array string.
pub fn to_documents_json_string(documents: &[Document]) -> Result<String, QaLabelError> {
    serde_json::to_string_pretty(documents).map_err(|source| QaLabelError::JsonWrite {
        path: Path::new("<string>").to_path_buf(),
        source,
    })
}

/// Writes documents to a JSONL string.
pub fn to_documents_jsonl_string(documents: &[Document]) -> Result<String, QaLabelError> {
    let dummy_path = Path::new("<string>");
    let mut buf = Vec::new();
    write_jsonl(&mut buf, documents, dummy_path)?;
    String::from_utf8(buf).map_err(|e| {
        QaLabelError::InvalidArgument(format!("Invalid UTF-8 in JSONL output: {}", e))
    })
}

fn write_jsonl<W: Write>(
    writer: &mut W,
    documents: &[Document],
    path: &Path,
) -> Result<(), QaLabelError> {
    for doc in documents {
        serde_json::to_writer(&mut *writer, doc).map_err(|source| QaLabelError::JsonWrite {
            path: path.to_path_buf(),
            source,
        })?;
        writer.write_all(b"\n").map_err(QaLabelError::Io)?;
    }
    Ok(())
}

fn documents_from_bytes(
    bytes: &[u8],
    path: &Path,
    opts: &ConvertOptions,
) -> Result<Vec<Document>, QaLabelError> {
    let decoded = decode_utf8_dropping_invalid(bytes);
    let text = decoded.strip_prefix('\u{feff}').unwrap_or(decoded.as_str());

    let records = match parse_jsonl(text) {
        Ok(records) => records,
        Err(jsonl_err) => {
            debug!(error = %jsonl_err, "not JSONL, parsing as a single JSON value");
            parse_whole(text).map_err(|source| QaLabelError::JsonParse {
                path: path.to_path_buf(),
                source,
            })?
        }
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, mut record)| {
            if let Value::Object(map) = &mut record {
                apply_overrides(map, opts);
            }
            Document::from_dict(record).map_err(|source| QaLabelError::InvalidRecord {
                path: path.to_path_buf(),
                index,
                source,
            })
        })
        .collect()
}

/// Decodes UTF-8, skipping invalid byte sequences instead of replacing them.
fn decode_utf8_dropping_invalid(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    let mut dropped = 0;
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        dropped += chunk.invalid().len();
    }
    if dropped > 0 {
        debug!(bytes = dropped, "dropped invalid UTF-8");
    }
    text
}

/// Parses one JSON value per non-blank line. Objects are kept, arrays are
/// spliced in, scalars are skipped.
fn parse_jsonl(text: &str) -> Result<Vec<Value>, serde_json::Error> {
    let mut records = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line)? {
            Value::Array(items) => records.extend(items),
            object @ Value::Object(_) => records.push(object),
            other => warn!(line = lineno + 1, value = %other, "skipping non-object JSON line"),
        }
    }
    Ok(records)
}

fn parse_whole(text: &str) -> Result<Vec<Value>, serde_json::Error> {
    Ok(match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => {
            warn!(value = %other, "JSON input holds no documents");
            Vec::new()
        }
    })
}

/// Option `id_hash_keys` replaces the record's; option `meta` is merged
/// over the record's meta.
fn apply_overrides(record: &mut Map<String, Value>, opts: &ConvertOptions) {
    if let Some(keys) = &opts.id_hash_keys {
        record.insert("id_hash_keys".into(), Value::from(keys.clone()));
    }
    if let Some(meta) = &opts.meta {
        let mut merged = match record.remove("meta") {
            Some(Value::Object(existing)) => existing,
            _ => Map::new(),
        };
        merged.extend(meta.clone());
        record.insert("meta".into(), Value::Object(merged));
    }
}
