//! File converters producing [`Document`]s.
//!
//! Two readers are supported:
//! - [`csv_faq`]: question/answer CSV files, one text document per row
//! - [`json`]: JSON arrays and JSONL files of serialized documents
//!
//! The JSON module also writes documents back out, so a converted corpus
//! can be stored and re-read without loss.

pub mod csv_faq;
pub mod json;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::QaLabelError;
use crate::schema::Document;

/// Options shared by all converters.
#[derive(Clone, Debug, Default)]
pub struct ConvertOptions {
    /// Metadata attached to every produced document.
    pub meta: Option<Map<String, Value>>,
    /// Fields to hash document ids from, replacing whatever the input says.
    pub id_hash_keys: Option<Vec<String>>,
}

/// Supported document file formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    CsvFaq,
    Json,
    Jsonl,
}

impl Format {
    /// The name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Format::CsvFaq => "csv-faq",
            Format::Json => "json",
            Format::Jsonl => "jsonl",
        }
    }

    /// Whether documents can be read from this format.
    pub fn is_readable(&self) -> bool {
        true
    }

    /// Whether documents can be written in this format.
    pub fn is_writable(&self) -> bool {
        !matches!(self, Format::CsvFaq)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = QaLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv-faq" | "csv" | "faq" => Ok(Format::CsvFaq),
            "json" => Ok(Format::Json),
            "jsonl" | "ndjson" => Ok(Format::Jsonl),
            other => Err(QaLabelError::UnsupportedFormat(format!(
                "'{}' (supported: csv-faq, json, jsonl)",
                other
            ))),
        }
    }
}

/// A reader turning files into documents.
pub trait Converter {
    /// Converts the file at `path`.
    fn convert(&self, path: &Path, opts: &ConvertOptions) -> Result<Vec<Document>, QaLabelError>;

    /// Converts several files, concatenating their documents in path order.
    ///
    /// Stops at the first file that fails.
    fn convert_all(
        &self,
        paths: &[&Path],
        opts: &ConvertOptions,
    ) -> Result<Vec<Document>, QaLabelError> {
        let mut documents = Vec::new();
        for path in paths {
            documents.extend(self.convert(path, opts)?);
        }
        Ok(documents)
    }
}

/// Reads FAQ-style CSV files.
#[derive(Clone, Copy, Debug, Default)]
pub struct CsvFaqConverter;

impl Converter for CsvFaqConverter {
    fn convert(&self, path: &Path, opts: &ConvertOptions) -> Result<Vec<Document>, QaLabelError> {
        csv_faq::read_faq_csv(path, opts)
    }
}

/// Reads JSON and JSONL document files.
#[derive(Clone, Debug, Default)]
pub struct JsonConverter {
    /// Used when the per-call options do not set `id_hash_keys`.
    pub id_hash_keys: Option<Vec<String>>,
}

impl Converter for JsonConverter {
    fn convert(&self, path: &Path, opts: &ConvertOptions) -> Result<Vec<Document>, QaLabelError> {
        let opts = ConvertOptions {
            meta: opts.meta.clone(),
            id_hash_keys: opts
                .id_hash_keys
                .clone()
                .or_else(|| self.id_hash_keys.clone()),
        };
        json::read_json_documents(path, &opts)
    }
}

/// Returns the reader for a format.
pub fn converter_for(format: Format) -> Box<dyn Converter> {
    match format {
        Format::CsvFaq => Box::new(CsvFaqConverter),
        Format::Json | Format::Jsonl => Box::new(JsonConverter::default()),
    }
}

/// Writes documents in a writable format.
pub fn write_documents(
    path: &Path,
    format: Format,
    documents: &[Document],
) -> Result<(), QaLabelError> {
    match format {
        Format::Json => json::write_documents_json(path, documents),
        Format::Jsonl => json::write_documents_jsonl(path, documents),
        Format::CsvFaq => Err(QaLabelError::UnsupportedFormat(format!(
            "'{}' is read-only (write json or jsonl instead)",
            format
        ))),
    }
}
