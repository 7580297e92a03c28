use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// Errors raised while constructing or decoding schema values.
///
/// Everything except [`SchemaError::Decode`] is a validation failure: the
/// input was well-formed but violates an invariant of the data model.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Invalid id_hash_keys entry '{0}' (allowed: content, content_type, score, meta, embedding, meta.<key>)")]
    InvalidIdHashKey(String),

    #[error("id_hash_keys references meta key '{0}' which is not present in meta")]
    MissingMetaKey(String),

    #[error("id_hash_keys must name at least one field")]
    EmptyIdHashKeys,

    #[error("Content type '{content_type}' does not match {content} content")]
    ContentTypeMismatch {
        content_type: &'static str,
        content: &'static str,
    },

    #[error("Invalid table: {0}")]
    InvalidTable(String),

    #[error("Labels in a MultiLabel must share the same filters, found {first} and {other}")]
    MixedFilters { first: String, other: String },

    #[error("Labels in a MultiLabel must share the same query, found '{first}' and '{other}'")]
    MixedQueries { first: String, other: String },

    #[error("A MultiLabel needs at least one label")]
    EmptyMultiLabel,

    #[error("Cannot check containment of {0}")]
    InvalidProbe(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),

    #[error("Failed to decode record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to hash identity fields: {0}")]
    Hash(#[source] std::io::Error),
}

impl SchemaError {
    /// Returns true for invariant violations, false for malformed input.
    pub fn is_validation(&self) -> bool {
        !matches!(self, SchemaError::Decode(_) | SchemaError::Hash(_))
    }
}

/// The main error type for qalabel operations.
#[derive(Debug, Error)]
pub enum QaLabelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Failed to parse CSV from {path}: {source}")]
    CsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid CSV {path}: {message}")]
    CsvInvalid { path: PathBuf, message: String },

    #[error("Couldn't decode {path}, please check that it is valid JSON or JSONL: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write JSON to {path}: {source}")]
    JsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid record {index} in {path}: {source}")]
    InvalidRecord {
        path: PathBuf,
        index: usize,
        #[source]
        source: SchemaError,
    },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
