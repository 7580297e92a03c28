//! FAQ CSV reader.
//!
//! An FAQ file has exactly two columns, `question` and `answer`, in that
//! order:
//!
//! ```text
//! question,answer
//! What is the capital of France?,Paris
//! ```
//!
//! Each row becomes one text [`Document`] whose content is the trimmed
//! question. The answer is stored under `meta["answer"]`, so a retriever
//! matching on questions hands back the stored answer with the hit.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::debug;

use super::ConvertOptions;
use crate::error::QaLabelError;
use crate::schema::Document;

const EXPECTED_HEADERS: [&str; 2] = ["question", "answer"];

/// Reads documents from an FAQ CSV file.
///
/// # Errors
/// Returns an error if the file cannot be read, is not valid CSV, does not
/// have exactly the `question` and `answer` columns, or if `id_hash_keys`
/// in `opts` cannot be used.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use qalabel::convert::{csv_faq::read_faq_csv, ConvertOptions};
///
/// let docs = read_faq_csv(Path::new("faq.csv"), &ConvertOptions::default())?;
/// # Ok::<(), qalabel::QaLabelError>(())
/// ```
pub fn read_faq_csv(path: &Path, opts: &ConvertOptions) -> Result<Vec<Document>, QaLabelError> {
    let file = File::open(path).map_err(QaLabelError::Io)?;
    let reader = csv::Reader::from_reader(BufReader::new(file));
    let docs = faq_to_documents(reader, path, opts)?;
    debug!(path = %path.display(), documents = docs.len(), "read FAQ CSV");
    Ok(docs)
}

/// Reads documents from an FAQ CSV string.
///
/// Useful for testing without file I/O.
pub fn from_faq_csv_str(csv_str: &str, opts: &ConvertOptions) -> Result<Vec<Document>, QaLabelError> {
    from_faq_csv_slice(csv_str.as_bytes(), opts)
}

/// Reads documents from FAQ CSV bytes.
pub fn from_faq_csv_slice(bytes: &[u8], opts: &ConvertOptions) -> Result<Vec<Document>, QaLabelError> {
    faq_to_documents(csv::Reader::from_reader(bytes), Path::new("<bytes>"), opts)
}

fn faq_to_documents<R: Read>(
    mut reader: csv::Reader<R>,
    path: &Path,
    opts: &ConvertOptions,
) -> Result<Vec<Document>, QaLabelError> {
    let headers = reader
        .headers()
        .map_err(|source| QaLabelError::CsvParse {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    if !headers.iter().eq(EXPECTED_HEADERS) {
        return Err(QaLabelError::CsvInvalid {
            path: path.to_path_buf(),
            message: format!(
                "expected exactly two columns named 'question' and 'answer', found [{}]",
                headers.iter().collect::<Vec<_>>().join(", ")
            ),
        });
    }

    let base_meta = opts.meta.clone().unwrap_or_default();
    let mut docs = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|source| QaLabelError::CsvParse {
            path: path.to_path_buf(),
            source,
        })?;
        let question = record.get(0).unwrap_or_default().trim();
        let answer = record.get(1).unwrap_or_default();

        let mut builder = Document::builder(question)
            .meta(base_meta.clone())
            .meta_entry("answer", answer);
        if let Some(keys) = &opts.id_hash_keys {
            builder = builder.id_hash_keys(keys.iter().cloned());
        }
        let doc = builder
            .build()
            .map_err(|source| QaLabelError::InvalidRecord {
                path: path.to_path_buf(),
                index,
                source,
            })?;
        docs.push(doc);
    }
    Ok(docs)
}
