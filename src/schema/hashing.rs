//! Deterministic identities for documents and multi-labels.
//!
//! Document ids are MurmurHash3 (x64, 128 bit, seed 0) digests of the fields
//! named by `id_hash_keys`, each rendered as a Python literal and prefixed
//! with `:`. MultiLabel ids are MD5 digests of the query followed by the
//! filters encoded as sorted-key JSON with Python's separators. Both schemes
//! reproduce ids produced by existing evaluation datasets.

use std::io::{self, Cursor, Write};

use md5::{Digest, Md5};
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};

use super::document::{Content, ContentType};
use super::label::Filters;
use crate::error::SchemaError;

/// Fields a document id can be derived from.
pub(crate) const HASHABLE_FIELDS: [&str; 5] = ["content", "content_type", "score", "meta", "embedding"];

/// Borrowed view of the document fields that feed its id.
pub(crate) struct IdentityFields<'a> {
    pub content: &'a Content,
    pub content_type: ContentType,
    pub score: Option<f64>,
    pub meta: &'a Map<String, Value>,
    pub embedding: Option<&'a [f32]>,
}

/// Checks that every key names a hashable field or a `meta.<key>` path.
pub(crate) fn validate_id_hash_keys(keys: &[String]) -> Result<(), SchemaError> {
    if keys.is_empty() {
        return Err(SchemaError::EmptyIdHashKeys);
    }
    for key in keys {
        let known = HASHABLE_FIELDS.contains(&key.as_str())
            || key.strip_prefix("meta.").is_some_and(|k| !k.is_empty());
        if !known {
            return Err(SchemaError::InvalidIdHashKey(key.clone()));
        }
    }
    Ok(())
}

/// Builds the string that is hashed into a document id.
pub(crate) fn document_hash_input(
    fields: &IdentityFields<'_>,
    keys: &[String],
) -> Result<String, SchemaError> {
    validate_id_hash_keys(keys)?;

    let mut input = String::new();
    for key in keys {
        let rendered = match key.as_str() {
            "content" => fields.content.canonical_string(),
            "content_type" => fields.content_type.as_str().to_string(),
            "score" => fields.score.map_or_else(|| "None".to_string(), py_float),
            "meta" => python_literal(&Value::Object(fields.meta.clone())),
            "embedding" => fields
                .embedding
                .map_or_else(|| "None".to_string(), py_f32_list),
            path => {
                // validate_id_hash_keys guarantees the prefix
                let meta_key = path.trim_start_matches("meta.");
                match fields.meta.get(meta_key) {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => python_literal(other),
                    None => return Err(SchemaError::MissingMetaKey(meta_key.to_string())),
                }
            }
        };
        input.push(':');
        input.push_str(&rendered);
    }
    Ok(input)
}

/// Computes a document id from its identity fields.
pub(crate) fn document_id(
    fields: &IdentityFields<'_>,
    keys: &[String],
) -> Result<String, SchemaError> {
    let input = document_hash_input(fields, keys)?;
    murmur_hex(&input)
}

/// MurmurHash3 x64 128-bit digest, lowercase hex without leading zeros.
pub(crate) fn murmur_hex(input: &str) -> Result<String, SchemaError> {
    let hash = murmur3::murmur3_x64_128(&mut Cursor::new(input.as_bytes()), 0)
        .map_err(SchemaError::Hash)?;
    Ok(format!("{:02x}", hash))
}

/// Computes the id shared by all labels with this query and these filters.
pub fn multilabel_id(query: &str, filters: Option<&Filters>) -> Result<String, SchemaError> {
    let mut hasher = Md5::new();
    hasher.update(query.as_bytes());
    hasher.update(python_json(&filters)?.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Encodes a value as JSON the way Python's `json.dumps` does by default.
pub(crate) fn python_json<T: Serialize + ?Sized>(value: &T) -> Result<String, SchemaError> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, PythonJsonFormatter);
    value.serialize(&mut serializer)?;
    // the formatter only ever writes ASCII
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// `", "` and `": "` separators, non-ASCII escaped as `\uXXXX`.
struct PythonJsonFormatter;

impl Formatter for PythonJsonFormatter {
    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Renders a JSON value as the equivalent Python literal (`str()` of it).
pub(crate) fn python_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) if n.is_f64() => n.as_f64().map_or_else(|| n.to_string(), py_float),
        Value::Number(n) => n.to_string(),
        Value::String(s) => py_repr_str(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(python_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", py_repr_str(k), python_literal(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Python's `repr()` of a float.
pub(crate) fn py_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let abs = x.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let repr = format!("{:e}", x);
        return match repr.split_once('e') {
            Some((mantissa, exp)) => {
                let (sign, digits) = match exp.strip_prefix('-') {
                    Some(d) => ('-', d),
                    None => ('+', exp),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => repr,
        };
    }
    let repr = x.to_string();
    if repr.contains('.') {
        repr
    } else {
        format!("{}.0", repr)
    }
}

fn py_f32_list(values: &[f32]) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|x| {
            let repr = x.to_string();
            if repr.contains('.') || !x.is_finite() {
                repr
            } else {
                format!("{}.0", repr)
            }
        })
        .collect();
    format!("[{}]", items.join(", "))
}

fn py_repr_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
