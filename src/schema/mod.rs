//! Core data model for question-answering labels.
//!
//! Everything the rest of the crate produces or consumes is expressed in
//! these types: [`Document`]s carry content and a content-derived id,
//! [`Answer`]s point into documents through [`Offset`]s, [`Label`]s record a
//! judgement about an answer, and [`MultiLabel`]s aggregate all labels for
//! one query.
//!
//! # Design Principles
//!
//! 1. **Deterministic identity**: document ids are a hash over a configurable
//!    subset of fields, so re-importing the same data yields the same ids.
//!
//! 2. **Dict-shaped interchange**: every type converts to and from a plain
//!    JSON mapping through [`Interchange`]. Unknown or legacy keys are
//!    accepted on decode; only the current shape is written.
//!
//! 3. **Permissive construction**: spans may be inverted and offsets may
//!    point past the end of a document. [`crate::validation`] reports those
//!    instead of the constructors rejecting them.
//!
//! # Example
//!
//! ```
//! use qalabel::schema::{Answer, Document, Label, MultiLabel, Origin, Span};
//!
//! let doc = Document::new("Berlin is the capital of Germany.").unwrap();
//! let answer = Answer::new("Berlin")
//!     .with_offsets_in_document([Span::new(0, 6)])
//!     .with_document_ids([doc.id()]);
//! let label = Label::new(
//!     "What is the capital of Germany?",
//!     doc,
//!     answer,
//!     true,
//!     true,
//!     Origin::GoldLabel,
//! );
//!
//! let ml = MultiLabel::new(vec![label]).unwrap();
//! assert_eq!(ml.answers(), ["Berlin"]);
//! ```

mod answer;
mod document;
pub(crate) mod hashing;
mod label;
mod multilabel;
mod offset;
mod table;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::SchemaError;

pub use answer::{Answer, AnswerType};
pub use document::{Content, ContentType, Document, DocumentBuilder};
pub use hashing::multilabel_id;
pub use label::{Filters, Label, Origin};
pub use multilabel::{MultiLabel, MultiLabelOptions};
pub use offset::{Offset, Probe, Span, TableCell};
pub use table::{DisplayOptions, Table};

/// Conversion to and from the plain mapping form used for storage and
/// exchange.
///
/// The default methods go through serde; implementors only decide their
/// wire shape with serde attributes.
pub trait Interchange: Serialize + DeserializeOwned {
    /// Converts to a JSON mapping.
    fn to_dict(&self) -> Result<Value, SchemaError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Builds a value from a JSON mapping, applying legacy-field handling
    /// and defaults.
    fn from_dict(value: Value) -> Result<Self, SchemaError> {
        Ok(serde_json::from_value(value)?)
    }

    fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string(self)?)
    }

    fn from_json(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }
}
