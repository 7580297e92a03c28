//! Documents: retrievable units of text or tabular content.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::hashing::{self, IdentityFields};
use super::table::{DisplayOptions, Table};
use super::Interchange;
use crate::error::SchemaError;

/// The kind of content a document carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
    Table,
    Image,
    Audio,
}

impl ContentType {
    /// Wire name of the content type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Table => "table",
            ContentType::Image => "image",
            ContentType::Audio => "audio",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document content: a string (text, or a path for image/audio documents)
/// or a table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Table(Table),
}

impl Content {
    /// The text, if this is text content.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(text),
            Content::Table(_) => None,
        }
    }

    /// The table, if this is table content.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Content::Table(table) => Some(table),
            Content::Text(_) => None,
        }
    }

    /// The content as a display string; tables are rendered as a grid.
    pub fn display_string(&self, opts: &DisplayOptions) -> String {
        match self {
            Content::Text(text) => text.clone(),
            Content::Table(table) => table.display_string(opts),
        }
    }

    /// Rendering used for identity hashing, independent of caller options.
    pub(crate) fn canonical_string(&self) -> String {
        self.display_string(&DisplayOptions::default())
    }

    fn kind(&self) -> &'static str {
        match self {
            Content::Text(_) => "text",
            Content::Table(_) => "table",
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<Table> for Content {
    fn from(table: Table) -> Self {
        Content::Table(table)
    }
}

/// One retrievable unit of content with a deterministic identity.
///
/// Documents are immutable once built. Unless an explicit id is supplied,
/// the id is a hash of the fields named by `id_hash_keys`, so two documents
/// that agree on those fields always share an id.
///
/// ```
/// use qalabel::schema::Document;
///
/// let a = Document::builder("text1").meta_entry("name", "doc1").build()?;
/// let b = Document::builder("text1").meta_entry("name", "doc2").build()?;
/// assert_eq!(a.id(), b.id());
/// # Ok::<(), qalabel::SchemaError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DocumentRecord", into = "DocumentRecord")]
pub struct Document {
    id: String,
    content: Content,
    content_type: ContentType,
    meta: Map<String, Value>,
    score: Option<f64>,
    embedding: Option<Vec<f32>>,
    id_hash_keys: Vec<String>,
}

impl Document {
    /// Builds a document from content with default settings.
    pub fn new(content: impl Into<Content>) -> Result<Self, SchemaError> {
        Self::builder(content).build()
    }

    /// Starts building a document.
    pub fn builder(content: impl Into<Content>) -> DocumentBuilder {
        DocumentBuilder {
            content: content.into(),
            content_type: None,
            meta: Map::new(),
            score: None,
            embedding: None,
            id_hash_keys: None,
            id: None,
        }
    }

    /// The stored id, either supplied or hashed at construction.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The text or table this document holds.
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// The declared content kind.
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Free-form metadata.
    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    /// Retriever relevance score, if any.
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    /// Dense vector representation, if any.
    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    /// Fields the id is hashed from.
    pub fn id_hash_keys(&self) -> &[String] {
        &self.id_hash_keys
    }

    /// The id this document's fields hash to under its `id_hash_keys`.
    ///
    /// Differs from [`Document::id`] when the id was supplied explicitly.
    pub fn recompute_id(&self) -> Result<String, SchemaError> {
        hashing::document_id(&self.identity_fields(), &self.id_hash_keys)
    }

    fn identity_fields(&self) -> IdentityFields<'_> {
        IdentityFields {
            content: &self.content,
            content_type: self.content_type,
            score: self.score,
            meta: &self.meta,
            embedding: self.embedding.as_deref(),
        }
    }
}

impl Interchange for Document {}

/// Builder for [`Document`]; all identity checks happen in [`build`](Self::build).
#[derive(Clone, Debug)]
pub struct DocumentBuilder {
    content: Content,
    content_type: Option<ContentType>,
    meta: Map<String, Value>,
    score: Option<f64>,
    embedding: Option<Vec<f32>>,
    id_hash_keys: Option<Vec<String>>,
    id: Option<String>,
}

impl DocumentBuilder {
    /// Sets the content type. Defaults to `table` for table content and
    /// `text` otherwise.
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Replaces the metadata.
    pub fn meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = meta;
        self
    }

    /// Adds one metadata entry.
    pub fn meta_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Sets the retriever score.
    pub fn score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Sets the embedding vector.
    pub fn embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Sets the fields the id is hashed from (default: `["content"]`).
    pub fn id_hash_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_hash_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Uses an explicit id instead of hashing.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Finishes the document, computing its id if none was given.
    ///
    /// # Errors
    /// - [`SchemaError::ContentTypeMismatch`] if table content is not typed
    ///   `table` or a `table` document has string content
    /// - [`SchemaError::InvalidIdHashKey`] / [`SchemaError::EmptyIdHashKeys`]
    ///   for unusable `id_hash_keys`
    /// - [`SchemaError::MissingMetaKey`] if a `meta.<key>` path is absent
    pub fn build(self) -> Result<Document, SchemaError> {
        let content_type = self.content_type.unwrap_or(match self.content {
            Content::Table(_) => ContentType::Table,
            Content::Text(_) => ContentType::Text,
        });
        let is_table = matches!(self.content, Content::Table(_));
        if is_table != (content_type == ContentType::Table) {
            return Err(SchemaError::ContentTypeMismatch {
                content_type: content_type.as_str(),
                content: self.content.kind(),
            });
        }

        let id_hash_keys = self
            .id_hash_keys
            .unwrap_or_else(|| vec!["content".to_string()]);
        hashing::validate_id_hash_keys(&id_hash_keys)?;

        let mut document = Document {
            id: String::new(),
            content: self.content,
            content_type,
            meta: self.meta,
            score: self.score,
            embedding: self.embedding,
            id_hash_keys,
        };
        document.id = match self.id {
            Some(id) => id,
            None => document.recompute_id()?,
        };
        Ok(document)
    }
}

/// Wire shape of a document. Unknown top-level keys are collected into
/// `extra` and folded into `meta` on decode.
#[derive(Serialize, Deserialize)]
struct DocumentRecord {
    content: Content,
    #[serde(default)]
    content_type: Option<ContentType>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    meta: Option<Map<String, Value>>,
    #[serde(default)]
    id_hash_keys: Option<Vec<String>>,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    id: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<Document> for DocumentRecord {
    fn from(doc: Document) -> Self {
        Self {
            content: doc.content,
            content_type: Some(doc.content_type),
            score: doc.score,
            meta: Some(doc.meta),
            id_hash_keys: Some(doc.id_hash_keys),
            embedding: doc.embedding,
            id: Some(doc.id),
            extra: Map::new(),
        }
    }
}

impl TryFrom<DocumentRecord> for Document {
    type Error = SchemaError;

    fn try_from(record: DocumentRecord) -> Result<Self, Self::Error> {
        let mut meta = record.meta.unwrap_or_default();
        meta.extend(record.extra);

        let mut builder = Document::builder(record.content).meta(meta);
        if let Some(content_type) = record.content_type {
            builder = builder.content_type(content_type);
        }
        if let Some(score) = record.score {
            builder = builder.score(score);
        }
        if let Some(embedding) = record.embedding {
            builder = builder.embedding(embedding);
        }
        if let Some(keys) = record.id_hash_keys {
            builder = builder.id_hash_keys(keys);
        }
        if let Some(id) = record.id {
            builder = builder.id(id);
        }
        builder.build()
    }
}
