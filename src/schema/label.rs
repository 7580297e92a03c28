//! Labels: judgements tying a query, a document and an answer together.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::answer::Answer;
use super::document::Document;
use super::Interchange;

/// Filter name to accepted values. Key order is irrelevant, value order is
/// significant.
pub type Filters = BTreeMap<String, Vec<String>>;

/// Where a label came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    UserFeedback,
    GoldLabel,
}

/// One human or system judgement about an answer to a query.
///
/// Equality ignores `id`, `created_at` and `updated_at`: two labels carrying
/// the same judgement are equal no matter when or under which id they were
/// recorded.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "LabelRecord", into = "LabelRecord")]
pub struct Label {
    pub id: String,
    pub query: String,
    pub document: Document,
    pub answer: Answer,
    pub is_correct_answer: bool,
    pub is_correct_document: bool,
    pub origin: Origin,
    pub pipeline_id: Option<String>,
    pub created_at: Option<DateTime<FixedOffset>>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub meta: Map<String, Value>,
    pub filters: Option<Filters>,
}

impl Label {
    /// Creates a label with a fresh id, stamped with the current time.
    pub fn new(
        query: impl Into<String>,
        document: Document,
        answer: Answer,
        is_correct_answer: bool,
        is_correct_document: bool,
        origin: Origin,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            query: query.into(),
            document,
            answer,
            is_correct_answer,
            is_correct_document,
            origin,
            pipeline_id: None,
            created_at: Some(Utc::now().fixed_offset()),
            updated_at: None,
            meta: Map::new(),
            filters: None,
        }
    }

    /// Replaces the generated UUID with `id`.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the id of the pipeline that produced this label.
    pub fn with_pipeline_id(mut self, pipeline_id: impl Into<String>) -> Self {
        self.pipeline_id = Some(pipeline_id.into());
        self
    }

    /// Overrides the creation timestamp.
    pub fn with_created_at(mut self, created_at: DateTime<FixedOffset>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Sets the last-update timestamp.
    pub fn with_updated_at(mut self, updated_at: DateTime<FixedOffset>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Replaces the label metadata.
    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = meta;
        self
    }

    /// Sets the filters this label's query ran with.
    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = Some(filters);
        self
    }

    /// True iff the answer text is empty. Always derived, never stored.
    pub fn no_answer(&self) -> bool {
        self.answer.is_no_answer()
    }

    /// True if both the answer and the document were judged correct.
    pub fn is_positive(&self) -> bool {
        self.is_correct_answer && self.is_correct_document
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.query == other.query
            && self.document == other.document
            && self.answer == other.answer
            && self.is_correct_answer == other.is_correct_answer
            && self.is_correct_document == other.is_correct_document
            && self.origin == other.origin
            && self.pipeline_id == other.pipeline_id
            && self.meta == other.meta
            && self.filters == other.filters
    }
}

impl Interchange for Label {}

/// Wire shape of a label. `no_answer` is written for consumers but ignored
/// on decode; a missing id gets a fresh one.
#[derive(Serialize, Deserialize)]
struct LabelRecord {
    #[serde(default)]
    id: Option<String>,
    query: String,
    document: Document,
    is_correct_answer: bool,
    is_correct_document: bool,
    origin: Origin,
    answer: Answer,
    #[serde(skip_deserializing)]
    no_answer: Option<bool>,
    #[serde(default)]
    pipeline_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    created_at: Option<DateTime<FixedOffset>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    updated_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    meta: Option<Map<String, Value>>,
    #[serde(default)]
    filters: Option<Filters>,
}

impl From<Label> for LabelRecord {
    fn from(label: Label) -> Self {
        Self {
            no_answer: Some(label.no_answer()),
            id: Some(label.id),
            query: label.query,
            document: label.document,
            is_correct_answer: label.is_correct_answer,
            is_correct_document: label.is_correct_document,
            origin: label.origin,
            answer: label.answer,
            pipeline_id: label.pipeline_id,
            created_at: label.created_at,
            updated_at: label.updated_at,
            meta: Some(label.meta),
            filters: label.filters,
        }
    }
}

impl From<LabelRecord> for Label {
    fn from(record: LabelRecord) -> Self {
        Self {
            id: record.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            query: record.query,
            document: record.document,
            answer: record.answer,
            is_correct_answer: record.is_correct_answer,
            is_correct_document: record.is_correct_document,
            origin: record.origin,
            pipeline_id: record.pipeline_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            meta: record.meta.unwrap_or_default(),
            filters: record.filters,
        }
    }
}

/// Accepts RFC 3339 timestamps and the offset-less `YYYY-MM-DD HH:MM:SS`
/// form (read as UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc().fixed_offset()))
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
}
