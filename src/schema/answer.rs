//! Answers extracted or generated for a query.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::document::Content;
use super::offset::Offset;
use super::Interchange;

/// How an answer was produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerType {
    #[default]
    Extractive,
    Generative,
    Other,
}

/// One answer for a query, pointing into the documents it came from.
///
/// An empty `answer` string denotes "no answer". Offsets are spans for text
/// documents and table cells for tabular ones.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "AnswerRecord")]
pub struct Answer {
    /// The answer text; empty for a no-answer.
    pub answer: String,

    #[serde(rename = "type")]
    pub answer_type: AnswerType,

    pub score: Option<f64>,

    /// Text or table excerpt around the answer.
    pub context: Option<Content>,

    pub offsets_in_document: Option<Vec<Offset>>,

    pub offsets_in_context: Option<Vec<Offset>>,

    /// Ids of the documents the answer was taken from.
    pub document_ids: Option<Vec<String>>,

    pub meta: Map<String, Value>,
}

impl Answer {
    /// Creates an extractive answer with no offsets or references.
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            ..Default::default()
        }
    }

    /// Creates the empty no-answer.
    pub fn no_answer() -> Self {
        Self::default()
    }

    /// Returns true if this answer denotes "no answer".
    pub fn is_no_answer(&self) -> bool {
        self.answer.is_empty()
    }

    /// Sets how the answer was produced.
    pub fn with_type(mut self, answer_type: AnswerType) -> Self {
        self.answer_type = answer_type;
        self
    }

    /// Sets the model confidence.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Sets the passage the answer was read from.
    pub fn with_context(mut self, context: impl Into<Content>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Sets where the answer sits in its document.
    pub fn with_offsets_in_document<I, O>(mut self, offsets: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<Offset>,
    {
        self.offsets_in_document = Some(offsets.into_iter().map(Into::into).collect());
        self
    }

    /// Sets where the answer sits in its context.
    pub fn with_offsets_in_context<I, O>(mut self, offsets: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<Offset>,
    {
        self.offsets_in_context = Some(offsets.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the ids of the documents the answer came from.
    pub fn with_document_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.document_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Replaces the answer metadata.
    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = meta;
        self
    }
}

impl Interchange for Answer {}

/// Wire shape accepted on decode, including the legacy singular
/// `document_id` field.
#[derive(Deserialize)]
struct AnswerRecord {
    answer: String,
    #[serde(rename = "type", default)]
    answer_type: AnswerType,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    context: Option<Content>,
    #[serde(default)]
    offsets_in_document: Option<Vec<Offset>>,
    #[serde(default)]
    offsets_in_context: Option<Vec<Offset>>,
    #[serde(default)]
    document_ids: Option<Vec<String>>,
    #[serde(default)]
    document_id: Option<String>,
    #[serde(default)]
    meta: Option<Map<String, Value>>,
}

impl From<AnswerRecord> for Answer {
    fn from(record: AnswerRecord) -> Self {
        let document_ids = record
            .document_ids
            .or_else(|| record.document_id.map(|id| vec![id]));
        Self {
            answer: record.answer,
            answer_type: record.answer_type,
            score: record.score,
            context: record.context,
            offsets_in_document: record.offsets_in_document,
            offsets_in_context: record.offsets_in_context,
            document_ids,
            meta: record.meta.unwrap_or_default(),
        }
    }
}
