//! MultiLabel: the deduplicated view over all labels for one query.
//!
//! Evaluation compares a prediction against every acceptable gold answer for
//! a query at once. A [`MultiLabel`] collects those labels, drops repeated
//! judgements and exposes parallel per-label sequences (answers, document
//! ids, contexts, offsets) for the evaluation code to consume.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::hashing;
use super::label::{Filters, Label};
use super::offset::Offset;
use super::Interchange;
use crate::error::SchemaError;

/// Optional label filtering applied after deduplication.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MultiLabelOptions {
    /// Keep only labels whose answer and document were both judged correct.
    pub drop_negative_labels: bool,
    /// Drop labels whose answer is empty.
    pub drop_no_answers: bool,
}

/// Labels sharing one query and one set of filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MultiLabelInput", into = "MultiLabelRecord")]
pub struct MultiLabel {
    labels: Vec<Label>,
    query: String,
    filters: Option<Filters>,
    id: String,
    no_answer: bool,
    answers: Vec<String>,
    document_ids: Vec<String>,
    contexts: Vec<String>,
    offsets_in_documents: Vec<Offset>,
    offsets_in_contexts: Vec<Offset>,
}

/// What makes two labels the same judgement for aggregation purposes.
#[derive(PartialEq, Eq, Hash)]
struct Fingerprint<'a> {
    answer: &'a str,
    document_ids: Vec<&'a str>,
    offsets_in_document: Option<&'a [Offset]>,
    offsets_in_context: Option<&'a [Offset]>,
}

impl<'a> Fingerprint<'a> {
    fn of(label: &'a Label) -> Self {
        let document_ids = match &label.answer.document_ids {
            Some(ids) if !ids.is_empty() => ids.iter().map(String::as_str).collect(),
            _ => vec![label.document.id()],
        };
        Self {
            answer: &label.answer.answer,
            document_ids,
            offsets_in_document: label.answer.offsets_in_document.as_deref(),
            offsets_in_context: label.answer.offsets_in_context.as_deref(),
        }
    }
}

impl MultiLabel {
    /// Aggregates labels without dropping any besides duplicates.
    pub fn new(labels: Vec<Label>) -> Result<Self, SchemaError> {
        Self::with_options(labels, &MultiLabelOptions::default())
    }

    /// Aggregates labels.
    ///
    /// All labels must share one query and one filters value. Duplicates
    /// (same answer text, referenced documents and offsets) are dropped,
    /// keeping the first occurrence, before the drop options apply.
    ///
    /// # Errors
    /// - [`SchemaError::EmptyMultiLabel`] if there are no labels, before or
    ///   after the drop options
    /// - [`SchemaError::MixedFilters`] / [`SchemaError::MixedQueries`] if the
    ///   labels disagree
    pub fn with_options(
        labels: Vec<Label>,
        options: &MultiLabelOptions,
    ) -> Result<Self, SchemaError> {
        let first = labels.first().ok_or(SchemaError::EmptyMultiLabel)?;
        if let Some(other) = labels.iter().find(|l| l.filters != first.filters) {
            return Err(SchemaError::MixedFilters {
                first: describe_filters(first.filters.as_ref()),
                other: describe_filters(other.filters.as_ref()),
            });
        }
        if let Some(other) = labels.iter().find(|l| l.query != first.query) {
            return Err(SchemaError::MixedQueries {
                first: first.query.clone(),
                other: other.query.clone(),
            });
        }
        let query = first.query.clone();
        let filters = first.filters.clone();

        let labels: Vec<Label> = dedup_labels(labels)
            .into_iter()
            .filter(|l| !options.drop_negative_labels || l.is_positive())
            .filter(|l| !options.drop_no_answers || !l.no_answer())
            .collect();
        if labels.is_empty() {
            return Err(SchemaError::EmptyMultiLabel);
        }

        let id = hashing::multilabel_id(&query, filters.as_ref())?;
        let no_answer = labels.iter().all(Label::no_answer);
        let answers = labels.iter().map(|l| l.answer.answer.clone()).collect();
        let document_ids = labels.iter().map(|l| l.document.id().to_string()).collect();
        let contexts = labels
            .iter()
            .map(|l| l.document.content().canonical_string())
            .collect();
        let offsets_in_documents = labels
            .iter()
            .flat_map(|l| l.answer.offsets_in_document.iter().flatten().copied())
            .collect();
        let offsets_in_contexts = labels
            .iter()
            .flat_map(|l| l.answer.offsets_in_context.iter().flatten().copied())
            .collect();

        Ok(Self {
            labels,
            query,
            filters,
            id,
            no_answer,
            answers,
            document_ids,
            contexts,
            offsets_in_documents,
            offsets_in_contexts,
        })
    }

    /// The deduplicated labels in first-seen order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Consumes the MultiLabel, returning its labels.
    pub fn into_labels(self) -> Vec<Label> {
        self.labels
    }

    /// The query shared by every label.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The filters shared by every label, if any.
    pub fn filters(&self) -> Option<&Filters> {
        self.filters.as_ref()
    }

    /// Hash of the query and filters; equal for every MultiLabel of the
    /// same query and filters.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// True if every label is a no-answer.
    pub fn no_answer(&self) -> bool {
        self.no_answer
    }

    /// Answer text of each label, no-answers included.
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// Id of each label's document.
    pub fn document_ids(&self) -> &[String] {
        &self.document_ids
    }

    /// Each label's document content as a display string.
    pub fn contexts(&self) -> &[String] {
        &self.contexts
    }

    /// All labels' document offsets, in label order.
    pub fn offsets_in_documents(&self) -> &[Offset] {
        &self.offsets_in_documents
    }

    /// All labels' context offsets, in label order.
    pub fn offsets_in_contexts(&self) -> &[Offset] {
        &self.offsets_in_contexts
    }
}

impl Interchange for MultiLabel {}

/// Drops labels whose fingerprint was already seen, keeping input order.
fn dedup_labels(labels: Vec<Label>) -> Vec<Label> {
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(labels.len());
        labels
            .iter()
            .map(|label| seen.insert(Fingerprint::of(label)))
            .collect()
    };
    labels
        .into_iter()
        .zip(keep)
        .filter_map(|(label, keep)| keep.then_some(label))
        .collect()
}

fn describe_filters(filters: Option<&Filters>) -> String {
    match filters {
        Some(filters) => format!("{:?}", filters),
        None => "no filters".to_string(),
    }
}

/// Decoded shape: only the labels (and drop options) matter, everything
/// else is recomputed.
#[derive(Deserialize)]
struct MultiLabelInput {
    labels: Vec<Label>,
    #[serde(default)]
    drop_negative_labels: bool,
    #[serde(default)]
    drop_no_answers: bool,
}

impl TryFrom<MultiLabelInput> for MultiLabel {
    type Error = SchemaError;

    fn try_from(input: MultiLabelInput) -> Result<Self, Self::Error> {
        let options = MultiLabelOptions {
            drop_negative_labels: input.drop_negative_labels,
            drop_no_answers: input.drop_no_answers,
        };
        MultiLabel::with_options(input.labels, &options)
    }
}

#[derive(Serialize)]
struct MultiLabelRecord {
    labels: Vec<Label>,
    query: String,
    filters: Option<Filters>,
    id: String,
    no_answer: bool,
    answers: Vec<String>,
    document_ids: Vec<String>,
    contexts: Vec<String>,
    offsets_in_documents: Vec<Offset>,
    offsets_in_contexts: Vec<Offset>,
}

impl From<MultiLabel> for MultiLabelRecord {
    fn from(ml: MultiLabel) -> Self {
        Self {
            labels: ml.labels,
            query: ml.query,
            filters: ml.filters,
            id: ml.id,
            no_answer: ml.no_answer,
            answers: ml.answers,
            document_ids: ml.document_ids,
            contexts: ml.contexts,
            offsets_in_documents: ml.offsets_in_documents,
            offsets_in_contexts: ml.offsets_in_contexts,
        }
    }
}
