//! Grouping a flat label collection into MultiLabels.
//!
//! Labels for the same question are usually stored one judgement per row.
//! Evaluation wants them grouped: one [`MultiLabel`] per query (and filters),
//! or per query and document when the retriever is not part of the
//! evaluation (closed domain).

use std::collections::HashMap;

use tracing::debug;

use crate::error::SchemaError;
use crate::schema::{Filters, Label, MultiLabel, MultiLabelOptions};

/// Options for label aggregation.
#[derive(Clone, Debug)]
pub struct AggregateOptions {
    /// Group by query and filters only. When false, labels are additionally
    /// grouped by the id of their document.
    pub open_domain: bool,
    /// Keep only labels judged correct for both answer and document.
    pub drop_negative_labels: bool,
    /// Drop labels without an answer.
    pub drop_no_answers: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            open_domain: true,
            drop_negative_labels: false,
            drop_no_answers: false,
        }
    }
}

impl AggregateOptions {
    fn multilabel_options(&self) -> MultiLabelOptions {
        MultiLabelOptions {
            drop_negative_labels: self.drop_negative_labels,
            drop_no_answers: self.drop_no_answers,
        }
    }
}

#[derive(PartialEq, Eq, Hash)]
struct GroupKey {
    query: String,
    filters: Option<Filters>,
    document_id: Option<String>,
}

/// Groups labels into MultiLabels.
///
/// Groups come out in order of their first label; labels keep their input
/// order inside a group. A group left empty by the drop options is skipped.
pub fn aggregate_labels(
    labels: Vec<Label>,
    opts: &AggregateOptions,
) -> Result<Vec<MultiLabel>, SchemaError> {
    let total = labels.len();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<Vec<Label>> = Vec::new();

    for label in labels {
        let key = GroupKey {
            query: label.query.clone(),
            filters: label.filters.clone(),
            document_id: (!opts.open_domain).then(|| label.document.id().to_string()),
        };
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(label);
    }

    debug!(
        labels = total,
        groups = groups.len(),
        open_domain = opts.open_domain,
        "grouped labels"
    );

    let ml_opts = opts.multilabel_options();
    let mut aggregated = Vec::with_capacity(groups.len());
    for group in groups {
        match MultiLabel::with_options(group, &ml_opts) {
            Ok(ml) => aggregated.push(ml),
            Err(SchemaError::EmptyMultiLabel) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(aggregated)
}
