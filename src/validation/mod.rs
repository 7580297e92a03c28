//! Label set validation.
//!
//! The schema types accept data that is structurally fine but semantically
//! off (inverted spans, offsets outside their document, references to the
//! wrong document). This module finds those problems and reports them
//! without failing, so a whole file can be checked in one pass.

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::HashMap;

use crate::schema::{Content, ContentType, Label, Offset, Span, TableCell};

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
    /// Also flag documents whose content-derived id no longer matches
    /// their content.
    pub check_document_ids: bool,
}

/// Validates labels and returns a report of all issues found.
pub fn validate_labels(labels: &[Label], opts: &ValidateOptions) -> ValidationReport {
    let mut report = ValidationReport::new();
    let mut seen_ids: HashMap<&str, usize> = HashMap::new();

    for (index, label) in labels.iter().enumerate() {
        let ctx = || IssueContext::Label {
            index,
            id: label.id.clone(),
        };

        if let Some(first) = seen_ids.get(label.id.as_str()) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateLabelId,
                format!("Duplicate label id (first seen at index {})", first),
                ctx(),
            ));
        } else {
            seen_ids.insert(&label.id, index);
        }

        if label.query.trim().is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyQuery,
                "Empty query",
                ctx(),
            ));
        }

        validate_offsets(label, &mut report, &ctx);
        validate_document_refs(label, &mut report, &ctx);

        if opts.check_document_ids {
            validate_document_id(label, index, &mut report);
        }
    }

    report
}

fn validate_offsets(
    label: &Label,
    report: &mut ValidationReport,
    ctx: &dyn Fn() -> IssueContext,
) {
    let answer = &label.answer;
    for span in answer
        .offsets_in_document
        .iter()
        .chain(answer.offsets_in_context.iter())
        .flatten()
        .filter_map(Offset::as_span)
    {
        if span.end <= span.start && !label.no_answer() {
            report.add(ValidationIssue::error(
                IssueCode::InvertedSpan,
                format!("Span {} is empty or inverted", span),
                ctx(),
            ));
        }
    }

    let document = &label.document;
    for offset in answer.offsets_in_document.iter().flatten() {
        match (offset, document.content()) {
            (Offset::Cell(cell), Content::Table(table)) => {
                if cell.row >= table.n_rows() || cell.col >= table.n_cols() {
                    report.add(ValidationIssue::error(
                        IssueCode::CellOutOfTable,
                        format!(
                            "Cell {} outside a table of {} row(s) and {} column(s)",
                            cell,
                            table.n_rows(),
                            table.n_cols()
                        ),
                        ctx(),
                    ));
                }
            }
            (Offset::Span(span), Content::Text(text)) => {
                check_span_in_text(span, text, document.content_type(), report, ctx);
            }
            (Offset::Cell(TableCell { .. }), Content::Text(_)) => {
                report.add(ValidationIssue::error(
                    IssueCode::OffsetKindMismatch,
                    format!("Table cell {} on a {} document", offset, document.content_type()),
                    ctx(),
                ));
            }
            (Offset::Span(_), Content::Table(_)) => {
                report.add(ValidationIssue::error(
                    IssueCode::OffsetKindMismatch,
                    format!("Character span {} on a table document", offset),
                    ctx(),
                ));
            }
        }
    }
}

fn check_span_in_text(
    span: &Span,
    text: &str,
    content_type: ContentType,
    report: &mut ValidationReport,
    ctx: &dyn Fn() -> IssueContext,
) {
    // image and audio content is a path, not the text being indexed
    if content_type != ContentType::Text {
        return;
    }
    let len = text.chars().count();
    if span.end > len {
        report.add(ValidationIssue::warning(
            IssueCode::SpanOutOfDocument,
            format!("Span {} ends past the document end ({} chars)", span, len),
            ctx(),
        ));
    }
}

fn validate_document_refs(
    label: &Label,
    report: &mut ValidationReport,
    ctx: &dyn Fn() -> IssueContext,
) {
    let Some(ids) = label.answer.document_ids.as_deref() else {
        return;
    };
    let own = label.document.id();
    if !ids.is_empty() && !ids.iter().any(|id| id == own) {
        report.add(ValidationIssue::warning(
            IssueCode::DanglingDocumentId,
            format!(
                "Answer references [{}] but the label's document is {}",
                ids.join(", "),
                own
            ),
            ctx(),
        ));
    }
}

fn validate_document_id(label: &Label, index: usize, report: &mut ValidationReport) {
    let document = &label.document;
    if document.id_hash_keys() != ["content"] {
        return;
    }
    if let Ok(expected) = document.recompute_id() {
        if expected != document.id() {
            report.add(ValidationIssue::warning(
                IssueCode::StaleDocumentId,
                format!("Content hashes to {}", expected),
                IssueContext::Document {
                    label_index: index,
                    id: document.id().to_string(),
                },
            ));
        }
    }
}
