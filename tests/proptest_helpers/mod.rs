#![allow(dead_code)]

use qalabel::schema::{Answer, AnswerType, Document, Filters, Label, Origin, Span};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use serde_json::{Map, Value};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Any finite `f64`, with extra weight on the usual (0, 1) score range.
pub fn arb_score() -> BoxedStrategy<f64> {
    prop_oneof![
        any::<f64>().prop_filter("finite score", |x| x.is_finite()),
        0.0f64..1.0,
    ]
    .boxed()
}

/// Text documents with optional meta, score and embedding.
pub fn arb_document() -> BoxedStrategy<Document> {
    (
        text_strategy(),
        arb_meta(),
        proptest::option::of(arb_score()),
        proptest::option::of(proptest::collection::vec(
            any::<f32>().prop_filter("finite embedding value", |x| x.is_finite()),
            0..=8,
        )),
    )
        .prop_map(|(content, meta, score, embedding)| {
            let mut builder = Document::builder(content).meta(meta);
            if let Some(score) = score {
                builder = builder.score(score);
            }
            if let Some(embedding) = embedding {
                builder = builder.embedding(embedding);
            }
            builder.build().expect("generated document is valid")
        })
        .boxed()
}

/// Answers pointing into `document`, including the occasional no-answer.
pub fn arb_answer_for(document: Document) -> BoxedStrategy<Answer> {
    let len = match document.content().as_text() {
        Some(text) => text.chars().count(),
        None => 0,
    };
    let id = document.id().to_string();

    (
        answer_text_strategy(),
        0..=len,
        0..=len,
        prop_oneof![
            Just(AnswerType::Extractive),
            Just(AnswerType::Generative),
            Just(AnswerType::Other),
        ],
        any::<bool>(),
        proptest::option::of(arb_score()),
    )
        .prop_map(move |(text, a, b, answer_type, with_offsets, score)| {
            if text.is_empty() {
                return Answer::no_answer();
            }
            let mut answer = Answer::new(text)
                .with_type(answer_type)
                .with_document_ids([id.clone()]);
            if let Some(score) = score {
                answer = answer.with_score(score);
            }
            if with_offsets {
                answer = answer.with_offsets_in_document([Span::new(a.min(b), a.max(b))]);
            }
            answer
        })
        .boxed()
}

/// Labels whose queries and filters come from small pools, so collections
/// of them form several groups with repeated members.
pub fn arb_label() -> BoxedStrategy<Label> {
    arb_document()
        .prop_flat_map(|document| {
            (
                Just(document.clone()),
                arb_answer_for(document),
                query_strategy(),
                any::<bool>(),
                any::<bool>(),
                prop_oneof![Just(Origin::GoldLabel), Just(Origin::UserFeedback)],
                proptest::option::of(arb_filters()),
                "[a-z0-9]{8}",
            )
        })
        .prop_map(
            |(document, answer, query, correct_answer, correct_document, origin, filters, id)| {
                let label = Label::new(
                    query,
                    document,
                    answer,
                    correct_answer,
                    correct_document,
                    origin,
                )
                .with_id(id);
                match filters {
                    Some(filters) => label.with_filters(filters),
                    None => label,
                }
            },
        )
        .boxed()
}

pub fn arb_labels(max_labels: usize) -> BoxedStrategy<Vec<Label>> {
    proptest::collection::vec(arb_label(), 0..=max_labels).boxed()
}

/// Labels that all share one query and no filters.
pub fn arb_same_query_labels(max_labels: usize) -> BoxedStrategy<Vec<Label>> {
    assert!(max_labels > 0, "max_labels must be > 0");

    proptest::collection::vec(arb_label(), 1..=max_labels)
        .prop_map(|labels| {
            labels
                .into_iter()
                .map(|mut label| {
                    label.query = "shared question".to_string();
                    label.filters = None;
                    label
                })
                .collect()
        })
        .boxed()
}

fn arb_meta() -> BoxedStrategy<Map<String, Value>> {
    proptest::collection::vec(
        (
            "[a-z]{1,8}",
            prop_oneof![
                any::<i32>().prop_map(Value::from),
                "[a-z ]{0,10}".prop_map(Value::from),
                any::<bool>().prop_map(Value::from),
            ],
        ),
        0..=3,
    )
    .prop_map(|pairs| pairs.into_iter().collect())
    .boxed()
}

fn arb_filters() -> BoxedStrategy<Filters> {
    proptest::collection::btree_map(
        prop_oneof![Just("lang".to_string()), Just("year".to_string())],
        proptest::collection::vec("[a-z0-9]{1,4}", 1..=2),
        1..=2,
    )
    .boxed()
}

fn text_strategy() -> BoxedStrategy<String> {
    proptest::string::string_regex("[A-Za-z][A-Za-z ,.]{0,40}")
        .expect("valid text regex")
        .boxed()
}

fn answer_text_strategy() -> BoxedStrategy<String> {
    prop_oneof![
        1 => Just(String::new()),
        4 => proptest::string::string_regex("[A-Za-z]{1,10}").expect("valid answer regex"),
    ]
    .boxed()
}

fn query_strategy() -> BoxedStrategy<String> {
    prop_oneof![
        Just("who".to_string()),
        Just("what".to_string()),
        Just("where".to_string()),
    ]
    .boxed()
}
