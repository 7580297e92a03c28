//! Integration tests for the document / answer / label model.
//!
//! These cover the behaviour evaluation code relies on: stable ids,
//! lossless round-trips, legacy field handling and MultiLabel aggregation.

use qalabel::schema::{
    Answer, Content, ContentType, Document, Interchange, Label, MultiLabel, Offset, Origin, Span,
    Table, TableCell,
};
use qalabel::SchemaError;
use serde_json::{json, Value};

fn gold(id: &str, answer: Answer, doc: Document) -> Label {
    Label::new("question", doc, answer, true, true, Origin::GoldLabel).with_id(id)
}

fn doc(content: &str, id: &str) -> Document {
    Document::builder(content).id(id).build().unwrap()
}

fn actors_table() -> Table {
    Table::from_columns(vec![
        (
            "actors".into(),
            vec![json!("brad pitt"), json!("leonardo di caprio"), json!("george clooney")],
        ),
        ("age".into(), vec![json!(58), json!(47), json!(60)]),
        ("number of movies".into(), vec![json!(87), json!(53), json!(69)]),
        (
            "date of birth".into(),
            vec![json!("18 december 1963"), json!("11 november 1974"), json!("6 may 1961")],
        ),
    ])
    .unwrap()
}

fn maps(offsets: &[Offset]) -> Vec<Value> {
    offsets.iter().map(Offset::to_map).collect()
}

#[test]
fn multilabel_preserves_label_order() {
    let span = Span::new(12, 18);
    let labels = vec![
        gold("0", Answer::new("answer1").with_offsets_in_document([span]), doc("some", "123")),
        gold("1", Answer::new("answer2").with_offsets_in_document([span]), doc("some", "123")),
        gold("2", Answer::new("answer3").with_offsets_in_document([span]), doc("some other", "333")),
        gold(
            "3",
            Answer::new("").with_offsets_in_document([Span::new(0, 0)]),
            doc("some", "777"),
        ),
        Label::new(
            "question",
            doc("some", "123"),
            Answer::new("answer5").with_offsets_in_document([span]),
            false,
            true,
            Origin::GoldLabel,
        )
        .with_id("4"),
    ];

    let ml = MultiLabel::new(labels).unwrap();
    let ids: Vec<&str> = ml.labels().iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, ["0", "1", "2", "3", "4"]);
    assert!(!ml.no_answer());
}

#[test]
fn multilabel_drops_duplicates_keeping_first() {
    let answer = |text: &str, doc_span: (usize, usize), ctx_span: (usize, usize)| {
        Answer::new(text)
            .with_offsets_in_document([Span::new(doc_span.0, doc_span.1)])
            .with_offsets_in_context([Span::new(ctx_span.0, ctx_span.1)])
    };
    let labels = vec![
        gold("0", answer("answer1", (12, 18), (1, 7)), doc("some", "123")),
        gold("1", answer("answer2", (10, 16), (0, 6)), doc("some", "123")),
        gold("2", answer("answer3", (14, 20), (2, 8)), doc("some other", "333")),
        gold("0", answer("answer1", (12, 18), (1, 7)), doc("some", "123")),
        gold("2", answer("answer3", (14, 20), (2, 8)), doc("some other", "333")),
    ];

    let ml = MultiLabel::new(labels).unwrap();
    assert_eq!(ml.query(), "question");
    assert_eq!(ml.answers(), ["answer1", "answer2", "answer3"]);
    assert_eq!(ml.document_ids(), ["123", "123", "333"]);
    assert_eq!(ml.contexts(), ["some", "some", "some other"]);
    assert_eq!(
        maps(ml.offsets_in_documents()),
        [
            json!({"start": 12, "end": 18}),
            json!({"start": 10, "end": 16}),
            json!({"start": 14, "end": 20}),
        ]
    );
    assert_eq!(
        maps(ml.offsets_in_contexts()),
        [
            json!({"start": 1, "end": 7}),
            json!({"start": 0, "end": 6}),
            json!({"start": 2, "end": 8}),
        ]
    );
    let ids: Vec<&str> = ml.labels().iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, ["0", "1", "2"]);
}

#[test]
fn multilabel_id_depends_on_query_and_filters() {
    let document = doc("something", "1");
    let label = |query: &str, filters: Value| {
        Label::new(
            query,
            document.clone(),
            Answer::new("answer 1"),
            true,
            true,
            Origin::GoldLabel,
        )
        .with_filters(serde_json::from_value(filters).unwrap())
    };
    let filter1 = json!({"name": ["name 1"]});
    let filter2 = json!({"name": ["name 1"], "author": ["author 1"]});

    let id = |l: Label| MultiLabel::new(vec![l]).unwrap().id().to_string();
    assert_eq!(id(label("question 1", filter1)), "33a3e58e13b16e9d6ec682ffe59ccc89");
    assert_eq!(id(label("question 2", filter2.clone())), "1b3ad38b629db7b0e869373b01bc32b1");
    assert_eq!(id(label("question 1", filter2)), "531445fa3bdf98b8598a3bea032bd605");
}

#[test]
fn multilabel_with_table_document() {
    let table = Table::from_columns(vec![
        ("col1".into(), vec![json!(1), json!(2)]),
        ("col2".into(), vec![json!(3), json!(4)]),
    ])
    .unwrap();
    let table_doc = Document::builder(table.clone())
        .content_type(ContentType::Table)
        .id("table1")
        .build()
        .unwrap();
    let answer = Answer::new("1")
        .with_context(table)
        .with_offsets_in_document([TableCell::new(0, 0)])
        .with_offsets_in_context([TableCell::new(0, 0)])
        .with_document_ids([table_doc.id()]);
    let label = Label::new("A question", table_doc, answer, true, true, Origin::GoldLabel);

    let ml = MultiLabel::new(vec![label]).unwrap();
    assert_eq!(ml.query(), "A question");
    assert_eq!(ml.contexts(), ["   col1  col2\n0     1     3\n1     2     4"]);
    assert_eq!(ml.answers(), ["1"]);
    assert_eq!(ml.document_ids(), ["table1"]);
    assert_eq!(maps(ml.offsets_in_documents()), [json!({"row": 0, "col": 0})]);
    assert_eq!(maps(ml.offsets_in_contexts()), [json!({"row": 0, "col": 0})]);
}

#[test]
fn multilabel_round_trips_through_dict_and_json() {
    let content = "\n\n\n\n\nThe eighth and final season of the fantasy drama television series ''Game of Thrones'', produced by HBO, premiered on April 14, 2019, and concluded on May 19, 2019.";
    let label_dict = json!({
        "id": "011079cf-c93f-49e6-83bb-42cd850dce12",
        "query": "When was the final season first shown on TV?",
        "document": {
            "content": content,
            "content_type": "text",
            "id": "9c82c97c9dc8ba6895893a53aafa610f",
            "meta": {},
            "score": null,
            "embedding": null
        },
        "is_correct_answer": true,
        "is_correct_document": true,
        "origin": "user-feedback",
        "answer": {
            "answer": "April 14",
            "type": "extractive",
            "score": null,
            "context": content,
            "offsets_in_document": [{"start": 124, "end": 132}],
            "offsets_in_context": null,
            "document_ids": null,
            "meta": {}
        },
        "no_answer": false,
        "pipeline_id": null,
        "created_at": "2022-07-22T13:29:33.699781+00:00",
        "updated_at": "2022-07-22T13:29:33.784895+00:00",
        "meta": {"answer_id": "374394", "document_id": "604995", "question_id": "345530"},
        "filters": null
    });

    let label = Label::from_dict(label_dict).unwrap();
    assert_eq!(label.document.id(), "9c82c97c9dc8ba6895893a53aafa610f");
    let original = MultiLabel::new(vec![label.clone()]).unwrap();

    let from_dict = MultiLabel::from_dict(original.to_dict().unwrap()).unwrap();
    assert_eq!(from_dict, original);
    assert_eq!(from_dict.labels()[0], label);

    let from_json = MultiLabel::from_json(&original.to_json().unwrap()).unwrap();
    assert_eq!(from_json, original);
    assert_eq!(from_json.labels()[0], label);
}

#[test]
fn multilabel_dict_derived_fields_are_recomputed() {
    let ml = MultiLabel::new(vec![gold("0", Answer::new("a"), doc("some", "1"))]).unwrap();
    let mut dict = ml.to_dict().unwrap();
    dict["answers"] = json!(["stale"]);
    dict["id"] = json!("stale");
    let restored = MultiLabel::from_dict(dict).unwrap();
    assert_eq!(restored.answers(), ["a"]);
    assert_eq!(restored.id(), ml.id());
}

#[test]
fn multilabel_rejects_mixed_filters() {
    let with = |value: &str| {
        gold("x", Answer::new("1"), doc("some", "777"))
            .with_filters(serde_json::from_value(json!({"name": [value]})).unwrap())
    };
    let ml = MultiLabel::new(vec![with("filename1"), with("filename1")]).unwrap();
    assert_eq!(ml.filters().unwrap()["name"], ["filename1"]);

    let err = MultiLabel::new(vec![with("filename1"), with("filename2")]).unwrap_err();
    assert!(matches!(err, SchemaError::MixedFilters { .. }));
}

#[test]
fn document_ids_follow_id_hash_keys() {
    let build = |content: &str, meta: Value, keys: &[&str]| {
        Document::builder(content)
            .meta(serde_json::from_value(meta).unwrap())
            .id_hash_keys(keys.iter().copied())
            .build()
    };
    let url = "https://deepset.ai";

    let a = build("text1", json!({"name": "doc1"}), &["content", "meta"]).unwrap();
    let b = build("text1", json!({"name": "doc2"}), &["content", "meta"]).unwrap();
    assert_ne!(a.id(), b.id());

    let a = build("text1", json!({"name": "doc1", "url": url}), &["content", "meta.url"]).unwrap();
    let b = build("text1", json!({"name": "doc2", "url": url}), &["content", "meta.url"]).unwrap();
    assert_eq!(a.id(), b.id());

    let a = build("text1", json!({"name": "doc1", "url": url}), &["meta.url"]).unwrap();
    let b = build("text2", json!({"name": "doc2", "url": url}), &["meta.url"]).unwrap();
    let c = build("text2", json!({"name": "doc2", "url": url}), &["meta.url", "meta.name"]).unwrap();
    assert_eq!(a.id(), b.id());
    assert_ne!(a.id(), c.id());

    let a = build("hello world", json!({"doc_id": "1"}), &["meta"]).unwrap();
    let b = build("hello world", json!({"doc_id": "2"}), &["meta"]).unwrap();
    assert_ne!(a.id(), b.id());

    let err = build("text1", json!({"name": "doc1"}), &["meta.url"]).unwrap_err();
    assert!(matches!(err, SchemaError::MissingMetaKey(k) if k == "url"));
    let err = build("text1", json!({}), &[]).unwrap_err();
    assert!(matches!(err, SchemaError::EmptyIdHashKeys));
}

#[test]
fn table_documents_round_trip_with_embedding() {
    let embedding: Vec<f32> = (0..768).map(|i| i as f32 / 768.0).collect();
    let plain = Document::builder(actors_table()).id("doc1").build().unwrap();
    let embedded = Document::builder(actors_table())
        .id("doc2")
        .embedding(embedding)
        .build()
        .unwrap();

    for doc in [plain, embedded] {
        assert_eq!(doc.content_type(), ContentType::Table);
        assert_eq!(Document::from_json(&doc.to_json().unwrap()).unwrap(), doc);
        assert_eq!(Document::from_dict(doc.to_dict().unwrap()).unwrap(), doc);
    }

    let dict = Document::new(actors_table()).unwrap().to_dict().unwrap();
    assert_eq!(dict["content"][0], json!(["actors", "age", "number of movies", "date of birth"]));
    assert_eq!(dict["content"][1], json!(["brad pitt", 58, 87, "18 december 1963"]));
}

#[test]
fn table_content_hashes_by_display_string() {
    let a = Document::new(actors_table()).unwrap();
    let b = Document::new(actors_table()).unwrap();
    assert_eq!(a.id(), b.id());
    match a.content() {
        Content::Table(t) => assert_eq!(t.n_rows(), 3),
        Content::Text(_) => panic!("expected table content"),
    }
}

#[test]
fn labels_compare_by_judgement() {
    let answered = |text: &str| {
        Answer::new(text)
            .with_score(0.1)
            .with_document_ids(["123"])
            .with_offsets_in_document([Span::new(1, 3)])
    };
    let label = |answer: Answer| {
        Label::new(
            "some",
            Document::new("some text").unwrap(),
            answer,
            true,
            true,
            Origin::UserFeedback,
        )
    };
    let first = label(answered("an answer"));
    let other = label(Answer::new("annother answer").with_score(0.1).with_document_ids(["123"]));
    let third = label(answered("an answer"));

    assert_eq!(third, first);
    assert_ne!(other, first);

    let restored = Label::from_json(&first.to_json().unwrap()).unwrap();
    assert_eq!(restored, first);
    assert_eq!(restored.id, first.id);
    assert_eq!(restored.created_at, first.created_at);
}

#[test]
fn legacy_answer_document_id_is_resolved_in_labels() {
    let legacy = |document_id: Value| {
        json!({
            "id": "123",
            "query": "Who made the PDF specification?",
            "document": {
                "content": "Some content",
                "content_type": "text",
                "score": null,
                "id": "fc18c987a8312e72a47fb1524f230bb0",
                "meta": {},
                "embedding": [0.1, 0.2, 0.3]
            },
            "answer": {
                "answer": "Adobe Systems",
                "type": "extractive",
                "context": "Some content",
                "offsets_in_context": [{"start": 60, "end": 73}],
                "offsets_in_document": [{"start": 60, "end": 73}],
                "document_id": document_id,
                "meta": {},
                "score": null
            },
            "is_correct_answer": true,
            "is_correct_document": true,
            "origin": "user-feedback",
            "pipeline_id": "some-123"
        })
    };

    let dict = legacy(json!("fc18c987a8312e72a47fb1524f230bb0"));
    let answer = Answer::from_dict(dict["answer"].clone()).unwrap();
    assert_eq!(
        answer.document_ids.as_deref(),
        Some(&["fc18c987a8312e72a47fb1524f230bb0".to_string()][..])
    );
    let label = Label::from_dict(dict).unwrap();
    assert_eq!(label.answer, answer);
    assert_eq!(label.pipeline_id.as_deref(), Some("some-123"));
    assert_eq!(label.document.embedding(), Some(&[0.1f32, 0.2, 0.3][..]));

    let label = Label::from_dict(legacy(Value::Null)).unwrap();
    assert_eq!(label.answer.document_ids, None);
}

#[test]
fn span_containment() {
    let outer = Span::new(5, 15);
    assert!(outer.contains(10).unwrap());
    assert!(!Span::new(1, 15).contains(20).unwrap());
    assert!(outer.contains(5).unwrap());
    assert!(!outer.contains(15).unwrap());
    assert!(outer.contains(10.0).unwrap());
    assert!(outer.contains("10").unwrap());
    assert!(matches!(outer.contains("hello"), Err(SchemaError::InvalidProbe(_))));

    assert!(outer.contains(Span::new(10, 11)).unwrap());
    assert!(outer.contains(Span::new(5, 10)).unwrap());
    assert!(outer.contains(Span::new(5, 14)).unwrap());
    assert!(!outer.contains(Span::new(10, 15)).unwrap());
    assert!(!outer.contains(Span::new(5, 15)).unwrap());
    assert!(!outer.contains(Span::new(0, 1)).unwrap());
    assert!(!outer.contains(Span::new(0, 10)).unwrap());
    assert!(!outer.contains(Span::new(10, 20)).unwrap());
}

#[test]
fn scores_round_trip_without_precision_loss() {
    // shortest decimal forms that a best-effort float parser reads back 1 ULP off
    for score in [0.36751094992643507, 0.9428909332142963, 1.0000000000000002, 5e-324] {
        let doc = Document::builder("scored").score(score).build().unwrap();
        let restored = Document::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(restored.score().map(f64::to_bits), Some(score.to_bits()));
        assert_eq!(restored, doc);

        let answer = Answer::new("x").with_score(score);
        let restored = Answer::from_json(&answer.to_json().unwrap()).unwrap();
        assert_eq!(restored.score.map(f64::to_bits), Some(score.to_bits()));
    }
}
