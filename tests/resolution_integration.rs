//! Integration tests for relational field resolution.
//!
//! These tests drive the collection accessor against a recording transport and
//! check:
//! - The number of remote calls per request
//! - Ordering of records, fields and to-many entries
//! - Null and dangling reference handling
//! - Error propagation

mod common;

use common::{MockTransport, sales};
use odex::prelude::*;
use odex::query::{ErrorCode, FieldSelection, RelationLoader};
use pretty_assertions::assert_eq;
use serde_json::json;

fn ids(raw: &[u64]) -> Vec<RecordId> {
    raw.iter().copied().map(RecordId).collect()
}

fn order_fields() -> Vec<FieldSpec> {
    vec![
        "name".into(),
        many_to_one("partner_id", "res.partner", ["name"]).into(),
        to_many("order_line", "sale.order.line", ["name"]).into(),
    ]
}

#[tokio::test]
async fn test_round_trip_scenario() {
    let mock = MockTransport::new()
        .record("sale.order", json!({"id": 5, "name": "S00005", "partner_id": 10}))
        .record("res.partner", json!({"id": 10, "name": "Deco Addict"}));

    let records = mock
        .collection("sale.order")
        .browse(
            &[RecordId(5)],
            &["name".into(), many_to_one("partner_id", "res.partner", ["name"]).into()],
        )
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&records).unwrap(),
        json!([{"id": 5, "name": "S00005", "partner_id": {"id": 10, "name": "Deco Addict"}}])
    );
    assert_eq!(mock.call_count(), 2);
}

#[tokio::test]
async fn test_call_count_independent_of_record_count() {
    for n in 1..=5u64 {
        let mock = sales();
        let base: Vec<RecordId> = (5..5 + n).map(RecordId).collect();

        let records = mock
            .collection("sale.order")
            .browse(&base, &order_fields())
            .await
            .unwrap();

        assert_eq!(records.len(), n as usize);
        assert_eq!(mock.call_count(), 3, "n = {n}");
        assert_eq!(mock.calls_to("res.partner").len(), 1);
        assert_eq!(mock.calls_to("sale.order.line").len(), 1);
    }
}

#[tokio::test]
async fn test_empty_relation_short_circuit() {
    let mock = sales();

    // Order 7 has no lines; order 8 has no partner.
    let records = mock
        .collection("sale.order")
        .browse(&[RecordId(7)], &order_fields())
        .await
        .unwrap();
    assert!(mock.calls_to("sale.order.line").is_empty());
    assert_eq!(records[0].nested_list("order_line"), Some(&[][..]));

    let mock = sales();
    let records = mock
        .collection("sale.order")
        .browse(&[RecordId(8)], &order_fields())
        .await
        .unwrap();
    assert!(mock.calls_to("res.partner").is_empty());
    assert!(records[0].get("partner_id").unwrap().is_null());
}

#[tokio::test]
async fn test_empty_base_ids_make_no_call() {
    let mock = sales();
    let records = mock
        .collection("sale.order")
        .browse(&[], &order_fields())
        .await
        .unwrap();
    assert!(records.is_empty());
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_to_many_batching_scenario() {
    let mock = MockTransport::new()
        .record("product.template", json!({"id": 1, "tag_ids": [12, 13]}))
        .record("product.template", json!({"id": 2, "tag_ids": [13, 14]}))
        .record("product.tag", json!({"id": 12, "name": "a"}))
        .record("product.tag", json!({"id": 13, "name": "b"}))
        .record("product.tag", json!({"id": 14, "name": "c"}));

    let records = mock
        .collection("product.template")
        .browse(&ids(&[1, 2]), &[to_many("tag_ids", "product.tag", ["name"]).into()])
        .await
        .unwrap();

    let tag_calls = mock.calls_to("product.tag");
    assert_eq!(tag_calls.len(), 1);
    assert_eq!(tag_calls[0].args.args[0], Value::from(ids(&[12, 13, 14])));

    let nested_ids = |i: usize| -> Vec<RecordId> {
        records[i]
            .nested_list("tag_ids")
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect()
    };
    assert_eq!(nested_ids(0), ids(&[12, 13]));
    assert_eq!(nested_ids(1), ids(&[13, 14]));
}

#[tokio::test]
async fn test_order_preservation() {
    let mock = MockTransport::new()
        .record("project.task", json!({"id": 3, "name": "c", "tag_ids": [3, 1, 2]}))
        .record("project.task", json!({"id": 1, "name": "a", "tag_ids": []}))
        .record("project.tags", json!({"id": 1, "name": "one"}))
        .record("project.tags", json!({"id": 2, "name": "two"}))
        .record("project.tags", json!({"id": 3, "name": "three"}));

    let records = mock
        .collection("project.task")
        .browse(
            &ids(&[3, 1]),
            &[to_many("tag_ids", "project.tags", ["name"]).into(), "name".into()],
        )
        .await
        .unwrap();

    assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), ids(&[3, 1]));
    assert_eq!(records[0].field_names().collect::<Vec<_>>(), vec!["tag_ids", "name"]);
    let names: Vec<_> = records[0]
        .nested_list("tag_ids")
        .unwrap()
        .iter()
        .map(|r| r.scalar("name").and_then(Value::as_str).unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["three", "one", "two"]);
}

#[tokio::test]
async fn test_dangling_reference_scenario() {
    let mock = MockTransport::new()
        .record("sale.order", json!({"id": 1, "name": "S1", "partner_id": 99}));

    let records = mock
        .collection("sale.order")
        .browse(
            &[RecordId(1)],
            &["name".into(), many_to_one("partner_id", "res.partner", ["name"]).into()],
        )
        .await
        .unwrap();

    assert_eq!(mock.calls_to("res.partner").len(), 1);
    assert!(records[0].get("partner_id").unwrap().is_null());
    assert_eq!(records[0].scalar("name"), Some(&Value::from("S1")));
}

#[tokio::test]
async fn test_malformed_spec_makes_no_call() {
    let mock = sales();
    let no_fields: Vec<&str> = Vec::new();

    let err = mock
        .collection("sale.order")
        .browse(
            &[RecordId(5)],
            &["name".into(), many_to_one("partner_id", "res.partner", no_fields).into()],
        )
        .await
        .unwrap_err();

    assert!(err.is_specification_error());
    assert_eq!(mock.call_count(), 0);

    let err = mock
        .collection("sale.order")
        .search_browse(
            Domain::all(),
            &[to_many("order_line", "", ["name"]).into()],
            SearchOptions::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidFieldSpec);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_base_fetch_failure() {
    let mock = sales().fail_reads("sale.order", "no access");

    let err = mock
        .collection("sale.order")
        .browse(&ids(&[5, 6]), &order_fields())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::RemoteOperation);
    assert_eq!(err.context.collection.as_deref(), Some("sale.order"));
    assert_eq!(err.context.ids, ids(&[5, 6]));
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_relation_fetch_failure_is_wrapped() {
    let mock = sales().fail_reads("res.partner", "no access");

    let err = mock
        .collection("sale.order")
        .browse(&ids(&[5, 6]), &order_fields())
        .await
        .unwrap_err();

    assert!(err.is_relation_fetch());
    assert_eq!(err.context.field.as_deref(), Some("partner_id"));
    assert_eq!(err.context.target_collection.as_deref(), Some("res.partner"));
    let inner = err.inner().unwrap();
    assert_eq!(inner.code, ErrorCode::RemoteOperation);
    assert!(err.display_full().contains("no access"));
    // Fail fast: the later relation is never fetched.
    assert!(mock.calls_to("sale.order.line").is_empty());
}

#[tokio::test]
async fn test_nested_relations_call_count() {
    let mock = sales();
    let fields: Vec<FieldSpec> = vec![
        "name".into(),
        to_many("order_line", "sale.order.line", ["name"])
            .field(many_to_one("product_id", "product.product", ["default_code"]))
            .into(),
        many_to_one("partner_id", "res.partner", ["name"]).into(),
    ];

    let records = mock
        .collection("sale.order")
        .browse(&ids(&[5, 6, 7, 8, 9]), &fields)
        .await
        .unwrap();

    // sale.order, sale.order.line, product.product, res.partner
    assert_eq!(mock.call_count(), 4);
    assert_eq!(
        FieldSelection::parse(&fields).unwrap().relation_count() + 1,
        mock.call_count()
    );

    let first_line = &records[0].nested_list("order_line").unwrap()[0];
    assert_eq!(
        first_line.nested("product_id").unwrap().scalar("default_code"),
        Some(&Value::from("D1"))
    );
}

#[tokio::test]
async fn test_concurrent_strategy_same_result() {
    let sequential_mock = sales();
    let sequential = sequential_mock
        .collection("sale.order")
        .browse(&ids(&[5, 6, 7, 8, 9]), &order_fields())
        .await
        .unwrap();

    let concurrent_mock = sales();
    let concurrent = concurrent_mock
        .collection("sale.order")
        .with_strategy(RelationLoadStrategy::Concurrent)
        .browse(&ids(&[5, 6, 7, 8, 9]), &order_fields())
        .await
        .unwrap();

    assert_eq!(sequential, concurrent);
    assert_eq!(sequential_mock.call_count(), concurrent_mock.call_count());
}

#[tokio::test]
async fn test_concurrent_strategy_relation_failure() {
    let mock = sales().fail_reads("sale.order.line", "no access");

    let err = mock
        .collection("sale.order")
        .with_strategy(RelationLoadStrategy::Concurrent)
        .browse(&ids(&[5, 6]), &order_fields())
        .await
        .unwrap_err();

    assert!(err.is_relation_fetch());
    assert_eq!(err.context.field.as_deref(), Some("order_line"));
    assert_eq!(err.context.target_collection.as_deref(), Some("sale.order.line"));
    let inner = err.inner().unwrap();
    assert_eq!(inner.code, ErrorCode::RemoteOperation);
    assert_eq!(inner.context.ids, ids(&[100, 101, 102]));
}

#[tokio::test]
async fn test_nested_relation_failure_is_wrapped_per_level() {
    let mock = sales().fail_reads("product.product", "no access");
    let fields: Vec<FieldSpec> = vec![
        "name".into(),
        to_many("order_line", "sale.order.line", ["name"])
            .field(many_to_one("product_id", "product.product", ["default_code"]))
            .into(),
    ];

    let err = mock
        .collection("sale.order")
        .browse(&ids(&[5, 6]), &fields)
        .await
        .unwrap_err();

    assert!(err.is_relation_fetch());
    assert_eq!(err.context.field.as_deref(), Some("order_line"));

    let middle = err.inner().unwrap();
    assert!(middle.is_relation_fetch());
    assert_eq!(middle.context.field.as_deref(), Some("product_id"));
    assert_eq!(middle.context.target_collection.as_deref(), Some("product.product"));

    let root = middle.inner().unwrap();
    assert_eq!(root.code, ErrorCode::RemoteOperation);
    assert_eq!(root.context.collection.as_deref(), Some("product.product"));
    assert!(err.display_full().contains("Caused by: [O2002]"));
    assert!(err.display_full().contains("Caused by: [O2001]"));
}

#[tokio::test]
async fn test_search_browse_resolves_relations() {
    let mock = sales();
    let records = mock
        .collection("sale.order")
        .search_browse(
            Domain::all().filter("state", "=", "sale"),
            &order_fields(),
            SearchOptions::new().limit(10),
        )
        .await
        .unwrap();

    assert_eq!(records.len(), 5);
    assert_eq!(mock.call_count(), 3);

    let search = &mock.calls_to("sale.order")[0];
    assert_eq!(search.method, "search_read");
    assert_eq!(search.args.kwargs["limit"], Value::Int(10));
    assert_eq!(
        search.args.kwargs["fields"],
        Value::from(vec!["name", "partner_id", "order_line"])
    );
    assert_eq!(
        records[0].nested("partner_id").unwrap().scalar("name"),
        Some(&Value::from("Deco Addict"))
    );
}

#[tokio::test]
async fn test_loader_directly() {
    let mock = sales();
    let selection = FieldSelection::parse(&order_fields()).unwrap();

    let fetched = RelationLoader::new(&mock)
        .plan_and_fetch("sale.order", &ids(&[5, 7]), &selection)
        .await
        .unwrap();

    assert_eq!(fetched.base.len(), 2);
    assert_eq!(fetched.resolved.len(), 2);
    assert_eq!(fetched.resolved[0].records.len(), 1);
    assert_eq!(fetched.resolved[1].records.len(), 2);
}
