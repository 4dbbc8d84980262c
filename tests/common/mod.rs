//! In-memory transport recording every call.

#![allow(dead_code)]

use std::collections::HashMap;

use odex::query::{BoxFuture, CallArgs, FaultKind, RawRecord, RemoteFault, Transport, Value};
use parking_lot::Mutex;

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub collection: String,
    pub method: String,
    pub args: CallArgs,
}

/// Serves `read` and `search_read` from in-memory tables; anything else from
/// canned responses.
#[derive(Default)]
pub struct MockTransport {
    tables: HashMap<String, Vec<RawRecord>>,
    responses: HashMap<(String, String), Result<Value, RemoteFault>>,
    failing: HashMap<String, RemoteFault>,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to a collection.
    pub fn record(mut self, collection: &str, fields: serde_json::Value) -> Self {
        let Value::Map(map) = Value::from(fields) else {
            panic!("record fixture must be an object");
        };
        self.tables.entry(collection.to_string()).or_default().push(map);
        self
    }

    /// Answer `method` on `collection` with a fixed value.
    pub fn respond(mut self, collection: &str, method: &str, value: impl Into<Value>) -> Self {
        self.responses
            .insert((collection.into(), method.into()), Ok(value.into()));
        self
    }

    /// Answer `method` on `collection` with a fault.
    pub fn fault(mut self, collection: &str, method: &str, fault: RemoteFault) -> Self {
        self.responses
            .insert((collection.into(), method.into()), Err(fault));
        self
    }

    /// Fail every read against `collection`.
    pub fn fail_reads(mut self, collection: &str, message: &str) -> Self {
        self.failing.insert(
            collection.into(),
            RemoteFault::new(FaultKind::AccessError, message),
        );
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Calls against one collection.
    pub fn calls_to(&self, collection: &str) -> Vec<Call> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.collection == collection)
            .cloned()
            .collect()
    }

    fn project(record: &RawRecord, fields: &[String]) -> Value {
        if fields.is_empty() {
            return Value::Map(record.clone());
        }
        let mut out = RawRecord::new();
        out.insert("id".into(), record.get("id").cloned().unwrap_or_default());
        for field in fields {
            if let Some(value) = record.get(field) {
                out.insert(field.clone(), value.clone());
            }
        }
        Value::Map(out)
    }

    fn requested_fields(args: &CallArgs) -> Vec<String> {
        args.kwargs
            .get("fields")
            .and_then(Value::as_list)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn serve(&self, collection: &str, method: &str, args: &CallArgs) -> Result<Value, RemoteFault> {
        if let Some(response) = self.responses.get(&(collection.into(), method.into())) {
            return response.clone();
        }

        let table = self.tables.get(collection).cloned().unwrap_or_default();
        match method {
            "read" => {
                if let Some(fault) = self.failing.get(collection) {
                    return Err(fault.clone());
                }
                let ids = args
                    .args
                    .first()
                    .map(|v| v.to_many_ids().unwrap_or_default())
                    .unwrap_or_default();
                let fields = Self::requested_fields(args);
                Ok(Value::List(
                    ids.iter()
                        .filter_map(|id| {
                            table
                                .iter()
                                .find(|r| r.get("id").and_then(Value::as_record_id) == Some(*id))
                        })
                        .map(|r| Self::project(r, &fields))
                        .collect(),
                ))
            }
            "search_read" => {
                let fields = Self::requested_fields(args);
                Ok(Value::List(
                    table.iter().map(|r| Self::project(r, &fields)).collect(),
                ))
            }
            _ => Err(RemoteFault::new(
                FaultKind::Application,
                format!("no mock response for {collection}.{method}"),
            )),
        }
    }
}

impl Transport for MockTransport {
    fn invoke<'a>(
        &'a self,
        collection: &'a str,
        method: &'a str,
        args: CallArgs,
    ) -> BoxFuture<'a, Result<Value, RemoteFault>> {
        Box::pin(async move {
            let result = self.serve(collection, method, &args);
            self.calls.lock().push(Call {
                collection: collection.to_string(),
                method: method.to_string(),
                args,
            });
            result
        })
    }
}

/// A sales dataset: five orders, three partners, order lines and products.
pub fn sales() -> MockTransport {
    use serde_json::json;

    let mut mock = MockTransport::new()
        .record("res.partner", json!({"id": 10, "name": "Deco Addict", "email": "deco@example.com"}))
        .record("res.partner", json!({"id": 11, "name": "Gemini Furniture", "email": "gemini@example.com"}))
        .record("res.partner", json!({"id": 12, "name": "Azure Interior", "email": false}))
        .record("product.product", json!({"id": 1, "name": "Desk", "default_code": "D1"}))
        .record("product.product", json!({"id": 2, "name": "Chair", "default_code": "C1"}));

    let orders = [
        (5, "S00005", json!([10, "Deco Addict"]), json!([100, 101])),
        (6, "S00006", json!([11, "Gemini Furniture"]), json!([102])),
        (7, "S00007", json!([10, "Deco Addict"]), json!([])),
        (8, "S00008", json!(false), json!([103])),
        (9, "S00009", json!([12, "Azure Interior"]), json!([104, 105])),
    ];
    for (id, name, partner, lines) in orders {
        mock = mock.record(
            "sale.order",
            json!({"id": id, "name": name, "partner_id": partner, "order_line": lines, "state": "sale"}),
        );
    }

    for (id, order, product) in [(100, 5, 1), (101, 5, 2), (102, 6, 1), (103, 8, 2), (104, 9, 1), (105, 9, 2)] {
        mock = mock.record(
            "sale.order.line",
            json!({"id": id, "name": format!("line {id}"), "order_id": order, "product_id": [product, "x"]}),
        );
    }
    mock
}
