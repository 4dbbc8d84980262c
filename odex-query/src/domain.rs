//! Search domains.
//!
//! A domain is the service's filter expression: a prefix-notation list of
//! `(field, operator, value)` triples and the logical operators `&`, `|` and
//! `!`. The client never interprets it; it is forwarded as-is.
//!
//! ```rust
//! use odex_query::Domain;
//!
//! let domain = Domain::all()
//!     .or()
//!     .filter("state", "=", "sale")
//!     .filter("state", "=", "done");
//! assert_eq!(
//!     serde_json::to_string(&domain).unwrap(),
//!     r#"["|",["state","=","sale"],["state","=","done"]]"#
//! );
//! ```

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// An opaque filter expression selecting records server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(Vec<Value>);

impl Domain {
    /// The empty domain, matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Append a `(field, operator, value)` leaf.
    pub fn filter(
        mut self,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.0.push(Value::List(vec![
            Value::String(field.into()),
            Value::String(operator.into()),
            value.into(),
        ]));
        self
    }

    /// Append the `&` prefix operator.
    pub fn and(mut self) -> Self {
        self.0.push(Value::from("&"));
        self
    }

    /// Append the `|` prefix operator.
    pub fn or(mut self) -> Self {
        self.0.push(Value::from("|"));
        self
    }

    /// Append the `!` prefix operator.
    pub fn not(mut self) -> Self {
        self.0.push(Value::from("!"));
        self
    }

    /// Number of terms, operators included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if this domain matches everything.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Domain> for Value {
    fn from(domain: Domain) -> Self {
        Value::List(domain.0)
    }
}

impl From<Vec<Value>> for Domain {
    fn from(terms: Vec<Value>) -> Self {
        Self(terms)
    }
}

impl From<Value> for Domain {
    fn from(value: Value) -> Self {
        match value {
            Value::List(terms) => Self(terms),
            Value::Null => Self::all(),
            other => Self(vec![other]),
        }
    }
}

impl From<serde_json::Value> for Domain {
    fn from(value: serde_json::Value) -> Self {
        Value::from(value).into()
    }
}
