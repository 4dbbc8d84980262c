//! Wire-level values exchanged with the service.
//!
//! [`Value`] is what the transport sends and receives: JSON-shaped scalars,
//! lists and ordered maps. Relation fields arrive as values too (a bare id, an
//! `[id, display_name]` pair, or a list of ids) and only become nested
//! [`Record`](crate::Record)s after resolution.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::record::RecordId;

/// A value as sent to or received from the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// Null value.
    #[default]
    Null,
    /// Boolean value. The service also uses `false` for "no value".
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// List of values.
    List(Vec<Value>),
    /// Ordered map of values.
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this value means "no related record" on the wire.
    pub fn is_empty_reference(&self) -> bool {
        matches!(self, Self::Null | Self::Bool(false))
    }

    /// Get the value as a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float. Integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get the value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get the value as a map.
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Get the value as a record identifier.
    pub fn as_record_id(&self) -> Option<RecordId> {
        match self {
            Self::Int(i) if *i >= 0 => Some(RecordId(*i as u64)),
            _ => None,
        }
    }

    /// Read a many-to-one reference.
    ///
    /// Accepts a bare id or the `[id, display_name]` pair; `false` and `null`
    /// mean no reference.
    pub fn many_to_one_id(&self) -> QueryResult<Option<RecordId>> {
        if self.is_empty_reference() {
            return Ok(None);
        }
        if let Some(id) = self.as_record_id() {
            return Ok(Some(id));
        }
        if let Some(first) = self.as_list().and_then(|items| items.first()) {
            if let Some(id) = first.as_record_id() {
                return Ok(Some(id));
            }
        }
        Err(QueryError::deserialization(format!(
            "expected a record reference, got {}",
            self.kind()
        )))
    }

    /// Read a to-many reference list. `false` and `null` are the empty list.
    pub fn to_many_ids(&self) -> QueryResult<Vec<RecordId>> {
        if self.is_empty_reference() {
            return Ok(Vec::new());
        }
        let items = self.as_list().ok_or_else(|| {
            QueryError::deserialization(format!("expected a list of ids, got {}", self.kind()))
        })?;
        items
            .iter()
            .map(|item| {
                item.as_record_id().ok_or_else(|| {
                    QueryError::deserialization(format!(
                        "expected a record id in list, got {}",
                        item.kind()
                    ))
                })
            })
            .collect()
    }

    /// Short name of the value's variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

/// Ids beyond `i64::MAX` have no integer encoding and are sent as decimal
/// strings, which the service rejects instead of reading a wrapped id.
impl From<RecordId> for Value {
    fn from(v: RecordId) -> Self {
        i64::try_from(v.0).map_or_else(|_| Self::String(v.0.to_string()), Self::Int)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<&[RecordId]> for Value {
    fn from(ids: &[RecordId]) -> Self {
        Self::List(ids.iter().copied().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(v: IndexMap<String, Value>) -> Self {
        Self::Map(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::from(i),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Map(map) => {
                serde_json::Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Ordered field values for `create` and `write`.
///
/// ```rust
/// use odex_query::{Value, Values};
///
/// let values = Values::new().set("name", "Deco Addict").set("customer_rank", 1);
/// assert_eq!(values.len(), 2);
/// assert_eq!(values.get("name"), Some(&Value::from("Deco Addict")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(IndexMap<String, Value>);

impl Values {
    /// Create an empty value set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field value.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Get a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Number of fields set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if no fields are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Values> for Value {
    fn from(values: Values) -> Self {
        Self::Map(values.0)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Values {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Positional and keyword arguments for a remote call.
///
/// ```rust
/// use odex_query::{CallArgs, Value};
///
/// let args = CallArgs::new().arg("draft").kwarg("context", Value::Null);
/// assert_eq!(args.args.len(), 1);
/// assert!(args.kwargs.contains_key("context"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    /// Positional arguments.
    pub args: Vec<Value>,
    /// Keyword arguments, in insertion order.
    pub kwargs: IndexMap<String, Value>,
}

impl CallArgs {
    /// Create empty call arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    /// Prepend a positional argument.
    pub fn prepend(mut self, value: impl Into<Value>) -> Self {
        self.args.insert(0, value.into());
        self
    }
}
