//! Record identifiers, raw records and resolved records.

use std::fmt;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{QueryError, QueryResult};
use crate::value::Value;

/// Identifier of a record within one collection.
///
/// Identifiers from different collections are not comparable in any meaningful
/// way; the type only guarantees they are non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Get the raw identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<u32> for RecordId {
    fn from(id: u32) -> Self {
        Self(id as u64)
    }
}

/// A record as returned by the service, before relation resolution.
///
/// Relation fields still hold bare identifiers, `[id, name]` pairs or id lists.
pub type RawRecord = IndexMap<String, Value>;

/// Read the `id` field every raw record carries.
pub fn raw_record_id(raw: &RawRecord) -> QueryResult<RecordId> {
    raw.get("id")
        .and_then(Value::as_record_id)
        .ok_or_else(|| QueryError::deserialization("record without an integer `id` field"))
}

/// A field of a resolved record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain data copied from the service. A relation that resolved to nothing
    /// is `Scalar(Value::Null)`.
    Scalar(Value),
    /// A resolved many-to-one relation.
    Nested(Box<Record>),
    /// A resolved to-many relation, in the order the service listed the ids.
    NestedList(Vec<Record>),
}

impl FieldValue {
    /// Check if this field is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Scalar(Value::Null))
    }

    /// Get the scalar value, if this is not a relation.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// Get the nested record of a resolved many-to-one.
    pub fn as_nested(&self) -> Option<&Record> {
        match self {
            Self::Nested(r) => Some(r),
            _ => None,
        }
    }

    /// Get the nested records of a resolved to-many.
    pub fn as_nested_list(&self) -> Option<&[Record]> {
        match self {
            Self::NestedList(rs) => Some(rs),
            _ => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        Self::Scalar(v)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(v) => v.serialize(serializer),
            Self::Nested(r) => r.serialize(serializer),
            Self::NestedList(rs) => rs.serialize(serializer),
        }
    }
}

/// A fully resolved record.
///
/// Fields keep the order the caller declared them in; `id` is always present
/// and serializes first.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Identifier within the record's collection.
    pub id: RecordId,
    /// Declared fields, in declaration order.
    pub fields: IndexMap<String, FieldValue>,
}

impl Record {
    /// Create a record with no fields.
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Get a field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Get a scalar field's value.
    pub fn scalar(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(FieldValue::as_scalar)
    }

    /// Get a resolved many-to-one field.
    pub fn nested(&self, name: &str) -> Option<&Record> {
        self.get(name).and_then(FieldValue::as_nested)
    }

    /// Get a resolved to-many field.
    pub fn nested_list(&self, name: &str) -> Option<&[Record]> {
        self.get(name).and_then(FieldValue::as_nested_list)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Convert into a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        // Serializing plain maps, lists and scalars cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Deserialize the record into a typed struct.
    ///
    /// ```rust
    /// use odex_query::{Record, RecordId, Value};
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Partner {
    ///     id: u64,
    ///     name: String,
    /// }
    ///
    /// let record = Record::new(RecordId(10)).with("name", Value::from("Deco Addict"));
    /// let partner: Partner = record.deserialize().unwrap();
    /// assert_eq!(partner.id, 10);
    /// assert_eq!(partner.name, "Deco Addict");
    /// ```
    pub fn deserialize<T: DeserializeOwned>(&self) -> QueryResult<T> {
        serde_json::from_value(self.to_json()).map_err(|e| {
            QueryError::deserialization(format!("record {} does not fit target type: {}", self.id, e))
                .with_source(e)
        })
    }
}

impl From<Record> for FieldValue {
    fn from(r: Record) -> Self {
        Self::Nested(Box::new(r))
    }
}

impl From<Vec<Record>> for FieldValue {
    fn from(rs: Vec<Record>) -> Self {
        Self::NestedList(rs)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let explicit_id = self.fields.contains_key("id");
        let len = self.fields.len() + usize::from(!explicit_id);
        let mut map = serializer.serialize_map(Some(len))?;
        if !explicit_id {
            map.serialize_entry("id", &self.id)?;
        }
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
