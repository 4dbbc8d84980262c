//! Relation descriptor types.

use super::select::FieldSpec;

/// Kind of relation a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// The field references a single record (e.g., an order's customer).
    ManyToOne,
    /// The field references an ordered list of records (one-to-many and
    /// many-to-many alike, e.g., an order's lines or a product's tags).
    ToMany,
}

/// Descriptor asking for a relation field to be expanded into nested records.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationSpec {
    /// Name of the relation field on the requesting collection.
    pub local_field: String,
    /// Collection the field points into.
    pub target_collection: String,
    /// Fields to read on the related records; may contain further relations.
    pub sub_fields: Vec<FieldSpec>,
    /// Kind of relation.
    pub kind: RelationKind,
}

impl RelationSpec {
    /// Create a relation descriptor.
    pub fn new(
        kind: RelationKind,
        local_field: impl Into<String>,
        target_collection: impl Into<String>,
        sub_fields: impl IntoIterator<Item = impl Into<FieldSpec>>,
    ) -> Self {
        Self {
            local_field: local_field.into(),
            target_collection: target_collection.into(),
            sub_fields: sub_fields.into_iter().map(Into::into).collect(),
            kind,
        }
    }

    /// Create a many-to-one descriptor.
    pub fn many_to_one(
        local_field: impl Into<String>,
        target_collection: impl Into<String>,
        sub_fields: impl IntoIterator<Item = impl Into<FieldSpec>>,
    ) -> Self {
        Self::new(RelationKind::ManyToOne, local_field, target_collection, sub_fields)
    }

    /// Create a to-many descriptor.
    pub fn to_many(
        local_field: impl Into<String>,
        target_collection: impl Into<String>,
        sub_fields: impl IntoIterator<Item = impl Into<FieldSpec>>,
    ) -> Self {
        Self::new(RelationKind::ToMany, local_field, target_collection, sub_fields)
    }

    /// Add a sub-field.
    pub fn field(mut self, field: impl Into<FieldSpec>) -> Self {
        self.sub_fields.push(field.into());
        self
    }
}

/// Shorthand for [`RelationSpec::many_to_one`].
pub fn many_to_one(
    local_field: impl Into<String>,
    target_collection: impl Into<String>,
    sub_fields: impl IntoIterator<Item = impl Into<FieldSpec>>,
) -> RelationSpec {
    RelationSpec::many_to_one(local_field, target_collection, sub_fields)
}

/// Shorthand for [`RelationSpec::to_many`].
pub fn to_many(
    local_field: impl Into<String>,
    target_collection: impl Into<String>,
    sub_fields: impl IntoIterator<Item = impl Into<FieldSpec>>,
) -> RelationSpec {
    RelationSpec::to_many(local_field, target_collection, sub_fields)
}
