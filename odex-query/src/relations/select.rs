//! Field specifications and their parsing.
//!
//! A caller describes what to read as an ordered list of [`FieldSpec`]s, freely
//! mixing plain field names and relation descriptors. [`FieldSelection::parse`]
//! validates the whole tree up front and splits each level into the names sent
//! to the service and the relations that need a follow-up fetch, remembering the
//! declared order for assembly.

use indexmap::IndexSet;

use super::spec::RelationSpec;
use crate::error::{QueryError, QueryResult};

/// One entry of a requested field list.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec {
    /// A plain field, returned verbatim.
    Scalar(String),
    /// A relation field, expanded into nested records.
    Relation(RelationSpec),
}

impl FieldSpec {
    /// Name of the field on the requesting collection.
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(name) => name,
            Self::Relation(rel) => &rel.local_field,
        }
    }
}

impl From<&str> for FieldSpec {
    fn from(name: &str) -> Self {
        Self::Scalar(name.to_string())
    }
}

impl From<String> for FieldSpec {
    fn from(name: String) -> Self {
        Self::Scalar(name)
    }
}

impl From<&String> for FieldSpec {
    fn from(name: &String) -> Self {
        Self::Scalar(name.clone())
    }
}

impl From<RelationSpec> for FieldSpec {
    fn from(rel: RelationSpec) -> Self {
        Self::Relation(rel)
    }
}

/// Position of a declared field in the output record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSlot {
    /// A scalar field, by name.
    Scalar(String),
    /// A relation, by index into [`FieldSelection::relations`].
    Relation(usize),
}

/// A relation descriptor together with its parsed sub-selection.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationPlan {
    /// The descriptor as declared.
    pub spec: RelationSpec,
    /// The parsed sub-field list.
    pub selection: FieldSelection,
}

/// A validated, partitioned field list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSelection {
    scalar_names: IndexSet<String>,
    relations: Vec<RelationPlan>,
    slots: Vec<FieldSlot>,
}

impl FieldSelection {
    /// Parse and validate a field list, recursing into relation sub-fields.
    ///
    /// No remote interaction happens here; a malformed descriptor at any depth
    /// fails the whole request before it reaches the service.
    ///
    /// ```rust
    /// use odex_query::relations::{many_to_one, FieldSelection, FieldSpec};
    ///
    /// let fields: Vec<FieldSpec> = vec![
    ///     "name".into(),
    ///     many_to_one("partner_id", "res.partner", ["name"]).into(),
    ///     "amount_total".into(),
    /// ];
    /// let selection = FieldSelection::parse(&fields).unwrap();
    /// assert_eq!(selection.remote_fields(), vec!["name", "partner_id", "amount_total"]);
    /// assert_eq!(selection.relations().len(), 1);
    /// ```
    pub fn parse(fields: &[FieldSpec]) -> QueryResult<Self> {
        let mut selection = Self::default();

        for field in fields {
            match field {
                FieldSpec::Scalar(name) => {
                    if name.trim().is_empty() {
                        return Err(QueryError::invalid_field_spec(name, "field name is empty"));
                    }
                    if selection.relation_index(name).is_some() {
                        return Err(QueryError::invalid_field_spec(
                            name,
                            "declared both as a plain field and as a relation",
                        ));
                    }
                    if selection.scalar_names.insert(name.clone()) {
                        selection.slots.push(FieldSlot::Scalar(name.clone()));
                    }
                }
                FieldSpec::Relation(rel) => {
                    Self::validate_relation(rel)?;
                    if selection.scalar_names.contains(&rel.local_field) {
                        return Err(QueryError::invalid_field_spec(
                            &rel.local_field,
                            "declared both as a plain field and as a relation",
                        ));
                    }
                    if selection.relation_index(&rel.local_field).is_some() {
                        return Err(QueryError::invalid_field_spec(
                            &rel.local_field,
                            "relation declared more than once",
                        ));
                    }
                    let sub_selection = Self::parse(&rel.sub_fields).map_err(|e| {
                        e.with_operation(format!("parsing sub-fields of `{}`", rel.local_field))
                    })?;
                    selection.slots.push(FieldSlot::Relation(selection.relations.len()));
                    selection.relations.push(RelationPlan {
                        spec: rel.clone(),
                        selection: sub_selection,
                    });
                }
            }
        }

        Ok(selection)
    }

    fn validate_relation(rel: &RelationSpec) -> QueryResult<()> {
        if rel.local_field.trim().is_empty() {
            return Err(QueryError::invalid_field_spec(
                &rel.target_collection,
                "relation has no local field",
            ));
        }
        if rel.target_collection.trim().is_empty() {
            return Err(QueryError::invalid_field_spec(
                &rel.local_field,
                "relation has no target collection",
            ));
        }
        if rel.sub_fields.is_empty() {
            return Err(QueryError::invalid_field_spec(
                &rel.local_field,
                "relation sub-field list is empty",
            ));
        }
        Ok(())
    }

    fn relation_index(&self, name: &str) -> Option<usize> {
        self.relations
            .iter()
            .position(|plan| plan.spec.local_field == name)
    }

    /// Plain field names, in declaration order.
    pub fn scalar_names(&self) -> impl Iterator<Item = &str> {
        self.scalar_names.iter().map(String::as_str)
    }

    /// Relations needing a follow-up fetch, in declaration order.
    pub fn relations(&self) -> &[RelationPlan] {
        &self.relations
    }

    /// Declared output order.
    pub fn slots(&self) -> &[FieldSlot] {
        &self.slots
    }

    /// Check if nothing was declared; the service then returns every field.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Field names to request from the service: scalar names plus each
    /// relation's local field, in declaration order.
    pub fn remote_fields(&self) -> Vec<String> {
        self.slots
            .iter()
            .map(|slot| match slot {
                FieldSlot::Scalar(name) => name.clone(),
                FieldSlot::Relation(i) => self.relations[*i].spec.local_field.clone(),
            })
            .collect()
    }

    /// Total relation descriptors in the tree, all levels included.
    pub fn relation_count(&self) -> usize {
        self.relations
            .iter()
            .map(|plan| 1 + plan.selection.relation_count())
            .sum()
    }
}
