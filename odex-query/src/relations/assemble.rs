//! Merging base records with resolved relations.

use tracing::warn;

use super::loader::ResolvedRelation;
use super::select::{FieldSelection, FieldSlot};
use super::spec::RelationKind;
use crate::error::{QueryError, QueryResult};
use crate::record::{FieldValue, RawRecord, Record, RecordId, raw_record_id};
use crate::value::Value;

/// Build resolved records from base records and the relation maps produced
/// by the loader.
///
/// Output order follows `base`; field order follows the declared selection.
/// A referenced id missing from its relation map (the related record was
/// deleted between reads, or is hidden by access rules) does not fail the
/// request: a many-to-one becomes null and a to-many entry is dropped.
pub fn assemble(
    base: Vec<RawRecord>,
    selection: &FieldSelection,
    resolved: &[ResolvedRelation],
) -> QueryResult<Vec<Record>> {
    if resolved.len() != selection.relations().len() {
        return Err(QueryError::internal(format!(
            "{} relations declared but {} resolved",
            selection.relations().len(),
            resolved.len()
        )));
    }
    base.into_iter()
        .map(|raw| assemble_record(raw, selection, resolved))
        .collect()
}

fn assemble_record(
    mut raw: RawRecord,
    selection: &FieldSelection,
    resolved: &[ResolvedRelation],
) -> QueryResult<Record> {
    let id = raw_record_id(&raw)?;
    let mut record = Record::new(id);

    if selection.is_empty() {
        raw.shift_remove("id");
        record.fields = raw
            .into_iter()
            .map(|(name, value)| (name, FieldValue::Scalar(value)))
            .collect();
        return Ok(record);
    }

    for slot in selection.slots() {
        match slot {
            FieldSlot::Scalar(name) => {
                let value = raw.swap_remove(name).unwrap_or_default();
                record.fields.insert(name.clone(), FieldValue::Scalar(value));
            }
            FieldSlot::Relation(index) => {
                let spec = &selection.relations()[*index].spec;
                let related = &resolved[*index];
                let value = raw.swap_remove(&spec.local_field).unwrap_or_default();
                let field = match spec.kind {
                    RelationKind::ManyToOne => {
                        nest_one(id, &value, related).map_err(|e| e.with_field(&spec.local_field))?
                    }
                    RelationKind::ToMany => {
                        nest_many(id, &value, related).map_err(|e| e.with_field(&spec.local_field))?
                    }
                };
                record.fields.insert(spec.local_field.clone(), field);
            }
        }
    }

    Ok(record)
}

fn nest_one(owner: RecordId, value: &Value, related: &ResolvedRelation) -> QueryResult<FieldValue> {
    let Some(ref_id) = value.many_to_one_id()? else {
        return Ok(FieldValue::Scalar(Value::Null));
    };
    match related.get(ref_id) {
        Some(record) => Ok(FieldValue::Nested(Box::new(record.clone()))),
        None => {
            warn!(
                record = %owner,
                field = %related.local_field,
                missing = %ref_id,
                "Dangling reference resolved to null"
            );
            Ok(FieldValue::Scalar(Value::Null))
        }
    }
}

fn nest_many(owner: RecordId, value: &Value, related: &ResolvedRelation) -> QueryResult<FieldValue> {
    let records = value
        .to_many_ids()?
        .into_iter()
        .filter_map(|ref_id| {
            let found = related.get(ref_id).cloned();
            if found.is_none() {
                warn!(
                    record = %owner,
                    field = %related.local_field,
                    missing = %ref_id,
                    "Dangling reference dropped from list"
                );
            }
            found
        })
        .collect();
    Ok(FieldValue::NestedList(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relations::select::FieldSpec;
    use crate::relations::spec::{many_to_one, to_many};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn raw(pairs: &[(&str, Value)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn relation(field: &str, records: Vec<Record>) -> ResolvedRelation {
        ResolvedRelation {
            local_field: field.to_string(),
            records: records.into_iter().map(|r| (r.id, r)).collect::<HashMap<_, _>>(),
        }
    }

    fn partner(id: u64, name: &str) -> Record {
        Record::new(RecordId(id)).with("name", Value::from(name))
    }

    #[test]
    fn test_declared_field_order() {
        let fields: Vec<FieldSpec> = vec![
            many_to_one("partner_id", "res.partner", ["name"]).into(),
            "name".into(),
        ];
        let selection = FieldSelection::parse(&fields).unwrap();
        let base = vec![raw(&[
            ("id", Value::Int(5)),
            ("name", Value::from("S00005")),
            ("partner_id", Value::from(vec![Value::Int(10), Value::from("Deco Addict")])),
        ])];

        let records = assemble(base, &selection, &[relation("partner_id", vec![partner(10, "Deco Addict")])]).unwrap();

        assert_eq!(records[0].field_names().collect::<Vec<_>>(), vec!["partner_id", "name"]);
        assert_eq!(records[0].nested("partner_id"), Some(&partner(10, "Deco Addict")));
    }

    #[test]
    fn test_to_many_keeps_id_order_and_drops_dangling() {
        let fields: Vec<FieldSpec> = vec![to_many("tag_ids", "product.tag", ["name"]).into()];
        let selection = FieldSelection::parse(&fields).unwrap();
        let base = vec![raw(&[("id", Value::Int(1)), ("tag_ids", Value::from(vec![14, 99, 12]))])];
        let tags = relation("tag_ids", vec![partner(12, "a"), partner(14, "c")]);

        let records = assemble(base, &selection, &[tags]).unwrap();
        let ids: Vec<_> = records[0]
            .nested_list("tag_ids")
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![RecordId(14), RecordId(12)]);
    }

    #[test]
    fn test_null_and_dangling_many_to_one() {
        let fields: Vec<FieldSpec> = vec![many_to_one("partner_id", "res.partner", ["name"]).into()];
        let selection = FieldSelection::parse(&fields).unwrap();
        let base = vec![
            raw(&[("id", Value::Int(1)), ("partner_id", Value::Bool(false))]),
            raw(&[("id", Value::Int(2)), ("partner_id", Value::Int(99))]),
        ];

        let records = assemble(base, &selection, &[relation("partner_id", vec![])]).unwrap();
        assert!(records[0].get("partner_id").unwrap().is_null());
        assert!(records[1].get("partner_id").unwrap().is_null());
    }

    #[test]
    fn test_empty_selection_copies_all_fields() {
        let selection = FieldSelection::parse(&[]).unwrap();
        let base = vec![raw(&[
            ("id", Value::Int(3)),
            ("name", Value::from("x")),
            ("active", Value::Bool(true)),
        ])];

        let records = assemble(base, &selection, &[]).unwrap();
        assert_eq!(records[0].id, RecordId(3));
        assert_eq!(records[0].field_names().collect::<Vec<_>>(), vec!["name", "active"]);
    }

    #[test]
    fn test_missing_id_is_an_error() {
        let selection = FieldSelection::parse(&["name".into()]).unwrap();
        let base = vec![raw(&[("name", Value::from("x"))])];
        assert!(assemble(base, &selection, &[]).is_err());
    }
}
