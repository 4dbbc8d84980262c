//! Batched relation loading.
//!
//! The loader turns one browse-style request into the fewest remote reads: a
//! single base read, then exactly one read per relation descriptor covering
//! the union of ids referenced by every base record. Nested descriptors recurse
//! through the same path, one read per descriptor per level, so the number of
//! calls never depends on how many records matched.

use std::collections::HashMap;

use futures::future::try_join_all;
use indexmap::IndexSet;
use tracing::debug;

use super::assemble::assemble;
use super::select::{FieldSelection, RelationPlan};
use super::spec::{RelationKind, RelationSpec};
use crate::error::{QueryError, QueryResult};
use crate::record::{RawRecord, Record, RecordId};
use crate::traits::{BoxFuture, RecordFetcher};
use crate::value::Value;

/// How independent relation reads of one level are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelationLoadStrategy {
    /// One read after another, in declaration order.
    #[default]
    Sequential,
    /// All reads of a level in flight at once. Results are identical.
    Concurrent,
}

impl RelationLoadStrategy {
    /// Check if this is the sequential strategy.
    pub fn is_sequential(&self) -> bool {
        matches!(self, Self::Sequential)
    }

    /// Check if this is the concurrent strategy.
    pub fn is_concurrent(&self) -> bool {
        matches!(self, Self::Concurrent)
    }
}

/// Related records of one relation descriptor, indexed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedRelation {
    /// The relation's local field.
    pub local_field: String,
    /// Fully resolved related records.
    pub records: HashMap<RecordId, Record>,
}

impl ResolvedRelation {
    fn empty(local_field: &str) -> Self {
        Self {
            local_field: local_field.to_string(),
            records: HashMap::new(),
        }
    }

    /// Look up a related record.
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.get(&id)
    }
}

/// Base records plus the resolved relations they reference.
#[derive(Debug, Clone, Default)]
pub struct Fetched {
    /// Base records, relation fields still raw.
    pub base: Vec<RawRecord>,
    /// One entry per relation of the selection, same order.
    pub resolved: Vec<ResolvedRelation>,
}

/// Plans and runs the reads of a browse-style request.
pub struct RelationLoader<'f, F: RecordFetcher + ?Sized> {
    fetcher: &'f F,
    strategy: RelationLoadStrategy,
}

impl<'f, F: RecordFetcher + ?Sized> RelationLoader<'f, F> {
    /// Create a loader reading through `fetcher`.
    pub fn new(fetcher: &'f F) -> Self {
        Self {
            fetcher,
            strategy: RelationLoadStrategy::default(),
        }
    }

    /// Set the scheduling strategy.
    pub fn with_strategy(mut self, strategy: RelationLoadStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Get the scheduling strategy.
    pub fn strategy(&self) -> RelationLoadStrategy {
        self.strategy
    }

    /// Read `ids` from `collection` and resolve every relation of `selection`.
    pub async fn browse(
        &self,
        collection: &str,
        ids: &[RecordId],
        selection: &FieldSelection,
    ) -> QueryResult<Vec<Record>> {
        let fetched = self.plan_and_fetch(collection, ids, selection).await?;
        assemble(fetched.base, selection, &fetched.resolved)
    }

    /// Run the base read, then one batched read per relation.
    ///
    /// An empty id list short-circuits without touching the service.
    pub async fn plan_and_fetch(
        &self,
        collection: &str,
        ids: &[RecordId],
        selection: &FieldSelection,
    ) -> QueryResult<Fetched> {
        if ids.is_empty() {
            return Ok(Fetched {
                base: Vec::new(),
                resolved: selection
                    .relations()
                    .iter()
                    .map(|plan| ResolvedRelation::empty(&plan.spec.local_field))
                    .collect(),
            });
        }

        let fields = selection.remote_fields();
        debug!(
            collection = %collection,
            ids = ids.len(),
            fields = fields.len(),
            "Base fetch"
        );

        let base = self
            .fetcher
            .fetch(collection, ids, &fields)
            .await
            .map_err(|e| base_fetch_error(e, collection, ids))?;

        let resolved = self.resolve(&base, selection).await?;
        Ok(Fetched { base, resolved })
    }

    /// Resolve the relations of `selection` for already-fetched base records.
    pub async fn resolve(
        &self,
        base: &[RawRecord],
        selection: &FieldSelection,
    ) -> QueryResult<Vec<ResolvedRelation>> {
        let plans = selection.relations();
        match self.strategy {
            RelationLoadStrategy::Sequential => {
                let mut resolved = Vec::with_capacity(plans.len());
                for plan in plans {
                    resolved.push(self.load_relation(base, plan).await?);
                }
                Ok(resolved)
            }
            RelationLoadStrategy::Concurrent => {
                try_join_all(plans.iter().map(|plan| self.load_relation(base, plan))).await
            }
        }
    }

    fn load_relation<'a>(
        &'a self,
        base: &'a [RawRecord],
        plan: &'a RelationPlan,
    ) -> BoxFuture<'a, QueryResult<ResolvedRelation>> {
        Box::pin(async move {
            let spec = &plan.spec;
            let ids = collect_ids(base, spec)?;

            if ids.is_empty() {
                debug!(field = %spec.local_field, "No references, skipping relation fetch");
                return Ok(ResolvedRelation::empty(&spec.local_field));
            }

            debug!(
                field = %spec.local_field,
                target = %spec.target_collection,
                ids = ids.len(),
                "Relation fetch"
            );

            let records = self
                .browse(&spec.target_collection, &ids, &plan.selection)
                .await
                .map_err(|e| {
                    QueryError::relation_fetch(&spec.local_field, &spec.target_collection, e)
                })?;

            Ok(ResolvedRelation {
                local_field: spec.local_field.clone(),
                records: records.into_iter().map(|r| (r.id, r)).collect(),
            })
        })
    }
}

impl<F: RecordFetcher + ?Sized> Clone for RelationLoader<'_, F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher,
            strategy: self.strategy,
        }
    }
}

/// Union of the ids a relation field references across `base`, deduplicated
/// in first-seen order.
pub fn collect_ids(base: &[RawRecord], spec: &RelationSpec) -> QueryResult<Vec<RecordId>> {
    let mut ids = IndexSet::new();
    for raw in base {
        let value = raw.get(&spec.local_field).unwrap_or(&Value::Null);
        let context = |e: QueryError| e.with_field(&spec.local_field);
        match spec.kind {
            RelationKind::ManyToOne => {
                if let Some(id) = value.many_to_one_id().map_err(context)? {
                    ids.insert(id);
                }
            }
            RelationKind::ToMany => {
                ids.extend(value.to_many_ids().map_err(context)?);
            }
        }
    }
    Ok(ids.into_iter().collect())
}

fn base_fetch_error(mut err: QueryError, collection: &str, ids: &[RecordId]) -> QueryError {
    if err.context.collection.is_none() {
        err.context.collection = Some(collection.to_string());
    }
    if err.context.ids.is_empty() {
        err.context.ids = ids.to_vec();
    }
    err
}
