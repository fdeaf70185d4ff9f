//! Projection store trait and in-memory implementation.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use crate::cache::lock::{rw_read, rw_write};
use crate::domain::entities::ProjectionRow;
use crate::domain::types::EntityKind;

use super::{SortDir, SortKey};

const SOURCE: &str = "projection::store";

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("projection write failed: {0}")]
    Write(String),
    #[error("projection query failed: {0}")]
    Query(String),
}

/// Persistence for the per-entity-kind side tables.
///
/// An upsert fully replaces the row or leaves the prior one intact on
/// failure; there is no such thing as a half-written row.
#[async_trait]
pub trait ProjectionStore: Send + Sync {
    async fn upsert(&self, kind: EntityKind, row: ProjectionRow) -> Result<(), ProjectionError>;

    /// Idempotent; deleting an absent row is a no-op.
    async fn delete(&self, kind: EntityKind, entity_id: i64) -> Result<(), ProjectionError>;

    /// Top `limit` rows by popularity descending, id-ascending tie-break.
    async fn top_by_popularity(
        &self,
        kind: EntityKind,
        limit: usize,
    ) -> Result<Vec<ProjectionRow>, ProjectionError>;

    /// Rows sorted by `sort`/`dir` with the fixed id-ascending tie-break.
    async fn list_sorted(
        &self,
        kind: EntityKind,
        sort: SortKey,
        dir: SortDir,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ProjectionRow>, ProjectionError>;
}

/// Absent values sort after all present ones regardless of direction, so
/// `dir` only applies when both sides are present.
fn cmp_nulls_last<T, F>(a: Option<T>, b: Option<T>, dir: SortDir, cmp: F) -> Ordering
where
    F: Fn(&T, &T) -> Ordering,
{
    match (a, b) {
        (Some(x), Some(y)) => match dir {
            SortDir::Asc => cmp(&x, &y),
            SortDir::Desc => cmp(&x, &y).reverse(),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Ordering used by the in-memory store; must agree with the SQL rewrite
/// (`NULLS LAST` in both directions, id-ascending tie-break) so both
/// backends paginate identically.
pub(crate) fn cmp_rows(a: &ProjectionRow, b: &ProjectionRow, sort: SortKey, dir: SortDir) -> Ordering {
    let primary = match sort {
        SortKey::ReleaseDate => cmp_nulls_last(a.release_date, b.release_date, dir, Ord::cmp),
        SortKey::Rating => cmp_nulls_last(a.rating, b.rating, dir, f64::total_cmp),
        SortKey::Popularity => cmp_nulls_last(a.popularity, b.popularity, dir, f64::total_cmp),
        SortKey::Runtime => cmp_nulls_last(a.runtime_minutes, b.runtime_minutes, dir, Ord::cmp),
    };
    primary.then(a.entity_id.cmp(&b.entity_id))
}

/// In-memory projection store: test double and small-deployment backend.
#[derive(Default)]
pub struct MemoryProjectionStore {
    rows: RwLock<HashMap<EntityKind, BTreeMap<i64, ProjectionRow>>>,
}

impl MemoryProjectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct row lookup, mainly for tests.
    pub fn row(&self, kind: EntityKind, entity_id: i64) -> Option<ProjectionRow> {
        rw_read(&self.rows, SOURCE, "row")
            .get(&kind)
            .and_then(|rows| rows.get(&entity_id))
            .cloned()
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        rw_read(&self.rows, SOURCE, "len")
            .get(&kind)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    fn sorted(&self, kind: EntityKind, sort: SortKey, dir: SortDir) -> Vec<ProjectionRow> {
        let rows = rw_read(&self.rows, SOURCE, "sorted");
        let mut rows: Vec<ProjectionRow> = rows
            .get(&kind)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| cmp_rows(a, b, sort, dir));
        rows
    }
}

#[async_trait]
impl ProjectionStore for MemoryProjectionStore {
    async fn upsert(&self, kind: EntityKind, row: ProjectionRow) -> Result<(), ProjectionError> {
        rw_write(&self.rows, SOURCE, "upsert")
            .entry(kind)
            .or_default()
            .insert(row.entity_id, row);
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, entity_id: i64) -> Result<(), ProjectionError> {
        if let Some(rows) = rw_write(&self.rows, SOURCE, "delete").get_mut(&kind) {
            rows.remove(&entity_id);
        }
        Ok(())
    }

    async fn top_by_popularity(
        &self,
        kind: EntityKind,
        limit: usize,
    ) -> Result<Vec<ProjectionRow>, ProjectionError> {
        let mut rows = self.sorted(kind, SortKey::Popularity, SortDir::Desc);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn list_sorted(
        &self,
        kind: EntityKind,
        sort: SortKey,
        dir: SortDir,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ProjectionRow>, ProjectionError> {
        let rows = self.sorted(kind, sort, dir);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }
}
