//! Content store adapter.
//!
//! Read access to catalog entities. Writes happen elsewhere; this subsystem
//! only observes them as change events on the bus.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::cache::lock::{rw_read, rw_write};
use crate::domain::entities::{CatalogRecord, ProjectionRow};
use crate::domain::types::EntityKind;
use crate::projection::{SortDir, SortKey};

const SOURCE: &str = "store";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("content store unavailable: {0}")]
    Unavailable(String),
    #[error("content store query failed: {0}")]
    Query(String),
}

/// Filter for listing queries.
#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    pub status: Option<String>,
    /// Case-insensitive title substring match.
    pub search: Option<String>,
}

/// Read access to catalog entities.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn get_entity(
        &self,
        kind: EntityKind,
        id: i64,
    ) -> Result<Option<CatalogRecord>, StoreError>;

    async fn list_entities(
        &self,
        kind: EntityKind,
        filter: &EntityFilter,
        sort: SortKey,
        dir: SortDir,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CatalogRecord>, StoreError>;
}

/// In-memory content store for tests and fixtures.
#[derive(Default)]
pub struct MemoryContentStore {
    entities: RwLock<HashMap<(EntityKind, i64), CatalogRecord>>,
    failing: RwLock<HashSet<(EntityKind, i64)>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: CatalogRecord) {
        rw_write(&self.entities, SOURCE, "insert").insert((record.kind, record.id), record);
    }

    pub fn remove(&self, kind: EntityKind, id: i64) {
        rw_write(&self.entities, SOURCE, "remove").remove(&(kind, id));
    }

    /// Make reads of one entity fail, to exercise skip-on-failure paths.
    pub fn fail_entity(&self, kind: EntityKind, id: i64) {
        rw_write(&self.failing, SOURCE, "fail_entity").insert((kind, id));
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn get_entity(
        &self,
        kind: EntityKind,
        id: i64,
    ) -> Result<Option<CatalogRecord>, StoreError> {
        if rw_read(&self.failing, SOURCE, "get_entity.failing").contains(&(kind, id)) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(rw_read(&self.entities, SOURCE, "get_entity")
            .get(&(kind, id))
            .cloned())
    }

    async fn list_entities(
        &self,
        kind: EntityKind,
        filter: &EntityFilter,
        sort: SortKey,
        dir: SortDir,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CatalogRecord>, StoreError> {
        let mut records: Vec<CatalogRecord> = rw_read(&self.entities, SOURCE, "list_entities")
            .values()
            .filter(|record| record.kind == kind)
            .filter(|record| match &filter.status {
                Some(status) => record.status.as_deref() == Some(status.as_str()),
                None => true,
            })
            .filter(|record| match &filter.search {
                Some(needle) => record
                    .title
                    .to_lowercase()
                    .contains(&needle.to_lowercase()),
                None => true,
            })
            .cloned()
            .collect();

        // Same ordering contract as the projection layer.
        let now = OffsetDateTime::UNIX_EPOCH;
        records.sort_by(|a, b| {
            crate::projection::cmp_rows(
                &ProjectionRow::from_record(a, now),
                &ProjectionRow::from_record(b, now),
                sort,
                dir,
            )
        });

        Ok(records.into_iter().skip(offset).take(limit).collect())
    }
}
