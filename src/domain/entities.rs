//! Entity records as seen by the cache subsystem.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use super::types::EntityKind;

/// A catalog entity (movie, series, drama, or person) reduced to the fields
/// this subsystem caches and projects.
///
/// The content store owns the full record; a cache entry holding one of these
/// is never authoritative and can always be recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: i64,
    pub kind: EntityKind,
    pub title: String,
    pub tmdb_id: Option<i64>,
    pub release_date: Option<Date>,
    pub rating: Option<f64>,
    pub popularity: Option<f64>,
    pub runtime_minutes: Option<i32>,
    pub status: Option<String>,
}

/// One row of a per-entity-kind projection side table.
///
/// Holds the scalar fields list queries sort and filter on, denormalized so
/// listings never scan generic attribute storage. 1:1 with the source entity;
/// refreshed on every entity write, deleted when the entity is deleted.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ProjectionRow {
    pub entity_id: i64,
    pub tmdb_id: Option<i64>,
    pub release_date: Option<Date>,
    pub rating: Option<f64>,
    pub popularity: Option<f64>,
    pub runtime_minutes: Option<i32>,
    pub status: Option<String>,
    pub updated_at: OffsetDateTime,
}

impl ProjectionRow {
    /// Build a projection row from the current source entity.
    pub fn from_record(record: &CatalogRecord, now: OffsetDateTime) -> Self {
        Self {
            entity_id: record.id,
            tmdb_id: record.tmdb_id,
            release_date: record.release_date,
            rating: record.rating,
            popularity: record.popularity,
            runtime_minutes: record.runtime_minutes,
            status: record.status.clone(),
            updated_at: now,
        }
    }
}
