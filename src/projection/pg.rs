//! Postgres-backed projection store.
//!
//! The side tables are the only persisted artifacts this subsystem owns; DDL
//! lives under `migrations/`. All queries bind at runtime because the table
//! name varies by entity kind (a fixed, code-owned set, never user input).

use sqlx::PgPool;

use crate::domain::entities::ProjectionRow;
use crate::domain::types::EntityKind;

use super::store::{ProjectionError, ProjectionStore};
use super::{SortDir, SortKey, projection_table};

use async_trait::async_trait;

pub struct PgProjectionStore {
    pool: PgPool,
}

impl PgProjectionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the projection table migrations.
    pub async fn migrate(&self) -> Result<(), ProjectionError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|error| ProjectionError::Write(error.to_string()))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ProjectionStore for PgProjectionStore {
    async fn upsert(&self, kind: EntityKind, row: ProjectionRow) -> Result<(), ProjectionError> {
        let table = projection_table(kind);
        // Single statement: a failed upsert leaves the prior row intact.
        let sql = format!(
            "INSERT INTO {table} \
             (entity_id, tmdb_id, release_date, rating, popularity, runtime_minutes, status, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (entity_id) DO UPDATE SET \
             tmdb_id = EXCLUDED.tmdb_id, \
             release_date = EXCLUDED.release_date, \
             rating = EXCLUDED.rating, \
             popularity = EXCLUDED.popularity, \
             runtime_minutes = EXCLUDED.runtime_minutes, \
             status = EXCLUDED.status, \
             updated_at = EXCLUDED.updated_at"
        );

        sqlx::query(&sql)
            .bind(row.entity_id)
            .bind(row.tmdb_id)
            .bind(row.release_date)
            .bind(row.rating)
            .bind(row.popularity)
            .bind(row.runtime_minutes)
            .bind(row.status)
            .bind(row.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|error| ProjectionError::Write(error.to_string()))?;
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, entity_id: i64) -> Result<(), ProjectionError> {
        let table = projection_table(kind);
        let sql = format!("DELETE FROM {table} WHERE entity_id = $1");

        sqlx::query(&sql)
            .bind(entity_id)
            .execute(&self.pool)
            .await
            .map_err(|error| ProjectionError::Write(error.to_string()))?;
        Ok(())
    }

    async fn top_by_popularity(
        &self,
        kind: EntityKind,
        limit: usize,
    ) -> Result<Vec<ProjectionRow>, ProjectionError> {
        self.list_sorted(kind, SortKey::Popularity, SortDir::Desc, limit, 0)
            .await
    }

    async fn list_sorted(
        &self,
        kind: EntityKind,
        sort: SortKey,
        dir: SortDir,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ProjectionRow>, ProjectionError> {
        let table = projection_table(kind);
        let sql = format!(
            "SELECT entity_id, tmdb_id, release_date, rating, popularity, runtime_minutes, status, updated_at \
             FROM {table} \
             ORDER BY {column} {dir} NULLS LAST, entity_id ASC \
             LIMIT $1 OFFSET $2",
            column = sort.column(),
            dir = dir.as_sql(),
        );

        sqlx::query_as::<_, ProjectionRow>(&sql)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| ProjectionError::Query(error.to_string()))
    }
}
