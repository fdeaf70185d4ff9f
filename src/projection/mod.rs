//! Query projection layer.
//!
//! Listing/sorting queries against generic attribute storage are slow; each
//! entity kind gets a denormalized side table of sortable scalars, and list
//! queries are rewritten to join against it and sort on an indexed column.

mod maintainer;
mod pg;
mod store;

use crate::domain::types::EntityKind;

pub use maintainer::ProjectionMaintainer;
pub use pg::PgProjectionStore;
pub use store::{MemoryProjectionStore, ProjectionError, ProjectionStore};

pub(crate) use store::cmp_rows;

/// Sortable scalar columns exposed by the projection tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    ReleaseDate,
    Rating,
    Popularity,
    Runtime,
}

impl SortKey {
    /// Projection table column backing this sort.
    ///
    /// `release_date` holds the first air date for series and dramas.
    pub fn column(&self) -> &'static str {
        match self {
            SortKey::ReleaseDate => "release_date",
            SortKey::Rating => "rating",
            SortKey::Popularity => "popularity",
            SortKey::Runtime => "runtime_minutes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// Side table name for an entity kind.
pub fn projection_table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Movie => "movie_projection",
        EntityKind::Series => "tv_projection",
        EntityKind::Drama => "drama_projection",
        EntityKind::Person => "person_projection",
    }
}

/// Scalar columns the rewrite joins into the caller's select list.
pub const PROJECTION_COLUMNS: [&str; 6] = [
    "tmdb_id",
    "release_date",
    "rating",
    "popularity",
    "runtime_minutes",
    "status",
];

/// A rewritten list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenQuery {
    pub sql: String,
    /// Columns the rewrite added to the select list, so callers do not
    /// re-fetch them.
    pub joined_columns: &'static [&'static str],
}

/// Rewrite a base list query to sort via the projection side table.
///
/// `base_query` must select entity rows with an `id` column (e.g.
/// `SELECT m.* FROM movies m WHERE m.status = 'released'`). The rewrite wraps
/// it, left-joins the projection on `entity_id`, sorts on the indexed
/// projection column, and breaks ties by ascending entity id so paginated
/// lists stay stable across requests.
pub fn rewrite(base_query: &str, kind: EntityKind, sort: SortKey, dir: SortDir) -> RewrittenQuery {
    let table = projection_table(kind);
    let joined = PROJECTION_COLUMNS
        .iter()
        .map(|column| format!("proj.{column}"))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "SELECT base.*, {joined} \
         FROM ({base_query}) AS base \
         LEFT JOIN {table} AS proj ON proj.entity_id = base.id \
         ORDER BY proj.{column} {dir} NULLS LAST, base.id ASC",
        column = sort.column(),
        dir = dir.as_sql(),
    );

    RewrittenQuery {
        sql,
        joined_columns: &PROJECTION_COLUMNS,
    }
}
