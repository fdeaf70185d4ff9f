//! Domain types for the catalog cache subsystem.

pub mod entities;
pub mod types;

pub use entities::{CatalogRecord, ProjectionRow};
pub use types::{CacheGroup, ChangeKind, EntityKind, TtlTier};
