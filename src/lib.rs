//! Multi-tier caching and invalidation for a movies/TV/people catalog.
//!
//! The crate has three cooperating layers:
//!
//! - **Cache**: a get-or-compute object cache and a fragment cache over a
//!   pluggable key/value backend with per-entry TTL and group tagging.
//!   Backend failures read as misses; the catalog stays up when the cache
//!   is down.
//! - **Invalidation**: content mutations are published as typed events on an
//!   in-process bus; a router maps each event to targeted key deletes plus
//!   conservative group flushes.
//! - **Projection**: denormalized per-kind side tables of sortable scalars
//!   keep list queries off the generic attribute storage, maintained from
//!   the same event stream.
//!
//! [`CacheManager`](cache::CacheManager) wires the layers together; the
//! [`warmer`] re-populates hot entries on a schedule.

pub mod backend;
pub mod cache;
pub mod config;
pub mod domain;
pub mod events;
pub mod invalidation;
pub mod projection;
pub mod store;
pub mod warmer;

pub use backend::{BackendError, CacheBackend, Clock, ManualClock, MemoryBackend, SystemClock};
pub use cache::{BoxError, CacheError, CacheManager, FragmentCache, ObjectCache, StatsSnapshot};
pub use config::{CacheSettings, WarmerSettings};
pub use domain::entities::{CatalogRecord, ProjectionRow};
pub use domain::types::{CacheGroup, ChangeKind, EntityKind, TtlTier};
pub use events::{ChangeEvent, EventBus, InvalidationEvent, InvalidationHandler};
pub use invalidation::{InvalidationPlan, InvalidationRouter};
pub use projection::{
    MemoryProjectionStore, PgProjectionStore, ProjectionMaintainer, ProjectionStore, SortDir,
    SortKey,
};
pub use store::{ContentStore, EntityFilter, MemoryContentStore, StoreError};
pub use warmer::{CacheWarmer, FragmentRenderer, PeriodicJob, Scheduler, TokioScheduler};
