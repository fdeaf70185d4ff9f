//! Cache manager.
//!
//! Single entry point wiring the object cache, fragment cache, event bus,
//! projection maintainer, and invalidation router together. Host code holds
//! one of these and does not touch the parts individually.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::backend::{CacheBackend, Clock};
use crate::config::CacheSettings;
use crate::domain::types::{CacheGroup, EntityKind, TtlTier};
use crate::events::{ChangeEvent, EventBus};
use crate::invalidation::InvalidationRouter;
use crate::projection::{ProjectionMaintainer, ProjectionStore};
use crate::store::ContentStore;

use super::fragment::FragmentCache;
use super::keys::entity_data_key;
use super::object::{BoxError, CacheError, ObjectCache};
use super::stats::{GroupStats, StatsSnapshot};

const SOURCE: &str = "cache::manager";

pub struct CacheManager {
    backend: Arc<dyn CacheBackend>,
    objects: Arc<ObjectCache>,
    fragments: Arc<FragmentCache>,
    bus: Arc<EventBus>,
    settings: CacheSettings,
}

impl CacheManager {
    /// Wire up the full cache surface.
    ///
    /// The projection maintainer subscribes before the invalidation router so
    /// that by the time list entries are flushed, recomputing them already
    /// sees fresh sort fields. The maintainer subscribes even with caching
    /// disabled: the side tables serve list queries whether or not entries
    /// are stored, and must not diverge from source.
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        content: Arc<dyn ContentStore>,
        projections: Arc<dyn ProjectionStore>,
        clock: Arc<dyn Clock>,
        settings: CacheSettings,
    ) -> Self {
        let stats = Arc::new(super::stats::CacheStats::new());
        let objects = Arc::new(ObjectCache::new(
            backend.clone(),
            settings.clone(),
            stats.clone(),
        ));
        let fragments = Arc::new(FragmentCache::new(objects.clone()));

        let bus = Arc::new(EventBus::new());
        bus.subscribe(Arc::new(ProjectionMaintainer::new(
            content,
            projections,
            clock,
        )));
        if settings.enabled {
            bus.subscribe(Arc::new(InvalidationRouter::new(backend.clone())));
        } else {
            debug!(
                source = SOURCE,
                "cache disabled; invalidation router not subscribed"
            );
        }

        Self {
            backend,
            objects,
            fragments,
            bus,
            settings,
        }
    }

    /// Cached entity detail payload, computed on miss.
    pub async fn entity<F, Fut>(
        &self,
        kind: EntityKind,
        id: i64,
        producer: F,
    ) -> Result<Bytes, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes, BoxError>>,
    {
        self.objects
            .get_or_compute(&entity_data_key(kind, id), kind.group(), None, producer)
            .await
    }

    /// Cached rendered fragment, rendered on miss.
    pub async fn fragment<F, Fut>(
        &self,
        key: &str,
        ttl: Option<TtlTier>,
        render: F,
    ) -> Result<String, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, BoxError>>,
    {
        self.fragments.get_or_render(key, ttl, render).await
    }

    /// Publish a content change. Every subscribed handler has run by the
    /// time this returns.
    ///
    /// With the cache disabled nothing is stored, so no invalidation runs;
    /// projection maintenance still does.
    pub async fn publish(&self, change: ChangeEvent) {
        self.bus.publish(change).await;
    }

    /// Drop every cached entry across all groups.
    pub async fn clear_all(&self) {
        if let Err(error) = self.backend.flush_all().await {
            warn!(
                source = SOURCE,
                error = %error,
                "flush all failed; entries expire by TTL instead"
            );
        }
    }

    /// Advisory per-group statistics.
    pub async fn stats(&self) -> StatsSnapshot {
        let cache_stats = self.objects.stats();
        let mut groups = Vec::with_capacity(CacheGroup::ALL.len());
        for group in CacheGroup::ALL {
            let approx_entries = match self.backend.group_len(group).await {
                Ok(len) => len,
                Err(error) => {
                    warn!(
                        source = SOURCE,
                        group = group.as_str(),
                        error = %error,
                        "backend size probe failed; reporting zero"
                    );
                    0
                }
            };
            groups.push(GroupStats {
                group,
                hits: cache_stats.hits(group),
                misses: cache_stats.misses(group),
                approx_entries,
            });
        }
        StatsSnapshot { groups }
    }

    pub fn objects(&self) -> &Arc<ObjectCache> {
        &self.objects
    }

    pub fn fragments(&self) -> &Arc<FragmentCache> {
        &self.fragments
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }
}
