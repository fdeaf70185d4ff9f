//! Cache warmer.
//!
//! Periodic job that pre-populates hot-path entries ahead of request demand:
//! the top-N entities per kind by projected popularity, a fixed set of common
//! search queries, and the navigation fragment. Every item is independent;
//! one failure is logged and skipped, never aborting the batch.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use metrics::histogram;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::lock::mutex_lock;
use crate::cache::{
    BoxError, FragmentCache, NAVIGATION_MENU_KEY, ObjectCache, card_fragment_key, entity_data_key,
    search_key,
};
use crate::config::WarmerSettings;
use crate::domain::entities::CatalogRecord;
use crate::domain::types::{CacheGroup, EntityKind};
use crate::projection::{ProjectionStore, SortDir, SortKey};
use crate::store::{ContentStore, EntityFilter};

const SOURCE: &str = "warmer";
const METRIC_WARM_MS: &str = "kinocache_warm_ms";

/// Renders fragments on the warmer's behalf.
///
/// Supplied by the host application; the cache layer does not own templates.
#[async_trait]
pub trait FragmentRenderer: Send + Sync {
    async fn render_card(&self, record: &CatalogRecord) -> Result<String, BoxError>;
    async fn render_navigation(&self) -> Result<String, BoxError>;
}

/// Pre-populates hot cache entries.
///
/// Writes into the same cache surface requests read from; idempotent and safe
/// to run concurrently with traffic.
pub struct CacheWarmer {
    objects: Arc<ObjectCache>,
    fragments: Arc<FragmentCache>,
    content: Arc<dyn ContentStore>,
    projections: Arc<dyn ProjectionStore>,
    renderer: Arc<dyn FragmentRenderer>,
    settings: WarmerSettings,
}

impl CacheWarmer {
    pub fn new(
        objects: Arc<ObjectCache>,
        fragments: Arc<FragmentCache>,
        content: Arc<dyn ContentStore>,
        projections: Arc<dyn ProjectionStore>,
        renderer: Arc<dyn FragmentRenderer>,
        settings: WarmerSettings,
    ) -> Self {
        Self {
            objects,
            fragments,
            content,
            projections,
            renderer,
            settings,
        }
    }

    /// One full warming pass.
    pub async fn run(&self) {
        let started_at = Instant::now();
        info!(source = SOURCE, top_n = self.settings.top_n, "warming cache");

        for kind in EntityKind::ALL {
            self.warm_kind(kind).await;
        }
        self.warm_search_queries().await;
        self.warm_navigation().await;

        histogram!(METRIC_WARM_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
        info!(source = SOURCE, "warming pass complete");
    }

    async fn warm_kind(&self, kind: EntityKind) {
        let rows = match self
            .projections
            .top_by_popularity(kind, self.settings.top_n)
            .await
        {
            Ok(rows) => rows,
            Err(error) => {
                warn!(
                    source = SOURCE,
                    kind = kind.as_str(),
                    error = %error,
                    "popularity ranking unavailable; skipping kind"
                );
                return;
            }
        };

        let mut warmed = 0usize;
        for row in &rows {
            if self.warm_entity(kind, row.entity_id).await {
                warmed += 1;
            }
        }

        debug!(
            source = SOURCE,
            kind = kind.as_str(),
            ranked = rows.len(),
            warmed,
            "kind warmed"
        );
    }

    /// Warm one entity's detail payload and card. Returns whether the
    /// payload was stored.
    async fn warm_entity(&self, kind: EntityKind, id: i64) -> bool {
        let record = match self.content.get_entity(kind, id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(
                    source = SOURCE,
                    kind = kind.as_str(),
                    id,
                    "ranked entity no longer exists; skipping"
                );
                return false;
            }
            Err(error) => {
                warn!(
                    source = SOURCE,
                    kind = kind.as_str(),
                    id,
                    error = %error,
                    "entity read failed; skipping item"
                );
                return false;
            }
        };

        let payload = match serde_json::to_vec(&record) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(
                    source = SOURCE,
                    kind = kind.as_str(),
                    id,
                    error = %error,
                    "entity failed to encode; skipping item"
                );
                return false;
            }
        };

        // Stale-ahead refresh: replace whatever is there, live or not.
        self.objects
            .set(
                &entity_data_key(kind, id),
                kind.group(),
                None,
                Bytes::from(payload),
            )
            .await;

        match self.renderer.render_card(&record).await {
            Ok(html) => {
                self.fragments
                    .set(&card_fragment_key(kind, id), None, html)
                    .await;
            }
            Err(error) => {
                warn!(
                    source = SOURCE,
                    kind = kind.as_str(),
                    id,
                    error = %error,
                    "card render failed; payload warmed without fragment"
                );
            }
        }

        true
    }

    async fn warm_search_queries(&self) {
        for query in &self.settings.search_queries {
            let filter = EntityFilter {
                search: Some(query.clone()),
                ..Default::default()
            };

            let mut results: Vec<CatalogRecord> = Vec::new();
            for kind in EntityKind::ALL {
                match self
                    .content
                    .list_entities(
                        kind,
                        &filter,
                        SortKey::Popularity,
                        SortDir::Desc,
                        self.settings.search_result_limit,
                        0,
                    )
                    .await
                {
                    Ok(records) => results.extend(records),
                    Err(error) => {
                        warn!(
                            source = SOURCE,
                            query,
                            kind = kind.as_str(),
                            error = %error,
                            "search listing failed; partial result set"
                        );
                    }
                }
            }

            match serde_json::to_vec(&results) {
                Ok(payload) => {
                    self.objects
                        .set(&search_key(query), CacheGroup::Search, None, Bytes::from(payload))
                        .await;
                }
                Err(error) => {
                    warn!(
                        source = SOURCE,
                        query,
                        error = %error,
                        "search results failed to encode; skipping query"
                    );
                }
            }
        }
    }

    /// Register this warmer with the scheduler at the configured interval.
    pub fn schedule(self: Arc<Self>, scheduler: &dyn Scheduler) {
        let interval = Duration::from_secs(self.settings.interval_secs);
        scheduler.register_periodic("warm_cache", interval, self);
    }

    async fn warm_navigation(&self) {
        match self.renderer.render_navigation().await {
            Ok(html) => {
                self.fragments.set(NAVIGATION_MENU_KEY, None, html).await;
            }
            Err(error) => {
                warn!(
                    source = SOURCE,
                    error = %error,
                    "navigation render failed; fragment left as-is"
                );
            }
        }
    }
}

/// A named job driven by a scheduler.
#[async_trait]
pub trait PeriodicJob: Send + Sync {
    async fn run(&self);
}

#[async_trait]
impl PeriodicJob for CacheWarmer {
    async fn run(&self) {
        CacheWarmer::run(self).await;
    }
}

/// Registers periodic jobs.
pub trait Scheduler: Send + Sync {
    fn register_periodic(&self, name: &'static str, interval: Duration, job: Arc<dyn PeriodicJob>);
}

/// Scheduler backed by spawned tokio interval loops.
///
/// The first tick fires immediately, which doubles as warm-on-startup.
#[derive(Default)]
pub struct TokioScheduler {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort all registered jobs.
    pub fn shutdown(&self) {
        for handle in mutex_lock(&self.handles, SOURCE, "shutdown").drain(..) {
            handle.abort();
        }
    }
}

impl Scheduler for TokioScheduler {
    fn register_periodic(&self, name: &'static str, interval: Duration, job: Arc<dyn PeriodicJob>) {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                debug!(source = SOURCE, job = name, "periodic job tick");
                job.run().await;
            }
        });
        mutex_lock(&self.handles, SOURCE, "register_periodic").push(handle);
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
