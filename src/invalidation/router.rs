//! Invalidation router.
//!
//! Subscribes to the event bus and executes the deletion/flush plan against
//! the backend. Failures are logged and accepted as staleness; there is no
//! retry queue in this design.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use metrics::histogram;
use tracing::{info, warn};

use crate::backend::CacheBackend;
use crate::events::{InvalidationEvent, InvalidationHandler};

use super::planner::InvalidationPlan;

const SOURCE: &str = "invalidation::router";
const METRIC_INVALIDATION_MS: &str = "kinocache_invalidation_ms";

/// Executes invalidation plans against the cache backend.
pub struct InvalidationRouter {
    backend: Arc<dyn CacheBackend>,
}

impl InvalidationRouter {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Execute a plan. Each failed delete/flush is logged and skipped.
    pub async fn apply(&self, plan: &InvalidationPlan) {
        let started_at = Instant::now();

        for (key, group) in &plan.delete_keys {
            if let Err(error) = self.backend.delete(key, *group).await {
                warn!(
                    source = SOURCE,
                    key,
                    group = group.as_str(),
                    error = %error,
                    "delete failed; entry may serve stale until TTL"
                );
            }
        }

        for group in &plan.flush_groups {
            if let Err(error) = self.backend.flush_group(*group).await {
                warn!(
                    source = SOURCE,
                    group = group.as_str(),
                    error = %error,
                    "group flush failed; group may serve stale until TTL"
                );
            }
        }

        histogram!(METRIC_INVALIDATION_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
    }
}

#[async_trait]
impl InvalidationHandler for InvalidationRouter {
    async fn on_event(&self, event: &InvalidationEvent) {
        let plan = InvalidationPlan::for_event(&event.change);
        if plan.is_empty() {
            return;
        }

        info!(
            source = SOURCE,
            event_id = %event.id,
            deletes = plan.delete_keys.len(),
            flushes = plan.flush_groups.len(),
            "applying invalidation plan"
        );

        self.apply(&plan).await;
    }
}
