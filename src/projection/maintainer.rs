//! Projection maintenance.
//!
//! Subscribes to the event bus and keeps the side tables in lockstep with
//! entity writes: upsert on create/update, delete on delete. Runs before the
//! invalidation router so recomputed list entries see fresh sort fields.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::backend::Clock;
use crate::domain::entities::ProjectionRow;
use crate::domain::types::{ChangeKind, EntityKind};
use crate::events::{ChangeEvent, InvalidationEvent, InvalidationHandler};
use crate::store::ContentStore;

use super::store::ProjectionStore;

const SOURCE: &str = "projection::maintainer";

pub struct ProjectionMaintainer {
    content: Arc<dyn ContentStore>,
    projections: Arc<dyn ProjectionStore>,
    clock: Arc<dyn Clock>,
}

impl ProjectionMaintainer {
    pub fn new(
        content: Arc<dyn ContentStore>,
        projections: Arc<dyn ProjectionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            content,
            projections,
            clock,
        }
    }

    async fn refresh(&self, kind: EntityKind, id: i64) {
        let record = match self.content.get_entity(kind, id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                // Written then deleted before we observed it; the delete
                // event will clean the row up.
                debug!(
                    source = SOURCE,
                    kind = kind.as_str(),
                    id,
                    "entity vanished before projection refresh"
                );
                return;
            }
            Err(error) => {
                warn!(
                    source = SOURCE,
                    kind = kind.as_str(),
                    id,
                    error = %error,
                    "entity read failed; projection row keeps last good value"
                );
                return;
            }
        };

        let row = ProjectionRow::from_record(&record, self.clock.now());
        if let Err(error) = self.projections.upsert(kind, row).await {
            warn!(
                source = SOURCE,
                kind = kind.as_str(),
                id,
                error = %error,
                "projection upsert failed; row keeps last good value"
            );
        }
    }

    async fn remove(&self, kind: EntityKind, id: i64) {
        if let Err(error) = self.projections.delete(kind, id).await {
            warn!(
                source = SOURCE,
                kind = kind.as_str(),
                id,
                error = %error,
                "projection delete failed"
            );
        }
    }
}

#[async_trait]
impl InvalidationHandler for ProjectionMaintainer {
    async fn on_event(&self, event: &InvalidationEvent) {
        match &event.change {
            ChangeEvent::Entity {
                kind,
                id,
                change: ChangeKind::Created | ChangeKind::Updated,
            } => self.refresh(*kind, *id).await,
            ChangeEvent::Entity {
                kind,
                id,
                change: ChangeKind::Deleted,
            } => self.remove(*kind, *id).await,
            ChangeEvent::NavigationChanged | ChangeEvent::FullSync => {}
        }
    }
}
