//! Typed invalidation event bus.
//!
//! Content mutations are published here and fan out to subscribed handlers
//! (projection maintainer, invalidation router). `publish` awaits every
//! handler before returning, so by the time a mutation call unwinds, the
//! affected cache state is already gone.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::cache::lock::{rw_read, rw_write};
use crate::domain::types::{ChangeKind, EntityKind};

const SOURCE: &str = "events";

/// Monotonic epoch for ordering events within this process.
pub type Epoch = u64;

/// What changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A catalog entity was created, updated, or deleted.
    Entity {
        kind: EntityKind,
        id: i64,
        change: ChangeKind,
    },
    /// The navigation menu changed.
    NavigationChanged,
    /// A bulk content sync touched an unknown number of entities.
    FullSync,
}

/// A published change with idempotency id and ordering epoch.
#[derive(Debug, Clone)]
pub struct InvalidationEvent {
    /// Unique id for idempotency (UUIDv4).
    pub id: Uuid,
    /// Monotonic epoch within this process.
    pub epoch: Epoch,
    pub change: ChangeEvent,
    pub timestamp: OffsetDateTime,
}

impl InvalidationEvent {
    pub fn new(change: ChangeEvent, epoch: Epoch) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            change,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// A subscriber on the bus.
#[async_trait]
pub trait InvalidationHandler: Send + Sync {
    async fn on_event(&self, event: &InvalidationEvent);
}

/// In-process publish/subscribe bus for invalidation events.
///
/// Handlers run sequentially in subscription order; a handler that needs the
/// projection refreshed before the flush fires subscribes earlier.
pub struct EventBus {
    handlers: RwLock<Vec<Arc<dyn InvalidationHandler>>>,
    epoch_counter: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            epoch_counter: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self, handler: Arc<dyn InvalidationHandler>) {
        rw_write(&self.handlers, SOURCE, "subscribe").push(handler);
    }

    pub fn next_epoch(&self) -> Epoch {
        self.epoch_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Publish a change and await every handler.
    pub async fn publish(&self, change: ChangeEvent) {
        let event = InvalidationEvent::new(change, self.next_epoch());

        info!(
            source = SOURCE,
            event_id = %event.id,
            event_epoch = event.epoch,
            change = ?event.change,
            "invalidation event published"
        );

        let handlers: Vec<Arc<dyn InvalidationHandler>> =
            rw_read(&self.handlers, SOURCE, "publish").clone();
        for handler in handlers {
            handler.on_event(&event).await;
        }
    }

    pub fn handler_count(&self) -> usize {
        rw_read(&self.handlers, SOURCE, "handler_count").len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct Recording {
        name: &'static str,
        log: Arc<Mutex<Vec<(&'static str, Epoch)>>>,
    }

    #[async_trait]
    impl InvalidationHandler for Recording {
        async fn on_event(&self, event: &InvalidationEvent) {
            self.log.lock().unwrap().push((self.name, event.epoch));
        }
    }

    #[tokio::test]
    async fn handlers_run_in_subscription_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        bus.subscribe(Arc::new(Recording {
            name: "first",
            log: log.clone(),
        }));
        bus.subscribe(Arc::new(Recording {
            name: "second",
            log: log.clone(),
        }));
        assert_eq!(bus.handler_count(), 2);

        bus.publish(ChangeEvent::NavigationChanged).await;

        let entries = log.lock().unwrap().clone();
        assert_eq!(entries, vec![("first", 0), ("second", 0)]);
    }

    #[tokio::test]
    async fn epochs_are_monotonic() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(Arc::new(Recording {
            name: "only",
            log: log.clone(),
        }));

        bus.publish(ChangeEvent::FullSync).await;
        bus.publish(ChangeEvent::FullSync).await;
        bus.publish(ChangeEvent::FullSync).await;

        let epochs: Vec<Epoch> = log.lock().unwrap().iter().map(|(_, e)| *e).collect();
        assert_eq!(epochs, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn publish_without_handlers_is_a_noop() {
        let bus = EventBus::new();
        bus.publish(ChangeEvent::Entity {
            kind: EntityKind::Movie,
            id: 1,
            change: ChangeKind::Updated,
        })
        .await;
    }

    #[test]
    fn events_get_unique_ids() {
        let a = InvalidationEvent::new(ChangeEvent::FullSync, 0);
        let b = InvalidationEvent::new(ChangeEvent::FullSync, 1);
        assert_ne!(a.id, b.id);
    }
}
