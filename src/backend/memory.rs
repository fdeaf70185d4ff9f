//! In-memory cache backend.
//!
//! One LRU per group, TTL checked against the injected clock on read.
//! Expired entries are reclaimed lazily; logical expiry is what matters.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use time::OffsetDateTime;

use crate::cache::lock::rw_write;
use crate::config::CacheSettings;
use crate::domain::types::CacheGroup;

use super::{BackendError, CacheBackend, Clock, SystemClock};

const SOURCE: &str = "backend::memory";

struct StoredEntry {
    value: Bytes,
    expires_at: OffsetDateTime,
}

/// Single-node backend backed by per-group LRU maps.
///
/// Serves as the production backend for single-process deployments and as the
/// substitute backend in tests.
pub struct MemoryBackend {
    groups: HashMap<CacheGroup, RwLock<LruCache<String, StoredEntry>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryBackend {
    /// Create a backend with `capacity` entries per group.
    pub fn new(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        let groups = CacheGroup::ALL
            .into_iter()
            .map(|group| (group, RwLock::new(LruCache::new(capacity))))
            .collect();
        Self { groups, clock }
    }

    pub fn with_system_clock(capacity: usize) -> Self {
        Self::new(capacity, Arc::new(SystemClock))
    }

    /// Create a backend sized by the configured per-group capacity.
    pub fn from_settings(settings: &CacheSettings, clock: Arc<dyn Clock>) -> Self {
        Self::new(settings.group_capacity, clock)
    }

    fn entries(&self, group: CacheGroup) -> &RwLock<LruCache<String, StoredEntry>> {
        // Constructed with every group present.
        self.groups
            .get(&group)
            .unwrap_or_else(|| unreachable!("group map is total"))
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str, group: CacheGroup) -> Result<Option<Bytes>, BackendError> {
        let now = self.clock.now();
        let mut entries = rw_write(self.entries(group), SOURCE, "get");
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.pop(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        group: CacheGroup,
        value: Bytes,
        ttl: Duration,
    ) -> Result<(), BackendError> {
        let expires_at = self.clock.now() + ttl;
        let entry = StoredEntry { value, expires_at };
        rw_write(self.entries(group), SOURCE, "set").put(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str, group: CacheGroup) -> Result<(), BackendError> {
        rw_write(self.entries(group), SOURCE, "delete").pop(key);
        Ok(())
    }

    async fn flush_group(&self, group: CacheGroup) -> Result<(), BackendError> {
        rw_write(self.entries(group), SOURCE, "flush_group").clear();
        Ok(())
    }

    async fn flush_all(&self) -> Result<(), BackendError> {
        for group in CacheGroup::ALL {
            rw_write(self.entries(group), SOURCE, "flush_all").clear();
        }
        Ok(())
    }

    async fn group_len(&self, group: CacheGroup) -> Result<usize, BackendError> {
        // Counts entries that have expired but not yet been reclaimed;
        // advisory, so that is acceptable.
        Ok(rw_write(self.entries(group), SOURCE, "group_len").len())
    }
}
