//! Cache backend adapter.
//!
//! The backend is a key/value store with per-entry TTL and group tagging.
//! It is injected everywhere (no implicit singleton); tests substitute an
//! in-memory fake implementing the same trait.

mod memory;

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use time::OffsetDateTime;

use crate::cache::lock::{rw_read, rw_write};
use crate::domain::types::CacheGroup;

pub use memory::MemoryBackend;

/// Backend failures.
///
/// The cache layer absorbs every variant into a miss; none of these reach a
/// request handler as a fatal error.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache backend call timed out")]
    Timeout,
    #[error("cache backend storage error: {0}")]
    Storage(String),
}

/// Key/value store with per-entry TTL and group tagging.
///
/// At most one entry exists per `(key, group)`; a write fully replaces the
/// prior value. Absence of a key is a miss, never an error.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str, group: CacheGroup) -> Result<Option<Bytes>, BackendError>;

    async fn set(
        &self,
        key: &str,
        group: CacheGroup,
        value: Bytes,
        ttl: Duration,
    ) -> Result<(), BackendError>;

    /// Idempotent; deleting an absent key is a no-op.
    async fn delete(&self, key: &str, group: CacheGroup) -> Result<(), BackendError>;

    /// Logically discard every entry tagged with the group. Idempotent.
    async fn flush_group(&self, group: CacheGroup) -> Result<(), BackendError>;

    async fn flush_all(&self) -> Result<(), BackendError>;

    /// Approximate number of live entries in the group. Advisory only.
    async fn group_len(&self, group: CacheGroup) -> Result<usize, BackendError>;
}

/// Time source for TTL decisions.
///
/// Injected so tests can drive expiry deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Manually advanced clock for tests.
pub struct ManualClock {
    now: RwLock<OffsetDateTime>,
}

const SOURCE: &str = "backend::clock";

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = rw_write(&self.now, SOURCE, "advance");
        *now += by;
    }

    pub fn set(&self, to: OffsetDateTime) {
        *rw_write(&self.now, SOURCE, "set") = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *rw_read(&self.now, SOURCE, "now")
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(datetime!(2026-01-01 00:00 UTC));
        assert_eq!(clock.now(), datetime!(2026-01-01 00:00 UTC));

        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now(), datetime!(2026-01-01 00:01:30 UTC));

        clock.set(datetime!(2026-02-01 00:00 UTC));
        assert_eq!(clock.now(), datetime!(2026-02-01 00:00 UTC));
    }
}
