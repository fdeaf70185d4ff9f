//! Object cache: get-or-compute primitives over the backend.
//!
//! Fail-open throughout: any backend failure is treated as a miss for that
//! call and logged, never surfaced to the caller. Producer failures are the
//! caller's business logic and do propagate.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::backend::CacheBackend;
use crate::config::CacheSettings;
use crate::domain::types::{CacheGroup, TtlTier};

use super::stats::CacheStats;

const SOURCE: &str = "cache::object";

/// Error type producers may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The compute-on-miss callback failed. Nothing was written.
    #[error("cache producer failed: {0}")]
    Producer(#[source] BoxError),
    /// A produced value could not be encoded/decoded.
    #[error("cache codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Get-or-compute cache over an injected backend.
///
/// No stampede protection: concurrent misses on the same key each invoke the
/// producer independently and the last completed write wins. Accepted
/// tradeoff for the fail-open, best-effort design.
pub struct ObjectCache {
    backend: Arc<dyn CacheBackend>,
    settings: CacheSettings,
    stats: Arc<CacheStats>,
}

impl ObjectCache {
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        settings: CacheSettings,
        stats: Arc<CacheStats>,
    ) -> Self {
        Self {
            backend,
            settings,
            stats,
        }
    }

    /// Look up a key. Backend failure and absence both read as `None`.
    pub async fn get(&self, key: &str, group: CacheGroup) -> Option<Bytes> {
        if !self.settings.enabled {
            return None;
        }
        match self.backend.get(key, group).await {
            Ok(Some(value)) => {
                self.stats.record_hit(group);
                Some(value)
            }
            Ok(None) => {
                self.stats.record_miss(group);
                None
            }
            Err(error) => {
                self.stats.record_miss(group);
                warn!(
                    source = SOURCE,
                    key,
                    group = group.as_str(),
                    error = %error,
                    "backend get failed; treating as miss"
                );
                None
            }
        }
    }

    /// Return the cached value, or run `producer`, store its result, and
    /// return it.
    ///
    /// Producer errors propagate and leave no entry behind. A failed store
    /// after a successful produce is logged and the value still returned.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        group: CacheGroup,
        ttl: Option<TtlTier>,
        producer: F,
    ) -> Result<Bytes, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes, BoxError>>,
    {
        if let Some(value) = self.get(key, group).await {
            return Ok(value);
        }

        let value = producer().await.map_err(CacheError::Producer)?;
        self.store(key, group, ttl, value.clone()).await;
        Ok(value)
    }

    /// Run the producer unconditionally and replace the stored value.
    ///
    /// Warming path: refreshes ahead of expiry whether or not a live entry
    /// exists.
    pub async fn refresh<F, Fut>(
        &self,
        key: &str,
        group: CacheGroup,
        ttl: Option<TtlTier>,
        producer: F,
    ) -> Result<Bytes, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes, BoxError>>,
    {
        let value = producer().await.map_err(CacheError::Producer)?;
        self.store(key, group, ttl, value.clone()).await;
        Ok(value)
    }

    /// Unconditional write. Idempotent.
    pub async fn set(&self, key: &str, group: CacheGroup, ttl: Option<TtlTier>, value: Bytes) {
        self.store(key, group, ttl, value).await;
    }

    /// Unconditional delete. Idempotent.
    pub async fn delete(&self, key: &str, group: CacheGroup) {
        if let Err(error) = self.backend.delete(key, group).await {
            warn!(
                source = SOURCE,
                key,
                group = group.as_str(),
                error = %error,
                "backend delete failed"
            );
        }
    }

    /// Typed lookup via serde_json. A corrupt entry reads as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str, group: CacheGroup) -> Option<T> {
        let bytes = self.get(key, group).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(error) => {
                debug!(
                    source = SOURCE,
                    key,
                    group = group.as_str(),
                    error = %error,
                    "cached entry failed to decode; treating as miss"
                );
                None
            }
        }
    }

    /// Typed get-or-compute via serde_json.
    pub async fn get_or_compute_json<T, F, Fut>(
        &self,
        key: &str,
        group: CacheGroup,
        ttl: Option<TtlTier>,
        producer: F,
    ) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, BoxError>>,
    {
        if let Some(value) = self.get_json(key, group).await {
            return Ok(value);
        }

        let value = producer().await.map_err(CacheError::Producer)?;
        let bytes = Bytes::from(serde_json::to_vec(&value)?);
        self.store(key, group, ttl, bytes).await;
        Ok(value)
    }

    async fn store(&self, key: &str, group: CacheGroup, ttl: Option<TtlTier>, value: Bytes) {
        if !self.settings.enabled {
            return;
        }
        let tier = ttl.unwrap_or_else(|| self.settings.tier_for(group));
        if let Err(error) = self
            .backend
            .set(key, group, value, tier.as_duration())
            .await
        {
            warn!(
                source = SOURCE,
                key,
                group = group.as_str(),
                error = %error,
                "backend set failed; entry not cached"
            );
        }
    }

    pub fn stats(&self) -> &Arc<CacheStats> {
        &self.stats
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }
}
