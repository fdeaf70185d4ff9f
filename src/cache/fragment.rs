//! Fragment cache: rendered output blobs over the object cache.
//!
//! Same storage model as generic entries; the producer emits a rendered
//! string instead of returning a value object.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::domain::types::{CacheGroup, TtlTier};

use super::object::{BoxError, CacheError, ObjectCache};

const SOURCE: &str = "cache::fragment";

/// Cache for named renderable fragments (`movie_card_42`, `navigation_menu`).
///
/// All fragments live in the `fragments` group.
pub struct FragmentCache {
    objects: Arc<ObjectCache>,
}

impl FragmentCache {
    pub fn new(objects: Arc<ObjectCache>) -> Self {
        Self { objects }
    }

    /// Look up a rendered fragment. Non-UTF-8 entries read as a miss.
    pub async fn get(&self, key: &str) -> Option<String> {
        let bytes = self.objects.get(key, CacheGroup::Fragments).await?;
        match String::from_utf8(bytes.to_vec()) {
            Ok(rendered) => Some(rendered),
            Err(_) => {
                debug!(source = SOURCE, key, "fragment is not valid UTF-8; miss");
                None
            }
        }
    }

    /// Return the cached fragment, or render it, store it, and return it.
    pub async fn get_or_render<F, Fut>(
        &self,
        key: &str,
        ttl: Option<TtlTier>,
        render: F,
    ) -> Result<String, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, BoxError>>,
    {
        if let Some(rendered) = self.get(key).await {
            return Ok(rendered);
        }

        let rendered = render().await.map_err(CacheError::Producer)?;
        self.objects
            .set(key, CacheGroup::Fragments, ttl, Bytes::from(rendered.clone()))
            .await;
        Ok(rendered)
    }

    /// Store a rendered fragment unconditionally.
    pub async fn set(&self, key: &str, ttl: Option<TtlTier>, rendered: String) {
        self.objects
            .set(key, CacheGroup::Fragments, ttl, Bytes::from(rendered))
            .await;
    }

    /// Delete a fragment. Idempotent.
    pub async fn delete(&self, key: &str) {
        self.objects.delete(key, CacheGroup::Fragments).await;
    }
}
