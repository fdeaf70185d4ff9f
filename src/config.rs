//! Cache subsystem configuration.
//!
//! Settings are plain serde structs with defaults so the host application can
//! embed them in its own configuration file:
//!
//! ```toml
//! [cache]
//! enabled = true
//! group_capacity = 2048
//!
//! [cache.tier_overrides]
//! search = "short"
//!
//! [cache.warmer]
//! top_n = 20
//! interval_secs = 3600
//! search_queries = ["star", "space"]
//! ```

use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::types::{CacheGroup, TtlTier};

const DEFAULT_GROUP_CAPACITY: usize = 1_024;
const DEFAULT_WARM_TOP_N: usize = 20;
const DEFAULT_WARM_INTERVAL_SECS: u64 = 3_600;
const DEFAULT_WARM_SEARCH_RESULT_LIMIT: usize = 10;

/// Top-level cache settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Master switch. When disabled, reads bypass storage and producers run
    /// on every call; invalidation events are not published.
    pub enabled: bool,
    /// Per-group entry capacity for the in-memory backend.
    pub group_capacity: usize,
    /// Per-group TTL tier overrides; groups not listed keep their built-in
    /// default tier.
    pub tier_overrides: HashMap<CacheGroup, TtlTier>,
    /// Cache warmer settings.
    pub warmer: WarmerSettings,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            group_capacity: DEFAULT_GROUP_CAPACITY,
            tier_overrides: HashMap::new(),
            warmer: WarmerSettings::default(),
        }
    }
}

impl CacheSettings {
    /// Resolve the effective TTL tier for a group.
    pub fn tier_for(&self, group: CacheGroup) -> TtlTier {
        self.tier_overrides
            .get(&group)
            .copied()
            .unwrap_or_else(|| group.default_tier())
    }
}

/// Settings for the periodic cache warmer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WarmerSettings {
    /// How many entities per kind to warm, ranked by popularity.
    pub top_n: usize,
    /// Interval between warming runs, in seconds.
    pub interval_secs: u64,
    /// Search queries to keep warm ahead of demand.
    pub search_queries: Vec<String>,
    /// Result cap per kind when warming a search query.
    pub search_result_limit: usize,
}

impl Default for WarmerSettings {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_WARM_TOP_N,
            interval_secs: DEFAULT_WARM_INTERVAL_SECS,
            search_queries: Vec::new(),
            search_result_limit: DEFAULT_WARM_SEARCH_RESULT_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let settings = CacheSettings::default();
        assert!(settings.enabled);
        assert_eq!(settings.group_capacity, 1_024);
        assert!(settings.tier_overrides.is_empty());
        assert_eq!(settings.warmer.top_n, 20);
        assert_eq!(settings.warmer.interval_secs, 3_600);
        assert_eq!(settings.warmer.search_result_limit, 10);
        assert!(settings.warmer.search_queries.is_empty());
    }

    #[test]
    fn tier_for_uses_group_default_without_override() {
        let settings = CacheSettings::default();
        assert_eq!(settings.tier_for(CacheGroup::Search), TtlTier::Medium);
        assert_eq!(settings.tier_for(CacheGroup::People), TtlTier::Daily);
    }

    #[test]
    fn tier_override_wins() {
        let mut settings = CacheSettings::default();
        settings
            .tier_overrides
            .insert(CacheGroup::Search, TtlTier::Short);
        assert_eq!(settings.tier_for(CacheGroup::Search), TtlTier::Short);
    }

    #[test]
    fn deserializes_from_toml_fragment() {
        let settings: CacheSettings = toml_like(
            r#"{
                "enabled": true,
                "group_capacity": 64,
                "tier_overrides": { "search": "short" },
                "warmer": { "top_n": 3, "search_queries": ["space"] }
            }"#,
        );
        assert_eq!(settings.group_capacity, 64);
        assert_eq!(settings.tier_for(CacheGroup::Search), TtlTier::Short);
        assert_eq!(settings.warmer.top_n, 3);
        assert_eq!(settings.warmer.search_queries, vec!["space".to_string()]);
    }

    fn toml_like(json: &str) -> CacheSettings {
        serde_json::from_str(json).expect("settings should deserialize")
    }
}
