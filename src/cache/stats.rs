//! Hit/miss accounting.
//!
//! Two sinks: the `metrics` recorder for operators, and internal atomics that
//! back the admin "cache statistics" surface. Both are advisory and carry no
//! correctness weight.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use metrics::counter;

use crate::domain::types::CacheGroup;

const METRIC_CACHE_HITS: &str = "kinocache_cache_hits_total";
const METRIC_CACHE_MISSES: &str = "kinocache_cache_misses_total";

#[derive(Default)]
struct GroupCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Per-group hit/miss counters.
#[derive(Default)]
pub struct CacheStats {
    counters: DashMap<CacheGroup, GroupCounters>,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self, group: CacheGroup) {
        counter!(METRIC_CACHE_HITS, "group" => group.as_str()).increment(1);
        self.counters
            .entry(group)
            .or_default()
            .hits
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self, group: CacheGroup) {
        counter!(METRIC_CACHE_MISSES, "group" => group.as_str()).increment(1);
        self.counters
            .entry(group)
            .or_default()
            .misses
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self, group: CacheGroup) -> u64 {
        self.counters
            .get(&group)
            .map(|c| c.hits.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn misses(&self, group: CacheGroup) -> u64 {
        self.counters
            .get(&group)
            .map(|c| c.misses.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

/// Snapshot of one group's counters plus the backend's approximate entry count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStats {
    pub group: CacheGroup,
    pub hits: u64,
    pub misses: u64,
    pub approx_entries: usize,
}

/// Advisory statistics for the administrative surface.
#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    pub groups: Vec<GroupStats>,
}

impl StatsSnapshot {
    pub fn group(&self, group: CacheGroup) -> Option<&GroupStats> {
        self.groups.iter().find(|g| g.group == group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits(CacheGroup::Movies), 0);
        assert_eq!(stats.misses(CacheGroup::Movies), 0);
    }

    #[test]
    fn records_per_group() {
        let stats = CacheStats::new();
        stats.record_hit(CacheGroup::Movies);
        stats.record_hit(CacheGroup::Movies);
        stats.record_miss(CacheGroup::Movies);
        stats.record_miss(CacheGroup::Search);

        assert_eq!(stats.hits(CacheGroup::Movies), 2);
        assert_eq!(stats.misses(CacheGroup::Movies), 1);
        assert_eq!(stats.hits(CacheGroup::Search), 0);
        assert_eq!(stats.misses(CacheGroup::Search), 1);
    }

    #[test]
    fn snapshot_lookup() {
        let snapshot = StatsSnapshot {
            groups: vec![GroupStats {
                group: CacheGroup::Search,
                hits: 5,
                misses: 2,
                approx_entries: 7,
            }],
        };
        assert_eq!(snapshot.group(CacheGroup::Search).unwrap().hits, 5);
        assert!(snapshot.group(CacheGroup::Movies).is_none());
    }
}
