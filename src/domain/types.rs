//! Core enums shared across the cache, invalidation, and projection layers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Primary catalog entity kinds.
///
/// Series and dramas share the `tv_*` cache key namespace; dramas keep their
/// own cache group so a full sync can flush them independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Movie,
    Series,
    Drama,
    Person,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Movie,
        EntityKind::Series,
        EntityKind::Drama,
        EntityKind::Person,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Movie => "movie",
            EntityKind::Series => "tv",
            EntityKind::Drama => "drama",
            EntityKind::Person => "person",
        }
    }

    /// The cache group that holds this kind's detail entries.
    pub fn group(&self) -> CacheGroup {
        match self {
            EntityKind::Movie => CacheGroup::Movies,
            EntityKind::Series => CacheGroup::TvSeries,
            EntityKind::Drama => CacheGroup::Dramas,
            EntityKind::Person => CacheGroup::People,
        }
    }
}

/// What happened to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Coarse invalidation namespaces.
///
/// Flushing a group logically discards every entry tagged with it, regardless
/// of individual TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheGroup {
    Movies,
    TvSeries,
    Dramas,
    People,
    Search,
    Recommendations,
    Fragments,
    ApiResponses,
}

impl CacheGroup {
    pub const ALL: [CacheGroup; 8] = [
        CacheGroup::Movies,
        CacheGroup::TvSeries,
        CacheGroup::Dramas,
        CacheGroup::People,
        CacheGroup::Search,
        CacheGroup::Recommendations,
        CacheGroup::Fragments,
        CacheGroup::ApiResponses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheGroup::Movies => "movies",
            CacheGroup::TvSeries => "tv_series",
            CacheGroup::Dramas => "dramas",
            CacheGroup::People => "people",
            CacheGroup::Search => "search",
            CacheGroup::Recommendations => "recommendations",
            CacheGroup::Fragments => "fragments",
            CacheGroup::ApiResponses => "api_responses",
        }
    }

    /// Default TTL tier for writes that do not pick one explicitly.
    pub fn default_tier(&self) -> TtlTier {
        match self {
            CacheGroup::Movies | CacheGroup::TvSeries | CacheGroup::Dramas => TtlTier::Long,
            CacheGroup::People => TtlTier::Daily,
            CacheGroup::Search => TtlTier::Medium,
            CacheGroup::Recommendations => TtlTier::Medium,
            CacheGroup::Fragments => TtlTier::Long,
            CacheGroup::ApiResponses => TtlTier::Short,
        }
    }
}

/// Fixed expiry durations reused across cache groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtlTier {
    Short,
    Medium,
    Long,
    Daily,
    Weekly,
}

impl TtlTier {
    pub fn as_secs(&self) -> u64 {
        match self {
            TtlTier::Short => 300,
            TtlTier::Medium => 1_800,
            TtlTier::Long => 3_600,
            TtlTier::Daily => 86_400,
            TtlTier::Weekly => 604_800,
        }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.as_secs())
    }
}
