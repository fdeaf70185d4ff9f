//! Cache key construction.
//!
//! Keys are content-derived strings so that the invalidation plan for an
//! entity change can be computed without consulting the cache.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::domain::types::EntityKind;

/// Fragment key for the rendered navigation menu.
pub const NAVIGATION_MENU_KEY: &str = "navigation_menu";

/// Detail payload key, e.g. `movie_data_42`.
///
/// Series and dramas share the `tv_data_*` namespace; their distinct cache
/// groups keep the entries apart.
pub fn entity_data_key(kind: EntityKind, id: i64) -> String {
    match kind {
        EntityKind::Movie => format!("movie_data_{id}"),
        EntityKind::Series | EntityKind::Drama => format!("tv_data_{id}"),
        EntityKind::Person => format!("person_data_{id}"),
    }
}

/// Rendered card fragment key, e.g. `movie_card_42`.
pub fn card_fragment_key(kind: EntityKind, id: i64) -> String {
    match kind {
        EntityKind::Movie => format!("movie_card_{id}"),
        EntityKind::Series | EntityKind::Drama => format!("tv_card_{id}"),
        EntityKind::Person => format!("person_card_{id}"),
    }
}

/// Key for a cached search result set.
pub fn search_key(query: &str) -> String {
    format!("search_{:016x}", hash_value(&query))
}

/// Compute a hash for any hashable value.
pub fn hash_value<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_keys_per_kind() {
        assert_eq!(entity_data_key(EntityKind::Movie, 42), "movie_data_42");
        assert_eq!(entity_data_key(EntityKind::Series, 7), "tv_data_7");
        assert_eq!(entity_data_key(EntityKind::Drama, 7), "tv_data_7");
        assert_eq!(entity_data_key(EntityKind::Person, 3), "person_data_3");
    }

    #[test]
    fn card_keys_per_kind() {
        assert_eq!(card_fragment_key(EntityKind::Movie, 42), "movie_card_42");
        assert_eq!(card_fragment_key(EntityKind::Drama, 7), "tv_card_7");
        assert_eq!(card_fragment_key(EntityKind::Person, 3), "person_card_3");
    }

    #[test]
    fn search_keys_are_deterministic() {
        assert_eq!(search_key("star wars"), search_key("star wars"));
        assert_ne!(search_key("star wars"), search_key("star trek"));
        assert!(search_key("star wars").starts_with("search_"));
    }
}
