//! Invalidation planning.
//!
//! Pure mapping from a change to the keys to delete and the groups to flush.
//! Over-invalidation is the policy: per-entity keys give precise invalidation
//! for detail views, whole-group flushes cover listings and cross-entity
//! aggregates where tracking exact membership is not worth the bookkeeping.

use crate::cache::{NAVIGATION_MENU_KEY, card_fragment_key, entity_data_key};
use crate::domain::types::{CacheGroup, EntityKind};
use crate::events::ChangeEvent;

/// Deletion/flush plan for one change.
#[derive(Debug, Default, PartialEq)]
pub struct InvalidationPlan {
    /// Exact keys to delete, with their groups.
    pub delete_keys: Vec<(String, CacheGroup)>,
    /// Groups to flush wholesale.
    pub flush_groups: Vec<CacheGroup>,
}

impl InvalidationPlan {
    /// Build the plan for a change.
    pub fn for_event(change: &ChangeEvent) -> Self {
        match change {
            ChangeEvent::Entity { kind, id, .. } => {
                // Same plan for create/update/delete: the detail entry and
                // card are stale either way, and list membership may have
                // changed in any direction.
                let mut flush_groups = vec![kind.group()];
                if *kind == EntityKind::Drama {
                    // Dramas surface in the shared tv listings too.
                    flush_groups.push(CacheGroup::TvSeries);
                }
                flush_groups.push(CacheGroup::Search);
                flush_groups.push(CacheGroup::Recommendations);

                Self {
                    delete_keys: vec![
                        (entity_data_key(*kind, *id), kind.group()),
                        (card_fragment_key(*kind, *id), CacheGroup::Fragments),
                    ],
                    flush_groups,
                }
            }
            ChangeEvent::NavigationChanged => Self {
                delete_keys: vec![(NAVIGATION_MENU_KEY.to_string(), CacheGroup::Fragments)],
                flush_groups: vec![CacheGroup::Fragments],
            },
            ChangeEvent::FullSync => Self {
                delete_keys: Vec::new(),
                flush_groups: vec![
                    CacheGroup::Movies,
                    CacheGroup::TvSeries,
                    CacheGroup::People,
                    CacheGroup::Dramas,
                    CacheGroup::Search,
                    CacheGroup::Recommendations,
                    CacheGroup::Fragments,
                ],
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.delete_keys.is_empty() && self.flush_groups.is_empty()
    }
}
