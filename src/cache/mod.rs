//! Object and fragment caching over a pluggable backend.

mod fragment;
mod keys;
pub(crate) mod lock;
mod manager;
mod object;
mod stats;

pub use fragment::FragmentCache;
pub use keys::{NAVIGATION_MENU_KEY, card_fragment_key, entity_data_key, hash_value, search_key};
pub use manager::CacheManager;
pub use object::{BoxError, CacheError, ObjectCache};
pub use stats::{CacheStats, GroupStats, StatsSnapshot};
