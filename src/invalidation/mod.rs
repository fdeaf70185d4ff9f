//! Invalidation: change events become targeted deletes and group flushes.

mod planner;
mod router;

pub use planner::InvalidationPlan;
pub use router::InvalidationRouter;
