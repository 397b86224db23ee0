//! Algorithms for the member graph
//!
//! - Identifier allocation (bounded random draws)
//! - Placement resolution (BFS over the placement tree)
//! - Downline aggregation and ancestor walks (BFS over the sponsor graph)

pub mod downline;
pub mod identifier_allocator;
pub mod placement;

pub use downline::{compute_downline_aggregates, sponsor_ancestors, TraversalLimits};
pub use identifier_allocator::IdentifierAllocator;
pub use placement::{next_free_slot, resolve_placement};
