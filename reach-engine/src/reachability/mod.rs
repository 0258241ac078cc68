//! Walking reachability boundary.
//!
//! The engine asks a `ReachabilityClient` for every location reachable by
//! one walking hop within a time budget. Clients are expected to fold walk
//! chains into single hops, so the engine never walks twice in a row.

mod cache;
mod walking;

pub use cache::{CacheConfig, CachedReachabilityClient};
pub use walking::{WalkingNetwork, WalkingNetworkBuilder};

use chrono::Duration;

use crate::domain::{LocationId, WalkCost};

/// Error from a walking reachability collaborator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReachError {
    /// The lookup was interrupted before it completed
    #[error("walking lookup interrupted")]
    Interrupted,

    /// The client has no record of the location
    #[error("unknown location {0}")]
    UnknownLocation(LocationId),

    /// The backing store could not answer
    #[error("walking lookup failed at {from}: {message}")]
    Lookup { from: LocationId, message: String },
}

/// A location reachable by walking, with the cost of getting there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkHop {
    pub to: LocationId,
    pub cost: WalkCost,
}

/// Trait for answering walking reachability queries.
///
/// # Contract
///
/// Implementations must be stateless per call and monotone in the budget:
/// the same `(from, budget)` always yields the same hops, and every hop
/// returned for a budget is returned, with the same cost, for any larger
/// budget. Incremental window reuse skips walking queries whose budget
/// did not grow and relies on this.
///
/// The result never contains `from` itself.
pub trait ReachabilityClient: Send + Sync {
    fn walking_reach(&self, from: LocationId, budget: Duration) -> Result<Vec<WalkHop>, ReachError>;
}

impl<C: ReachabilityClient + ?Sized> ReachabilityClient for std::sync::Arc<C> {
    fn walking_reach(&self, from: LocationId, budget: Duration) -> Result<Vec<WalkHop>, ReachError> {
        (**self).walking_reach(from, budget)
    }
}
