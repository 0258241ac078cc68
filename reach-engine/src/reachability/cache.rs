//! Caching layer for walking reachability.
//!
//! Walk sets are looked up once per location at a ceiling budget (the
//! longest duration of the calculation) and cached. Smaller budgets are
//! answered by filtering the cached set, which is exact for any client
//! that honours the monotone contract of `ReachabilityClient`.

use std::sync::Arc;

use chrono::Duration;
use moka::sync::Cache as MokaCache;
use tracing::trace;

use super::{ReachError, ReachabilityClient, WalkHop};
use crate::domain::LocationId;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Budget used for the cached lookup. Queries above it bypass the cache.
    pub ceiling: Duration,

    /// Maximum number of cached locations.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ceiling: Duration::minutes(60),
            max_capacity: 10_000,
        }
    }
}

/// Reachability client with caching.
///
/// Wraps any `ReachabilityClient` and caches its ceiling-budget answers.
pub struct CachedReachabilityClient<C> {
    client: C,
    hops: MokaCache<LocationId, Arc<Vec<WalkHop>>>,
    ceiling: Duration,
}

impl<C: ReachabilityClient> CachedReachabilityClient<C> {
    /// Create a new cached client.
    pub fn new(client: C, config: &CacheConfig) -> Self {
        let hops = MokaCache::builder().max_capacity(config.max_capacity).build();
        Self {
            client,
            hops,
            ceiling: config.ceiling,
        }
    }

    fn ceiling_hops(&self, from: LocationId) -> Result<Arc<Vec<WalkHop>>, ReachError> {
        self.hops
            .try_get_with(from, || {
                trace!(%from, "Walk cache miss");
                self.client
                    .walking_reach(from, self.ceiling)
                    .map(Arc::new)
            })
            .map_err(|e| (*e).clone())
    }

    /// Access the underlying client for lookups that bypass the cache.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Get cache statistics.
    pub fn cache_entry_count(&self) -> u64 {
        self.hops.run_pending_tasks();
        self.hops.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.hops.invalidate_all();
    }
}

impl<C: ReachabilityClient> ReachabilityClient for CachedReachabilityClient<C> {
    fn walking_reach(&self, from: LocationId, budget: Duration) -> Result<Vec<WalkHop>, ReachError> {
        if budget > self.ceiling {
            return self.client.walking_reach(from, budget);
        }
        let all = self.ceiling_hops(from)?;
        Ok(all
            .iter()
            .filter(|hop| hop.cost.duration <= budget)
            .copied()
            .collect())
    }
}
