//! Walkable links between locations.
//!
//! Stops, sectors and landmarks that are close enough to walk between are
//! joined by symmetric links. A query runs a budget-bounded shortest-path
//! search over the links, so a chain of short walks comes back as a single
//! hop with the combined cost.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use chrono::Duration;

use super::{ReachError, ReachabilityClient, WalkHop};
use crate::domain::{LocationId, WalkCost};

/// Ordering key for the search: shortest time first, then shortest distance.
type CostKey = (Duration, u32);

/// A collection of walkable links.
///
/// Links are symmetric: if you can walk from A to B, you can walk from B to A
/// in the same time.
#[derive(Debug, Clone, Default)]
pub struct WalkingNetwork {
    links: HashMap<LocationId, Vec<(LocationId, WalkCost)>>,
    /// Locations `0..location_count` are known to the network.
    location_count: usize,
}

impl WalkingNetwork {
    /// Start building a network covering `location_count` locations.
    pub fn builder(location_count: usize) -> WalkingNetworkBuilder {
        WalkingNetworkBuilder {
            inner: WalkingNetwork {
                links: HashMap::new(),
                location_count,
            },
        }
    }

    /// Direct links out of a location.
    pub fn neighbours(&self, from: LocationId) -> &[(LocationId, WalkCost)] {
        self.links.get(&from).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Returns the number of links (counting A→B and B→A as one).
    pub fn len(&self) -> usize {
        self.links.values().map(Vec::len).sum::<usize>() / 2
    }

    /// Returns true if there are no links.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    fn add(&mut self, a: LocationId, b: LocationId, cost: WalkCost) {
        self.location_count = self.location_count.max(a.index() + 1).max(b.index() + 1);
        self.links.entry(a).or_default().push((b, cost));
        self.links.entry(b).or_default().push((a, cost));
    }
}

impl ReachabilityClient for WalkingNetwork {
    fn walking_reach(&self, from: LocationId, budget: Duration) -> Result<Vec<WalkHop>, ReachError> {
        if from.index() >= self.location_count {
            return Err(ReachError::UnknownLocation(from));
        }
        if budget < Duration::zero() {
            return Ok(Vec::new());
        }

        let mut best: HashMap<LocationId, CostKey> = HashMap::new();
        let mut heap = BinaryHeap::new();
        best.insert(from, (Duration::zero(), 0));
        heap.push(Reverse(((Duration::zero(), 0u32), from)));

        while let Some(Reverse((key, at))) = heap.pop() {
            if best.get(&at).is_some_and(|b| *b < key) {
                continue;
            }
            for (next, cost) in self.neighbours(at) {
                let candidate = (key.0 + cost.duration, key.1.saturating_add(cost.distance_m));
                if candidate.0 > budget {
                    continue;
                }
                if best.get(next).is_none_or(|b| candidate < *b) {
                    best.insert(*next, candidate);
                    heap.push(Reverse((candidate, *next)));
                }
            }
        }

        let mut hops: Vec<WalkHop> = best
            .into_iter()
            .filter(|(to, _)| *to != from)
            .map(|(to, (duration, distance_m))| WalkHop {
                to,
                cost: WalkCost {
                    distance_m,
                    duration,
                },
            })
            .collect();
        hops.sort_by_key(|h| h.to);
        Ok(hops)
    }
}

/// Builder for creating walking networks.
#[derive(Debug)]
pub struct WalkingNetworkBuilder {
    inner: WalkingNetwork,
}

impl WalkingNetworkBuilder {
    /// Add a symmetric link.
    pub fn link(mut self, a: LocationId, b: LocationId, distance_m: u32, duration: Duration) -> Self {
        self.add_link(a, b, distance_m, duration);
        self
    }

    /// Add a symmetric link in place. Self-links and negative durations are ignored.
    pub fn add_link(&mut self, a: LocationId, b: LocationId, distance_m: u32, duration: Duration) {
        if a == b || duration < Duration::zero() {
            return;
        }
        self.inner.add(
            a,
            b,
            WalkCost {
                distance_m,
                duration,
            },
        );
    }

    pub fn build(self) -> WalkingNetwork {
        self.inner
    }
}
