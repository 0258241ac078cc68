//! Scheduled transit trips.
//!
//! A `Trip` is one vehicle run along a route, visiting an ordered list of
//! stops. A `StopIndex` is a position within that list, which keeps loops
//! (a trip calling at the same stop twice) unambiguous.

use serde::{Deserialize, Serialize};

use super::{DomainError, LocationId, Time};

typed_id! {
    /// Identifier of a scheduled trip.
    pub struct TripId(u32);
}

typed_id! {
    /// Identifier of a route (the line a trip runs on).
    pub struct RouteId(u32);
}

/// Position of a stop time within a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopIndex(pub usize);

impl StopIndex {
    /// Returns the next index.
    pub fn next(self) -> Self {
        StopIndex(self.0 + 1)
    }
}

/// Display details for a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    /// Public-facing name, e.g. "Line 4"
    pub name: String,
}

impl Route {
    pub fn new(id: RouteId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A trip's visit to one stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopTime {
    /// The stop, as an interned location
    pub location: LocationId,
    pub arrival: Time,
    pub departure: Time,
}

impl StopTime {
    /// A stop time where the vehicle does not dwell.
    pub fn passing(location: LocationId, at: Time) -> Self {
        Self {
            location,
            arrival: at,
            departure: at,
        }
    }
}

/// A scheduled vehicle run.
///
/// # Invariants
///
/// - At least two stop times
/// - Each stop time departs no earlier than it arrives
/// - Each stop time arrives no earlier than the previous one departs
#[derive(Debug, Clone)]
pub struct Trip {
    id: TripId,
    route: RouteId,
    stop_times: Vec<StopTime>,
}

impl Trip {
    /// Construct a trip, validating its stop times.
    ///
    /// # Errors
    ///
    /// Returns `Err` if fewer than two stop times are given or if times
    /// ever go backwards along the trip.
    pub fn new(id: TripId, route: RouteId, stop_times: Vec<StopTime>) -> Result<Self, DomainError> {
        if stop_times.len() < 2 {
            return Err(DomainError::InvalidTrip {
                trip: id,
                reason: "a trip needs at least two stop times",
            });
        }
        for st in &stop_times {
            if st.departure < st.arrival {
                return Err(DomainError::InvalidTrip {
                    trip: id,
                    reason: "departure before arrival at a stop",
                });
            }
        }
        for pair in stop_times.windows(2) {
            if pair[1].arrival < pair[0].departure {
                return Err(DomainError::InvalidTrip {
                    trip: id,
                    reason: "arrival before previous departure",
                });
            }
        }
        Ok(Self {
            id,
            route,
            stop_times,
        })
    }

    pub fn id(&self) -> TripId {
        self.id
    }

    pub fn route(&self) -> RouteId {
        self.route
    }

    /// All stop times in travel order.
    pub fn stop_times(&self) -> &[StopTime] {
        &self.stop_times
    }

    /// The stop time at `idx`, if in range.
    pub fn stop_time(&self, idx: StopIndex) -> Option<&StopTime> {
        self.stop_times.get(idx.0)
    }

    /// Stop times strictly after `idx`, paired with their indices.
    pub fn downstream(&self, idx: StopIndex) -> impl Iterator<Item = (StopIndex, &StopTime)> {
        self.stop_times
            .iter()
            .enumerate()
            .skip(idx.0 + 1)
            .map(|(i, st)| (StopIndex(i), st))
    }

    /// Stop times strictly before `idx`, nearest first.
    pub fn upstream(&self, idx: StopIndex) -> impl Iterator<Item = (StopIndex, &StopTime)> {
        self.stop_times[..idx.0.min(self.stop_times.len())]
            .iter()
            .enumerate()
            .rev()
            .map(|(i, st)| (StopIndex(i), st))
    }
}
