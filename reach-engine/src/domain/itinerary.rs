//! Itinerary types.
//!
//! An `Itinerary` is the concrete travel plan behind one reachability
//! record: an ordered list of walks and transit rides from the search's
//! first event to its last. The origin itself has an empty itinerary.

use chrono::Duration;
use serde::Serialize;

use super::{DomainError, LocationId, RouteId, Time, TripId};

/// A walk between two locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Walk {
    pub from: LocationId,
    pub to: LocationId,
    pub depart: Time,
    pub arrive: Time,
    pub distance_m: u32,
}

/// A ride on one scheduled trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitRide {
    pub trip: TripId,
    pub route: RouteId,
    pub route_name: String,
    pub from: LocationId,
    pub to: LocationId,
    pub board: Time,
    pub alight: Time,
}

/// One step of an itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Movement {
    Walk(Walk),
    TransitRide(TransitRide),
}

impl Movement {
    /// Where this movement starts.
    pub fn origin(&self) -> LocationId {
        match self {
            Movement::Walk(walk) => walk.from,
            Movement::TransitRide(ride) => ride.from,
        }
    }

    /// Where this movement ends.
    pub fn destination(&self) -> LocationId {
        match self {
            Movement::Walk(walk) => walk.to,
            Movement::TransitRide(ride) => ride.to,
        }
    }

    pub fn depart(&self) -> Time {
        match self {
            Movement::Walk(walk) => walk.depart,
            Movement::TransitRide(ride) => ride.board,
        }
    }

    pub fn arrive(&self) -> Time {
        match self {
            Movement::Walk(walk) => walk.arrive,
            Movement::TransitRide(ride) => ride.alight,
        }
    }

    pub fn is_transit(&self) -> bool {
        matches!(self, Movement::TransitRide(_))
    }
}

/// An ordered, connected sequence of movements.
///
/// # Invariants
///
/// - Consecutive movements connect (destination of one = origin of next)
/// - Every movement arrives no earlier than it departs
/// - Every movement departs no earlier than the previous one arrives
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Itinerary {
    movements: Vec<Movement>,
}

impl Itinerary {
    /// The empty itinerary of a search origin.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Constructs an itinerary from movements in travel order.
    ///
    /// # Errors
    ///
    /// Returns `Err` if movements don't connect or if times go backwards.
    pub fn new(movements: Vec<Movement>) -> Result<Self, DomainError> {
        for movement in &movements {
            if movement.arrive() < movement.depart() {
                return Err(DomainError::TimesOutOfOrder(movement.origin()));
            }
        }
        for pair in movements.windows(2) {
            let prev_dest = pair[0].destination();
            let next_origin = pair[1].origin();
            if prev_dest != next_origin {
                return Err(DomainError::MovementsNotConnected(prev_dest, next_origin));
            }
            if pair[1].depart() < pair[0].arrive() {
                return Err(DomainError::TimesOutOfOrder(next_origin));
            }
        }
        Ok(Self { movements })
    }

    pub fn movements(&self) -> &[Movement] {
        &self.movements
    }

    pub fn len(&self) -> usize {
        self.movements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }

    /// Number of transit rides.
    pub fn transit_count(&self) -> usize {
        self.movements.iter().filter(|m| m.is_transit()).count()
    }

    pub fn departure_time(&self) -> Option<Time> {
        self.movements.first().map(Movement::depart)
    }

    pub fn arrival_time(&self) -> Option<Time> {
        self.movements.last().map(Movement::arrive)
    }

    /// Time from first departure to last arrival; zero when empty.
    pub fn total_duration(&self) -> Duration {
        match (self.departure_time(), self.arrival_time()) {
            (Some(dep), Some(arr)) => arr.signed_duration_since(dep),
            _ => Duration::zero(),
        }
    }
}
