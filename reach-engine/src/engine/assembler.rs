//! Path reconstruction.
//!
//! Turns a location's predecessor chain into an itinerary. Forward tables
//! chain from the terminal back towards the origin in decreasing time, so
//! the hops are collected and reversed. Backward tables already chain in
//! travel order (the terminal is where the rider sets off), so hops are
//! emitted as found with the predecessor as the later event.

use super::{EngineError, ReachabilityTable, Record};
use crate::domain::{Direction, Itinerary, LocationId, ModeInfo, Movement, TransitRide, Walk};
use crate::network::TransitNetwork;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementAssembler {
    Forward,
    Retrospective,
}

impl MovementAssembler {
    pub fn for_direction(direction: Direction) -> Self {
        match direction {
            Direction::Forward => MovementAssembler::Forward,
            Direction::Backward => MovementAssembler::Retrospective,
        }
    }

    /// Reconstruct the itinerary that reaches `terminal`.
    ///
    /// The origin itself yields an empty itinerary.
    ///
    /// # Errors
    ///
    /// Fails if `terminal` is not in the table, if its chain does not lead
    /// back to the origin, or if a ride's route has no details.
    pub fn assemble(
        &self,
        terminal: LocationId,
        table: &ReachabilityTable,
        network: &dyn TransitNetwork,
    ) -> Result<Itinerary, EngineError> {
        let chain = table.chain(terminal)?;
        let mut movements = Vec::with_capacity(chain.len().saturating_sub(1));

        for pair in chain.windows(2) {
            let (location, predecessor) = (pair[0], pair[1]);
            let record = table
                .get(location)
                .ok_or(EngineError::BrokenPredecessorChain(terminal))?;
            let movement = match self {
                MovementAssembler::Forward => forward_hop(predecessor, location, record, network)?,
                MovementAssembler::Retrospective => {
                    backward_hop(location, predecessor, record, network)?
                }
            };
            movements.push(movement);
        }

        if *self == MovementAssembler::Forward {
            movements.reverse();
        }
        Ok(Itinerary::new(movements)?)
    }
}

/// The hop `from -> to` that produced `to`'s record in a forward table.
fn forward_hop(
    from: LocationId,
    to: LocationId,
    record: &Record,
    network: &dyn TransitNetwork,
) -> Result<Movement, EngineError> {
    match record.mode {
        ModeInfo::Walking(cost) => Ok(Movement::Walk(Walk {
            from,
            to,
            depart: record.reach_time - cost.duration,
            arrive: record.reach_time,
            distance_m: cost.distance_m,
        })),
        ModeInfo::Transit(boarding) => {
            let route = network
                .route(boarding.route)
                .ok_or(EngineError::MissingRouteDetails(boarding.route))?;
            Ok(Movement::TransitRide(TransitRide {
                trip: boarding.trip,
                route: boarding.route,
                route_name: route.name.clone(),
                from,
                to,
                board: boarding.time,
                alight: record.reach_time,
            }))
        }
        ModeInfo::Origin => Err(EngineError::BrokenPredecessorChain(to)),
    }
}

/// The hop `from -> to` recorded on `from` in a backward table, where `to`
/// is the predecessor.
fn backward_hop(
    from: LocationId,
    to: LocationId,
    record: &Record,
    network: &dyn TransitNetwork,
) -> Result<Movement, EngineError> {
    match record.mode {
        ModeInfo::Walking(cost) => Ok(Movement::Walk(Walk {
            from,
            to,
            depart: record.reach_time,
            arrive: record.reach_time + cost.duration,
            distance_m: cost.distance_m,
        })),
        ModeInfo::Transit(boarding) => {
            let route = network
                .route(boarding.route)
                .ok_or(EngineError::MissingRouteDetails(boarding.route))?;
            Ok(Movement::TransitRide(TransitRide {
                trip: boarding.trip,
                route: boarding.route,
                route_name: route.name.clone(),
                from,
                to,
                board: record.reach_time,
                alight: boarding.time,
            }))
        }
        ModeInfo::Origin => Err(EngineError::BrokenPredecessorChain(from)),
    }
}
