//! Scheduled transit boundary.
//!
//! The engine never reads schedules directly. It asks a `TransitNetwork`
//! for the scheduled hops out of a stop inside a time window, and filters
//! them through the rider's `RiderPolicy`.

mod policy;
mod timetable;

pub use policy::RiderPolicy;
pub use timetable::{Timetable, TimetableBuilder};

use crate::domain::{Direction, LocationId, Route, RouteId, Time, TimeWindow, TripId};

/// Error from a transit network collaborator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScheduleError {
    /// The lookup was interrupted before it completed
    #[error("schedule lookup interrupted")]
    Interrupted,

    /// The backing store could not answer
    #[error("schedule lookup failed at {stop}: {message}")]
    Lookup { stop: LocationId, message: String },
}

/// One scheduled hop out of (forward) or into (backward) a stop.
///
/// For a forward query `at_stop` is the departure from the queried stop and
/// `other_time` is the arrival at `other`. For a backward query `at_stop` is
/// the arrival at the queried stop and `other_time` the departure from
/// `other`, an earlier stop on the same trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opportunity {
    pub trip: TripId,
    pub route: RouteId,
    pub at_stop: Time,
    pub other: LocationId,
    pub other_time: Time,
}

/// Trait for providing scheduled transit.
///
/// This abstraction allows the engine to be tested with small synthetic
/// timetables.
pub trait TransitNetwork: Send + Sync {
    /// Scheduled hops touching `stop` inside `window`.
    ///
    /// Forward: trips departing `stop` within the window, paired with every
    /// downstream arrival that is still within the window. Backward: trips
    /// arriving at `stop` within the window, paired with every upstream
    /// departure still within the window.
    fn opportunities(
        &self,
        stop: LocationId,
        window: TimeWindow,
        direction: Direction,
    ) -> Result<Vec<Opportunity>, ScheduleError>;

    /// Display details for a route, if the network has them.
    fn route(&self, id: RouteId) -> Option<&Route>;
}
