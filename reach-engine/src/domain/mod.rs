//! Domain types for the reachability engine.
//!
//! This module contains the validated value types the engine passes
//! around: times, locations, trips, travel modes and itineraries. All
//! types enforce their invariants at construction time.

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(
            Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(transparent)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

mod error;
mod itinerary;
mod location;
mod mode;
mod time;
mod trip;

pub use error::DomainError;
pub use itinerary::{Itinerary, Movement, TransitRide, Walk};
pub use location::{LandmarkId, LocationArena, LocationId, SectorId, StopId, VisitableLocation};
pub use mode::{Boarding, Mode, ModeInfo, ModeSet, WalkCost};
pub use time::{Direction, Time, TimeError, TimeWindow};
pub use trip::{Route, RouteId, StopIndex, StopTime, Trip, TripId};
