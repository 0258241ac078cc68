//! In-memory timetable.
//!
//! Holds trips with ordered stop times plus route details, and indexes
//! every stop's departure and arrival events so a window query is a pair
//! of binary searches.

use std::collections::HashMap;

use tracing::debug;

use super::{Opportunity, ScheduleError, TransitNetwork};
use crate::domain::{Direction, LocationId, Route, RouteId, StopIndex, Time, TimeWindow, Trip};

/// One scheduled event at a stop: (time, trip position in `trips`, stop index).
type StopEvent = (Time, usize, StopIndex);

/// A closed-world schedule for one analysis window.
#[derive(Debug, Clone, Default)]
pub struct Timetable {
    trips: Vec<Trip>,
    routes: HashMap<RouteId, Route>,
    /// Departure events per stop, sorted by time.
    departures: HashMap<LocationId, Vec<StopEvent>>,
    /// Arrival events per stop, sorted by time.
    arrivals: HashMap<LocationId, Vec<StopEvent>>,
}

impl Timetable {
    /// Start building a timetable.
    pub fn builder() -> TimetableBuilder {
        TimetableBuilder::default()
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    /// Stops with at least one scheduled event.
    pub fn served_stops(&self) -> impl Iterator<Item = LocationId> + '_ {
        self.departures
            .keys()
            .chain(self.arrivals.keys().filter(|loc| !self.departures.contains_key(loc)))
            .copied()
    }

    fn forward(&self, stop: LocationId, window: TimeWindow) -> Vec<Opportunity> {
        let mut out = Vec::new();
        for &(dep, trip_pos, idx) in events_in(self.departures.get(&stop), window) {
            let trip = &self.trips[trip_pos];
            for (_, st) in trip.downstream(idx) {
                // Arrivals are non-decreasing along a trip
                if st.arrival > window.end {
                    break;
                }
                out.push(Opportunity {
                    trip: trip.id(),
                    route: trip.route(),
                    at_stop: dep,
                    other: st.location,
                    other_time: st.arrival,
                });
            }
        }
        out
    }

    fn backward(&self, stop: LocationId, window: TimeWindow) -> Vec<Opportunity> {
        let mut out = Vec::new();
        for &(arr, trip_pos, idx) in events_in(self.arrivals.get(&stop), window) {
            let trip = &self.trips[trip_pos];
            for (_, st) in trip.upstream(idx) {
                if st.departure < window.start {
                    break;
                }
                out.push(Opportunity {
                    trip: trip.id(),
                    route: trip.route(),
                    at_stop: arr,
                    other: st.location,
                    other_time: st.departure,
                });
            }
        }
        out
    }
}

/// Events from a sorted list that fall inside `window`.
fn events_in(events: Option<&Vec<StopEvent>>, window: TimeWindow) -> &[StopEvent] {
    let Some(events) = events else {
        return &[];
    };
    let lo = events.partition_point(|(t, _, _)| *t < window.start);
    let hi = events.partition_point(|(t, _, _)| *t <= window.end);
    &events[lo..hi.max(lo)]
}

impl TransitNetwork for Timetable {
    fn opportunities(
        &self,
        stop: LocationId,
        window: TimeWindow,
        direction: Direction,
    ) -> Result<Vec<Opportunity>, ScheduleError> {
        Ok(match direction {
            Direction::Forward => self.forward(stop, window),
            Direction::Backward => self.backward(stop, window),
        })
    }

    fn route(&self, id: RouteId) -> Option<&Route> {
        self.routes.get(&id)
    }
}

/// Builder for an in-memory timetable.
///
/// Trips may reference routes that were never added; such trips are
/// searchable but cannot be rendered into itineraries.
#[derive(Debug, Default)]
pub struct TimetableBuilder {
    trips: Vec<Trip>,
    routes: HashMap<RouteId, Route>,
}

impl TimetableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register display details for a route.
    pub fn route(mut self, route: Route) -> Self {
        self.routes.insert(route.id, route);
        self
    }

    pub fn trip(mut self, trip: Trip) -> Self {
        self.trips.push(trip);
        self
    }

    pub fn add_trip(&mut self, trip: Trip) {
        self.trips.push(trip);
    }

    pub fn add_route(&mut self, route: Route) {
        self.routes.insert(route.id, route);
    }

    /// Index all stop events and freeze the timetable.
    pub fn build(self) -> Timetable {
        let mut departures: HashMap<LocationId, Vec<StopEvent>> = HashMap::new();
        let mut arrivals: HashMap<LocationId, Vec<StopEvent>> = HashMap::new();

        for (pos, trip) in self.trips.iter().enumerate() {
            let last = trip.stop_times().len() - 1;
            for (i, st) in trip.stop_times().iter().enumerate() {
                // Nobody boards at the terminus or alights at the first stop
                if i < last {
                    departures
                        .entry(st.location)
                        .or_default()
                        .push((st.departure, pos, StopIndex(i)));
                }
                if i > 0 {
                    arrivals
                        .entry(st.location)
                        .or_default()
                        .push((st.arrival, pos, StopIndex(i)));
                }
            }
        }

        for events in departures.values_mut().chain(arrivals.values_mut()) {
            events.sort_unstable();
        }

        debug!(
            trips = self.trips.len(),
            routes = self.routes.len(),
            stops = departures.len(),
            "Built timetable"
        );

        Timetable {
            trips: self.trips,
            routes: self.routes,
            departures,
            arrivals,
        }
    }
}
