//! A small synthetic city for the demo binary and tests.
//!
//! Two lines cross the city: Red runs east-west over five stops and Blue
//! runs north-south over four. Red's middle stop and Blue's second stop
//! are a short walk apart. Every stop has a sector around it, neighbouring
//! sectors along a line are walkable, and two landmarks hang off sectors.

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::domain::{
    DomainError, LandmarkId, LocationArena, LocationId, Route, RouteId, SectorId, StopId,
    StopTime, Time, Trip, TripId, VisitableLocation,
};
use crate::network::{Timetable, TimetableBuilder};
use crate::reachability::WalkingNetwork;

const SERVICE_START: (u32, u32) = (7, 0);
const SERVICE_END: (u32, u32) = (10, 0);
const HEADWAY_MINS: i64 = 10;

struct Line {
    route: RouteId,
    name: &'static str,
    stops: u32,
    minutes_between: i64,
    /// Offset of the first departure after the service start.
    offset_mins: i64,
}

const LINES: [Line; 2] = [
    Line {
        route: RouteId(1),
        name: "Red",
        stops: 5,
        minutes_between: 4,
        offset_mins: 0,
    },
    Line {
        route: RouteId(2),
        name: "Blue",
        stops: 4,
        minutes_between: 5,
        offset_mins: 3,
    },
];

/// Everything a calculation over the sample city needs.
#[derive(Debug, Clone)]
pub struct SampleCity {
    pub date: NaiveDate,
    pub arena: LocationArena,
    pub timetable: Timetable,
    pub walking: WalkingNetwork,
    sectors: Vec<LocationId>,
}

impl SampleCity {
    /// Sectors, in interning order. These are the usual origins.
    pub fn sectors(&self) -> &[LocationId] {
        &self.sectors
    }

    /// Query times from `from` up to and including `to`, every `step`.
    pub fn query_times(&self, from: NaiveTime, to: NaiveTime, step: Duration) -> Vec<Time> {
        let end = Time::new(self.date, to);
        let mut times = Vec::new();
        let mut t = Time::new(self.date, from);
        while t <= end && step > Duration::zero() {
            times.push(t);
            t = t + step;
        }
        times
    }
}

/// Build the sample city on `date`.
///
/// # Errors
///
/// Fails only if a generated trip is invalid.
pub fn sample_city(date: NaiveDate) -> Result<SampleCity, DomainError> {
    let mut arena = LocationArena::new();
    let mut timetable = Timetable::builder();
    let mut walking_links = Vec::new();
    let mut sectors = Vec::new();
    let mut line_stops = Vec::new();
    let mut next_stop = 0;
    let mut next_trip = 0;

    for line in &LINES {
        timetable.add_route(Route::new(line.route, line.name));

        let stops: Vec<LocationId> = (0..line.stops)
            .map(|_| {
                next_stop += 1;
                arena.intern(VisitableLocation::TransitStop(StopId(next_stop)))
            })
            .collect();

        // One sector per stop, neighbours walkable
        let line_sectors: Vec<LocationId> = stops
            .iter()
            .map(|stop| {
                let sector = arena.intern(VisitableLocation::Sector(SectorId(sectors.len() as u32)));
                walking_links.push((sector, *stop, 320, Duration::minutes(4)));
                sectors.push(sector);
                sector
            })
            .collect();
        for pair in line_sectors.windows(2) {
            walking_links.push((pair[0], pair[1], 950, Duration::minutes(12)));
        }

        add_trips(&mut timetable, line, &stops, date, &mut next_trip)?;
        line_stops.push(stops);
    }

    // Interchange between Red's middle stop and Blue's second
    walking_links.push((line_stops[0][2], line_stops[1][1], 150, Duration::minutes(2)));

    let market = arena.intern(VisitableLocation::Landmark(LandmarkId(0)));
    walking_links.push((sectors[1], market, 240, Duration::minutes(3)));
    let hospital = arena.intern(VisitableLocation::Landmark(LandmarkId(1)));
    walking_links.push((sectors[sectors.len() - 1], hospital, 500, Duration::minutes(6)));

    let mut walking = WalkingNetwork::builder(arena.len());
    for (a, b, distance_m, duration) in walking_links {
        walking.add_link(a, b, distance_m, duration);
    }

    Ok(SampleCity {
        date,
        arena,
        timetable: timetable.build(),
        walking: walking.build(),
        sectors,
    })
}

fn add_trips(
    timetable: &mut TimetableBuilder,
    line: &Line,
    stops: &[LocationId],
    date: NaiveDate,
    next_trip: &mut u32,
) -> Result<(), DomainError> {
    let first = service_time(date, SERVICE_START) + Duration::minutes(line.offset_mins);
    let last = service_time(date, SERVICE_END);

    let mut departure = first;
    while departure <= last {
        for reverse in [false, true] {
            let ordered: Vec<LocationId> = if reverse {
                stops.iter().rev().copied().collect()
            } else {
                stops.to_vec()
            };
            let stop_times = ordered
                .iter()
                .enumerate()
                .map(|(i, stop)| {
                    StopTime::passing(*stop, departure + Duration::minutes(line.minutes_between * i as i64))
                })
                .collect();
            *next_trip += 1;
            timetable.add_trip(Trip::new(TripId(*next_trip), line.route, stop_times)?);
        }
        departure = departure + Duration::minutes(HEADWAY_MINS);
    }
    Ok(())
}

fn service_time(date: NaiveDate, (hour, minute): (u32, u32)) -> Time {
    Time::midnight(date) + Duration::hours(hour as i64) + Duration::minutes(minute as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::TransitNetwork;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn city_layout() {
        let city = sample_city(date()).unwrap();

        // 9 stops, 9 sectors, 2 landmarks
        assert_eq!(city.arena.len(), 20);
        assert_eq!(city.sectors().len(), 9);
        assert!(city.timetable.route(RouteId(1)).is_some());
        assert!(city.timetable.route(RouteId(2)).is_some());
        // Red departs 19 times and Blue 18, each in both directions
        assert_eq!(city.timetable.trip_count(), 2 * (19 + 18));
    }

    #[test]
    fn query_times_are_inclusive() {
        let city = sample_city(date()).unwrap();
        let times = city.query_times(
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            Duration::minutes(10),
        );
        assert_eq!(times.len(), 4);
        assert_eq!(times[3], Time::new(date(), NaiveTime::from_hms_opt(8, 30, 0).unwrap()));
    }
}
