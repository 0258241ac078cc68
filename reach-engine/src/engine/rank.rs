//! Itinerary ranking for score card reports.

use std::cmp::Ordering;

use crate::domain::Itinerary;

/// Rank itineraries by preference.
///
/// Itineraries are ranked by:
/// 1. Total duration (shorter is better)
/// 2. Number of transit rides (fewer is better)
/// 3. Departure time (earlier is better)
///
/// Returns itineraries sorted best-first.
pub fn rank_itineraries(mut itineraries: Vec<Itinerary>) -> Vec<Itinerary> {
    itineraries.sort_by(compare);
    itineraries
}

fn compare(a: &Itinerary, b: &Itinerary) -> Ordering {
    // Primary: duration
    let duration_cmp = a.total_duration().cmp(&b.total_duration());
    if duration_cmp != Ordering::Equal {
        return duration_cmp;
    }

    // Secondary: fewer rides
    let rides_cmp = a.transit_count().cmp(&b.transit_count());
    if rides_cmp != Ordering::Equal {
        return rides_cmp;
    }

    // Tertiary: earlier departure
    a.departure_time().cmp(&b.departure_time())
}

/// Deduplicate itineraries that are effectively identical.
///
/// Two itineraries are duplicates if they depart and arrive at the same
/// times with the same number of rides. Expects ranked input and keeps the
/// first of each group.
pub fn deduplicate(itineraries: Vec<Itinerary>) -> Vec<Itinerary> {
    let mut result: Vec<Itinerary> = Vec::with_capacity(itineraries.len());
    for itinerary in itineraries {
        let key = (
            itinerary.departure_time(),
            itinerary.arrival_time(),
            itinerary.transit_count(),
        );
        let seen = result
            .iter()
            .any(|kept| (kept.departure_time(), kept.arrival_time(), kept.transit_count()) == key);
        if !seen {
            result.push(itinerary);
        }
    }
    result
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{LocationId, Movement, RouteId, Time, TransitRide, TripId, Walk};
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;

    fn base() -> Time {
        Time::midnight(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()) + Duration::hours(8)
    }

    /// Walk for `walk_mins`, then optionally ride for `ride_mins`.
    fn make_itinerary(dep_mins: i64, walk_mins: i64, ride_mins: Option<i64>) -> Itinerary {
        let depart = base() + Duration::minutes(dep_mins);
        let at_stop = depart + Duration::minutes(walk_mins);
        let mut movements = vec![Movement::Walk(Walk {
            from: LocationId(0),
            to: LocationId(1),
            depart,
            arrive: at_stop,
            distance_m: walk_mins as u32 * 80,
        })];
        if let Some(ride_mins) = ride_mins {
            movements.push(Movement::TransitRide(TransitRide {
                trip: TripId(1),
                route: RouteId(1),
                route_name: "Line 1".into(),
                from: LocationId(1),
                to: LocationId(2),
                board: at_stop,
                alight: at_stop + Duration::minutes(ride_mins),
            }));
        }
        Itinerary::new(movements).unwrap()
    }

    fn itinerary_strategy() -> impl Strategy<Value = Itinerary> {
        (0i64..60, 0i64..20, prop::option::of(1i64..30))
            .prop_map(|(dep, walk, ride)| make_itinerary(dep, walk, ride))
    }

    fn itineraries_strategy() -> impl Strategy<Value = Vec<Itinerary>> {
        prop::collection::vec(itinerary_strategy(), 0..15)
    }

    proptest! {
        #[test]
        fn rank_is_sorted(itineraries in itineraries_strategy()) {
            let ranked = rank_itineraries(itineraries);

            for window in ranked.windows(2) {
                let a = &window[0];
                let b = &window[1];
                let a_key = (a.total_duration(), a.transit_count(), a.departure_time());
                let b_key = (b.total_duration(), b.transit_count(), b.departure_time());

                prop_assert!(a_key <= b_key, "Not sorted: {:?} before {:?}", a_key, b_key);
            }
        }

        #[test]
        fn rank_preserves_elements(itineraries in itineraries_strategy()) {
            let original_len = itineraries.len();
            prop_assert_eq!(rank_itineraries(itineraries).len(), original_len);
        }

        #[test]
        fn deduplicate_no_duplicate_keys(itineraries in itineraries_strategy()) {
            let result = deduplicate(rank_itineraries(itineraries));
            for (i, a) in result.iter().enumerate() {
                for b in &result[i + 1..] {
                    prop_assert_ne!(
                        (a.departure_time(), a.arrival_time(), a.transit_count()),
                        (b.departure_time(), b.arrival_time(), b.transit_count())
                    );
                }
            }
        }
    }
}
