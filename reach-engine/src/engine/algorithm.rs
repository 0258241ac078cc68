//! Single-origin table builder.
//!
//! Label-correcting search in rounds. Each round expands the locations
//! whose record changed in the previous round (the frontier): transit
//! boardings at stops, then one walking hop for locations not already
//! reached on foot. A candidate replaces a record only when strictly
//! better, so every round makes progress and the loop reaches a fixed point.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::{Calculation, EngineError, Interrupt, ReachabilityTable, Record, TimeTracker};
use crate::domain::{Boarding, LocationArena, LocationId, Mode, ModeInfo, ModeSet, Time};
use crate::network::{RiderPolicy, TransitNetwork};
use crate::reachability::{ReachabilityClient, WalkHop};

/// Which hops to look for from a frontier location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Expansion {
    pub transit: bool,
    pub walking: bool,
}

impl Expansion {
    pub const FULL: Expansion = Expansion {
        transit: true,
        walking: true,
    };
}

/// Locations to expand in the next round, in handle order.
pub(crate) type Frontier = BTreeMap<LocationId, Expansion>;

/// Builds reachability tables for one calculation.
pub struct DynamicProgrammingAlgorithm<'a> {
    network: &'a dyn TransitNetwork,
    client: &'a dyn ReachabilityClient,
    policy: &'a RiderPolicy,
    arena: &'a LocationArena,
    modes: ModeSet,
    tracker: TimeTracker,
    max_rounds: usize,
    interrupt: &'a Interrupt,
}

impl<'a> DynamicProgrammingAlgorithm<'a> {
    pub fn new(calculation: &'a Calculation) -> Self {
        Self {
            network: calculation.network(),
            client: calculation.client(),
            policy: calculation.policy(),
            arena: calculation.arena(),
            modes: calculation.modes(),
            tracker: calculation.tracker(),
            max_rounds: calculation.max_rounds(),
            interrupt: calculation.interrupt(),
        }
    }

    pub fn tracker(&self) -> TimeTracker {
        self.tracker
    }

    /// Build the table for `origin` starting at `start`, bounded by `cutoff`.
    ///
    /// # Errors
    ///
    /// Fails if the origin is not in the arena, if the calculation is
    /// interrupted, if a collaborator fails, or if no fixed point is reached
    /// within the round limit. No partial table is returned.
    pub fn build(
        &self,
        start: Time,
        cutoff: Time,
        origin: LocationId,
    ) -> Result<ReachabilityTable, EngineError> {
        self.build_with(start, cutoff, origin, None)
    }

    /// As `build`, answering the origin's walking query from `origin_walks`
    /// when given.
    pub(crate) fn build_with(
        &self,
        start: Time,
        cutoff: Time,
        origin: LocationId,
        origin_walks: Option<&[WalkHop]>,
    ) -> Result<ReachabilityTable, EngineError> {
        if !self.arena.contains(origin) {
            return Err(EngineError::OriginOutsideNetwork(origin));
        }
        let mut table = ReachabilityTable::seeded(origin, start, cutoff, self.arena.len());
        let mut frontier = Frontier::new();
        frontier.insert(origin, Expansion::FULL);

        let rounds = self.propagate(&mut table, frontier, origin_walks)?;

        debug!(
            origin = %origin,
            start = %start,
            rounds,
            reached = table.len(),
            "Built reachability table"
        );
        Ok(table)
    }

    /// Run rounds from `frontier` until nothing changes.
    ///
    /// Returns the number of rounds that expanded at least one location.
    pub(crate) fn propagate(
        &self,
        table: &mut ReachabilityTable,
        mut frontier: Frontier,
        origin_walks: Option<&[WalkHop]>,
    ) -> Result<usize, EngineError> {
        let mut rounds = 0;

        while !frontier.is_empty() {
            self.interrupt.check()?;
            if rounds >= self.max_rounds {
                return Err(EngineError::RoundLimitExceeded {
                    origin: table.origin(),
                    limit: self.max_rounds,
                });
            }
            rounds += 1;

            trace!(round = rounds, frontier = frontier.len(), "Expanding frontier");

            let mut next = Frontier::new();
            for (location, expansion) in frontier {
                // Always the latest record, even if it improved earlier this round
                let Some(record) = table.get(location).copied() else {
                    continue;
                };
                if expansion.transit {
                    self.expand_transit(table, location, record, &mut next)?;
                }
                if expansion.walking {
                    self.expand_walking(table, location, record, origin_walks, &mut next)?;
                }
            }
            frontier = next;
        }

        table.add_rounds(rounds);
        Ok(rounds)
    }

    fn expand_transit(
        &self,
        table: &mut ReachabilityTable,
        location: LocationId,
        record: Record,
        next: &mut Frontier,
    ) -> Result<(), EngineError> {
        if !self.modes.allows(Mode::Transit) {
            return Ok(());
        }
        // Sectors and landmarks have no boardings
        if !self.arena.get(location).is_some_and(|l| l.is_transit_stop()) {
            return Ok(());
        }
        let Some(window) = self.tracker.wait_window(self.policy, record.reach_time, table.cutoff())
        else {
            return Ok(());
        };

        let opportunities = self
            .network
            .opportunities(location, window, self.tracker.direction())
            .map_err(EngineError::from_schedule)?;

        for opportunity in opportunities {
            if !self.policy.permits(opportunity.route) {
                continue;
            }
            if !self.tracker.within(opportunity.other_time, table.cutoff()) {
                continue;
            }
            let anchor = if location == table.origin() {
                self.tracker
                    .boarding_anchor(opportunity.at_stop, self.policy.boarding_buffer)
            } else {
                match record.anchor {
                    Some(anchor) => anchor,
                    None => return Err(EngineError::BrokenPredecessorChain(location)),
                }
            };
            let candidate = Record {
                reach_time: opportunity.other_time,
                mode: ModeInfo::Transit(Boarding {
                    trip: opportunity.trip,
                    route: opportunity.route,
                    time: opportunity.at_stop,
                }),
                anchor: Some(anchor),
            };
            self.offer(table, opportunity.other, candidate, location, next);
        }
        Ok(())
    }

    fn expand_walking(
        &self,
        table: &mut ReachabilityTable,
        location: LocationId,
        record: Record,
        origin_walks: Option<&[WalkHop]>,
        next: &mut Frontier,
    ) -> Result<(), EngineError> {
        // Walk chains are already folded into single hops by the client
        if !self.modes.allows(Mode::Walking) || record.mode.is_walking() {
            return Ok(());
        }
        let budget = self.tracker.slack(record.reach_time, table.cutoff());
        if budget < chrono::Duration::zero() {
            return Ok(());
        }

        let is_origin = location == table.origin();
        let queried;
        let hops: &[WalkHop] = match origin_walks {
            Some(hops) if is_origin => hops,
            _ => {
                queried = self
                    .client
                    .walking_reach(location, budget)
                    .map_err(EngineError::from_reach)?;
                &queried
            }
        };

        let anchor = if is_origin {
            table.start()
        } else {
            match record.anchor {
                Some(anchor) => anchor,
                None => return Err(EngineError::BrokenPredecessorChain(location)),
            }
        };

        for hop in hops {
            if hop.to == location || hop.cost.duration > budget {
                continue;
            }
            let candidate = Record {
                reach_time: self.tracker.advance(record.reach_time, hop.cost.duration),
                mode: ModeInfo::Walking(hop.cost),
                anchor: Some(anchor),
            };
            self.offer(table, hop.to, candidate, location, next);
        }
        Ok(())
    }

    fn offer(
        &self,
        table: &mut ReachabilityTable,
        destination: LocationId,
        candidate: Record,
        predecessor: LocationId,
        next: &mut Frontier,
    ) {
        if table.offer(&self.tracker, destination, candidate, predecessor) {
            next.insert(destination, Expansion::FULL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Direction, LandmarkId, Route, RouteId, SectorId, StopId, StopTime, Trip, TripId,
        VisitableLocation,
    };
    use crate::engine::CountingScoreCard;
    use crate::network::Timetable;
    use crate::reachability::WalkingNetwork;
    use chrono::{Duration, NaiveDate};
    use std::sync::Arc;

    fn time(s: &str) -> Time {
        Time::parse_hhmm(s, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()).unwrap()
    }

    fn mins(m: i64) -> Duration {
        Duration::minutes(m)
    }

    /// A (sector), S (stop adjacent to A), B (stop), C (landmark near B).
    struct Fixture {
        a: LocationId,
        s: LocationId,
        b: LocationId,
        c: LocationId,
        arena: LocationArena,
    }

    fn fixture() -> Fixture {
        let mut arena = LocationArena::new();
        let a = arena.intern(VisitableLocation::Sector(SectorId(0)));
        let s = arena.intern(VisitableLocation::TransitStop(StopId(1)));
        let b = arena.intern(VisitableLocation::TransitStop(StopId(2)));
        let c = arena.intern(VisitableLocation::Landmark(LandmarkId(3)));
        Fixture { a, s, b, c, arena }
    }

    fn calculation(
        f: &Fixture,
        timetable: Timetable,
        walking: WalkingNetwork,
        direction: Direction,
    ) -> Calculation {
        Calculation::builder(
            Arc::new(timetable),
            Arc::new(walking),
            Arc::new(f.arena.clone()),
            Arc::new(CountingScoreCard::new()),
        )
        .direction(direction)
        .longest_duration(mins(30))
        .build()
    }

    fn ride(f: &Fixture, dep: &str, arr: &str) -> Timetable {
        Timetable::builder()
            .route(Route::new(RouteId(1), "Line 1"))
            .trip(
                Trip::new(
                    TripId(1),
                    RouteId(1),
                    vec![StopTime::passing(f.s, time(dep)), StopTime::passing(f.b, time(arr))],
                )
                .unwrap(),
            )
            .build()
    }

    #[test]
    fn walk_then_ride() {
        // Walk 3 minutes to the stop, the trip leaves 5 minutes after the
        // rider gets there and arrives 15 minutes after that: 18 minutes.
        let f = fixture();
        let walking = WalkingNetwork::builder(4).link(f.a, f.s, 240, mins(3)).build();
        let calc = calculation(&f, ride(&f, "10:08", "10:18"), walking, Direction::Forward);
        let algo = DynamicProgrammingAlgorithm::new(&calc);

        let table = algo.build(time("10:00"), time("10:30"), f.a).unwrap();

        let b = table.get(f.b).unwrap();
        assert_eq!(b.reach_time, time("10:00") + mins(18));
        assert!(b.mode.is_transit());
        assert_eq!(table.predecessor(f.b), Some(f.s));

        let s = table.get(f.s).unwrap();
        assert_eq!(s.reach_time, time("10:03"));
        assert!(s.mode.is_walking());
    }

    #[test]
    fn walk_beyond_budget_is_absent() {
        let f = fixture();
        let walking = WalkingNetwork::builder(4).link(f.a, f.c, 3000, mins(40)).build();
        let calc = calculation(&f, Timetable::builder().build(), walking, Direction::Forward);
        let algo = DynamicProgrammingAlgorithm::new(&calc);

        let table = algo.build(time("10:00"), time("10:30"), f.a).unwrap();

        assert!(!table.contains(f.c));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn no_walk_after_walk() {
        let f = fixture();
        // Only direct links; the client would fold a-s-c, so the engine must not
        let walking = WalkingNetwork::builder(4)
            .link(f.a, f.s, 100, mins(3))
            .link(f.s, f.c, 100, mins(3))
            .build();
        let calc = calculation(&f, Timetable::builder().build(), walking, Direction::Forward);
        let algo = DynamicProgrammingAlgorithm::new(&calc);

        let table = algo.build(time("10:00"), time("10:30"), f.a).unwrap();

        // Reached once, as a single folded hop from the origin
        let c = table.get(f.c).unwrap();
        assert_eq!(c.reach_time, time("10:06"));
        assert_eq!(table.predecessor(f.c), Some(f.a));
    }

    #[test]
    fn arrival_past_cutoff_is_ignored() {
        let f = fixture();
        let walking = WalkingNetwork::builder(4).link(f.a, f.s, 240, mins(3)).build();
        let calc = calculation(&f, ride(&f, "10:08", "10:35"), walking, Direction::Forward);
        let algo = DynamicProgrammingAlgorithm::new(&calc);

        let table = algo.build(time("10:00"), time("10:30"), f.a).unwrap();
        assert!(!table.contains(f.b));
    }

    #[test]
    fn boarding_buffer_applies() {
        let f = fixture();
        let walking = WalkingNetwork::builder(4).link(f.a, f.s, 240, mins(3)).build();
        let calc = Calculation::builder(
            Arc::new(ride(&f, "10:04", "10:14")),
            Arc::new(walking),
            Arc::new(f.arena.clone()),
            Arc::new(CountingScoreCard::new()),
        )
        .policy(RiderPolicy::new(mins(2)))
        .build();
        let algo = DynamicProgrammingAlgorithm::new(&calc);

        // At the stop 10:03, needs until 10:05 to board; the 10:04 is missed
        let table = algo.build(time("10:00"), time("10:30"), f.a).unwrap();
        assert!(!table.contains(f.b));
    }

    #[test]
    fn excluded_routes_are_skipped() {
        let f = fixture();
        let walking = WalkingNetwork::builder(4).link(f.a, f.s, 240, mins(3)).build();
        let calc = Calculation::builder(
            Arc::new(ride(&f, "10:08", "10:18")),
            Arc::new(walking),
            Arc::new(f.arena.clone()),
            Arc::new(CountingScoreCard::new()),
        )
        .policy(RiderPolicy::default().excluding(RouteId(1)))
        .build();
        let algo = DynamicProgrammingAlgorithm::new(&calc);

        let table = algo.build(time("10:00"), time("10:30"), f.a).unwrap();
        assert!(!table.contains(f.b));
        assert!(table.contains(f.s));
    }

    #[test]
    fn sectors_do_not_board() {
        let f = fixture();
        // A trip "calling" at the sector is never boarded from it
        let timetable = Timetable::builder()
            .trip(
                Trip::new(
                    TripId(1),
                    RouteId(1),
                    vec![StopTime::passing(f.a, time("10:05")), StopTime::passing(f.b, time("10:10"))],
                )
                .unwrap(),
            )
            .build();
        let calc = calculation(&f, timetable, WalkingNetwork::builder(4).build(), Direction::Forward);
        let algo = DynamicProgrammingAlgorithm::new(&calc);

        let table = algo.build(time("10:00"), time("10:30"), f.a).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn mode_set_limits_queries() {
        let f = fixture();
        let walking = WalkingNetwork::builder(4).link(f.a, f.s, 240, mins(3)).build();
        let calc = Calculation::builder(
            Arc::new(ride(&f, "10:08", "10:18")),
            Arc::new(walking),
            Arc::new(f.arena.clone()),
            Arc::new(CountingScoreCard::new()),
        )
        .modes(ModeSet::only(Mode::Transit))
        .build();
        let algo = DynamicProgrammingAlgorithm::new(&calc);

        // Starting at the stop: transit only still reaches B
        let table = algo.build(time("10:00"), time("10:30"), f.s).unwrap();
        assert!(table.contains(f.b));
        assert!(!table.contains(f.a));
    }

    #[test]
    fn backward_search() {
        let f = fixture();
        let walking = WalkingNetwork::builder(4).link(f.a, f.s, 240, mins(3)).build();
        let calc = calculation(&f, ride(&f, "10:08", "10:18"), walking, Direction::Backward);
        let algo = DynamicProgrammingAlgorithm::new(&calc);

        // Arrive at B by 10:20; leave A by 10:05 at the latest
        let table = algo.build(time("10:20"), time("09:50"), f.b).unwrap();

        assert_eq!(table.get(f.s).unwrap().reach_time, time("10:08"));
        let a = table.get(f.a).unwrap();
        assert_eq!(a.reach_time, time("10:05"));
        assert!(a.mode.is_walking());
        assert_eq!(table.predecessor(f.a), Some(f.s));
    }

    #[test]
    fn origin_outside_network() {
        let f = fixture();
        let calc = calculation(
            &f,
            Timetable::builder().build(),
            WalkingNetwork::builder(4).build(),
            Direction::Forward,
        );
        let algo = DynamicProgrammingAlgorithm::new(&calc);

        let err = algo.build(time("10:00"), time("10:30"), LocationId(42)).unwrap_err();
        assert!(matches!(err, EngineError::OriginOutsideNetwork(_)));
    }

    #[test]
    fn interrupted_build_fails() {
        let f = fixture();
        let walking = WalkingNetwork::builder(4).link(f.a, f.s, 240, mins(3)).build();
        let calc = calculation(&f, ride(&f, "10:08", "10:18"), walking, Direction::Forward);
        calc.interrupt().raise();
        let algo = DynamicProgrammingAlgorithm::new(&calc);

        let err = algo.build(time("10:00"), time("10:30"), f.a).unwrap_err();
        assert!(matches!(err, EngineError::Interrupted));
    }

    #[test]
    fn round_limit_is_an_error() {
        let f = fixture();
        let walking = WalkingNetwork::builder(4).link(f.a, f.s, 240, mins(3)).build();
        let calc = Calculation::builder(
            Arc::new(ride(&f, "10:08", "10:18")),
            Arc::new(walking),
            Arc::new(f.arena.clone()),
            Arc::new(CountingScoreCard::new()),
        )
        .max_rounds(1)
        .build();
        let algo = DynamicProgrammingAlgorithm::new(&calc);

        let err = algo.build(time("10:00"), time("10:30"), f.a).unwrap_err();
        assert!(matches!(err, EngineError::RoundLimitExceeded { limit: 1, .. }));
    }
}
