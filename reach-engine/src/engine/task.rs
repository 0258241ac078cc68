//! Tasks, task groups and the shared calculation context.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;

use super::config::EngineConfig;
use super::range::Strategy;
use super::{EngineError, Interrupt, ScoreCard, TimeTracker};
use crate::domain::{Direction, LocationArena, LocationId, ModeSet, Time};
use crate::network::{RiderPolicy, TransitNetwork};
use crate::reachability::ReachabilityClient;

/// One reachability query: an origin at one time, within a named run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Task {
    pub origin: LocationId,
    pub time: Time,
    pub run: String,
}

/// Identifies the task group an origin's queries belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskGroupIdentifier {
    pub origin: LocationId,
    pub run: String,
}

impl TaskGroupIdentifier {
    pub fn new(origin: LocationId, run: impl Into<String>) -> Self {
        Self {
            origin,
            run: run.into(),
        }
    }
}

impl fmt::Display for TaskGroupIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.origin, self.run)
    }
}

/// All query times for one origin, in the order they are processed.
///
/// # Invariants
///
/// - Times are unique
/// - Times ascend for forward searches and descend for backward ones
#[derive(Debug, Clone)]
pub struct TaskGroup {
    id: TaskGroupIdentifier,
    times: Vec<Time>,
}

impl TaskGroup {
    /// Build a group, sorting and deduplicating `times` for `direction`.
    pub fn new(id: TaskGroupIdentifier, mut times: Vec<Time>, direction: Direction) -> Self {
        TimeTracker::new(direction).sequence(&mut times);
        Self { id, times }
    }

    /// Build a group from times that must already be in processing order.
    pub fn from_ordered(
        id: TaskGroupIdentifier,
        times: Vec<Time>,
        direction: Direction,
    ) -> Result<Self, EngineError> {
        check_order(&TimeTracker::new(direction), &times)?;
        Ok(Self { id, times })
    }

    pub fn id(&self) -> &TaskGroupIdentifier {
        &self.id
    }

    pub fn origin(&self) -> LocationId {
        self.id.origin
    }

    pub fn times(&self) -> &[Time] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// The task for one of this group's times.
    pub fn task(&self, time: Time) -> Task {
        Task {
            origin: self.id.origin,
            time,
            run: self.id.run.clone(),
        }
    }

    pub fn tasks(&self) -> impl Iterator<Item = Task> + '_ {
        self.times.iter().map(|t| self.task(*t))
    }
}

/// Returns `Err(UnorderedTimes)` at the first pair out of processing order.
pub(crate) fn check_order(tracker: &TimeTracker, times: &[Time]) -> Result<(), EngineError> {
    for pair in times.windows(2) {
        if !tracker.follows(pair[0], pair[1]) {
            return Err(EngineError::UnorderedTimes {
                previous: pair[0],
                next: pair[1],
            });
        }
    }
    Ok(())
}

/// Read-only context shared by every task group of one request.
pub struct Calculation {
    modes: ModeSet,
    network: Arc<dyn TransitNetwork>,
    policy: RiderPolicy,
    client: Arc<dyn ReachabilityClient>,
    arena: Arc<LocationArena>,
    longest_duration: Duration,
    direction: Direction,
    strategy: Strategy,
    max_rounds: Option<usize>,
    interrupt: Interrupt,
    score_card: Arc<dyn ScoreCard>,
}

impl Calculation {
    /// Start building a calculation from its required collaborators.
    pub fn builder(
        network: Arc<dyn TransitNetwork>,
        client: Arc<dyn ReachabilityClient>,
        arena: Arc<LocationArena>,
        score_card: Arc<dyn ScoreCard>,
    ) -> CalculationBuilder {
        CalculationBuilder {
            inner: Calculation {
                modes: ModeSet::all(),
                network,
                policy: RiderPolicy::default(),
                client,
                arena,
                longest_duration: Duration::minutes(45),
                direction: Direction::Forward,
                strategy: Strategy::default(),
                max_rounds: None,
                interrupt: Interrupt::new(),
                score_card,
            },
        }
    }

    pub fn modes(&self) -> ModeSet {
        self.modes
    }

    pub fn network(&self) -> &dyn TransitNetwork {
        self.network.as_ref()
    }

    pub fn policy(&self) -> &RiderPolicy {
        &self.policy
    }

    pub fn client(&self) -> &dyn ReachabilityClient {
        self.client.as_ref()
    }

    pub fn arena(&self) -> &LocationArena {
        &self.arena
    }

    pub fn longest_duration(&self) -> Duration {
        self.longest_duration
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn tracker(&self) -> TimeTracker {
        TimeTracker::new(self.direction)
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Round limit for one table build.
    pub fn max_rounds(&self) -> usize {
        self.max_rounds.unwrap_or(self.arena.len() + 1)
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    pub fn score_card(&self) -> &dyn ScoreCard {
        self.score_card.as_ref()
    }

    /// Group `times` for each origin into task groups for this calculation's direction.
    pub fn task_groups(
        &self,
        origins: impl IntoIterator<Item = LocationId>,
        times: &[Time],
        run: &str,
    ) -> Vec<TaskGroup> {
        origins
            .into_iter()
            .map(|origin| {
                TaskGroup::new(
                    TaskGroupIdentifier::new(origin, run),
                    times.to_vec(),
                    self.direction,
                )
            })
            .collect()
    }
}

impl fmt::Debug for Calculation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Calculation")
            .field("modes", &self.modes)
            .field("policy", &self.policy)
            .field("locations", &self.arena.len())
            .field("longest_duration", &self.longest_duration)
            .field("direction", &self.direction)
            .field("strategy", &self.strategy)
            .field("max_rounds", &self.max_rounds)
            .finish_non_exhaustive()
    }
}

/// Builder for a `Calculation`.
pub struct CalculationBuilder {
    inner: Calculation,
}

impl CalculationBuilder {
    pub fn modes(mut self, modes: ModeSet) -> Self {
        self.inner.modes = modes;
        self
    }

    pub fn policy(mut self, policy: RiderPolicy) -> Self {
        self.inner.policy = policy;
        self
    }

    pub fn longest_duration(mut self, duration: Duration) -> Self {
        self.inner.longest_duration = duration;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.inner.direction = direction;
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.inner.strategy = strategy;
        self
    }

    pub fn max_rounds(mut self, max_rounds: usize) -> Self {
        self.inner.max_rounds = Some(max_rounds);
        self
    }

    pub fn interrupt(mut self, interrupt: Interrupt) -> Self {
        self.inner.interrupt = interrupt;
        self
    }

    /// Apply direction, strategy, budget, boarding buffer and round limit
    /// from configuration. Excluded routes already on the policy are kept.
    pub fn configure(mut self, config: &EngineConfig) -> Self {
        self.inner.direction = config.direction;
        self.inner.strategy = config.strategy;
        self.inner.longest_duration = config.longest_duration();
        self.inner.policy.boarding_buffer = config.boarding_buffer();
        self.inner.max_rounds = config.max_rounds;
        self
    }

    pub fn build(self) -> Calculation {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SectorId, VisitableLocation};
    use crate::engine::CountingScoreCard;
    use crate::network::Timetable;
    use crate::reachability::WalkingNetwork;
    use chrono::NaiveDate;

    fn time(s: &str) -> Time {
        Time::parse_hhmm(s, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()).unwrap()
    }

    fn id() -> TaskGroupIdentifier {
        TaskGroupIdentifier::new(LocationId(3), "am")
    }

    #[test]
    fn group_orders_by_direction() {
        let times = vec![time("08:10"), time("08:00"), time("08:10"), time("08:05")];

        let fwd = TaskGroup::new(id(), times.clone(), Direction::Forward);
        assert_eq!(fwd.times(), &[time("08:00"), time("08:05"), time("08:10")]);

        let bwd = TaskGroup::new(id(), times, Direction::Backward);
        assert_eq!(bwd.times(), &[time("08:10"), time("08:05"), time("08:00")]);
        assert_eq!(bwd.len(), 3);
    }

    #[test]
    fn from_ordered_validates() {
        let ok = TaskGroup::from_ordered(id(), vec![time("08:00"), time("08:05")], Direction::Forward);
        assert!(ok.is_ok());

        let err = TaskGroup::from_ordered(id(), vec![time("08:00"), time("08:05")], Direction::Backward)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnorderedTimes { .. }));

        let err = TaskGroup::from_ordered(id(), vec![time("08:00"), time("08:00")], Direction::Forward)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnorderedTimes { .. }));
    }

    #[test]
    fn tasks_carry_group_identity() {
        let group = TaskGroup::new(id(), vec![time("08:00"), time("08:05")], Direction::Forward);
        let tasks: Vec<Task> = group.tasks().collect();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.origin == LocationId(3) && t.run == "am"));
        assert_eq!(tasks[1].time, time("08:05"));
        assert_eq!(group.id().to_string(), "LocationId(3)/am");
    }

    #[test]
    fn builder_applies_config() {
        let mut arena = LocationArena::new();
        arena.intern(VisitableLocation::Sector(SectorId(0)));
        arena.intern(VisitableLocation::Sector(SectorId(1)));

        let config = EngineConfig {
            direction: Direction::Backward,
            strategy: Strategy::Repeated,
            longest_duration_mins: 20,
            boarding_buffer_mins: 3,
            ..EngineConfig::default()
        };
        let calc = Calculation::builder(
            Arc::new(Timetable::builder().build()),
            Arc::new(WalkingNetwork::builder(2).build()),
            Arc::new(arena),
            Arc::new(CountingScoreCard::new()),
        )
        .configure(&config)
        .build();

        assert_eq!(calc.direction(), Direction::Backward);
        assert_eq!(calc.strategy(), Strategy::Repeated);
        assert_eq!(calc.longest_duration(), Duration::minutes(20));
        assert_eq!(calc.policy().boarding_buffer, Duration::minutes(3));
        assert_eq!(calc.max_rounds(), 3);

        let groups = calc.task_groups([LocationId(0), LocationId(1)], &[time("09:00"), time("09:30")], "pm");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].times(), &[time("09:30"), time("09:00")]);
    }
}
