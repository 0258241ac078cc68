//! Range execution over one task group.
//!
//! A task group asks the same question from one origin at many times.
//! The strategies differ only in how much work one step reuses from the
//! step before it; they produce the same tables.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::algorithm::{Expansion, Frontier};
use super::task::check_order;
use super::{
    Calculation, DynamicProgrammingAlgorithm, EngineError, MovementAssembler, ReachabilityTable,
    TaskGroup,
};
use crate::domain::{LocationId, Mode, Time};
use crate::reachability::WalkHop;

/// How consecutive time steps of a task group share work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// A fresh table for every time.
    Repeated,
    /// Slide the previous table to the next time and repair it.
    #[default]
    Incremental,
    /// As `Incremental`, with the origin's walking hops looked up once.
    Progressive,
}

/// Work done by one or more range runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RangeSummary {
    /// Time steps processed.
    pub steps: usize,
    /// Score card entries written.
    pub records_written: usize,
    /// Propagation rounds across all steps.
    pub rounds: usize,
    /// Records carried over from a previous step.
    pub reused: usize,
}

impl RangeSummary {
    pub fn merge(&mut self, other: &RangeSummary) {
        self.steps += other.steps;
        self.records_written += other.records_written;
        self.rounds += other.rounds;
        self.reused += other.reused;
    }
}

/// Process every time of `group` with the calculation's strategy, writing
/// each step's reached locations to the score card before moving on.
///
/// # Errors
///
/// Fails on interruption, on times out of search order, and on any error
/// from building a table or assembling an itinerary. Steps already scored
/// stay on the score card. An interruption reported by a collaborator
/// raises the calculation's interrupt so every other worker stops too.
pub fn run(calculation: &Calculation, group: &TaskGroup) -> Result<RangeSummary, EngineError> {
    run_steps(calculation, group).inspect_err(|err| {
        if err.is_interrupted() {
            calculation.interrupt().raise();
        }
    })
}

fn run_steps(calculation: &Calculation, group: &TaskGroup) -> Result<RangeSummary, EngineError> {
    calculation.interrupt().check()?;

    let origin = group.origin();
    if !calculation.arena().contains(origin) {
        return Err(EngineError::OriginOutsideNetwork(origin));
    }
    let tracker = calculation.tracker();
    check_order(&tracker, group.times())?;

    let strategy = calculation.strategy();
    let algorithm = DynamicProgrammingAlgorithm::new(calculation);
    let origin_walks = match strategy {
        Strategy::Progressive => lookup_origin_walks(calculation, origin)?,
        Strategy::Repeated | Strategy::Incremental => None,
    };

    let mut summary = RangeSummary::default();
    let mut previous: Option<ReachabilityTable> = None;

    for &time in group.times() {
        calculation.interrupt().check()?;
        let cutoff = tracker.cutoff(time, calculation.longest_duration());

        let (table, rounds, reused) = match previous.take() {
            Some(mut table) if strategy != Strategy::Repeated => {
                let (rounds, reused) =
                    slide(&algorithm, &mut table, time, cutoff, origin_walks.as_deref())?;
                (table, rounds, reused)
            }
            _ => {
                let table = algorithm.build_with(time, cutoff, origin, origin_walks.as_deref())?;
                let rounds = table.rounds();
                (table, rounds, 0)
            }
        };

        let written = score(calculation, group, time, &table)?;
        debug!(
            origin = %origin,
            time = %time,
            reached = table.len(),
            rounds,
            reused,
            "Scored time step"
        );

        summary.steps += 1;
        summary.records_written += written;
        summary.rounds += rounds;
        summary.reused += reused;
        previous = Some(table);
    }

    debug!(
        group = %group.id(),
        ?strategy,
        steps = summary.steps,
        rounds = summary.rounds,
        reused = summary.reused,
        "Finished task group"
    );
    Ok(summary)
}

/// Walking hops from the origin at the full travel budget.
fn lookup_origin_walks(
    calculation: &Calculation,
    origin: LocationId,
) -> Result<Option<Vec<WalkHop>>, EngineError> {
    if !calculation.modes().allows(Mode::Walking) {
        return Ok(None);
    }
    let hops = calculation
        .client()
        .walking_reach(origin, calculation.longest_duration())
        .map_err(EngineError::from_reach)?;
    Ok(Some(hops))
}

/// Move `table` to `start` and propagate from the reset origin and every
/// surviving record. Returns the rounds run and the number of survivors.
fn slide(
    algorithm: &DynamicProgrammingAlgorithm<'_>,
    table: &mut ReachabilityTable,
    start: Time,
    cutoff: Time,
    origin_walks: Option<&[WalkHop]>,
) -> Result<(usize, usize), EngineError> {
    let outcome = table.slide(&algorithm.tracker(), start, cutoff)?;

    let mut frontier = Frontier::new();
    frontier.insert(table.origin(), Expansion::FULL);
    for &(location, slack_grew) in &outcome.survivors {
        frontier.insert(
            location,
            Expansion {
                transit: true,
                walking: slack_grew,
            },
        );
    }

    let rounds = algorithm.propagate(table, frontier, origin_walks)?;
    Ok((rounds, outcome.survivors.len()))
}

/// Assemble and record an itinerary for every location in `table`.
fn score(
    calculation: &Calculation,
    group: &TaskGroup,
    time: Time,
    table: &ReachabilityTable,
) -> Result<usize, EngineError> {
    let assembler = MovementAssembler::for_direction(calculation.direction());
    let task = group.task(time);
    let card = calculation.score_card();

    let mut written = 0;
    for (location, _) in table.iter() {
        let itinerary = assembler.assemble(location, table, calculation.network())?;
        card.put_path(location, &task, itinerary);
        written += 1;
    }
    Ok(written)
}
