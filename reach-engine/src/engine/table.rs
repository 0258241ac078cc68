//! Reachability tables.
//!
//! A table is a flat, `LocationId`-indexed store of one record per reached
//! location, with predecessors kept in a separate column. Predecessor
//! chains are handles into the same table, never references.

use std::collections::BTreeMap;

use chrono::Duration;

use super::{EngineError, TimeTracker};
use crate::domain::{LocationId, ModeInfo, Time};

/// The best known way of reaching one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub reach_time: Time,
    pub mode: ModeInfo,
    /// Most extreme origin start for which this record's path is still
    /// feasible; `None` only for the origin itself.
    pub anchor: Option<Time>,
}

/// What survived sliding a table to a new start time.
#[derive(Debug, Clone, Default)]
pub struct Slide {
    /// Surviving non-origin locations, each with whether its slack grew.
    pub survivors: Vec<(LocationId, bool)>,
    pub pruned: usize,
}

/// Per-origin mapping from location to its best record.
#[derive(Debug, Clone)]
pub struct ReachabilityTable {
    origin: LocationId,
    start: Time,
    cutoff: Time,
    records: Vec<Option<Record>>,
    predecessors: Vec<Option<LocationId>>,
    reached: usize,
    rounds: usize,
}

impl ReachabilityTable {
    /// A table holding only the origin, sized for `capacity` locations.
    pub fn seeded(origin: LocationId, start: Time, cutoff: Time, capacity: usize) -> Self {
        let mut table = Self {
            origin,
            start,
            cutoff,
            records: vec![None; capacity.max(origin.index() + 1)],
            predecessors: vec![None; capacity.max(origin.index() + 1)],
            reached: 0,
            rounds: 0,
        };
        table.set(origin, origin_record(start), None);
        table
    }

    pub fn origin(&self) -> LocationId {
        self.origin
    }

    pub fn start(&self) -> Time {
        self.start
    }

    pub fn cutoff(&self) -> Time {
        self.cutoff
    }

    /// Rounds spent producing this table, including earlier steps it was
    /// derived from.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub(crate) fn add_rounds(&mut self, rounds: usize) {
        self.rounds += rounds;
    }

    pub fn get(&self, location: LocationId) -> Option<&Record> {
        self.records.get(location.index()).and_then(Option::as_ref)
    }

    pub fn predecessor(&self, location: LocationId) -> Option<LocationId> {
        self.predecessors.get(location.index()).copied().flatten()
    }

    pub fn contains(&self, location: LocationId) -> bool {
        self.get(location).is_some()
    }

    /// Number of reached locations, origin included.
    pub fn len(&self) -> usize {
        self.reached
    }

    pub fn is_empty(&self) -> bool {
        self.reached == 0
    }

    /// Iterate over reached locations in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (LocationId, &Record)> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|r| (LocationId(i as u32), r)))
    }

    /// Reach time per reached location.
    pub fn reach_times(&self) -> BTreeMap<LocationId, Time> {
        self.iter().map(|(loc, r)| (loc, r.reach_time)).collect()
    }

    /// Store `record` for `location` if it is new or strictly better.
    ///
    /// Returns whether the table changed.
    pub fn offer(
        &mut self,
        tracker: &TimeTracker,
        location: LocationId,
        record: Record,
        predecessor: LocationId,
    ) -> bool {
        let improves = match self.get(location) {
            None => true,
            Some(current) => tracker.is_better(record.reach_time, current.reach_time),
        };
        if improves {
            self.set(location, record, Some(predecessor));
        }
        improves
    }

    /// Locations on the chain from `location` back to the origin, starting
    /// with `location` itself and ending with the origin.
    pub fn chain(&self, location: LocationId) -> Result<Vec<LocationId>, EngineError> {
        let mut chain = Vec::new();
        let mut current = location;
        loop {
            if !self.contains(current) || chain.len() >= self.reached {
                return Err(EngineError::BrokenPredecessorChain(location));
            }
            chain.push(current);
            match self.predecessor(current) {
                Some(p) => current = p,
                None if current == self.origin => return Ok(chain),
                None => return Err(EngineError::BrokenPredecessorChain(location)),
            }
        }
    }

    /// Move the table to a new start time and cutoff.
    ///
    /// Drops every record whose reach time misses the new cutoff or whose
    /// anchor does not hold for the new start, then every record whose
    /// predecessor chain passes through a dropped one. The origin is reset
    /// to the new start.
    pub fn slide(
        &mut self,
        tracker: &TimeTracker,
        start: Time,
        cutoff: Time,
    ) -> Result<Slide, EngineError> {
        let previous_cutoff = self.cutoff;
        let keeps = |record: &Record| {
            tracker.within(record.reach_time, cutoff)
                && record.anchor.is_none_or(|a| tracker.anchor_holds(a, start))
        };

        // None: undecided
        let mut verdict: Vec<Option<bool>> = vec![None; self.records.len()];
        verdict[self.origin.index()] = Some(true);

        for index in 0..self.records.len() {
            if self.records[index].is_none() || verdict[index].is_some() {
                continue;
            }
            let mut pending = Vec::new();
            let mut current = LocationId(index as u32);
            let alive = loop {
                if let Some(v) = verdict[current.index()] {
                    break v;
                }
                if pending.len() > self.reached {
                    return Err(EngineError::BrokenPredecessorChain(LocationId(index as u32)));
                }
                pending.push(current);
                let Some(record) = self.get(current) else {
                    return Err(EngineError::BrokenPredecessorChain(LocationId(index as u32)));
                };
                if !keeps(record) {
                    break false;
                }
                match self.predecessor(current) {
                    Some(p) => current = p,
                    None => return Err(EngineError::BrokenPredecessorChain(current)),
                }
            };
            for loc in pending {
                verdict[loc.index()] = Some(alive);
            }
        }

        let mut slide = Slide::default();
        for (index, alive) in verdict.into_iter().enumerate() {
            let location = LocationId(index as u32);
            match alive {
                Some(true) if location != self.origin => {
                    let reach = self.records[index].map(|r| r.reach_time);
                    let grew = reach.is_some_and(|reach| {
                        slack_grew(tracker, reach, previous_cutoff, cutoff)
                    });
                    slide.survivors.push((location, grew));
                }
                Some(false) => {
                    self.clear(location);
                    slide.pruned += 1;
                }
                _ => {}
            }
        }

        self.start = start;
        self.cutoff = cutoff;
        self.set(self.origin, origin_record(start), None);
        Ok(slide)
    }

    fn set(&mut self, location: LocationId, record: Record, predecessor: Option<LocationId>) {
        let index = location.index();
        if index >= self.records.len() {
            self.records.resize(index + 1, None);
            self.predecessors.resize(index + 1, None);
        }
        if self.records[index].is_none() {
            self.reached += 1;
        }
        self.records[index] = Some(record);
        self.predecessors[index] = predecessor;
    }

    fn clear(&mut self, location: LocationId) {
        let index = location.index();
        if self.records[index].take().is_some() {
            self.reached -= 1;
        }
        self.predecessors[index] = None;
    }
}

fn origin_record(start: Time) -> Record {
    Record {
        reach_time: start,
        mode: ModeInfo::Origin,
        anchor: None,
    }
}

fn slack_grew(tracker: &TimeTracker, reach: Time, before: Time, after: Time) -> bool {
    let old: Duration = tracker.slack(reach, before);
    tracker.slack(reach, after) > old
}
