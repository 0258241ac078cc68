//! Direction-aware time arithmetic.
//!
//! Everything in the engine that depends on whether a search runs forward
//! or backward in time goes through a `TimeTracker`, so the builder and the
//! range executors are written once for both directions.

use std::cmp::Ordering;

use chrono::Duration;

use crate::domain::{Direction, Time, TimeWindow};
use crate::network::RiderPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeTracker {
    direction: Direction,
}

impl TimeTracker {
    pub const fn new(direction: Direction) -> Self {
        Self { direction }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Move `time` by `by` in the search direction.
    pub fn advance(&self, time: Time, by: Duration) -> Time {
        match self.direction {
            Direction::Forward => time + by,
            Direction::Backward => time - by,
        }
    }

    /// The boundary of a search that starts at `start` with budget `duration`.
    pub fn cutoff(&self, start: Time, duration: Duration) -> Time {
        self.advance(start, duration)
    }

    /// Whether `candidate` strictly beats `current`: earlier forward, later backward.
    pub fn is_better(&self, candidate: Time, current: Time) -> bool {
        self.compare(candidate, current) == Ordering::Less
    }

    /// Order times best-first.
    pub fn compare(&self, a: Time, b: Time) -> Ordering {
        match self.direction {
            Direction::Forward => a.cmp(&b),
            Direction::Backward => b.cmp(&a),
        }
    }

    /// Whether `time` is on the near side of (or at) `cutoff`.
    pub fn within(&self, time: Time, cutoff: Time) -> bool {
        self.compare(time, cutoff) != Ordering::Greater
    }

    /// Budget left between `reach` and `cutoff`; negative once past it.
    pub fn slack(&self, reach: Time, cutoff: Time) -> Duration {
        match self.direction {
            Direction::Forward => cutoff.signed_duration_since(reach),
            Direction::Backward => reach.signed_duration_since(cutoff),
        }
    }

    /// Whether a record anchored at `anchor` stays feasible for a search
    /// starting at `start`.
    ///
    /// Forward anchors are the latest usable start; backward anchors the
    /// earliest usable arrival deadline.
    pub fn anchor_holds(&self, anchor: Time, start: Time) -> bool {
        self.within(start, anchor)
    }

    /// The anchor of a transit hop out of (forward) or into (backward) the
    /// origin: the most extreme start that still makes the scheduled event
    /// with the boarding buffer.
    pub fn boarding_anchor(&self, event: Time, buffer: Duration) -> Time {
        match self.direction {
            Direction::Forward => event - buffer,
            Direction::Backward => event + buffer,
        }
    }

    /// Whether `next` strictly follows `previous` in the order a task
    /// group's times are processed: ascending forward, descending backward.
    pub fn follows(&self, previous: Time, next: Time) -> bool {
        match self.direction {
            Direction::Forward => previous < next,
            Direction::Backward => previous > next,
        }
    }

    /// Sort and deduplicate times into processing order.
    pub fn sequence(&self, times: &mut Vec<Time>) {
        times.sort_unstable();
        times.dedup();
        if self.direction == Direction::Backward {
            times.reverse();
        }
    }

    /// Where scheduled events at a stop are usable from a record at `reach`.
    pub fn wait_window(&self, policy: &RiderPolicy, reach: Time, cutoff: Time) -> Option<TimeWindow> {
        policy.wait_window(reach, cutoff, self.direction)
    }
}
