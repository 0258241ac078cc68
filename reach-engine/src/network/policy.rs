//! Rider boarding policy.

use std::collections::HashSet;

use chrono::Duration;

use crate::domain::{Direction, RouteId, Time, TimeWindow};

/// What a rider is willing to board.
///
/// The policy is applied uniformly to every location regardless of how it
/// was reached, which keeps reach times independent of search order.
#[derive(Debug, Clone, Default)]
pub struct RiderPolicy {
    /// Time a rider needs at a stop before a vehicle leaves.
    pub boarding_buffer: Duration,
    /// Routes the rider will not use.
    pub excluded_routes: HashSet<RouteId>,
}

impl RiderPolicy {
    pub fn new(boarding_buffer: Duration) -> Self {
        Self {
            boarding_buffer,
            excluded_routes: HashSet::new(),
        }
    }

    pub fn excluding(mut self, route: RouteId) -> Self {
        self.excluded_routes.insert(route);
        self
    }

    /// Whether the rider will ride `route`.
    pub fn permits(&self, route: RouteId) -> bool {
        !self.excluded_routes.contains(&route)
    }

    /// The window in which scheduled events at a stop are usable by a rider
    /// whose record there is `reach`.
    ///
    /// Forward: from `reach + buffer` up to `cutoff`. Backward: from `cutoff`
    /// up to `reach - buffer`. Returns `None` when the buffer leaves no room.
    pub fn wait_window(&self, reach: Time, cutoff: Time, direction: Direction) -> Option<TimeWindow> {
        match direction {
            Direction::Forward => TimeWindow::new(reach.checked_add(self.boarding_buffer)?, cutoff),
            Direction::Backward => TimeWindow::new(cutoff, reach.checked_sub(self.boarding_buffer)?),
        }
    }
}
