//! How a location was reached.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{RouteId, Time, TripId};

/// Travel mode a calculation may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Walking,
    Transit,
}

/// The set of modes a calculation permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSet {
    pub walking: bool,
    pub transit: bool,
}

impl ModeSet {
    /// Walking and transit both allowed.
    pub fn all() -> Self {
        Self {
            walking: true,
            transit: true,
        }
    }

    /// Only the given mode allowed.
    pub fn only(mode: Mode) -> Self {
        Self {
            walking: mode == Mode::Walking,
            transit: mode == Mode::Transit,
        }
    }

    pub fn allows(&self, mode: Mode) -> bool {
        match mode {
            Mode::Walking => self.walking,
            Mode::Transit => self.transit,
        }
    }
}

impl Default for ModeSet {
    fn default() -> Self {
        Self::all()
    }
}

/// Cost of one walking hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalkCost {
    pub distance_m: u32,
    pub duration: Duration,
}

impl WalkCost {
    pub fn new(distance_m: u32, duration: Duration) -> Self {
        Self {
            distance_m,
            duration,
        }
    }
}

/// The scheduled event a transit hop hangs off.
///
/// `time` is the event at the predecessor stop: the departure there for a
/// forward search, the arrival there for a backward one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Boarding {
    pub trip: TripId,
    pub route: RouteId,
    pub time: Time,
}

/// How a record's location was reached from its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeInfo {
    /// The search origin; no hop.
    Origin,
    Walking(WalkCost),
    Transit(Boarding),
}

impl ModeInfo {
    pub fn is_walking(&self) -> bool {
        matches!(self, ModeInfo::Walking(_))
    }

    pub fn is_transit(&self) -> bool {
        matches!(self, ModeInfo::Transit(_))
    }

    /// The travel mode, or `None` for the origin.
    pub fn mode(&self) -> Option<Mode> {
        match self {
            ModeInfo::Origin => None,
            ModeInfo::Walking(_) => Some(Mode::Walking),
            ModeInfo::Transit(_) => Some(Mode::Transit),
        }
    }
}
