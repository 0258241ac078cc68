//! Location identity.
//!
//! A `VisitableLocation` is anything a rider can reach: a transit stop, a
//! grid sector, or an ad hoc landmark. Locations are interned into a
//! `LocationArena`, which hands out dense `LocationId` handles. Reachability
//! tables are indexed by these handles rather than by the locations
//! themselves.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

typed_id! {
    /// Handle of an interned location; dense from zero.
    pub struct LocationId(u32);
}

typed_id! {
    /// Identifier of a transit stop in the network's own numbering.
    pub struct StopId(u32);
}

typed_id! {
    /// Identifier of a grid cell in the sector index.
    pub struct SectorId(u32);
}

typed_id! {
    /// Identifier of an ad hoc point of interest.
    pub struct LandmarkId(u32);
}

/// Something a rider can be at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum VisitableLocation {
    TransitStop(StopId),
    Sector(SectorId),
    Landmark(LandmarkId),
}

impl VisitableLocation {
    /// Returns true if riders can board or alight scheduled transit here.
    pub fn is_transit_stop(&self) -> bool {
        matches!(self, VisitableLocation::TransitStop(_))
    }
}

impl fmt::Display for VisitableLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisitableLocation::TransitStop(id) => write!(f, "stop:{}", id.0),
            VisitableLocation::Sector(id) => write!(f, "sector:{}", id.0),
            VisitableLocation::Landmark(id) => write!(f, "landmark:{}", id.0),
        }
    }
}

/// Interning arena for locations.
///
/// Interning the same location twice returns the same handle. Handles are
/// never reused or removed, so a `LocationId` stays valid for the life of
/// the arena.
#[derive(Debug, Clone, Default)]
pub struct LocationArena {
    locations: Vec<VisitableLocation>,
    ids: HashMap<VisitableLocation, LocationId>,
}

impl LocationArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a location, returning its handle.
    pub fn intern(&mut self, location: VisitableLocation) -> LocationId {
        if let Some(id) = self.ids.get(&location) {
            return *id;
        }
        let id = LocationId(self.locations.len() as u32);
        self.locations.push(location);
        self.ids.insert(location, id);
        id
    }

    /// Look up the handle of an already interned location.
    pub fn id_of(&self, location: &VisitableLocation) -> Option<LocationId> {
        self.ids.get(location).copied()
    }

    /// Resolve a handle back to its location.
    pub fn get(&self, id: LocationId) -> Option<&VisitableLocation> {
        self.locations.get(id.index())
    }

    /// Returns true if the handle was issued by this arena.
    pub fn contains(&self, id: LocationId) -> bool {
        id.index() < self.locations.len()
    }

    /// Number of interned locations.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Returns true if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Iterate over `(handle, location)` pairs in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (LocationId, &VisitableLocation)> {
        self.locations
            .iter()
            .enumerate()
            .map(|(i, loc)| (LocationId(i as u32), loc))
    }
}
