//! Completed buildings placed in the world

use serde::{Deserialize, Serialize};

use crate::catalog::{BuildingKind, Orientation};
use crate::core::types::{BuildingId, Coord, IslandId};

/// A fully constructed building occupying its footprint tiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub kind: BuildingKind,
    pub island: IslandId,
    pub origin: Coord,
    pub orientation: Orientation,
    pub footprint: Vec<Coord>,
}
