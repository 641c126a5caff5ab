//! Prospective construction jobs
//!
//! A `Builder` binds a building kind to a concrete footprint and resource
//! cost before anything is committed. Execution is atomic: either the world
//! accepts the placement and the cost is paid, or nothing changes.

use serde::{Deserialize, Serialize};

use crate::catalog::{BuildingCatalog, BuildingKind, Orientation};
use crate::core::types::{BuildingId, Coord, IslandId, Resource};
use crate::plan::grid_plan::GridPlan;
use crate::world::{Stock, TerrainClass, World};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Builder {
    pub kind: BuildingKind,
    pub origin: Coord,
    pub orientation: Orientation,
    pub footprint: Vec<Coord>,
    pub cost: Vec<(Resource, u32)>,
}

impl Builder {
    pub fn create(catalog: &BuildingCatalog, kind: BuildingKind, origin: Coord) -> Self {
        Self::create_oriented(catalog, kind, origin, Orientation::Horizontal)
    }

    pub fn create_oriented(
        catalog: &BuildingCatalog,
        kind: BuildingKind,
        origin: Coord,
        orientation: Orientation,
    ) -> Self {
        let profile = catalog.profile(kind);
        Self {
            kind,
            origin,
            orientation,
            footprint: profile.footprint(origin, orientation),
            cost: profile.cost.clone(),
        }
    }

    /// Whether the footprint sits entirely on free plan cells
    pub fn fits_plan(&self, plan: &GridPlan) -> bool {
        self.footprint.iter().all(|&coord| plan.is_free(coord))
    }

    /// Whether every footprint tile has the given terrain
    pub fn on_terrain(&self, world: &World, island: IslandId, terrain: TerrainClass) -> bool {
        let Some(island) = world.island(island) else {
            return false;
        };
        self.footprint
            .iter()
            .all(|&coord| island.terrain(coord) == terrain)
    }

    /// Smallest chebyshev distance from the footprint to a coordinate
    pub fn distance_to(&self, coord: Coord) -> u32 {
        self.footprint
            .iter()
            .map(|c| c.chebyshev_distance(coord))
            .min()
            .unwrap_or(u32::MAX)
    }

    /// Cells within `radius` of the footprint, excluding the footprint itself
    pub fn radius_coords(&self, radius: u32) -> Vec<Coord> {
        let min_x = self.footprint.iter().map(|c| c.x).min().unwrap_or(0);
        let max_x = self.footprint.iter().map(|c| c.x).max().unwrap_or(0);
        let min_y = self.footprint.iter().map(|c| c.y).min().unwrap_or(0);
        let max_y = self.footprint.iter().map(|c| c.y).max().unwrap_or(0);
        let r = radius as i32;
        let mut coords = Vec::new();
        for x in (min_x - r)..=(max_x + r) {
            for y in (min_y - r)..=(max_y + r) {
                if x >= min_x && x <= max_x && y >= min_y && y <= max_y {
                    continue;
                }
                coords.push(Coord::new(x, y));
            }
        }
        coords
    }

    /// Plan cells edge-adjacent to the footprint
    pub fn neighbour_coords(&self) -> Vec<Coord> {
        let mut coords = Vec::new();
        for &cell in &self.footprint {
            for n in cell.neighbours4() {
                if !self.footprint.contains(&n) && !coords.contains(&n) {
                    coords.push(n);
                }
            }
        }
        coords.sort();
        coords
    }

    /// The one-cell ring around a footprint
    pub fn ring_around(footprint: &[Coord]) -> Vec<Coord> {
        let min_x = footprint.iter().map(|c| c.x).min().unwrap_or(0) - 1;
        let max_x = footprint.iter().map(|c| c.x).max().unwrap_or(0) + 1;
        let min_y = footprint.iter().map(|c| c.y).min().unwrap_or(0) - 1;
        let max_y = footprint.iter().map(|c| c.y).max().unwrap_or(0) + 1;
        let mut ring = Vec::new();
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                if x == min_x || x == max_x || y == min_y || y == max_y {
                    ring.push(Coord::new(x, y));
                }
            }
        }
        ring
    }

    /// Pay the cost and construct the building. Returns `None`, leaving both
    /// stock and world untouched, if the stock cannot cover the cost or the
    /// world refuses the placement.
    pub fn execute(
        &self,
        world: &mut World,
        catalog: &BuildingCatalog,
        island: IslandId,
        stock: &mut Stock,
    ) -> Option<BuildingId> {
        if !stock.has_materials(&self.cost) {
            return None;
        }
        let id = world.construct(catalog, self.kind, island, self.origin, self.orientation)?;
        stock.consume_materials(&self.cost);
        Some(id)
    }
}
