//! Island claims and the village/production land split

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::types::{Coord, IslandId};
use crate::world::{Island, TerrainClass};

/// A claim on one island, with its constructible land split between the
/// village and the production area.
///
/// Created when a founding mission is dispatched; released if the mission
/// fails, handed to the new settlement manager if it succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandManager {
    pub island: IslandId,
    /// Feeder settlements produce surplus for founding further settlements
    pub feeder: bool,
    village: BTreeSet<Coord>,
    production: BTreeSet<Coord>,
}

impl LandManager {
    /// Claim an island. Feeder islands keep all land for production; village
    /// settlements reserve a compact block of central flat land for housing.
    pub fn new(island: &Island, feeder: bool) -> Self {
        let constructible: BTreeSet<Coord> = island.constructible_coords().collect();
        let mut village = BTreeSet::new();
        if !feeder {
            let flats: Vec<Coord> = constructible
                .iter()
                .copied()
                .filter(|&c| island.terrain(c) == TerrainClass::Flat)
                .collect();
            if !flats.is_empty() {
                let cx = flats.iter().map(|c| c.x).sum::<i32>() / flats.len() as i32;
                let cy = flats.iter().map(|c| c.y).sum::<i32>() / flats.len() as i32;
                let centre = Coord::new(cx, cy);
                let width = flats.iter().map(|c| c.x).max().unwrap_or(cx)
                    - flats.iter().map(|c| c.x).min().unwrap_or(cx)
                    + 1;
                let height = flats.iter().map(|c| c.y).max().unwrap_or(cy)
                    - flats.iter().map(|c| c.y).min().unwrap_or(cy)
                    + 1;
                let radius = (width.min(height) / 4).max(2) as u32;
                village = flats
                    .into_iter()
                    .filter(|c| c.chebyshev_distance(centre) <= radius)
                    .collect();
            }
        }
        let production: BTreeSet<Coord> = constructible.difference(&village).copied().collect();
        Self {
            island: island.id,
            feeder,
            village,
            production,
        }
    }

    pub fn village_area(&self) -> &BTreeSet<Coord> {
        &self.village
    }

    pub fn production_area(&self) -> &BTreeSet<Coord> {
        &self.production
    }

    /// Every coordinate of the claim
    pub fn claimed(&self) -> BTreeSet<Coord> {
        self.village.union(&self.production).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_is_disjoint_and_covers() {
        let island = Island::rect(IslandId(0), Coord::new(0, 0), 24, 24);
        let land = LandManager::new(&island, false);
        assert!(!land.village_area().is_empty());
        assert!(!land.production_area().is_empty());
        assert!(land.village_area().is_disjoint(land.production_area()));
        let all: BTreeSet<Coord> = island.constructible_coords().collect();
        assert_eq!(land.claimed(), all);
    }

    #[test]
    fn test_feeder_island_is_all_production() {
        let island = Island::rect(IslandId(0), Coord::new(0, 0), 24, 24);
        let land = LandManager::new(&island, true);
        assert!(land.village_area().is_empty());
        let all: BTreeSet<Coord> = island.constructible_coords().collect();
        assert_eq!(*land.production_area(), all);
    }

    #[test]
    fn test_village_is_flat_land_only() {
        let island = Island::rect(IslandId(0), Coord::new(0, 0), 24, 24);
        let land = LandManager::new(&island, false);
        for &coord in land.village_area() {
            assert_eq!(island.terrain(coord), TerrainClass::Flat);
        }
    }
}
