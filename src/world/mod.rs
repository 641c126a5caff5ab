//! The game-world collaborator: islands, buildings, roads and ships
//!
//! The decision engine does not own a renderer or a network layer; this
//! module is the minimal world state the planners read and mutate. All
//! containers iterate in deterministic order.

pub mod building;
pub mod island;
pub mod ship;
pub mod stock;

pub use building::Building;
pub use island::{Deposit, Island, TerrainClass, Tile};
pub use ship::Ship;
pub use stock::Stock;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::{BuildingCatalog, BuildingKind, Orientation};
use crate::core::types::{BuildingId, Coord, IslandId, ShipId, Tick};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    pub tick: Tick,
    islands: BTreeMap<IslandId, Island>,
    buildings: BTreeMap<BuildingId, Building>,
    /// Tile -> building occupying it (every footprint cell is indexed)
    #[serde(with = "crate::core::types::coord_map")]
    occupancy: BTreeMap<Coord, BuildingId>,
    roads: BTreeSet<Coord>,
    ships: BTreeMap<ShipId, Ship>,
    next_island: u32,
    next_building: u32,
    next_ship: u32,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    // === ISLANDS ===

    /// Reserve the next island id; the caller builds the island around it
    pub fn allocate_island_id(&mut self) -> IslandId {
        let id = IslandId(self.next_island);
        self.next_island += 1;
        id
    }

    pub fn insert_island(&mut self, island: Island) {
        self.islands.insert(island.id, island);
    }

    pub fn island(&self, id: IslandId) -> Option<&Island> {
        self.islands.get(&id)
    }

    pub fn islands(&self) -> impl Iterator<Item = &Island> {
        self.islands.values()
    }

    /// Free constructible flat land on an island: flat terrain, no building
    pub fn flat_land(&self, id: IslandId) -> u32 {
        let Some(island) = self.islands.get(&id) else {
            return 0;
        };
        island
            .constructible_coords()
            .filter(|&coord| {
                island.terrain(coord) == TerrainClass::Flat
                    && !self.occupancy.contains_key(&coord)
            })
            .count() as u32
    }

    // === BUILDINGS ===

    /// Construct a building, claiming every footprint tile.
    ///
    /// Atomic: if any footprint tile is already occupied or not constructible
    /// the world is left untouched and `None` is returned.
    pub fn construct(
        &mut self,
        catalog: &BuildingCatalog,
        kind: BuildingKind,
        island_id: IslandId,
        origin: Coord,
        orientation: Orientation,
    ) -> Option<BuildingId> {
        let island = self.islands.get(&island_id)?;
        let footprint = catalog.profile(kind).footprint(origin, orientation);
        for &coord in &footprint {
            let tile = island.tile(coord)?;
            if !tile.terrain.constructible() {
                return None;
            }
            if self.occupancy.contains_key(&coord) || self.roads.contains(&coord) {
                return None;
            }
        }

        let id = BuildingId(self.next_building);
        self.next_building += 1;
        for &coord in &footprint {
            self.occupancy.insert(coord, id);
        }
        self.buildings.insert(
            id,
            Building {
                id,
                kind,
                island: island_id,
                origin,
                orientation,
                footprint,
            },
        );
        Some(id)
    }

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(&id)
    }

    pub fn building_at(&self, coord: Coord) -> Option<&Building> {
        self.occupancy.get(&coord).and_then(|id| self.buildings.get(id))
    }

    pub fn is_occupied(&self, coord: Coord) -> bool {
        self.occupancy.contains_key(&coord)
    }

    pub fn buildings_on(&self, island: IslandId) -> impl Iterator<Item = &Building> {
        self.buildings.values().filter(move |b| b.island == island)
    }

    // === ROADS ===

    pub fn build_road(&mut self, coord: Coord) {
        self.roads.insert(coord);
    }

    pub fn is_road(&self, coord: Coord) -> bool {
        self.roads.contains(&coord)
    }

    // === SHIPS ===

    pub fn spawn_ship(&mut self, position: Coord) -> ShipId {
        let id = ShipId(self.next_ship);
        self.next_ship += 1;
        self.ships.insert(id, Ship::new(id, position));
        id
    }

    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.get(&id)
    }

    pub fn ship_mut(&mut self, id: ShipId) -> Option<&mut Ship> {
        self.ships.get_mut(&id)
    }

    pub fn ships(&self) -> impl Iterator<Item = &Ship> {
        self.ships.values()
    }

    /// Advance the world by one tick; ships make voyage progress
    pub fn advance(&mut self) {
        self.tick += 1;
        for ship in self.ships.values_mut() {
            ship.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_island() -> (World, IslandId) {
        let mut world = World::new();
        let id = world.allocate_island_id();
        world.insert_island(Island::rect(id, Coord::new(0, 0), 16, 16));
        (world, id)
    }

    #[test]
    fn test_construct_claims_footprint() {
        let (mut world, island) = world_with_island();
        let catalog = BuildingCatalog::standard();
        let id = world
            .construct(
                &catalog,
                BuildingKind::Farm,
                island,
                Coord::new(4, 4),
                Orientation::Horizontal,
            )
            .unwrap();
        assert_eq!(world.building_at(Coord::new(6, 6)).unwrap().id, id);
        assert!(world.is_occupied(Coord::new(4, 4)));
        assert!(!world.is_occupied(Coord::new(7, 7)));
    }

    #[test]
    fn test_construct_refuses_overlap_atomically() {
        let (mut world, island) = world_with_island();
        let catalog = BuildingCatalog::standard();
        world
            .construct(
                &catalog,
                BuildingKind::Storage,
                island,
                Coord::new(6, 6),
                Orientation::Horizontal,
            )
            .unwrap();
        // overlaps the storage corner
        assert!(world
            .construct(
                &catalog,
                BuildingKind::Farm,
                island,
                Coord::new(5, 5),
                Orientation::Horizontal,
            )
            .is_none());
        // and no cell of the refused farm was claimed
        assert!(!world.is_occupied(Coord::new(5, 5)));
    }

    #[test]
    fn test_construct_refuses_water() {
        let (mut world, island) = world_with_island();
        let catalog = BuildingCatalog::standard();
        assert!(world
            .construct(
                &catalog,
                BuildingKind::Farm,
                island,
                Coord::new(0, 0),
                Orientation::Horizontal,
            )
            .is_none());
    }

    #[test]
    fn test_flat_land_shrinks_with_construction() {
        let (mut world, island) = world_with_island();
        let catalog = BuildingCatalog::standard();
        let before = world.flat_land(island);
        world
            .construct(
                &catalog,
                BuildingKind::Farm,
                island,
                Coord::new(4, 4),
                Orientation::Horizontal,
            )
            .unwrap();
        assert_eq!(world.flat_land(island), before - 9);
    }
}
