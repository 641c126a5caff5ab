//! Islands and their tile ground maps

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::{Coord, IslandId};

/// Terrain classification of a single tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainClass {
    /// Shallow water along the island rim
    Water,
    /// Constructible shoreline; fishers and branch offices sit here
    Coast,
    /// Constructible flat land
    Flat,
}

impl TerrainClass {
    pub fn constructible(&self) -> bool {
        matches!(self, TerrainClass::Coast | TerrainClass::Flat)
    }
}

/// Natural deposit occupying a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Deposit {
    Clay,
    Fish,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Tile {
    pub terrain: TerrainClass,
    pub deposit: Option<Deposit>,
}

/// One island: a ground map plus the deposits the AI cares about.
///
/// Coordinates are world-global; islands are generated at disjoint origins so
/// a `Coord` identifies at most one tile anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Island {
    pub id: IslandId,
    #[serde(with = "crate::core::types::coord_map")]
    ground: BTreeMap<Coord, Tile>,
    /// Origins of 2x2 clay patches
    pub clay_deposits: Vec<Coord>,
    /// Fish swarm positions in the surrounding water
    pub fish_deposits: Vec<Coord>,
    /// Water tile ships sail to when visiting the island
    pub anchorage: Coord,
}

impl Island {
    /// Generate a rectangular island: a one-tile water rim, a one-tile coast
    /// ring, flat interior. Deposits are added by the caller.
    pub fn rect(id: IslandId, origin: Coord, width: i32, height: i32) -> Self {
        let mut ground = BTreeMap::new();
        for dx in 0..width {
            for dy in 0..height {
                let coord = origin.offset(dx, dy);
                let terrain = if dx == 0 || dy == 0 || dx == width - 1 || dy == height - 1 {
                    TerrainClass::Water
                } else if dx == 1 || dy == 1 || dx == width - 2 || dy == height - 2 {
                    TerrainClass::Coast
                } else {
                    TerrainClass::Flat
                };
                ground.insert(
                    coord,
                    Tile {
                        terrain,
                        deposit: None,
                    },
                );
            }
        }
        Self {
            id,
            ground,
            clay_deposits: Vec::new(),
            fish_deposits: Vec::new(),
            anchorage: origin,
        }
    }

    pub fn tile(&self, coord: Coord) -> Option<&Tile> {
        self.ground.get(&coord)
    }

    pub fn terrain(&self, coord: Coord) -> TerrainClass {
        // anything off the ground map is open sea
        self.tile(coord)
            .map(|t| t.terrain)
            .unwrap_or(TerrainClass::Water)
    }

    pub fn is_water(&self, coord: Coord) -> bool {
        self.terrain(coord) == TerrainClass::Water
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.ground.contains_key(&coord)
    }

    /// All constructible coordinates in deterministic order
    pub fn constructible_coords(&self) -> impl Iterator<Item = Coord> + '_ {
        self.ground
            .iter()
            .filter(|(_, tile)| tile.terrain.constructible())
            .map(|(&coord, _)| coord)
    }

    /// Place a 2x2 clay patch with its origin at `origin`
    pub fn add_clay_deposit(&mut self, origin: Coord) {
        for dx in 0..2 {
            for dy in 0..2 {
                if let Some(tile) = self.ground.get_mut(&origin.offset(dx, dy)) {
                    tile.deposit = Some(Deposit::Clay);
                }
            }
        }
        self.clay_deposits.push(origin);
    }

    /// Register a fish swarm on a water tile
    pub fn add_fish_deposit(&mut self, coord: Coord) {
        if let Some(tile) = self.ground.get_mut(&coord) {
            tile.deposit = Some(Deposit::Fish);
        }
        self.fish_deposits.push(coord);
    }
}
