//! Building archetype registry
//!
//! One profile per building kind: footprint size, construction cost, and the
//! handful of per-kind constants the planners consult. The catalog is built
//! once at startup and passed by reference to every component that needs it;
//! nothing reads archetype data from ambient state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::{Coord, Resource};

/// Closed set of building archetypes known to the AI
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    BranchOffice,
    Storage,
    Lumberjack,
    Tree,
    Fisher,
    Farm,
    PotatoField,
    Pasture,
    SugarcaneField,
    Weaver,
    Distillery,
    ClayPit,
    Brickyard,
    MainSquare,
    Pavilion,
    VillageSchool,
    Tavern,
    Residence,
}

/// Orientation of a rectangular footprint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Static data describing one building archetype
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingProfile {
    pub kind: BuildingKind,
    /// Footprint (width, height) in its horizontal orientation
    pub size: (i32, i32),
    pub cost: Vec<(Resource, u32)>,
    /// Working radius around the footprint (lumberjack harvest area)
    pub radius: u32,
    /// Goods-fetching units contributed when acting as a collector
    pub collector_units: u32,
    /// Weight in the collector-sufficiency estimate
    pub produce_quantity: u32,
}

impl BuildingProfile {
    /// Resolve the footprint cells for a placement at `origin`
    pub fn footprint(&self, origin: Coord, orientation: Orientation) -> Vec<Coord> {
        let (w, h) = match orientation {
            Orientation::Horizontal => self.size,
            Orientation::Vertical => (self.size.1, self.size.0),
        };
        let mut cells = Vec::with_capacity((w * h) as usize);
        for dx in 0..w {
            for dy in 0..h {
                cells.push(origin.offset(dx, dy));
            }
        }
        cells
    }

    pub fn is_collector(&self) -> bool {
        self.collector_units > 0
    }
}

/// The process-wide archetype registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingCatalog {
    profiles: BTreeMap<BuildingKind, BuildingProfile>,
}

impl BuildingCatalog {
    /// The standard building set
    pub fn standard() -> Self {
        use BuildingKind::*;
        use Resource::*;

        let mut profiles = BTreeMap::new();
        let mut insert = |kind,
                          size,
                          cost: &[(Resource, u32)],
                          radius,
                          collector_units,
                          produce_quantity| {
            profiles.insert(
                kind,
                BuildingProfile {
                    kind,
                    size,
                    cost: cost.to_vec(),
                    radius,
                    collector_units,
                    produce_quantity,
                },
            );
        };

        insert(BranchOffice, (3, 3), &[], 0, 3, 0);
        insert(Storage, (2, 2), &[(Boards, 6)], 0, 2, 0);
        insert(Lumberjack, (2, 2), &[(Boards, 2), (Tools, 1)], 3, 0, 1);
        insert(Tree, (1, 1), &[], 0, 0, 0);
        insert(Fisher, (2, 2), &[(Boards, 4), (Tools, 1)], 3, 0, 1);
        insert(Farm, (3, 3), &[(Boards, 6), (Tools, 2)], 0, 0, 2);
        insert(PotatoField, (3, 3), &[], 0, 0, 0);
        insert(Pasture, (3, 3), &[], 0, 0, 0);
        insert(SugarcaneField, (3, 3), &[], 0, 0, 0);
        insert(Weaver, (2, 2), &[(Boards, 5), (Tools, 1)], 0, 0, 1);
        insert(Distillery, (2, 2), &[(Boards, 5), (Tools, 1), (Bricks, 2)], 0, 0, 1);
        insert(ClayPit, (2, 2), &[(Boards, 4), (Tools, 2)], 0, 0, 0);
        insert(Brickyard, (2, 3), &[(Boards, 8), (Tools, 2)], 0, 0, 1);
        insert(MainSquare, (4, 4), &[(Boards, 10)], 0, 0, 0);
        insert(Pavilion, (2, 2), &[(Boards, 4)], 0, 0, 0);
        insert(VillageSchool, (2, 2), &[(Boards, 8), (Tools, 2)], 0, 0, 0);
        insert(Tavern, (2, 2), &[(Boards, 6), (Tools, 1)], 0, 0, 0);
        insert(Residence, (2, 2), &[(Boards, 2)], 0, 0, 0);

        Self { profiles }
    }

    pub fn profile(&self, kind: BuildingKind) -> &BuildingProfile {
        // the catalog is total over BuildingKind by construction
        &self.profiles[&kind]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_covers_every_kind() {
        let catalog = BuildingCatalog::standard();
        for kind in [
            BuildingKind::BranchOffice,
            BuildingKind::Storage,
            BuildingKind::Lumberjack,
            BuildingKind::Tree,
            BuildingKind::Fisher,
            BuildingKind::Farm,
            BuildingKind::PotatoField,
            BuildingKind::Pasture,
            BuildingKind::SugarcaneField,
            BuildingKind::Weaver,
            BuildingKind::Distillery,
            BuildingKind::ClayPit,
            BuildingKind::Brickyard,
            BuildingKind::MainSquare,
            BuildingKind::Pavilion,
            BuildingKind::VillageSchool,
            BuildingKind::Tavern,
            BuildingKind::Residence,
        ] {
            assert_eq!(catalog.profile(kind).kind, kind);
        }
    }

    #[test]
    fn test_footprint_orientation_swaps_size() {
        let catalog = BuildingCatalog::standard();
        let profile = catalog.profile(BuildingKind::Brickyard);
        let horizontal = profile.footprint(Coord::new(0, 0), Orientation::Horizontal);
        let vertical = profile.footprint(Coord::new(0, 0), Orientation::Vertical);
        assert_eq!(horizontal.len(), 6);
        assert_eq!(vertical.len(), 6);
        assert!(horizontal.contains(&Coord::new(1, 2)));
        assert!(!horizontal.contains(&Coord::new(2, 1)));
        assert!(vertical.contains(&Coord::new(2, 1)));
    }

    #[test]
    fn test_collector_units() {
        let catalog = BuildingCatalog::standard();
        assert!(catalog.profile(BuildingKind::BranchOffice).is_collector());
        assert!(catalog.profile(BuildingKind::Storage).is_collector());
        assert!(!catalog.profile(BuildingKind::Farm).is_collector());
    }
}
