//! Per-tile purpose map over a settlement's production area
//!
//! The grid plan is the single source of truth for what occupies or is
//! reserved at each coordinate. Multi-tile claims are atomic: a build either
//! claims its whole footprint or nothing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::BuildingKind;
use crate::core::types::Coord;
use crate::plan::builder::Builder;

/// The semantic role assigned to a planned cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Purpose {
    /// Unassigned constructible land
    Free,
    Road,
    /// Part of a multi-tile footprint whose origin cell holds the real purpose
    Reserved,
    Fisher,
    Lumberjack,
    Tree,
    Farm,
    PotatoField,
    UnusedPotatoField,
    Pasture,
    UnusedPasture,
    SugarcaneField,
    UnusedSugarcaneField,
    Weaver,
    Distillery,
    ClayPit,
    Brickyard,
    Storage,
    BranchOffice,
    MainSquare,
    Pavilion,
    VillageSchool,
    Tavern,
    Residence,
}

/// The three crop assignments a tilled field can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Potato,
    Pasture,
    Sugarcane,
}

impl FieldKind {
    pub const ALL: [FieldKind; 3] = [FieldKind::Potato, FieldKind::Pasture, FieldKind::Sugarcane];

    /// Plan purpose of a tilled-but-unplanted plot of this kind
    pub fn unused_purpose(&self) -> Purpose {
        match self {
            FieldKind::Potato => Purpose::UnusedPotatoField,
            FieldKind::Pasture => Purpose::UnusedPasture,
            FieldKind::Sugarcane => Purpose::UnusedSugarcaneField,
        }
    }

    /// Plan purpose once the crop is planted
    pub fn crop_purpose(&self) -> Purpose {
        match self {
            FieldKind::Potato => Purpose::PotatoField,
            FieldKind::Pasture => Purpose::Pasture,
            FieldKind::Sugarcane => Purpose::SugarcaneField,
        }
    }

    pub fn building_kind(&self) -> BuildingKind {
        match self {
            FieldKind::Potato => BuildingKind::PotatoField,
            FieldKind::Pasture => BuildingKind::Pasture,
            FieldKind::Sugarcane => BuildingKind::SugarcaneField,
        }
    }
}

/// One planned cell: its purpose and, on a footprint origin, the builder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    pub purpose: Purpose,
    pub builder: Option<Builder>,
}

impl PlanEntry {
    fn free() -> Self {
        Self {
            purpose: Purpose::Free,
            builder: None,
        }
    }
}

/// Purpose map over the production area
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridPlan {
    #[serde(with = "crate::core::types::coord_map")]
    cells: BTreeMap<Coord, PlanEntry>,
}

impl GridPlan {
    /// Initialize the plan to `Free` over the given production area
    pub fn new(area: impl IntoIterator<Item = Coord>) -> Self {
        Self {
            cells: area
                .into_iter()
                .map(|coord| (coord, PlanEntry::free()))
                .collect(),
        }
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.cells.contains_key(&coord)
    }

    pub fn entry(&self, coord: Coord) -> Option<&PlanEntry> {
        self.cells.get(&coord)
    }

    pub fn purpose(&self, coord: Coord) -> Option<Purpose> {
        self.cells.get(&coord).map(|e| e.purpose)
    }

    pub fn is_free(&self, coord: Coord) -> bool {
        self.purpose(coord) == Some(Purpose::Free)
    }

    /// Deterministic (x-major) iteration over all planned cells
    pub fn cells(&self) -> impl Iterator<Item = (Coord, &PlanEntry)> {
        self.cells.iter().map(|(&coord, entry)| (coord, entry))
    }

    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        self.cells.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Overwrite a single cell's purpose (roads, trees, settlement seed)
    pub fn set_purpose(&mut self, coord: Coord, purpose: Purpose) {
        if let Some(entry) = self.cells.get_mut(&coord) {
            entry.purpose = purpose;
            entry.builder = None;
        }
    }

    /// Assign a purpose and builder to a single cell (field consumption)
    pub fn assign(&mut self, coord: Coord, purpose: Purpose, builder: Option<Builder>) {
        if let Some(entry) = self.cells.get_mut(&coord) {
            entry.purpose = purpose;
            entry.builder = builder;
        }
    }

    /// Atomically claim a footprint: every cell must currently hold
    /// `expected`; on success all cells become `Reserved` except the origin
    /// (the smallest footprint coordinate), which records the purpose and
    /// builder. Returns false, leaving the plan untouched, if any cell is
    /// missing or not in the expected state.
    pub fn claim_footprint(
        &mut self,
        footprint: &[Coord],
        purpose: Purpose,
        builder: Option<Builder>,
        expected: Purpose,
    ) -> bool {
        let Some(&origin) = footprint.iter().min() else {
            return false;
        };
        for &coord in footprint {
            if self.purpose(coord) != Some(expected) {
                return false;
            }
        }
        for &coord in footprint {
            self.set_purpose(coord, Purpose::Reserved);
        }
        if let Some(entry) = self.cells.get_mut(&origin) {
            entry.purpose = purpose;
            entry.builder = builder;
        }
        true
    }

    /// Number of size x size all-free squares, stopping early at `limit`
    pub fn count_free_squares(&self, size: i32, limit: u32) -> u32 {
        let mut count = 0;
        'outer: for &coord in self.cells.keys() {
            for dx in 0..size {
                for dy in 0..size {
                    if !self.is_free(coord.offset(dx, dy)) {
                        continue 'outer;
                    }
                }
            }
            count += 1;
            if count >= limit {
                break;
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_plan(size: i32) -> GridPlan {
        let mut area = Vec::new();
        for x in 0..size {
            for y in 0..size {
                area.push(Coord::new(x, y));
            }
        }
        GridPlan::new(area)
    }

    #[test]
    fn test_new_plan_is_all_free() {
        let plan = square_plan(4);
        assert_eq!(plan.len(), 16);
        assert!(plan.coords().all(|c| plan.is_free(c)));
    }

    #[test]
    fn test_claim_footprint_origin_holds_purpose() {
        let mut plan = square_plan(6);
        let footprint = vec![
            Coord::new(2, 2),
            Coord::new(3, 2),
            Coord::new(2, 3),
            Coord::new(3, 3),
        ];
        assert!(plan.claim_footprint(&footprint, Purpose::Storage, None, Purpose::Free));
        assert_eq!(plan.purpose(Coord::new(2, 2)), Some(Purpose::Storage));
        assert_eq!(plan.purpose(Coord::new(3, 2)), Some(Purpose::Reserved));
        assert_eq!(plan.purpose(Coord::new(3, 3)), Some(Purpose::Reserved));
    }

    #[test]
    fn test_claim_footprint_is_atomic() {
        let mut plan = square_plan(6);
        plan.set_purpose(Coord::new(3, 3), Purpose::Road);
        let footprint = vec![
            Coord::new(2, 2),
            Coord::new(3, 2),
            Coord::new(2, 3),
            Coord::new(3, 3),
        ];
        let before: Vec<_> = plan.cells().map(|(c, e)| (c, e.purpose)).collect();
        assert!(!plan.claim_footprint(&footprint, Purpose::Storage, None, Purpose::Free));
        let after: Vec<_> = plan.cells().map(|(c, e)| (c, e.purpose)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_claim_outside_plan_is_rejected() {
        let mut plan = square_plan(3);
        let footprint = vec![Coord::new(2, 2), Coord::new(3, 2)];
        assert!(!plan.claim_footprint(&footprint, Purpose::Storage, None, Purpose::Free));
        assert_eq!(plan.purpose(Coord::new(2, 2)), Some(Purpose::Free));
    }

    #[test]
    fn test_count_free_squares() {
        let mut plan = square_plan(4);
        assert_eq!(plan.count_free_squares(3, 100), 4);
        plan.set_purpose(Coord::new(1, 1), Purpose::Road);
        assert_eq!(plan.count_free_squares(3, 100), 1);
        // limit short-circuits
        assert_eq!(plan.count_free_squares(1, 5), 5);
    }
}
