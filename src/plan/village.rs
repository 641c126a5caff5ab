//! Plan-driven village building placement
//!
//! Unlike production buildings, village buildings are not scored: a village
//! layout is precomputed at settlement creation and walked in ascending
//! construction-section order. Civic buildings beyond the main square wait
//! until enough of their assigned residences exist.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::{BuildingCatalog, BuildingKind};
use crate::core::config::AiConfig;
use crate::core::types::{Coord, IslandId};
use crate::plan::builder::Builder;
use crate::plan::grid_plan::Purpose;
use crate::plan::BuildOutcome;
use crate::world::{Island, Stock, TerrainClass, World};

/// Village build kinds a settlement can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VillageRequest {
    MainSquare,
    Pavilion,
    VillageSchool,
    Tavern,
    Residence,
}

impl VillageRequest {
    fn purpose(&self) -> Purpose {
        match self {
            VillageRequest::MainSquare => Purpose::MainSquare,
            VillageRequest::Pavilion => Purpose::Pavilion,
            VillageRequest::VillageSchool => Purpose::VillageSchool,
            VillageRequest::Tavern => Purpose::Tavern,
            VillageRequest::Residence => Purpose::Residence,
        }
    }

    fn building_kind(&self) -> BuildingKind {
        match self {
            VillageRequest::MainSquare => BuildingKind::MainSquare,
            VillageRequest::Pavilion => BuildingKind::Pavilion,
            VillageRequest::VillageSchool => BuildingKind::VillageSchool,
            VillageRequest::Tavern => BuildingKind::Tavern,
            VillageRequest::Residence => BuildingKind::Residence,
        }
    }
}

/// One precomputed slot of the village layout
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VillageSlot {
    pub purpose: Purpose,
    /// Construction section; lower sections are built out first
    pub section: u32,
}

/// A civic building site and the residences it services
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CivicAssignment {
    purpose: Purpose,
    site: Coord,
    residences: Vec<Coord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VillageBuilder {
    island: IslandId,
    #[serde(with = "crate::core::types::coord_map")]
    slots: BTreeMap<Coord, VillageSlot>,
    assignments: Vec<CivicAssignment>,
    current_section: u32,
    max_section: u32,
    roads_built: bool,
}

/// Lattice pitch: 2x2 residences separated by one-tile road lines
const LATTICE: i32 = 3;
/// Section band width in tiles
const SECTION_BAND: i32 = 6;

impl VillageBuilder {
    /// Precompute the village layout over the given area: a central main
    /// square, a residence lattice with road lines between, and one site
    /// each for pavilion, school and tavern near the square.
    pub fn generate(island: &Island, area: &BTreeSet<Coord>) -> Self {
        let mut slots: BTreeMap<Coord, VillageSlot> = BTreeMap::new();
        let mut assignments = Vec::new();
        let mut max_section = 0;

        let Some(square) = Self::find_main_square_site(island, area) else {
            return Self {
                island: island.id,
                slots,
                assignments,
                current_section: 0,
                max_section: 0,
                roads_built: false,
            };
        };
        slots.insert(
            square,
            VillageSlot {
                purpose: Purpose::MainSquare,
                section: 0,
            },
        );
        let square_cells: BTreeSet<Coord> = (0..4)
            .flat_map(|dx| (0..4).map(move |dy| square.offset(dx, dy)))
            .collect();

        // road lines along the lattice
        for &coord in area {
            let (rx, ry) = (
                (coord.x - square.x).rem_euclid(LATTICE),
                (coord.y - square.y).rem_euclid(LATTICE),
            );
            if (rx == 2 || ry == 2) && !square_cells.contains(&coord) {
                slots.insert(
                    coord,
                    VillageSlot {
                        purpose: Purpose::Road,
                        section: 0,
                    },
                );
            }
        }

        // residence lattice
        let mut residences = Vec::new();
        for &coord in area {
            let on_lattice = (coord.x - square.x).rem_euclid(LATTICE) == 0
                && (coord.y - square.y).rem_euclid(LATTICE) == 0;
            if !on_lattice {
                continue;
            }
            let cells: Vec<Coord> = (0..2)
                .flat_map(|dx| (0..2).map(move |dy| coord.offset(dx, dy)))
                .collect();
            let usable = cells.iter().all(|c| {
                area.contains(c)
                    && island.terrain(*c) == TerrainClass::Flat
                    && !square_cells.contains(c)
            });
            if !usable {
                continue;
            }
            let section =
                (coord.chebyshev_distance(square.offset(2, 2)) as i32 / SECTION_BAND) as u32;
            max_section = max_section.max(section);
            slots.insert(
                coord,
                VillageSlot {
                    purpose: Purpose::Residence,
                    section,
                },
            );
            residences.push(coord);
        }

        // the three civic sites take over the residence slots nearest the
        // square, in a fixed order
        let mut by_distance = residences.clone();
        by_distance.sort_by_key(|c| (c.chebyshev_distance(square.offset(2, 2)), *c));
        let civic_purposes = [Purpose::Pavilion, Purpose::VillageSchool, Purpose::Tavern];
        for (purpose, &site) in civic_purposes.iter().zip(by_distance.iter()) {
            if let Some(slot) = slots.get_mut(&site) {
                slot.purpose = *purpose;
            }
            residences.retain(|&c| c != site);
        }
        for (purpose, &site) in civic_purposes.iter().zip(by_distance.iter()) {
            assignments.push(CivicAssignment {
                purpose: *purpose,
                site,
                residences: residences.clone(),
            });
        }

        Self {
            island: island.id,
            slots,
            assignments,
            current_section: 0,
            max_section,
            roads_built: false,
        }
    }

    fn find_main_square_site(island: &Island, area: &BTreeSet<Coord>) -> Option<Coord> {
        if area.is_empty() {
            return None;
        }
        let cx = area.iter().map(|c| c.x).sum::<i32>() / area.len() as i32;
        let cy = area.iter().map(|c| c.y).sum::<i32>() / area.len() as i32;
        let centre = Coord::new(cx, cy);

        let mut candidates: Vec<Coord> = area.iter().copied().collect();
        candidates.sort_by_key(|c| (c.chebyshev_distance(centre), *c));
        candidates.into_iter().find(|&origin| {
            (0..4).all(|dx| {
                (0..4).all(|dy| {
                    let cell = origin.offset(dx, dy);
                    area.contains(&cell) && island.terrain(cell) == TerrainClass::Flat
                })
            })
        })
    }

    pub fn slots(&self) -> impl Iterator<Item = (Coord, &VillageSlot)> {
        self.slots.iter().map(|(&coord, slot)| (coord, slot))
    }

    pub fn current_section(&self) -> u32 {
        self.current_section
    }

    /// Walk the layout in ascending section order and build the first open
    /// slot matching the request
    pub fn attempt_build(
        &mut self,
        world: &mut World,
        catalog: &BuildingCatalog,
        config: &AiConfig,
        stock: &mut Stock,
        claimed: &BTreeSet<Coord>,
        request: VillageRequest,
    ) -> BuildOutcome {
        let target = request.purpose();
        let mut ordered: Vec<(Coord, VillageSlot)> =
            self.slots.iter().map(|(&c, &s)| (c, s)).collect();
        ordered.sort_by_key(|&(coord, slot)| (slot.section, coord));

        for (coord, slot) in ordered {
            if slot.section > self.current_section || slot.purpose != target {
                continue;
            }
            if world
                .building_at(coord)
                .is_some_and(|b| b.kind == request.building_kind())
            {
                continue;
            }
            if !matches!(request, VillageRequest::MainSquare | VillageRequest::Residence)
                && !self.need_producer(world, config, coord, target)
            {
                continue;
            }

            let builder = Builder::create(catalog, request.building_kind(), coord);
            if !stock.has_materials(&builder.cost) {
                return BuildOutcome::NeedResources;
            }
            if builder.footprint.iter().any(|c| !claimed.contains(c)) {
                return BuildOutcome::OutOfSettlement;
            }
            if builder.execute(world, catalog, self.island, stock).is_none() {
                return BuildOutcome::UnknownError;
            }
            tracing::debug!(?request, origin = ?coord, "village building placed");

            if request == VillageRequest::MainSquare && !self.roads_built {
                self.build_roads(world);
            }
            if request == VillageRequest::Residence {
                self.advance_section(world);
            }
            return BuildOutcome::Ok;
        }
        BuildOutcome::Skip
    }

    /// Secondary civic buildings wait for three quarters of their assigned
    /// residences; the main square is exempt
    fn need_producer(
        &self,
        world: &World,
        config: &AiConfig,
        site: Coord,
        purpose: Purpose,
    ) -> bool {
        let Some(assignment) = self
            .assignments
            .iter()
            .find(|a| a.purpose == purpose && a.site == site)
        else {
            return false;
        };
        if assignment.residences.is_empty() {
            return false;
        }
        let built = assignment
            .residences
            .iter()
            .filter(|&&coord| {
                world
                    .building_at(coord)
                    .is_some_and(|b| b.kind == BuildingKind::Residence)
            })
            .count();
        built as f64 >= assignment.residences.len() as f64 * config.service_ratio
    }

    /// Lay the village road grid; done once, right after the main square
    fn build_roads(&mut self, world: &mut World) {
        for (&coord, slot) in &self.slots {
            if slot.purpose == Purpose::Road && !world.is_occupied(coord) {
                world.build_road(coord);
            }
        }
        self.roads_built = true;
    }

    /// Open the next section once every residence slot in the current one
    /// is built
    fn advance_section(&mut self, world: &World) {
        while self.current_section < self.max_section {
            let complete = self
                .slots
                .iter()
                .filter(|(_, slot)| {
                    slot.purpose == Purpose::Residence && slot.section <= self.current_section
                })
                .all(|(&coord, _)| world.building_at(coord).is_some());
            if !complete {
                break;
            }
            self.current_section += 1;
        }
    }
}
