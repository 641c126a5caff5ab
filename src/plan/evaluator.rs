//! Scored placement candidates, one flavour per building archetype
//!
//! Evaluators are ephemeral: created fresh for each planning pass, sorted
//! ascending by score (lower is better) with an insertion-sequence tie-break
//! so that repeated scans over identical state pick identical sites.

use ordered_float::OrderedFloat;
use std::cmp::Ordering;

use crate::catalog::{BuildingCatalog, BuildingKind, Orientation};
use crate::core::types::{BuildingId, Coord, Resource};
use crate::plan::builder::Builder;
use crate::plan::grid_plan::{FieldKind, GridPlan, Purpose};
use crate::world::{Island, Stock, TerrainClass, World};

/// Read-only context an evaluator scores against
pub struct SiteCtx<'a> {
    pub plan: &'a GridPlan,
    pub world: &'a World,
    pub island: &'a Island,
    pub catalog: &'a BuildingCatalog,
    /// Collector buildings already serving the settlement
    pub collectors: &'a [BuildingId],
}

/// Archetype-specific candidate data
#[derive(Debug, Clone)]
pub enum EvaluatorDetail {
    Fisher,
    Farm {
        field_kind: FieldKind,
        /// Origins of the 3x3 plots this farm would till
        field_plots: Vec<Coord>,
        /// Cells kept clear for the farm's road side
        road_cells: Vec<Coord>,
    },
    ClayPit,
    Brickyard,
    Distillery,
}

/// A scored, executable placement candidate
#[derive(Debug, Clone)]
pub struct Evaluator {
    pub detail: EvaluatorDetail,
    /// Lower is better
    pub score: OrderedFloat<f64>,
    /// Insertion order; the deterministic tie-break
    pub seq: u32,
    pub builder: Builder,
}

impl PartialEq for Evaluator {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.seq == other.seq
    }
}

impl Eq for Evaluator {}

impl PartialOrd for Evaluator {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Evaluator {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.score, self.seq).cmp(&(other.score, other.seq))
    }
}

/// Road-side offsets tried for each farm site: a road may run along any of
/// the four sides of the 3x3 farm
pub const FARM_ROAD_SIDES: [(i32, i32); 4] = [(-1, 0), (0, -1), (0, 3), (3, 0)];

const FIELD_PLOT_OFFSETS: [(i32, i32); 8] = [
    (-3, -3),
    (-3, 0),
    (-3, 3),
    (0, -3),
    (0, 3),
    (3, -3),
    (3, 0),
    (3, 3),
];

impl Evaluator {
    /// Number of fields a farm candidate would create; zero for other kinds
    pub fn fields(&self) -> u32 {
        match &self.detail {
            EvaluatorDetail::Farm { field_plots, .. } => field_plots.len() as u32,
            _ => 0,
        }
    }

    /// Normalized cost per unit of production, used only for comparing
    /// archetypes that yield the same resource (farm vs fisher for food).
    /// Monotonic in scarcity: the scarcer an input in `stock`, the higher
    /// the cost.
    pub fn unit_cost(&self, _resource: Resource, stock: &Stock) -> f64 {
        let cost: f64 = self
            .builder
            .cost
            .iter()
            .map(|&(res, amount)| amount as f64 * (1.0 + 1.0 / (1.0 + stock.get(res) as f64)))
            .sum();
        let units = match &self.detail {
            EvaluatorDetail::Farm { field_plots, .. } => field_plots.len().max(1) as f64,
            _ => 1.0,
        };
        cost / units
    }

    /// Score a fisher site: coast placement with water access, ranked by the
    /// number of fish swarms in working range
    pub fn fisher(ctx: &SiteCtx, origin: Coord, seq: u32) -> Option<Evaluator> {
        let builder = Builder::create(ctx.catalog, BuildingKind::Fisher, origin);
        if !builder.fits_plan(ctx.plan) {
            return None;
        }
        let mut touches_coast = false;
        for &cell in &builder.footprint {
            match ctx.island.terrain(cell) {
                TerrainClass::Coast => touches_coast = true,
                TerrainClass::Flat => {}
                TerrainClass::Water => return None,
            }
        }
        if !touches_coast {
            return None;
        }
        let has_water_access = builder
            .footprint
            .iter()
            .any(|cell| cell.neighbours4().iter().any(|&n| ctx.island.is_water(n)));
        if !has_water_access {
            return None;
        }

        let radius = ctx.catalog.profile(BuildingKind::Fisher).radius;
        let fish = ctx
            .island
            .fish_deposits
            .iter()
            .filter(|&&f| builder.distance_to(f) <= radius)
            .count();
        if fish == 0 {
            return None;
        }

        Some(Evaluator {
            detail: EvaluatorDetail::Fisher,
            score: OrderedFloat(-(fish as f64)),
            seq,
            builder,
        })
    }

    /// Score a farm site for one road-side configuration. Candidates that
    /// would create fewer than `min_fields` fields are pruned so the scan
    /// cost stays proportional to the best arrangement found so far.
    pub fn farm(
        ctx: &SiteCtx,
        origin: Coord,
        road_side: (i32, i32),
        min_fields: u32,
        field_kind: FieldKind,
        seq: u32,
    ) -> Option<Evaluator> {
        let builder = Builder::create(ctx.catalog, BuildingKind::Farm, origin);
        if !builder.fits_plan(ctx.plan)
            || !builder.on_terrain(ctx.world, ctx.island.id, TerrainClass::Flat)
        {
            return None;
        }

        let (dx, dy) = road_side;
        let road_cells: Vec<Coord> = if dx == -1 || dx == 3 {
            (0..3).map(|k| origin.offset(dx, k)).collect()
        } else {
            (0..3).map(|k| origin.offset(k, dy)).collect()
        };
        let road_ok = road_cells.iter().all(|&cell| {
            matches!(ctx.plan.purpose(cell), Some(Purpose::Free) | Some(Purpose::Road))
        });
        if !road_ok {
            return None;
        }

        let mut field_plots = Vec::new();
        for (ox, oy) in FIELD_PLOT_OFFSETS {
            let plot = origin.offset(ox, oy);
            let mut usable = true;
            'cells: for cx in 0..3 {
                for cy in 0..3 {
                    let cell = plot.offset(cx, cy);
                    if !ctx.plan.is_free(cell)
                        || ctx.island.terrain(cell) != TerrainClass::Flat
                        || road_cells.contains(&cell)
                    {
                        usable = false;
                        break 'cells;
                    }
                }
            }
            if usable {
                field_plots.push(plot);
            }
        }
        let fields = field_plots.len() as u32;
        if fields == 0 || fields < min_fields {
            return None;
        }

        let cost: u32 = builder.cost.iter().map(|&(_, amount)| amount).sum();
        Some(Evaluator {
            detail: EvaluatorDetail::Farm {
                field_kind,
                field_plots,
                road_cells,
            },
            score: OrderedFloat(cost as f64 / fields as f64),
            seq,
            builder,
        })
    }

    /// Score a clay pit on a clay patch, ranked by collector proximity
    pub fn clay_pit(ctx: &SiteCtx, origin: Coord, seq: u32) -> Option<Evaluator> {
        let builder = Builder::create(ctx.catalog, BuildingKind::ClayPit, origin);
        if !builder.fits_plan(ctx.plan) {
            return None;
        }
        let on_clay = builder.footprint.iter().all(|&cell| {
            ctx.island
                .tile(cell)
                .is_some_and(|t| t.deposit == Some(crate::world::Deposit::Clay))
        });
        if !on_clay {
            return None;
        }

        let distance = ctx
            .collectors
            .iter()
            .filter_map(|&id| ctx.world.building(id))
            .map(|b| builder.distance_to(b.origin))
            .min()?;
        Some(Evaluator {
            detail: EvaluatorDetail::ClayPit,
            score: OrderedFloat(distance as f64),
            seq,
            builder,
        })
    }

    /// Score a brickyard site, ranked by distance to the nearest planned
    /// clay pit; no clay pit means no viable site
    pub fn brickyard(
        ctx: &SiteCtx,
        origin: Coord,
        orientation: Orientation,
        seq: u32,
    ) -> Option<Evaluator> {
        let builder =
            Builder::create_oriented(ctx.catalog, BuildingKind::Brickyard, origin, orientation);
        if !builder.fits_plan(ctx.plan)
            || !builder.on_terrain(ctx.world, ctx.island.id, TerrainClass::Flat)
        {
            return None;
        }
        let distance = nearest_purpose(ctx.plan, &builder, &[Purpose::ClayPit])?;
        Some(Evaluator {
            detail: EvaluatorDetail::Brickyard,
            score: OrderedFloat(distance as f64),
            seq,
            builder,
        })
    }

    /// Score a distillery site, ranked by distance to the nearest sugarcane
    pub fn distillery(ctx: &SiteCtx, origin: Coord, seq: u32) -> Option<Evaluator> {
        let builder = Builder::create(ctx.catalog, BuildingKind::Distillery, origin);
        if !builder.fits_plan(ctx.plan)
            || !builder.on_terrain(ctx.world, ctx.island.id, TerrainClass::Flat)
        {
            return None;
        }
        let distance = nearest_purpose(
            ctx.plan,
            &builder,
            &[Purpose::SugarcaneField, Purpose::UnusedSugarcaneField],
        )?;
        Some(Evaluator {
            detail: EvaluatorDetail::Distillery,
            score: OrderedFloat(distance as f64),
            seq,
            builder,
        })
    }
}

fn nearest_purpose(plan: &GridPlan, builder: &Builder, purposes: &[Purpose]) -> Option<u32> {
    plan.cells()
        .filter(|(_, entry)| purposes.contains(&entry.purpose))
        .map(|(coord, _)| builder.distance_to(coord))
        .min()
}
