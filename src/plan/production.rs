//! The production builder
//!
//! Orchestrates the building evaluators against the grid plan: enumerates
//! candidate sites, ranks them, and executes at most one placement per
//! invocation. Also owns the unused-field queues and the collector-coverage
//! computation.

use ahash::AHashMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::catalog::{BuildingCatalog, BuildingKind, Orientation};
use crate::core::config::AiConfig;
use crate::core::types::{BuildingId, Coord, IslandId, Resource};
use crate::plan::builder::Builder;
use crate::plan::evaluator::{Evaluator, EvaluatorDetail, SiteCtx, FARM_ROAD_SIDES};
use crate::plan::grid_plan::{FieldKind, GridPlan, Purpose};
use crate::plan::BuildOutcome;
use crate::world::{Building, Stock, TerrainClass, World};

/// Production build kinds a settlement can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionRequest {
    Lumberjack,
    /// Farm-backed food or a fisher, whichever is cheaper per unit
    FoodProducer,
    SugarProducer,
    ClayPit,
    Brickyard,
    Distillery,
    /// A storage to improve collector coverage
    Storage,
}

/// Per-settlement counters consumed by the evaluators and the build order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettlementCounters {
    pub num_fishers: u32,
    num_fields: BTreeMap<FieldKind, u32>,
}

impl SettlementCounters {
    pub fn fields(&self, kind: FieldKind) -> u32 {
        self.num_fields.get(&kind).copied().unwrap_or(0)
    }

    pub fn add_field(&mut self, kind: FieldKind) {
        *self.num_fields.entry(kind).or_insert(0) += 1;
    }
}

/// FIFO queues of tilled-but-unplanted field plots, one per crop kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnusedFields {
    potato: VecDeque<Coord>,
    pasture: VecDeque<Coord>,
    sugarcane: VecDeque<Coord>,
}

impl UnusedFields {
    pub fn queue(&self, kind: FieldKind) -> &VecDeque<Coord> {
        match kind {
            FieldKind::Potato => &self.potato,
            FieldKind::Pasture => &self.pasture,
            FieldKind::Sugarcane => &self.sugarcane,
        }
    }

    fn queue_mut(&mut self, kind: FieldKind) -> &mut VecDeque<Coord> {
        match kind {
            FieldKind::Potato => &mut self.potato,
            FieldKind::Pasture => &mut self.pasture,
            FieldKind::Sugarcane => &mut self.sugarcane,
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// A collector as seen by the arrangement-value computation: either an
/// existing building or the in-progress candidate being scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CollectorKey {
    Built(BuildingId),
    Candidate,
}

type CollectorData = BTreeMap<BuildingId, BTreeMap<CollectorKey, u32>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionBuilder {
    island: IslandId,
    plan: GridPlan,
    collector_ids: Vec<BuildingId>,
    production_ids: Vec<BuildingId>,
    unused_fields: UnusedFields,
}

impl ProductionBuilder {
    /// Initialize the plan over a settlement's production area. The branch
    /// office acts as the first collector; its footprint cells are marked in
    /// the plan.
    pub fn new(
        island: IslandId,
        production_area: impl IntoIterator<Item = Coord>,
        branch_office: &Building,
    ) -> Self {
        let mut plan = GridPlan::new(production_area);
        for &coord in &branch_office.footprint {
            if plan.contains(coord) {
                plan.set_purpose(coord, Purpose::BranchOffice);
            }
        }
        Self {
            island,
            plan,
            collector_ids: vec![branch_office.id],
            production_ids: Vec::new(),
            unused_fields: UnusedFields::default(),
        }
    }

    pub fn island(&self) -> IslandId {
        self.island
    }

    pub fn plan(&self) -> &GridPlan {
        &self.plan
    }

    pub fn unused_fields(&self) -> &UnusedFields {
        &self.unused_fields
    }

    pub fn collector_ids(&self) -> &[BuildingId] {
        &self.collector_ids
    }

    pub fn production_ids(&self) -> &[BuildingId] {
        &self.production_ids
    }

    /// Ring the branch office with roads so later placements have a network
    /// to connect to
    pub fn seed_roads(&mut self, world: &mut World, branch_office: &Building) {
        for coord in Builder::ring_around(&branch_office.footprint) {
            if self.plan.is_free(coord) {
                self.plan.set_purpose(coord, Purpose::Road);
                world.build_road(coord);
            }
        }
    }

    fn have_resources(catalog: &BuildingCatalog, stock: &Stock, kind: BuildingKind) -> bool {
        stock.has_materials(&catalog.profile(kind).cost)
    }

    /// Decide and execute one placement for the requested production kind
    pub fn attempt_build(
        &mut self,
        world: &mut World,
        catalog: &BuildingCatalog,
        config: &AiConfig,
        stock: &mut Stock,
        counters: &mut SettlementCounters,
        request: ProductionRequest,
    ) -> BuildOutcome {
        let outcome = match request {
            ProductionRequest::Lumberjack => self.build_lumberjack(world, catalog, config, stock),
            ProductionRequest::FoodProducer => {
                self.build_food_producer(world, catalog, stock, counters)
            }
            ProductionRequest::SugarProducer => {
                self.build_field_producer(world, catalog, stock, counters, FieldKind::Sugarcane)
            }
            ProductionRequest::ClayPit => self.build_clay_pit(world, catalog, stock),
            ProductionRequest::Brickyard => self.build_brickyard(world, catalog, stock),
            ProductionRequest::Distillery => self.build_distillery(world, catalog, stock),
            ProductionRequest::Storage => {
                self.improve_collector_coverage(world, catalog, config, stock)
            }
        };
        tracing::debug!(?request, ?outcome, island = self.island.0, "build attempt");
        outcome
    }

    // === LUMBERJACK ===

    /// Place a lumberjack, connect it to the road network, and fill its
    /// harvest radius with trees
    fn build_lumberjack(
        &mut self,
        world: &mut World,
        catalog: &BuildingCatalog,
        config: &AiConfig,
        stock: &mut Stock,
    ) -> BuildOutcome {
        if !Self::have_resources(catalog, stock, BuildingKind::Lumberjack) {
            return BuildOutcome::NeedResources;
        }

        // per-cell harvest value and edge-alignment contribution
        let mut cell_value: AHashMap<Coord, u32> = AHashMap::new();
        let mut alignment_value: AHashMap<Coord, u32> = AHashMap::new();
        for (coord, entry) in self.plan.cells() {
            let value = match entry.purpose {
                Purpose::Free => 3,
                Purpose::Tree => 1,
                _ => continue,
            };
            cell_value.insert(coord, value);

            let mut alignment = 0;
            for neighbour in coord.neighbours8() {
                let against_edge = !self.plan.contains(neighbour)
                    || self.plan.purpose(neighbour) == Some(Purpose::Road);
                if against_edge {
                    alignment += if coord.manhattan_distance(neighbour) == 1 {
                        2
                    } else {
                        1
                    };
                }
            }
            alignment_value.insert(coord, alignment);
        }

        let radius = catalog.profile(BuildingKind::Lumberjack).radius;
        let mut options: Vec<(OrderedFloat<f64>, u32, Builder)> = Vec::new();
        let mut seq = 0;
        for coord in self.plan.coords() {
            let builder = Builder::create(catalog, BuildingKind::Lumberjack, coord);
            if !builder.fits_plan(&self.plan)
                || !builder.on_terrain(world, self.island, TerrainClass::Flat)
            {
                continue;
            }

            let mut value = 0;
            let mut alignment = 0;
            for cell in builder.radius_coords(radius) {
                if let Some(&v) = cell_value.get(&cell) {
                    value += v;
                    alignment += alignment_value.get(&cell).copied().unwrap_or(0);
                }
            }
            let value = value.min(config.lumberjack_value_cap);
            if value >= config.lumberjack_min_value {
                let score =
                    -(value as f64) - ((alignment + 1) as f64).ln() - alignment as f64 / 5.0;
                options.push((OrderedFloat(score), seq, builder));
                seq += 1;
            }
        }
        options.sort_by_key(|(score, seq, _)| (*score, *seq));

        for (_, _, builder) in &options {
            let Some(path) = self.find_road_path(world, builder) else {
                continue;
            };
            let Some(id) = builder.execute(world, catalog, self.island, stock) else {
                return BuildOutcome::UnknownError;
            };
            self.commit_roads(world, &path);
            self.plan.claim_footprint(
                &builder.footprint,
                Purpose::Lumberjack,
                Some(builder.clone()),
                Purpose::Free,
            );

            // fill the harvest radius with trees
            for cell in builder.radius_coords(radius) {
                if self.plan.is_free(cell)
                    && world
                        .construct(catalog, BuildingKind::Tree, self.island, cell, Orientation::Horizontal)
                        .is_some()
                {
                    self.plan.set_purpose(cell, Purpose::Tree);
                }
            }
            self.production_ids.push(id);
            return BuildOutcome::Ok;
        }
        BuildOutcome::Impossible
    }

    // === FOOD & FIELDS ===

    /// Best fisher site with a feasible road connection
    fn get_next_fisher(&self, world: &World, catalog: &BuildingCatalog) -> Option<Evaluator> {
        let island = world.island(self.island)?;
        let ctx = SiteCtx {
            plan: &self.plan,
            world,
            island,
            catalog,
            collectors: &self.collector_ids,
        };
        let mut options = Vec::new();
        let mut seq = 0;
        for coord in self.plan.coords() {
            if let Some(evaluator) = Evaluator::fisher(&ctx, coord, seq) {
                options.push(evaluator);
                seq += 1;
            }
        }
        options.sort();
        options
            .into_iter()
            .find(|ev| self.find_road_path(world, &ev.builder).is_some())
    }

    /// Best farm site with a feasible road connection, trying all four road
    /// side configurations per origin
    fn get_next_farm(
        &self,
        world: &World,
        catalog: &BuildingCatalog,
        field_kind: FieldKind,
    ) -> Option<Evaluator> {
        let island = world.island(self.island)?;
        let ctx = SiteCtx {
            plan: &self.plan,
            world,
            island,
            catalog,
            collectors: &self.collector_ids,
        };
        let mut options = Vec::new();
        let mut seq = 0;
        let mut most_fields = 1;
        for coord in self.plan.coords() {
            for side in FARM_ROAD_SIDES {
                if let Some(evaluator) =
                    Evaluator::farm(&ctx, coord, side, most_fields, field_kind, seq)
                {
                    most_fields = most_fields.max(evaluator.fields());
                    options.push(evaluator);
                    seq += 1;
                }
            }
        }
        options.sort();
        options
            .into_iter()
            .find(|ev| self.find_road_path(world, &ev.builder).is_some())
    }

    /// Build whichever food source is cheaper per unit, preferring to plant
    /// an already-tilled field over any new construction
    fn build_food_producer(
        &mut self,
        world: &mut World,
        catalog: &BuildingCatalog,
        stock: &mut Stock,
        counters: &mut SettlementCounters,
    ) -> BuildOutcome {
        if self.unused_fields.queue(FieldKind::Potato).is_empty() {
            if !Self::have_resources(catalog, stock, BuildingKind::Fisher)
                && !Self::have_resources(catalog, stock, BuildingKind::Farm)
            {
                return BuildOutcome::NeedResources;
            }
            let next_fisher = self.get_next_fisher(world, catalog);
            let next_farm = self.get_next_farm(world, catalog, FieldKind::Potato);
            match (next_fisher, next_farm) {
                (None, None) => return BuildOutcome::Impossible,
                (None, Some(farm)) => {
                    let outcome = self.execute_evaluator(world, catalog, stock, &farm);
                    if outcome != BuildOutcome::Ok {
                        return outcome;
                    }
                }
                (Some(fisher), None) => {
                    let outcome = self.execute_evaluator(world, catalog, stock, &fisher);
                    if outcome == BuildOutcome::Ok {
                        counters.num_fishers += 1;
                    }
                    return outcome;
                }
                (Some(fisher), Some(farm)) => {
                    let cost_farm = farm.unit_cost(Resource::Food, stock);
                    let cost_fisher = fisher.unit_cost(Resource::Food, stock);
                    tracing::info!(
                        island = self.island.0,
                        cost_farm,
                        cost_fisher,
                        "food producer comparison"
                    );
                    if cost_farm <= cost_fisher {
                        let outcome = self.execute_evaluator(world, catalog, stock, &farm);
                        if outcome != BuildOutcome::Ok {
                            return outcome;
                        }
                    } else {
                        let outcome = self.execute_evaluator(world, catalog, stock, &fisher);
                        if outcome == BuildOutcome::Ok {
                            counters.num_fishers += 1;
                        }
                        return outcome;
                    }
                }
            }
        }

        self.plant_field(world, catalog, stock, counters, FieldKind::Potato)
    }

    /// Build a field-backed producer of the given kind, placing a farm first
    /// if no tilled plot is waiting
    fn build_field_producer(
        &mut self,
        world: &mut World,
        catalog: &BuildingCatalog,
        stock: &mut Stock,
        counters: &mut SettlementCounters,
        field_kind: FieldKind,
    ) -> BuildOutcome {
        if self.unused_fields.queue(field_kind).is_empty() {
            if !Self::have_resources(catalog, stock, BuildingKind::Farm) {
                return BuildOutcome::NeedResources;
            }
            let Some(farm) = self.get_next_farm(world, catalog, field_kind) else {
                return BuildOutcome::Impossible;
            };
            let outcome = self.execute_evaluator(world, catalog, stock, &farm);
            if outcome != BuildOutcome::Ok {
                return outcome;
            }
        }

        self.plant_field(world, catalog, stock, counters, field_kind)
    }

    /// Consume the oldest tilled plot of the given kind
    fn plant_field(
        &mut self,
        world: &mut World,
        catalog: &BuildingCatalog,
        stock: &mut Stock,
        counters: &mut SettlementCounters,
        field_kind: FieldKind,
    ) -> BuildOutcome {
        let Some(&plot) = self.unused_fields.queue(field_kind).front() else {
            return BuildOutcome::Impossible;
        };
        let builder = Builder::create(catalog, field_kind.building_kind(), plot);
        if builder.execute(world, catalog, self.island, stock).is_none() {
            return BuildOutcome::UnknownError;
        }
        self.unused_fields.queue_mut(field_kind).pop_front();
        self.plan
            .assign(plot, field_kind.crop_purpose(), Some(builder));
        counters.add_field(field_kind);
        BuildOutcome::Ok
    }

    // === SIMPLE PRODUCERS ===

    fn build_clay_pit(
        &mut self,
        world: &mut World,
        catalog: &BuildingCatalog,
        stock: &mut Stock,
    ) -> BuildOutcome {
        if !Self::have_resources(catalog, stock, BuildingKind::ClayPit) {
            return BuildOutcome::NeedResources;
        }
        let Some(island) = world.island(self.island) else {
            return BuildOutcome::Impossible;
        };
        let ctx = SiteCtx {
            plan: &self.plan,
            world,
            island,
            catalog,
            collectors: &self.collector_ids,
        };
        let mut options = Vec::new();
        let mut seq = 0;
        for &origin in &island.clay_deposits {
            if let Some(evaluator) = Evaluator::clay_pit(&ctx, origin, seq) {
                options.push(evaluator);
                seq += 1;
            }
        }
        options.sort();
        match options.first() {
            Some(evaluator) => {
                let evaluator = evaluator.clone();
                self.execute_evaluator(world, catalog, stock, &evaluator)
            }
            None => BuildOutcome::Impossible,
        }
    }

    fn build_brickyard(
        &mut self,
        world: &mut World,
        catalog: &BuildingCatalog,
        stock: &mut Stock,
    ) -> BuildOutcome {
        if !Self::have_resources(catalog, stock, BuildingKind::Brickyard) {
            return BuildOutcome::NeedResources;
        }
        let Some(island) = world.island(self.island) else {
            return BuildOutcome::Impossible;
        };
        let ctx = SiteCtx {
            plan: &self.plan,
            world,
            island,
            catalog,
            collectors: &self.collector_ids,
        };
        let mut options = Vec::new();
        let mut seq = 0;
        for coord in self.plan.coords() {
            for orientation in [Orientation::Horizontal, Orientation::Vertical] {
                if let Some(evaluator) = Evaluator::brickyard(&ctx, coord, orientation, seq) {
                    options.push(evaluator);
                    seq += 1;
                }
            }
        }
        options.sort();
        match options.first() {
            Some(evaluator) => {
                let evaluator = evaluator.clone();
                self.execute_evaluator(world, catalog, stock, &evaluator)
            }
            None => BuildOutcome::Impossible,
        }
    }

    fn build_distillery(
        &mut self,
        world: &mut World,
        catalog: &BuildingCatalog,
        stock: &mut Stock,
    ) -> BuildOutcome {
        if !Self::have_resources(catalog, stock, BuildingKind::Distillery) {
            return BuildOutcome::NeedResources;
        }
        let Some(island) = world.island(self.island) else {
            return BuildOutcome::Impossible;
        };
        let ctx = SiteCtx {
            plan: &self.plan,
            world,
            island,
            catalog,
            collectors: &self.collector_ids,
        };
        let mut options = Vec::new();
        let mut seq = 0;
        for coord in self.plan.coords() {
            if let Some(evaluator) = Evaluator::distillery(&ctx, coord, seq) {
                options.push(evaluator);
                seq += 1;
            }
        }
        options.sort();
        match options.first() {
            Some(evaluator) => {
                let evaluator = evaluator.clone();
                self.execute_evaluator(world, catalog, stock, &evaluator)
            }
            None => BuildOutcome::Impossible,
        }
    }

    /// Execute a scored candidate: pay, construct, connect, claim
    fn execute_evaluator(
        &mut self,
        world: &mut World,
        catalog: &BuildingCatalog,
        stock: &mut Stock,
        evaluator: &Evaluator,
    ) -> BuildOutcome {
        if !stock.has_materials(&evaluator.builder.cost) {
            return BuildOutcome::NeedResources;
        }
        let Some(path) = self.find_road_path(world, &evaluator.builder) else {
            return BuildOutcome::Impossible;
        };
        let Some(id) = evaluator.builder.execute(world, catalog, self.island, stock) else {
            tracing::warn!(
                kind = ?evaluator.builder.kind,
                origin = ?evaluator.builder.origin,
                "construction refused a placement that passed the legality checks"
            );
            return BuildOutcome::UnknownError;
        };
        self.commit_roads(world, &path);

        let purpose = match &evaluator.detail {
            EvaluatorDetail::Fisher => Purpose::Fisher,
            EvaluatorDetail::Farm { .. } => Purpose::Farm,
            EvaluatorDetail::ClayPit => Purpose::ClayPit,
            EvaluatorDetail::Brickyard => Purpose::Brickyard,
            EvaluatorDetail::Distillery => Purpose::Distillery,
        };
        self.plan.claim_footprint(
            &evaluator.builder.footprint,
            purpose,
            Some(evaluator.builder.clone()),
            Purpose::Free,
        );

        if let EvaluatorDetail::Farm {
            field_kind,
            field_plots,
            road_cells,
        } = &evaluator.detail
        {
            for &cell in road_cells {
                if self.plan.is_free(cell) {
                    self.plan.set_purpose(cell, Purpose::Road);
                    world.build_road(cell);
                }
            }
            // till the plots; each origin carries the unused purpose and
            // joins its FIFO queue
            for &plot in field_plots {
                let cells: Vec<Coord> = (0..3)
                    .flat_map(|dx| (0..3).map(move |dy| plot.offset(dx, dy)))
                    .collect();
                if self.plan.claim_footprint(
                    &cells,
                    field_kind.unused_purpose(),
                    None,
                    Purpose::Free,
                ) {
                    self.unused_fields.queue_mut(*field_kind).push_back(plot);
                }
            }
        }

        self.production_ids.push(id);
        BuildOutcome::Ok
    }

    // === ROADS ===

    /// Free plan cells that must become road to connect the builder to the
    /// existing network; `Some(vec![])` when already adjacent to a road.
    /// Deterministic: starts and expansion both follow fixed orders.
    fn find_road_path(&self, world: &World, builder: &Builder) -> Option<Vec<Coord>> {
        let neighbours = builder.neighbour_coords();
        if neighbours
            .iter()
            .any(|&coord| self.plan.purpose(coord) == Some(Purpose::Road) || world.is_road(coord))
        {
            return Some(Vec::new());
        }

        let mut parent: AHashMap<Coord, Option<Coord>> = AHashMap::new();
        let mut queue: VecDeque<Coord> = VecDeque::new();
        for coord in neighbours {
            if self.plan.is_free(coord) {
                parent.insert(coord, None);
                queue.push_back(coord);
            }
        }

        while let Some(coord) = queue.pop_front() {
            for next in coord.neighbours4() {
                if builder.footprint.contains(&next) || parent.contains_key(&next) {
                    continue;
                }
                match self.plan.purpose(next) {
                    Some(Purpose::Road) => {
                        // reconstruct the free-cell chain ending at `coord`
                        let mut path = vec![coord];
                        let mut cursor = coord;
                        while let Some(Some(prev)) = parent.get(&cursor) {
                            path.push(*prev);
                            cursor = *prev;
                        }
                        path.reverse();
                        return Some(path);
                    }
                    Some(Purpose::Free) => {
                        parent.insert(next, Some(coord));
                        queue.push_back(next);
                    }
                    _ => {}
                }
            }
        }
        None
    }

    fn commit_roads(&mut self, world: &mut World, path: &[Coord]) {
        for &coord in path {
            self.plan.set_purpose(coord, Purpose::Road);
            world.build_road(coord);
        }
    }

    // === COLLECTOR COVERAGE ===

    /// Whether the current collectors can keep up with production
    pub fn enough_collectors(&self, world: &World, catalog: &BuildingCatalog) -> bool {
        let produce_quantity: u32 = self
            .production_ids
            .iter()
            .filter_map(|&id| world.building(id))
            .map(|b| catalog.profile(b.kind).produce_quantity)
            .sum();
        1 + 2 * self.collector_ids.len() as u32 > produce_quantity
    }

    /// Road distances from every collector to every production building,
    /// derived by breadth-first propagation from each collector's adjacent
    /// road tiles. Recomputed on demand; the plan may have changed since any
    /// previous call.
    fn collector_data(&self, world: &World) -> (CollectorData, BTreeMap<Coord, BuildingId>) {
        let mut data: CollectorData = BTreeMap::new();
        let mut keys: BTreeMap<Coord, BuildingId> = BTreeMap::new();
        for &id in &self.production_ids {
            data.insert(id, BTreeMap::new());
            if let Some(building) = world.building(id) {
                for &coord in &building.footprint {
                    keys.insert(coord, id);
                }
            }
        }

        for &collector in &self.collector_ids {
            let Some(building) = world.building(collector) else {
                continue;
            };
            let starts = road_starts(world, &building.footprint);
            road_bfs(world, starts, &keys, |production, distance| {
                if let Some(per_building) = data.get_mut(&production) {
                    per_building
                        .entry(CollectorKey::Built(collector))
                        .or_insert(distance);
                }
            });
        }
        (data, keys)
    }

    /// Value of a collector arrangement; smaller is better
    fn evaluate_collector_data(
        world: &World,
        catalog: &BuildingCatalog,
        config: &AiConfig,
        data: &CollectorData,
    ) -> f64 {
        let mut result = 0.0;
        for per_building in data.values() {
            let mut value = 0.000001;
            for (&key, &distance) in per_building {
                let units = match key {
                    CollectorKey::Built(id) => world
                        .building(id)
                        .map(|b| catalog.profile(b.kind).collector_units)
                        .unwrap_or(0),
                    CollectorKey::Candidate => 2,
                };
                value += units as f64 / (config.collector_distance_base + distance as f64);
            }
            result += 1.0 / value;
        }
        result
    }

    /// Build a storage where it most improves collector coverage
    fn improve_collector_coverage(
        &mut self,
        world: &mut World,
        catalog: &BuildingCatalog,
        config: &AiConfig,
        stock: &mut Stock,
    ) -> BuildOutcome {
        if !Self::have_resources(catalog, stock, BuildingKind::Storage) {
            return BuildOutcome::NeedResources;
        }

        let (data, keys) = self.collector_data(world);
        let baseline = Self::evaluate_collector_data(world, catalog, config, &data);

        let mut options: Vec<(OrderedFloat<f64>, u32, Builder)> = Vec::new();
        let mut seq = 0;
        for coord in self.plan.coords() {
            let builder = Builder::create(catalog, BuildingKind::Storage, coord);
            if !builder.fits_plan(&self.plan)
                || !builder.on_terrain(world, self.island, TerrainClass::Flat)
            {
                continue;
            }

            let mut starts = Vec::new();
            let mut alignment = 1u32;
            for neighbour in builder.neighbour_coords() {
                if world.is_road(neighbour) {
                    starts.push((neighbour, 0));
                }
                if !self.plan.is_free(neighbour) {
                    alignment += 1;
                }
            }
            if starts.is_empty() {
                continue;
            }

            let mut extra = data.clone();
            road_bfs(world, starts, &keys, |production, distance| {
                if let Some(per_building) = extra.get_mut(&production) {
                    per_building
                        .entry(CollectorKey::Candidate)
                        .or_insert(distance);
                }
            });

            let value = Self::evaluate_collector_data(world, catalog, config, &extra)
                - (alignment as f64).ln() * config.storage_alignment_weight;
            options.push((OrderedFloat(value), seq, builder));
            seq += 1;
        }
        options.sort_by_key(|(score, seq, _)| (*score, *seq));

        for (value, _, builder) in &options {
            if value.0 >= baseline {
                break;
            }
            let Some(id) = builder.execute(world, catalog, self.island, stock) else {
                return BuildOutcome::UnknownError;
            };
            self.plan.claim_footprint(
                &builder.footprint,
                Purpose::Storage,
                Some(builder.clone()),
                Purpose::Free,
            );
            self.collector_ids.push(id);
            tracing::info!(
                island = self.island.0,
                origin = ?builder.origin,
                value = value.0,
                baseline,
                "storage placed to improve collector coverage"
            );
            return BuildOutcome::Ok;
        }
        BuildOutcome::Impossible
    }

    // === COUNTERS & MAINTENANCE ===

    pub fn count_fishers(&self, world: &World) -> u32 {
        self.production_ids
            .iter()
            .filter_map(|&id| world.building(id))
            .filter(|b| b.kind == BuildingKind::Fisher)
            .count() as u32
    }

    pub fn count_fields(&self, kind: FieldKind) -> u32 {
        let crop = kind.crop_purpose();
        self.plan
            .cells()
            .filter(|(_, entry)| entry.purpose == crop)
            .count() as u32
    }

    /// Whether every queued field plot still carries its matching unused
    /// purpose in the plan
    pub fn unused_fields_consistent(&self) -> bool {
        FieldKind::ALL.iter().all(|&kind| {
            self.unused_fields
                .queue(kind)
                .iter()
                .all(|&coord| self.plan.purpose(coord) == Some(kind.unused_purpose()))
        })
    }

    /// Rebuild the unused-field queues from the plan (load path)
    pub fn refresh_unused_fields(&mut self) {
        self.unused_fields.clear();
        for (coord, entry) in self.plan.cells() {
            for kind in FieldKind::ALL {
                if entry.purpose == kind.unused_purpose() {
                    self.unused_fields.queue_mut(kind).push_back(coord);
                }
            }
        }
    }

    /// Number of free size x size squares left, capped at `limit`
    pub fn count_available_squares(&self, size: i32, limit: u32) -> u32 {
        self.plan.count_free_squares(size, limit)
    }
}

/// Road tiles adjacent to a footprint, as BFS seeds at distance zero
fn road_starts(world: &World, footprint: &[Coord]) -> Vec<(Coord, u32)> {
    let mut starts = Vec::new();
    for &cell in footprint {
        for neighbour in cell.neighbours4() {
            if world.is_road(neighbour) && !starts.iter().any(|&(c, _)| c == neighbour) {
                starts.push((neighbour, 0));
            }
        }
    }
    starts.sort();
    starts
}

/// Breadth-first propagation along road tiles. `visit` fires the first time
/// the frontier touches each production building's footprint.
fn road_bfs(
    world: &World,
    starts: Vec<(Coord, u32)>,
    keys: &BTreeMap<Coord, BuildingId>,
    mut visit: impl FnMut(BuildingId, u32),
) {
    let mut distance: AHashMap<Coord, u32> = AHashMap::new();
    let mut queue: VecDeque<(Coord, u32)> = VecDeque::new();
    for (coord, d) in starts {
        if !distance.contains_key(&coord) {
            distance.insert(coord, d);
            queue.push_back((coord, d));
        }
    }

    while let Some((coord, d)) = queue.pop_front() {
        for next in coord.neighbours4() {
            if distance.contains_key(&next) {
                continue;
            }
            if world.is_road(next) {
                distance.insert(next, d + 1);
                queue.push_back((next, d + 1));
            } else if let Some(&building) = keys.get(&next) {
                distance.insert(next, d + 1);
                visit(building, d + 1);
            }
        }
    }
}
