//! Per-settlement aggregation: builders, stock, counters, trade lists
//!
//! The settlement manager owns one production builder and one village
//! builder over its land manager's areas. The build-order logic that decides
//! which request to issue next lives with the caller; the manager only
//! executes requests and keeps the per-settlement state consistent.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::{BuildingCatalog, BuildingKind};
use crate::core::config::AiConfig;
use crate::core::error::{Result, TideholmError};
use crate::core::types::{BuildingId, Coord, IslandId, Resource, SettlementId};
use crate::plan::production::{ProductionBuilder, ProductionRequest, SettlementCounters};
use crate::plan::village::{VillageBuilder, VillageRequest};
use crate::plan::BuildOutcome;
use crate::settlement::land::LandManager;
use crate::world::{Stock, World};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementManager {
    pub id: SettlementId,
    land: LandManager,
    pub production: ProductionBuilder,
    pub village: VillageBuilder,
    pub counters: SettlementCounters,
    pub stock: Stock,
    pub branch_office: BuildingId,
    /// Resource -> target amount the settlement buys up to
    buy_list: BTreeMap<Resource, u32>,
    /// Resource -> threshold the settlement sells down to
    sell_list: BTreeMap<Resource, u32>,
}

impl SettlementManager {
    /// Bind a new settlement to its freshly built branch office: the
    /// production plan covers the land manager's production area, the village
    /// layout its village area.
    pub fn found(
        id: SettlementId,
        world: &mut World,
        _catalog: &BuildingCatalog,
        land: LandManager,
        branch_office: BuildingId,
    ) -> Result<Self> {
        let building = world.building(branch_office).cloned().ok_or_else(|| {
            TideholmError::InvariantViolation(format!(
                "settlement {} founded on missing branch office {}",
                id.0, branch_office.0
            ))
        })?;
        let mut production = ProductionBuilder::new(
            land.island,
            land.production_area().iter().copied(),
            &building,
        );
        production.seed_roads(world, &building);

        let island = world.island(land.island).ok_or_else(|| {
            TideholmError::InvariantViolation(format!(
                "settlement {} founded on missing island {}",
                id.0,
                land.island.0
            ))
        })?;
        // the layout must not plan over anything already standing
        let village_area: BTreeSet<Coord> = land
            .village_area()
            .iter()
            .copied()
            .filter(|&coord| !world.is_occupied(coord))
            .collect();
        let village = VillageBuilder::generate(island, &village_area);

        Ok(Self {
            id,
            land,
            production,
            village,
            counters: SettlementCounters::default(),
            stock: Stock::new(),
            branch_office,
            buy_list: BTreeMap::new(),
            sell_list: BTreeMap::new(),
        })
    }

    pub fn island(&self) -> IslandId {
        self.land.island
    }

    pub fn is_feeder(&self) -> bool {
        self.land.feeder
    }

    pub fn land(&self) -> &LandManager {
        &self.land
    }

    pub fn attempt_production(
        &mut self,
        world: &mut World,
        catalog: &BuildingCatalog,
        config: &AiConfig,
        request: ProductionRequest,
    ) -> BuildOutcome {
        self.production.attempt_build(
            world,
            catalog,
            config,
            &mut self.stock,
            &mut self.counters,
            request,
        )
    }

    pub fn attempt_village(
        &mut self,
        world: &mut World,
        catalog: &BuildingCatalog,
        config: &AiConfig,
        request: VillageRequest,
    ) -> BuildOutcome {
        let claimed = self.land.claimed();
        self.village
            .attempt_build(world, catalog, config, &mut self.stock, &claimed, request)
    }

    /// Whether this settlement can bankroll founding another one: its stock
    /// clears the sell threshold for every tracked resource
    pub fn can_provide_resources(&self, config: &AiConfig) -> bool {
        config
            .buy_sell_thresholds()
            .iter()
            .all(|&(resource, (_, min_sell))| self.stock.get(resource) >= min_sell)
    }

    /// Fewer free 3x3 plan squares than the threshold means production here
    /// is running out of room
    pub fn low_on_space(&self, config: &AiConfig) -> bool {
        let limit = config.feeder_space_threshold;
        self.production.count_available_squares(3, limit) < limit
    }

    pub fn count_buildings(&self, world: &World, kind: BuildingKind) -> u32 {
        world
            .buildings_on(self.land.island)
            .filter(|b| b.kind == kind)
            .count() as u32
    }

    // === TRADE LISTS ===

    pub fn start_buying(&mut self, resource: Resource, target: u32) {
        self.buy_list.insert(resource, target);
    }

    pub fn stop_buying(&mut self, resource: Resource) {
        self.buy_list.remove(&resource);
    }

    pub fn start_selling(&mut self, resource: Resource, threshold: u32) {
        self.sell_list.insert(resource, threshold);
    }

    pub fn stop_selling(&mut self, resource: Resource) {
        self.sell_list.remove(&resource);
    }

    pub fn is_buying(&self, resource: Resource) -> bool {
        self.buy_list.contains_key(&resource)
    }

    pub fn is_selling(&self, resource: Resource) -> bool {
        self.sell_list.contains_key(&resource)
    }

    pub fn sell_threshold(&self, resource: Resource) -> Option<u32> {
        self.sell_list.get(&resource).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Orientation;
    use crate::world::Island;

    fn founded() -> (World, BuildingCatalog, SettlementManager) {
        let mut world = World::new();
        let catalog = BuildingCatalog::standard();
        let island_id = world.allocate_island_id();
        world.insert_island(Island::rect(island_id, Coord::new(0, 0), 24, 24));
        let land = LandManager::new(world.island(island_id).unwrap(), false);
        let bo = world
            .construct(
                &catalog,
                BuildingKind::BranchOffice,
                island_id,
                Coord::new(1, 1),
                Orientation::Horizontal,
            )
            .unwrap();
        let settlement =
            SettlementManager::found(SettlementId(0), &mut world, &catalog, land, bo).unwrap();
        (world, catalog, settlement)
    }

    #[test]
    fn test_found_initializes_plan_over_production_area() {
        let (_, _, settlement) = founded();
        assert_eq!(
            settlement.production.plan().len(),
            settlement.land().production_area().len()
        );
        assert!(!settlement.is_feeder());
    }

    #[test]
    fn test_found_rejects_missing_branch_office() {
        let mut world = World::new();
        let catalog = BuildingCatalog::standard();
        let island_id = world.allocate_island_id();
        world.insert_island(Island::rect(island_id, Coord::new(0, 0), 24, 24));
        let land = LandManager::new(world.island(island_id).unwrap(), false);
        assert!(
            SettlementManager::found(SettlementId(0), &mut world, &catalog, land, BuildingId(9))
                .is_err()
        );
    }

    #[test]
    fn test_can_provide_resources_needs_sell_threshold() {
        let (_, _, mut settlement) = founded();
        let config = AiConfig::default();
        assert!(!settlement.can_provide_resources(&config));
        settlement.stock.add(Resource::Food, 40);
        settlement.stock.add(Resource::Boards, 30);
        assert!(!settlement.can_provide_resources(&config));
        settlement.stock.add(Resource::Tools, 40);
        assert!(settlement.can_provide_resources(&config));
    }

    #[test]
    fn test_trade_list_membership() {
        let (_, _, mut settlement) = founded();
        settlement.start_buying(Resource::Food, 20);
        assert!(settlement.is_buying(Resource::Food));
        assert!(!settlement.is_selling(Resource::Food));
        settlement.stop_buying(Resource::Food);
        settlement.start_selling(Resource::Food, 40);
        assert!(!settlement.is_buying(Resource::Food));
        assert_eq!(settlement.sell_threshold(Resource::Food), Some(40));
    }
}
