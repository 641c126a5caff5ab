//! The AI player: ship roster, resource stocking, settlement founding and
//! mission dispatch
//!
//! Runs on a fixed cadence. Within one pass, resource management always runs
//! before founding and mission dispatch, so buy/sell adjustments reflect the
//! start-of-pass inventory. Mission progress is advanced every tick and
//! terminal outcomes drain through an explicit queue rather than re-entrant
//! callbacks.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ai::mission::{Mission, MissionProgress, MissionTask};
use crate::catalog::{BuildingCatalog, BuildingKind};
use crate::core::config::AiConfig;
use crate::core::types::{Coord, IslandId, MissionId, Resource, SettlementId, ShipId};
use crate::settlement::{LandManager, SettlementManager};
use crate::world::World;

/// What a ship in the roster is currently doing.
///
/// A ship is in exactly one state at a time and is referenced by at most one
/// active mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipAssignment {
    Idle,
    MovingRandom,
    MovingToBranch,
    ReachedBranch,
    OnAMission,
}

impl ShipAssignment {
    /// Ships in these states can be given a mission
    fn available(&self) -> bool {
        matches!(self, ShipAssignment::Idle | ShipAssignment::ReachedBranch)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiPlayer {
    pub money: u32,
    rng: ChaCha8Rng,
    /// Claimed islands awaiting settlement; the land manager moves into the
    /// settlement manager once founding succeeds
    claims: BTreeMap<IslandId, LandManager>,
    pub settlements: Vec<SettlementManager>,
    missions: Vec<Mission>,
    ships: BTreeMap<ShipId, ShipAssignment>,
    need_feeder_island: bool,
    need_more_ships: bool,
    next_settlement: u32,
    next_mission: u32,
}

impl AiPlayer {
    pub fn new(seed: u64, money: u32) -> Self {
        Self {
            money,
            rng: ChaCha8Rng::seed_from_u64(seed),
            claims: BTreeMap::new(),
            settlements: Vec::new(),
            missions: Vec::new(),
            ships: BTreeMap::new(),
            need_feeder_island: false,
            need_more_ships: false,
            next_settlement: 0,
            next_mission: 0,
        }
    }

    pub fn missions(&self) -> &[Mission] {
        &self.missions
    }

    pub fn ship_assignment(&self, ship: ShipId) -> Option<ShipAssignment> {
        self.ships.get(&ship).copied()
    }

    pub fn needs_more_ships(&self) -> bool {
        self.need_more_ships
    }

    pub fn wants_feeder_island(&self) -> bool {
        self.need_feeder_island
    }

    pub fn claims(&self) -> &BTreeMap<IslandId, LandManager> {
        &self.claims
    }

    fn next_settlement_id(&mut self) -> SettlementId {
        let id = SettlementId(self.next_settlement);
        self.next_settlement += 1;
        id
    }

    fn next_mission_id(&mut self) -> MissionId {
        let id = MissionId(self.next_mission);
        self.next_mission += 1;
        id
    }

    /// One scheduler tick. Mission progress advances every tick; planning
    /// runs on the configured cadence.
    pub fn tick(&mut self, world: &mut World, catalog: &BuildingCatalog, config: &AiConfig) {
        self.reconcile_ships(world);
        self.advance_missions(world, catalog, config);
        if world.tick % config.tick_period == 0 {
            self.manage_resources(config);
            self.update_feeder_need(world, config);
            self.found_settlements(world, config);
            self.dispatch_trade();
            self.wander_idle_ships(world);
        }
    }

    // === SHIPS ===

    /// Pick up ships added to the world since the last call
    pub fn refresh_ships(&mut self, world: &World) {
        for ship in world.ships() {
            self.ships.entry(ship.id).or_insert_with(|| {
                tracing::info!(ship = ship.id.0, "added ship to the fleet");
                ShipAssignment::Idle
            });
        }
        self.need_more_ships = false;
    }

    /// Called when founding wants a ship and none is available
    pub fn request_ship(&mut self) {
        if !self.need_more_ships {
            tracing::info!("requesting another ship");
        }
        self.need_more_ships = true;
    }

    /// Transport-layer notification: a ship cannot continue its path.
    /// Missions observing the flag abort and release the ship.
    pub fn notify_ship_blocked(&mut self, world: &mut World, ship: ShipId) {
        tracing::warn!(ship = ship.0, "ship path blocked");
        if let Some(ship) = world.ship_mut(ship) {
            ship.blocked = true;
        }
    }

    fn pick_available_ship(&self) -> Option<ShipId> {
        self.ships
            .iter()
            .find(|(_, assignment)| assignment.available())
            .map(|(&id, _)| id)
    }

    /// Fold completed voyages back into the roster states
    fn reconcile_ships(&mut self, world: &mut World) {
        let ship_ids: Vec<ShipId> = self.ships.keys().copied().collect();
        for id in ship_ids {
            let assignment = self.ships[&id];
            let Some(ship) = world.ship_mut(id) else {
                continue;
            };
            match assignment {
                ShipAssignment::MovingRandom => {
                    if ship.blocked {
                        tracing::warn!(ship = id.0, "wandering ship blocked");
                        ship.abort_voyage();
                        self.ships.insert(id, ShipAssignment::Idle);
                    } else if !ship.is_sailing() {
                        self.ships.insert(id, ShipAssignment::Idle);
                    }
                }
                ShipAssignment::MovingToBranch => {
                    if ship.blocked {
                        tracing::warn!(ship = id.0, "ship blocked on the way to a branch office");
                        ship.abort_voyage();
                        self.ships.insert(id, ShipAssignment::Idle);
                    } else if !ship.is_sailing() {
                        self.ships.insert(id, ShipAssignment::ReachedBranch);
                    }
                }
                _ => {}
            }
        }
    }

    /// Send ships nobody needs this pass somewhere useful: to a branch
    /// office when one exists, wandering otherwise
    fn wander_idle_ships(&mut self, world: &mut World) {
        let ship_ids: Vec<ShipId> = self.ships.keys().copied().collect();
        for id in ship_ids {
            if self.ships[&id] != ShipAssignment::Idle {
                continue;
            }
            let Some(position) = world.ship(id).map(|s| s.position) else {
                continue;
            };
            if let Some(anchorage) = self.nearest_branch_anchorage(world, position) {
                if let Some(ship) = world.ship_mut(id) {
                    ship.sail_to(anchorage);
                    self.ships.insert(id, ShipAssignment::MovingToBranch);
                }
            } else if let Some(target) = self.random_sea_position(world) {
                if let Some(ship) = world.ship_mut(id) {
                    ship.sail_to(target);
                    self.ships.insert(id, ShipAssignment::MovingRandom);
                }
            }
        }
    }

    fn nearest_branch_anchorage(&self, world: &World, from: Coord) -> Option<Coord> {
        self.settlements
            .iter()
            .filter_map(|s| world.island(s.island()))
            .map(|island| island.anchorage)
            .min_by_key(|&anchorage| (from.manhattan_distance(anchorage), anchorage))
    }

    fn random_sea_position(&mut self, world: &World) -> Option<Coord> {
        let anchorages: Vec<Coord> = world.islands().map(|i| i.anchorage).collect();
        if anchorages.is_empty() {
            return None;
        }
        let base = anchorages[self.rng.gen_range(0..anchorages.len())];
        let dx = self.rng.gen_range(-3..=3);
        let dy = self.rng.gen_range(-3..=3);
        Some(base.offset(dx, dy))
    }

    // === MISSIONS ===

    /// Advance every active mission, then drain terminal outcomes through an
    /// explicit queue so follow-up dispatches never re-enter mid-advance
    pub fn advance_missions(
        &mut self,
        world: &mut World,
        catalog: &BuildingCatalog,
        config: &AiConfig,
    ) {
        let mut terminal = Vec::new();
        let mut remaining = Vec::new();
        for mut mission in std::mem::take(&mut self.missions) {
            match mission.advance(world, catalog, &mut self.settlements, config) {
                MissionProgress::InProgress => remaining.push(mission),
                progress => terminal.push((mission, progress)),
            }
        }
        self.missions = remaining;
        for (mission, progress) in terminal {
            self.process_outcome(world, catalog, config, mission, progress);
        }
    }

    /// Exactly one terminal outcome per mission: the mission was removed from
    /// the active set before this call and is consumed here
    fn process_outcome(
        &mut self,
        world: &mut World,
        catalog: &BuildingCatalog,
        config: &AiConfig,
        mission: Mission,
        progress: MissionProgress,
    ) {
        if let Some(assignment) = self.ships.get_mut(&mission.ship) {
            *assignment = ShipAssignment::Idle;
        }
        if let Some(ship) = world.ship_mut(mission.ship) {
            ship.abort_voyage();
        }

        match progress {
            MissionProgress::Succeeded(message) => {
                tracing::info!(mission = mission.id.0, %message, "mission succeeded");
                match mission.task {
                    MissionTask::FoundSettlement {
                        island,
                        feeder,
                        branch_office,
                    } => self.finish_founding(world, catalog, island, feeder, branch_office, mission.ship),
                    MissionTask::PrepareFoundationShip { .. } => {
                        // the prepared resources may make founding possible
                        // right now, not a cadence away
                        self.found_settlements(world, config);
                    }
                    MissionTask::DomesticTrade { .. } => {}
                }
            }
            MissionProgress::Failed(message) => {
                tracing::warn!(mission = mission.id.0, %message, "mission failed");
                if let MissionTask::FoundSettlement { island, .. } = mission.task {
                    // release the island back to the pool
                    self.claims.remove(&island);
                }
            }
            MissionProgress::InProgress => {
                unreachable!("non-terminal mission in the outcome queue")
            }
        }
    }

    fn finish_founding(
        &mut self,
        world: &mut World,
        catalog: &BuildingCatalog,
        island: IslandId,
        feeder: bool,
        branch_office: Option<crate::core::types::BuildingId>,
        ship: ShipId,
    ) {
        let Some(land) = self.claims.remove(&island) else {
            tracing::error!(island = island.0, "founding succeeded on an unclaimed island");
            return;
        };
        let Some(branch_office) = branch_office else {
            tracing::error!(island = island.0, "founding succeeded without a branch office");
            return;
        };
        let id = self.next_settlement_id();
        match SettlementManager::found(id, world, catalog, land, branch_office) {
            Ok(mut settlement) => {
                if let Some(ship) = world.ship_mut(ship) {
                    ship.cargo.drain_into(&mut settlement.stock);
                }
                if feeder {
                    self.need_feeder_island = false;
                }
                tracing::info!(
                    settlement = id.0,
                    island = island.0,
                    feeder,
                    "settlement founded"
                );
                self.settlements.push(settlement);
            }
            Err(error) => {
                tracing::error!(island = island.0, %error, "settlement creation failed");
            }
        }
    }

    // === RESOURCE STOCKING ===

    /// Push each settlement's inventory toward the configured band. Feeder
    /// settlements never sell food; it is their reason to exist.
    pub fn manage_resources(&mut self, config: &AiConfig) {
        for settlement in &mut self.settlements {
            for (resource, (max_buy, min_sell)) in config.buy_sell_thresholds() {
                let inventory = settlement.stock.get(resource);
                if inventory < max_buy {
                    settlement.stop_selling(resource);
                    settlement.start_buying(resource, max_buy);
                } else if inventory > min_sell
                    && !(settlement.is_feeder() && resource == Resource::Food)
                {
                    settlement.stop_buying(resource);
                    settlement.start_selling(resource, min_sell);
                } else {
                    settlement.stop_buying(resource);
                    settlement.stop_selling(resource);
                }
            }
        }
    }

    // === FOUNDING ===

    fn is_claimed(&self, island: IslandId) -> bool {
        self.claims.contains_key(&island) || self.settlements.iter().any(|s| s.island() == island)
    }

    /// Unclaimed islands with at least `min_land` free constructible flat
    /// tiles, with their land counts
    pub fn available_islands(&self, world: &World, min_land: u32) -> Vec<(u32, IslandId)> {
        world
            .islands()
            .filter(|island| !self.is_claimed(island.id))
            .filter_map(|island| {
                let flat = world.flat_land(island.id);
                (flat >= min_land).then_some((flat, island.id))
            })
            .collect()
    }

    /// Size-weighted lottery over qualifying islands: bigger islands are more
    /// likely but not guaranteed to be chosen
    pub fn choose_island(&mut self, world: &World, min_land: u32) -> Option<IslandId> {
        let options = self.available_islands(world, min_land);
        let total: u32 = options.iter().map(|&(land, _)| land).sum();
        if total == 0 {
            return None;
        }
        let mut choice = self.rng.gen_range(0..total);
        for (land, island) in options {
            if choice < land {
                return Some(island);
            }
            choice -= land;
        }
        None
    }

    /// Walk the size tiers in decreasing order; the first tier with a
    /// qualifying island wins
    pub fn select_island(&mut self, world: &World, config: &AiConfig) -> Option<IslandId> {
        for &tier in &config.island_size_tiers {
            if let Some(island) = self.choose_island(world, tier) {
                return Some(island);
            }
        }
        None
    }

    /// Money floor plus resource floors, counted across the ship's cargo and
    /// (optionally) one settlement's stock
    pub fn have_starting_resources(
        &self,
        world: &World,
        ship: ShipId,
        settlement: Option<&SettlementManager>,
        config: &AiConfig,
        feeder: bool,
    ) -> bool {
        let (min_money, floors) = config.founding_floors(feeder);
        if self.money < min_money {
            return false;
        }
        let cargo = world.ship(ship).map(|s| &s.cargo);
        for (resource, amount) in floors {
            let mut have = cargo.map(|c| c.get(resource)).unwrap_or(0);
            if let Some(settlement) = settlement {
                have += settlement.stock.get(resource);
            }
            if have < amount {
                return false;
            }
        }
        true
    }

    /// No more than one developing village at a time: a new one is wanted
    /// only while every existing non-feeder settlement can chip in
    pub fn want_another_village(&self, config: &AiConfig) -> bool {
        self.settlements
            .iter()
            .filter(|s| !s.is_feeder())
            .all(|s| s.can_provide_resources(config))
    }

    pub fn have_feeder_island(&self) -> bool {
        self.settlements.iter().any(|s| s.is_feeder())
    }

    pub fn can_found_feeder_island(&self, world: &World, config: &AiConfig) -> bool {
        !self
            .available_islands(world, config.feeder_island_min_size)
            .is_empty()
    }

    /// Latch the feeder wish if a big enough island exists; cleared when a
    /// feeder settlement is founded
    pub fn found_feeder_island(&mut self, world: &World, config: &AiConfig) {
        if self.can_found_feeder_island(world, config) {
            tracing::info!("a feeder island is wanted");
            self.need_feeder_island = true;
        }
    }

    fn update_feeder_need(&mut self, world: &World, config: &AiConfig) {
        if self.need_feeder_island || self.have_feeder_island() {
            return;
        }
        let any_cramped = self
            .settlements
            .iter()
            .any(|s| !s.is_feeder() && s.low_on_space(config));
        if any_cramped {
            self.found_feeder_island(world, config);
        }
    }

    /// At most one idle ship is sent founding (or resource-gathering) per
    /// pass
    pub fn found_settlements(&mut self, world: &World, config: &AiConfig) {
        let Some(ship) = self.pick_available_ship() else {
            self.request_ship();
            return;
        };
        let Some(island) = self.select_island(world, config) else {
            return;
        };

        if self.need_feeder_island {
            if self.have_starting_resources(world, ship, None, config, true) {
                tracing::info!(ship = ship.0, island = island.0, "founding a feeder settlement");
                self.found_settlement(world, island, ship, true);
            } else {
                for index in 0..self.settlements.len() {
                    if self.have_starting_resources(
                        world,
                        ship,
                        Some(&self.settlements[index]),
                        config,
                        true,
                    ) {
                        self.prepare_foundation_ship(index, ship, true);
                        return;
                    }
                }
            }
        } else if self.want_another_village(config) {
            if self.have_starting_resources(world, ship, None, config, false) {
                tracing::info!(ship = ship.0, island = island.0, "founding a settlement");
                self.found_settlement(world, island, ship, false);
            } else {
                for index in 0..self.settlements.len() {
                    if !self.settlements[index].can_provide_resources(config) {
                        continue;
                    }
                    if self.have_starting_resources(
                        world,
                        ship,
                        Some(&self.settlements[index]),
                        config,
                        false,
                    ) {
                        self.prepare_foundation_ship(index, ship, false);
                        return;
                    }
                }
            }
        }
    }

    fn found_settlement(&mut self, world: &World, island: IslandId, ship: ShipId, feeder: bool) {
        let Some(island_ref) = world.island(island) else {
            return;
        };
        self.claims.insert(island, LandManager::new(island_ref, feeder));
        self.ships.insert(ship, ShipAssignment::OnAMission);
        let mission = Mission::found_settlement(self.next_mission_id(), ship, island, feeder);
        self.missions.push(mission);
    }

    fn prepare_foundation_ship(&mut self, settlement_index: usize, ship: ShipId, feeder: bool) {
        let settlement = self.settlements[settlement_index].id;
        tracing::info!(
            ship = ship.0,
            settlement = settlement.0,
            feeder,
            "sending a ship to gather founding resources"
        );
        self.ships.insert(ship, ShipAssignment::OnAMission);
        let mission =
            Mission::prepare_foundation_ship(self.next_mission_id(), ship, settlement, feeder);
        self.missions.push(mission);
    }

    // === TRADE ===

    /// Route surplus from a selling settlement to a buying one, one new trade
    /// run per pass at most
    fn dispatch_trade(&mut self) {
        let Some(ship) = self.pick_available_ship() else {
            return;
        };
        for source in 0..self.settlements.len() {
            for destination in 0..self.settlements.len() {
                if source == destination {
                    continue;
                }
                for resource in Resource::TRACKED {
                    if !self.settlements[source].is_selling(resource)
                        || !self.settlements[destination].is_buying(resource)
                    {
                        continue;
                    }
                    let threshold = self.settlements[source]
                        .sell_threshold(resource)
                        .unwrap_or(0);
                    let amount = self.settlements[source]
                        .stock
                        .get(resource)
                        .saturating_sub(threshold);
                    if amount == 0 {
                        continue;
                    }
                    tracing::info!(
                        ship = ship.0,
                        from = self.settlements[source].id.0,
                        to = self.settlements[destination].id.0,
                        ?resource,
                        amount,
                        "dispatching a domestic trade run"
                    );
                    self.ships.insert(ship, ShipAssignment::OnAMission);
                    let mission = Mission::domestic_trade(
                        self.next_mission_id(),
                        ship,
                        self.settlements[source].id,
                        self.settlements[destination].id,
                        resource,
                        amount,
                    );
                    self.missions.push(mission);
                    return;
                }
            }
        }
    }

    // === AGGREGATION ===

    pub fn count_buildings(&self, world: &World, kind: BuildingKind) -> u32 {
        self.settlements
            .iter()
            .map(|s| s.count_buildings(world, kind))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Orientation;
    use crate::world::Island;

    fn settled_player(stock: &[(Resource, u32)], feeder: bool) -> (World, AiPlayer) {
        let mut world = World::new();
        let catalog = BuildingCatalog::standard();
        let island_id = world.allocate_island_id();
        world.insert_island(Island::rect(island_id, Coord::new(0, 0), 24, 24));
        let land = LandManager::new(world.island(island_id).unwrap(), feeder);
        let bo = world
            .construct(
                &catalog,
                BuildingKind::BranchOffice,
                island_id,
                Coord::new(1, 1),
                Orientation::Horizontal,
            )
            .unwrap();
        let mut settlement =
            SettlementManager::found(SettlementId(0), &mut world, &catalog, land, bo).unwrap();
        for &(resource, amount) in stock {
            settlement.stock.add(resource, amount);
        }
        let mut player = AiPlayer::new(7, 10000);
        player.settlements.push(settlement);
        (world, player)
    }

    #[test]
    fn test_low_inventory_joins_the_buy_list() {
        let (_, mut player) = settled_player(&[(Resource::Food, 15)], false);
        player.manage_resources(&AiConfig::default());
        let settlement = &player.settlements[0];
        assert!(settlement.is_buying(Resource::Food));
        assert!(!settlement.is_selling(Resource::Food));
    }

    #[test]
    fn test_high_inventory_joins_the_sell_list() {
        let (_, mut player) = settled_player(&[(Resource::Food, 50)], false);
        player.manage_resources(&AiConfig::default());
        let settlement = &player.settlements[0];
        assert!(settlement.is_selling(Resource::Food));
        assert!(!settlement.is_buying(Resource::Food));
    }

    #[test]
    fn test_in_band_inventory_is_on_neither_list() {
        let (_, mut player) = settled_player(&[(Resource::Food, 25)], false);
        player.manage_resources(&AiConfig::default());
        let settlement = &player.settlements[0];
        assert!(!settlement.is_buying(Resource::Food));
        assert!(!settlement.is_selling(Resource::Food));
    }

    #[test]
    fn test_feeder_settlement_never_sells_food() {
        let (_, mut player) = settled_player(&[(Resource::Food, 50), (Resource::Boards, 50)], true);
        player.manage_resources(&AiConfig::default());
        let settlement = &player.settlements[0];
        assert!(!settlement.is_selling(Resource::Food));
        assert!(!settlement.is_buying(Resource::Food));
        // the exemption is food-specific
        assert!(settlement.is_selling(Resource::Boards));
    }

    #[test]
    fn test_band_crossing_moves_between_lists() {
        let (_, mut player) = settled_player(&[(Resource::Food, 15)], false);
        let config = AiConfig::default();
        player.manage_resources(&config);
        assert!(player.settlements[0].is_buying(Resource::Food));

        player.settlements[0].stock.add(Resource::Food, 40);
        player.manage_resources(&config);
        assert!(!player.settlements[0].is_buying(Resource::Food));
        assert!(player.settlements[0].is_selling(Resource::Food));
    }

    #[test]
    fn test_island_eligibility_by_tier() {
        let mut world = World::new();
        // (29-4) x (28-4) = 600 flat tiles
        let big = world.allocate_island_id();
        world.insert_island(Island::rect(big, Coord::new(0, 0), 29, 28));
        // (24-4) x (14-4) = 200 flat tiles
        let small = world.allocate_island_id();
        world.insert_island(Island::rect(small, Coord::new(60, 0), 24, 14));

        let player = AiPlayer::new(3, 10000);
        let eligible = player.available_islands(&world, 300);
        assert_eq!(eligible, vec![(600, big)]);
        assert_eq!(player.available_islands(&world, 150).len(), 2);
    }

    #[test]
    fn test_tier_walk_falls_through_to_smaller_tiers() {
        let mut world = World::new();
        // (25-4) x (24-4) = 420 flat tiles: misses the 500 tier, meets 300
        let mid = world.allocate_island_id();
        world.insert_island(Island::rect(mid, Coord::new(0, 0), 25, 24));
        let tiny = world.allocate_island_id();
        world.insert_island(Island::rect(tiny, Coord::new(60, 0), 14, 14));

        let mut player = AiPlayer::new(3, 10000);
        let config = AiConfig::default();
        assert_eq!(player.select_island(&world, &config), Some(mid));
    }

    #[test]
    fn test_claimed_islands_are_not_available() {
        let mut world = World::new();
        let island = world.allocate_island_id();
        world.insert_island(Island::rect(island, Coord::new(0, 0), 29, 28));
        let mut player = AiPlayer::new(3, 10000);
        assert_eq!(player.available_islands(&world, 300).len(), 1);
        let ship = world.spawn_ship(Coord::new(-5, -5));
        player.refresh_ships(&world);
        player.found_settlement(&world, island, ship, false);
        assert!(player.available_islands(&world, 300).is_empty());
        assert_eq!(
            player.ship_assignment(ship),
            Some(ShipAssignment::OnAMission)
        );
    }

    #[test]
    fn test_founding_requires_money_and_floors() {
        let mut world = World::new();
        let config = AiConfig::default();
        let ship = world.spawn_ship(Coord::new(0, 0));
        let mut poor = AiPlayer::new(1, 100);
        poor.refresh_ships(&world);
        assert!(!poor.have_starting_resources(&world, ship, None, &config, false));

        let rich = AiPlayer::new(1, 10000);
        assert!(!rich.have_starting_resources(&world, ship, None, &config, false));
        world
            .ship_mut(ship)
            .unwrap()
            .cargo
            .add(Resource::Boards, 17);
        world.ship_mut(ship).unwrap().cargo.add(Resource::Food, 10);
        world.ship_mut(ship).unwrap().cargo.add(Resource::Tools, 5);
        assert!(rich.have_starting_resources(&world, ship, None, &config, false));
    }

    #[test]
    fn test_no_available_ship_requests_one() {
        let mut world = World::new();
        let island = world.allocate_island_id();
        world.insert_island(Island::rect(island, Coord::new(0, 0), 29, 28));
        let mut player = AiPlayer::new(3, 10000);
        assert!(!player.needs_more_ships());
        player.found_settlements(&mut world, &AiConfig::default());
        assert!(player.needs_more_ships());
        world.spawn_ship(Coord::new(0, 0));
        player.refresh_ships(&world);
        assert!(!player.needs_more_ships());
    }

    #[test]
    fn test_want_another_village_needs_every_settlement_solvent() {
        let (_, mut player) = settled_player(&[(Resource::Food, 5)], false);
        let config = AiConfig::default();
        assert!(!player.want_another_village(&config));
        player.settlements[0].stock.add(Resource::Food, 40);
        player.settlements[0].stock.add(Resource::Boards, 30);
        player.settlements[0].stock.add(Resource::Tools, 40);
        assert!(player.want_another_village(&config));
    }

    #[test]
    fn test_finish_founding_handles_missing_claim() {
        let mut world = World::new();
        let catalog = BuildingCatalog::standard();
        let config = AiConfig::default();
        let mut player = AiPlayer::new(3, 10000);
        // a forged terminal outcome must not corrupt the roster
        let mission = Mission::found_settlement(MissionId(99), ShipId(0), IslandId(42), false);
        player.process_outcome(
            &mut world,
            &catalog,
            &config,
            mission,
            MissionProgress::Failed("island taken".into()),
        );
        assert!(player.settlements.is_empty());
        assert!(player.ship_assignment(ShipId(0)).is_none());
    }
}
