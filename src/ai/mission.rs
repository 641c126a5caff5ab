//! Long-running missions that span many ticks and own a ship for their
//! duration
//!
//! Missions report progress through explicit values returned from `advance`
//! instead of callbacks into the player: the player drains terminal outcomes
//! after each pass, removes the mission from its active set and returns the
//! ship to idle. A mission reaches exactly one terminal state and is consumed
//! by the drain, so the exactly-once reporting contract is structural.

use serde::{Deserialize, Serialize};

use crate::catalog::{BuildingCatalog, BuildingKind, Orientation};
use crate::core::config::AiConfig;
use crate::core::types::{BuildingId, Coord, IslandId, MissionId, Resource, SettlementId, ShipId};
use crate::settlement::SettlementManager;
use crate::world::{Island, TerrainClass, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionState {
    Created,
    Running,
    Succeeded,
    Failed,
}

/// Which leg of a trade run the ship is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeLeg {
    ToSource,
    ToDestination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MissionTask {
    /// Sail to an unclaimed island and erect a branch office there
    FoundSettlement {
        island: IslandId,
        feeder: bool,
        /// Recorded once the branch office stands; the player reads it when
        /// instantiating the settlement manager
        branch_office: Option<BuildingId>,
    },
    /// Sail to an existing settlement and load founding resources
    PrepareFoundationShip {
        settlement: SettlementId,
        feeder: bool,
    },
    /// Move surplus goods from one settlement to another
    DomesticTrade {
        source: SettlementId,
        destination: SettlementId,
        resource: Resource,
        amount: u32,
        leg: TradeLeg,
    },
}

/// Outcome of one `advance` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissionProgress {
    InProgress,
    Succeeded(String),
    Failed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    /// The ship stays in the player's roster; the mission only references it
    pub ship: ShipId,
    pub state: MissionState,
    pub task: MissionTask,
}

impl Mission {
    pub fn found_settlement(id: MissionId, ship: ShipId, island: IslandId, feeder: bool) -> Self {
        Self {
            id,
            ship,
            state: MissionState::Created,
            task: MissionTask::FoundSettlement {
                island,
                feeder,
                branch_office: None,
            },
        }
    }

    pub fn prepare_foundation_ship(
        id: MissionId,
        ship: ShipId,
        settlement: SettlementId,
        feeder: bool,
    ) -> Self {
        Self {
            id,
            ship,
            state: MissionState::Created,
            task: MissionTask::PrepareFoundationShip { settlement, feeder },
        }
    }

    pub fn domestic_trade(
        id: MissionId,
        ship: ShipId,
        source: SettlementId,
        destination: SettlementId,
        resource: Resource,
        amount: u32,
    ) -> Self {
        Self {
            id,
            ship,
            state: MissionState::Created,
            task: MissionTask::DomesticTrade {
                source,
                destination,
                resource,
                amount,
                leg: TradeLeg::ToSource,
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, MissionState::Succeeded | MissionState::Failed)
    }

    /// Drive the mission one step. Must not be called again after a terminal
    /// result; the caller consumes the mission on that transition.
    pub fn advance(
        &mut self,
        world: &mut World,
        catalog: &BuildingCatalog,
        settlements: &mut [SettlementManager],
        config: &AiConfig,
    ) -> MissionProgress {
        debug_assert!(!self.is_terminal(), "advance called on a finished mission");

        if self.state == MissionState::Created {
            return self.start(world, settlements);
        }

        let Some(ship) = world.ship(self.ship) else {
            return self.fail("ship no longer exists".into());
        };
        if ship.blocked {
            if let Some(ship) = world.ship_mut(self.ship) {
                ship.abort_voyage();
            }
            return self.fail("ship path blocked".into());
        }
        if ship.is_sailing() {
            return MissionProgress::InProgress;
        }

        match self.task.clone() {
            MissionTask::FoundSettlement { island, .. } => {
                self.erect_branch_office(world, catalog, island)
            }
            MissionTask::PrepareFoundationShip { settlement, feeder } => {
                self.load_founding_resources(world, settlements, config, settlement, feeder)
            }
            MissionTask::DomesticTrade {
                source,
                destination,
                resource,
                amount,
                leg,
            } => self.run_trade_leg(world, settlements, source, destination, resource, amount, leg),
        }
    }

    /// Issue the first sail and move to `Running`
    fn start(&mut self, world: &mut World, settlements: &[SettlementManager]) -> MissionProgress {
        let destination = match &self.task {
            MissionTask::FoundSettlement { island, .. } => {
                world.island(*island).map(|i| i.anchorage)
            }
            MissionTask::PrepareFoundationShip { settlement, .. } => {
                settlement_anchorage(world, settlements, *settlement)
            }
            MissionTask::DomesticTrade { source, .. } => {
                settlement_anchorage(world, settlements, *source)
            }
        };
        let Some(destination) = destination else {
            return self.fail("mission target no longer exists".into());
        };
        let Some(ship) = world.ship_mut(self.ship) else {
            return self.fail("ship no longer exists".into());
        };
        ship.sail_to(destination);
        self.state = MissionState::Running;
        tracing::debug!(mission = self.id.0, ship = self.ship.0, ?destination, "mission started");
        MissionProgress::InProgress
    }

    fn erect_branch_office(
        &mut self,
        world: &mut World,
        catalog: &BuildingCatalog,
        island_id: IslandId,
    ) -> MissionProgress {
        let Some(island) = world.island(island_id) else {
            return self.fail("target island no longer exists".into());
        };
        if world
            .buildings_on(island_id)
            .any(|b| b.kind == BuildingKind::BranchOffice)
        {
            return self.fail("island already settled".into());
        }
        let Some(origin) = branch_office_site(world, catalog, island) else {
            return self.fail("no branch office site on the island".into());
        };
        let Some(id) = world.construct(
            catalog,
            BuildingKind::BranchOffice,
            island_id,
            origin,
            Orientation::Horizontal,
        ) else {
            tracing::warn!(
                island = island_id.0,
                ?origin,
                "construction refused a branch office site that passed the legality checks"
            );
            return self.fail("branch office construction refused".into());
        };
        if let MissionTask::FoundSettlement { branch_office, .. } = &mut self.task {
            *branch_office = Some(id);
        }
        self.succeed(format!("branch office built on island {}", island_id.0))
    }

    fn load_founding_resources(
        &mut self,
        world: &mut World,
        settlements: &mut [SettlementManager],
        config: &AiConfig,
        settlement: SettlementId,
        feeder: bool,
    ) -> MissionProgress {
        let Some(settlement) = settlements.iter_mut().find(|s| s.id == settlement) else {
            return self.fail("source settlement no longer exists".into());
        };
        let Some(ship) = world.ship_mut(self.ship) else {
            return self.fail("ship no longer exists".into());
        };
        let (_, floors) = config.founding_floors(feeder);
        for (resource, target) in floors {
            let missing = target.saturating_sub(ship.cargo.get(resource));
            settlement
                .stock
                .transfer_to(&mut ship.cargo, resource, missing);
        }
        self.succeed(format!(
            "founding resources loaded at settlement {}",
            settlement.id.0
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn run_trade_leg(
        &mut self,
        world: &mut World,
        settlements: &mut [SettlementManager],
        source: SettlementId,
        destination: SettlementId,
        resource: Resource,
        amount: u32,
        leg: TradeLeg,
    ) -> MissionProgress {
        match leg {
            TradeLeg::ToSource => {
                let Some(settlement) = settlements.iter_mut().find(|s| s.id == source) else {
                    return self.fail("trade source no longer exists".into());
                };
                let Some(ship) = world.ship_mut(self.ship) else {
                    return self.fail("ship no longer exists".into());
                };
                settlement.stock.transfer_to(&mut ship.cargo, resource, amount);

                let Some(next_stop) = settlement_anchorage(world, settlements, destination) else {
                    return self.fail("trade destination no longer exists".into());
                };
                if let Some(ship) = world.ship_mut(self.ship) {
                    ship.sail_to(next_stop);
                }
                if let MissionTask::DomesticTrade { leg, .. } = &mut self.task {
                    *leg = TradeLeg::ToDestination;
                }
                MissionProgress::InProgress
            }
            TradeLeg::ToDestination => {
                let Some(settlement) = settlements.iter_mut().find(|s| s.id == destination) else {
                    return self.fail("trade destination no longer exists".into());
                };
                let Some(ship) = world.ship_mut(self.ship) else {
                    return self.fail("ship no longer exists".into());
                };
                ship.cargo.drain_into(&mut settlement.stock);
                self.succeed(format!(
                    "delivered {:?} to settlement {}",
                    resource, settlement.id.0
                ))
            }
        }
    }

    fn succeed(&mut self, message: String) -> MissionProgress {
        self.state = MissionState::Succeeded;
        MissionProgress::Succeeded(message)
    }

    fn fail(&mut self, message: String) -> MissionProgress {
        self.state = MissionState::Failed;
        MissionProgress::Failed(message)
    }
}

fn settlement_anchorage(
    world: &World,
    settlements: &[SettlementManager],
    id: SettlementId,
) -> Option<Coord> {
    settlements
        .iter()
        .find(|s| s.id == id)
        .and_then(|s| world.island(s.island()))
        .map(|island| island.anchorage)
}

/// Deterministic branch office site choice: the coastal footprint with water
/// access closest to the anchorage
fn branch_office_site(world: &World, catalog: &BuildingCatalog, island: &Island) -> Option<Coord> {
    let profile = catalog.profile(BuildingKind::BranchOffice);
    let mut candidates: Vec<Coord> = Vec::new();
    for origin in island.constructible_coords() {
        let footprint = profile.footprint(origin, Orientation::Horizontal);
        let legal = footprint.iter().all(|&cell| {
            island.terrain(cell).constructible()
                && !world.is_occupied(cell)
                && !world.is_road(cell)
        });
        if !legal {
            continue;
        }
        let touches_coast = footprint
            .iter()
            .any(|&cell| island.terrain(cell) == TerrainClass::Coast);
        let water_access = footprint
            .iter()
            .any(|cell| cell.neighbours4().iter().any(|&n| island.is_water(n)));
        if touches_coast && water_access {
            candidates.push(origin);
        }
    }
    candidates.sort_by_key(|&c| (c.chebyshev_distance(island.anchorage), c));
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_island() -> (World, BuildingCatalog, IslandId) {
        let mut world = World::new();
        let catalog = BuildingCatalog::standard();
        let id = world.allocate_island_id();
        world.insert_island(Island::rect(id, Coord::new(0, 0), 20, 20));
        (world, catalog, id)
    }

    #[test]
    fn test_found_settlement_erects_branch_office() {
        let (mut world, catalog, island) = world_with_island();
        let config = AiConfig::default();
        let ship = world.spawn_ship(Coord::new(-10, -10));
        let mut mission = Mission::found_settlement(MissionId(0), ship, island, false);

        let mut settlements = Vec::new();
        let mut last = MissionProgress::InProgress;
        for _ in 0..40 {
            last = mission.advance(&mut world, &catalog, &mut settlements, &config);
            if last != MissionProgress::InProgress {
                break;
            }
            world.advance();
        }
        assert!(matches!(last, MissionProgress::Succeeded(_)));
        assert_eq!(mission.state, MissionState::Succeeded);
        let MissionTask::FoundSettlement { branch_office, .. } = &mission.task else {
            panic!("wrong task kind");
        };
        let id = branch_office.expect("branch office recorded");
        assert_eq!(
            world.building(id).unwrap().kind,
            BuildingKind::BranchOffice
        );
    }

    #[test]
    fn test_blocked_ship_fails_the_mission() {
        let (mut world, catalog, island) = world_with_island();
        let config = AiConfig::default();
        let ship = world.spawn_ship(Coord::new(-10, -10));
        let mut mission = Mission::found_settlement(MissionId(0), ship, island, false);

        let mut settlements = Vec::new();
        mission.advance(&mut world, &catalog, &mut settlements, &config);
        world.ship_mut(ship).unwrap().blocked = true;
        let progress = mission.advance(&mut world, &catalog, &mut settlements, &config);
        assert!(matches!(progress, MissionProgress::Failed(_)));
        assert_eq!(mission.state, MissionState::Failed);
        // the failure path leaves the ship free to be reassigned
        assert!(!world.ship(ship).unwrap().blocked);
        assert!(!world.ship(ship).unwrap().is_sailing());
        // and no branch office went up
        assert!(world
            .buildings_on(island)
            .all(|b| b.kind != BuildingKind::BranchOffice));
    }

    #[test]
    fn test_found_settlement_fails_on_settled_island() {
        let (mut world, catalog, island) = world_with_island();
        let config = AiConfig::default();
        world
            .construct(
                &catalog,
                BuildingKind::BranchOffice,
                island,
                Coord::new(1, 1),
                Orientation::Horizontal,
            )
            .unwrap();
        let ship = world.spawn_ship(Coord::new(-10, -10));
        let mut mission = Mission::found_settlement(MissionId(0), ship, island, false);
        let mut settlements = Vec::new();
        let mut last = MissionProgress::InProgress;
        for _ in 0..40 {
            last = mission.advance(&mut world, &catalog, &mut settlements, &config);
            if last != MissionProgress::InProgress {
                break;
            }
            world.advance();
        }
        assert!(matches!(last, MissionProgress::Failed(_)));
    }
}
