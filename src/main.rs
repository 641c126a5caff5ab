//! Tideholm demo: run the settlement AI on a small archipelago
//!
//! Builds a handful of islands, gives the player two ships and founding
//! resources, then lets the tick loop run. A simple build order drives each
//! settlement's production and village requests so the planners have work to
//! do; the interesting decisions are all logged.

use clap::Parser;
use std::path::PathBuf;

use tideholm::ai::AiPlayer;
use tideholm::catalog::{BuildingCatalog, BuildingKind};
use tideholm::core::config::AiConfig;
use tideholm::core::error::Result;
use tideholm::core::types::{Coord, Resource};
use tideholm::plan::grid_plan::FieldKind;
use tideholm::plan::production::ProductionRequest;
use tideholm::plan::village::VillageRequest;
use tideholm::plan::BuildOutcome;
use tideholm::settlement::SettlementManager;
use tideholm::world::{Island, World};

#[derive(Parser, Debug)]
#[command(name = "tideholm")]
#[command(about = "Run the autonomous island-settlement AI")]
struct Args {
    /// Random seed for reproducible runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of scheduler ticks to simulate
    #[arg(long, default_value_t = 1500)]
    ticks: u64,

    /// Starting money for the AI player
    #[arg(long, default_value_t = 10000)]
    money: u32,

    /// Optional TOML file overriding the tuned AI constants
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log every build attempt, not just the decisions
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let config = match &args.config {
        Some(path) => AiConfig::from_toml_file(path)?,
        None => AiConfig::default(),
    };
    let catalog = BuildingCatalog::standard();

    let mut world = build_archipelago();
    let mut player = AiPlayer::new(args.seed, args.money);

    // two ships, the first carrying the founding resources
    let flagship = world.spawn_ship(Coord::new(-8, 10));
    world.spawn_ship(Coord::new(-8, 14));
    if let Some(ship) = world.ship_mut(flagship) {
        ship.cargo.add(Resource::Boards, 30);
        ship.cargo.add(Resource::Food, 20);
        ship.cargo.add(Resource::Tools, 12);
    }
    player.refresh_ships(&world);

    tracing::info!(seed = args.seed, ticks = args.ticks, "starting simulation");
    for _ in 0..args.ticks {
        world.advance();
        player.tick(&mut world, &catalog, &config);
        if world.tick % config.tick_period == 0 {
            for settlement in player.settlements.iter_mut() {
                develop(settlement, &mut world, &catalog, &config);
            }
        }
    }

    for settlement in &player.settlements {
        tracing::info!(
            settlement = settlement.id.0,
            island = settlement.island().0,
            feeder = settlement.is_feeder(),
            lumberjacks = settlement.count_buildings(&world, BuildingKind::Lumberjack),
            farms = settlement.count_buildings(&world, BuildingKind::Farm),
            fishers = settlement.count_buildings(&world, BuildingKind::Fisher),
            residences = settlement.count_buildings(&world, BuildingKind::Residence),
            storages = settlement.count_buildings(&world, BuildingKind::Storage),
            "final state"
        );
    }
    tracing::info!(
        settlements = player.settlements.len(),
        active_missions = player.missions().len(),
        "simulation finished"
    );
    Ok(())
}

fn build_archipelago() -> World {
    let mut world = World::new();

    let a = world.allocate_island_id();
    let mut island = Island::rect(a, Coord::new(0, 0), 34, 34);
    island.add_clay_deposit(Coord::new(26, 26));
    island.add_fish_deposit(Coord::new(0, 10));
    island.add_fish_deposit(Coord::new(0, 16));
    island.add_fish_deposit(Coord::new(10, 0));
    world.insert_island(island);

    let b = world.allocate_island_id();
    let mut island = Island::rect(b, Coord::new(60, 0), 28, 28);
    island.add_clay_deposit(Coord::new(80, 20));
    island.add_fish_deposit(Coord::new(60, 12));
    world.insert_island(island);

    let c = world.allocate_island_id();
    let mut island = Island::rect(c, Coord::new(0, 60), 22, 22);
    island.add_fish_deposit(Coord::new(0, 68));
    world.insert_island(island);

    world
}

/// A deliberately simple build order: wood first, then food, then the clay
/// chain, with the village growing alongside
fn develop(
    settlement: &mut SettlementManager,
    world: &mut World,
    catalog: &BuildingCatalog,
    config: &AiConfig,
) {
    let food_producers =
        settlement.counters.fields(FieldKind::Potato) + settlement.counters.num_fishers;
    let request = if settlement.count_buildings(world, BuildingKind::Lumberjack) < 2 {
        ProductionRequest::Lumberjack
    } else if food_producers < 4 {
        ProductionRequest::FoodProducer
    } else if settlement.count_buildings(world, BuildingKind::ClayPit) < 1 {
        ProductionRequest::ClayPit
    } else if settlement.count_buildings(world, BuildingKind::Brickyard) < 1 {
        ProductionRequest::Brickyard
    } else if settlement.counters.fields(FieldKind::Sugarcane) < 2 {
        ProductionRequest::SugarProducer
    } else if settlement.count_buildings(world, BuildingKind::Distillery) < 1 {
        ProductionRequest::Distillery
    } else if !settlement.production.enough_collectors(world, catalog) {
        ProductionRequest::Storage
    } else {
        return;
    };
    let outcome = settlement.attempt_production(world, catalog, config, request);
    tracing::debug!(settlement = settlement.id.0, ?request, ?outcome, "production pass");

    if settlement.is_feeder() {
        return;
    }
    for request in [
        VillageRequest::MainSquare,
        VillageRequest::Residence,
        VillageRequest::Pavilion,
        VillageRequest::VillageSchool,
        VillageRequest::Tavern,
    ] {
        match settlement.attempt_village(world, catalog, config, request) {
            BuildOutcome::Skip => continue,
            outcome => {
                tracing::debug!(settlement = settlement.id.0, ?request, ?outcome, "village pass");
                break;
            }
        }
    }
}
