//! Property tests for the production builder: footprint disjointness,
//! atomicity of failed attempts, queue consistency and scan determinism

use proptest::prelude::*;
use std::collections::BTreeSet;

use tideholm::catalog::{BuildingCatalog, BuildingKind, Orientation};
use tideholm::core::config::AiConfig;
use tideholm::core::types::{Coord, Resource};
use tideholm::plan::production::{ProductionBuilder, ProductionRequest, SettlementCounters};
use tideholm::plan::grid_plan::Purpose;
use tideholm::plan::BuildOutcome;
use tideholm::world::{Island, Stock, World};

const REQUESTS: [ProductionRequest; 7] = [
    ProductionRequest::Lumberjack,
    ProductionRequest::FoodProducer,
    ProductionRequest::SugarProducer,
    ProductionRequest::ClayPit,
    ProductionRequest::Brickyard,
    ProductionRequest::Distillery,
    ProductionRequest::Storage,
];

fn fixture() -> (World, BuildingCatalog, AiConfig, ProductionBuilder, Stock) {
    let mut world = World::new();
    let catalog = BuildingCatalog::standard();
    let config = AiConfig::default();
    let island_id = world.allocate_island_id();
    let mut island = Island::rect(island_id, Coord::new(0, 0), 26, 26);
    island.add_fish_deposit(Coord::new(0, 9));
    island.add_fish_deposit(Coord::new(0, 14));
    island.add_clay_deposit(Coord::new(20, 20));
    world.insert_island(island);

    let bo = world
        .construct(
            &catalog,
            BuildingKind::BranchOffice,
            island_id,
            Coord::new(1, 1),
            Orientation::Horizontal,
        )
        .unwrap();
    let branch_office = world.building(bo).unwrap().clone();
    let area: Vec<Coord> = world
        .island(island_id)
        .unwrap()
        .constructible_coords()
        .collect();
    let mut production = ProductionBuilder::new(island_id, area, &branch_office);
    production.seed_roads(&mut world, &branch_office);

    let stock = Stock::with(&[
        (Resource::Boards, 150),
        (Resource::Tools, 60),
        (Resource::Bricks, 10),
    ]);
    (world, catalog, config, production, stock)
}

fn plan_purposes(production: &ProductionBuilder) -> Vec<(Coord, Purpose)> {
    production
        .plan()
        .cells()
        .map(|(coord, entry)| (coord, entry.purpose))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// No two placements ever claim overlapping footprints, failed attempts
    /// leave the plan untouched, and the unused-field queues stay consistent
    /// with the plan throughout
    #[test]
    fn test_build_sequences_preserve_invariants(choices in prop::collection::vec(0usize..REQUESTS.len(), 1..30)) {
        let (mut world, catalog, config, mut production, mut stock) = fixture();
        let mut counters = SettlementCounters::default();
        let island = production.island();

        for choice in choices {
            let before = plan_purposes(&production);
            let outcome = production.attempt_build(
                &mut world,
                &catalog,
                &config,
                &mut stock,
                &mut counters,
                REQUESTS[choice],
            );
            let after = plan_purposes(&production);
            match outcome {
                BuildOutcome::Ok => prop_assert_ne!(&before, &after, "no-op OK"),
                _ => prop_assert_eq!(&before, &after, "failed attempt mutated the plan"),
            }
            prop_assert!(production.unused_fields_consistent());
        }

        // every constructed footprint cell belongs to exactly one building
        let mut seen = BTreeSet::new();
        for building in world.buildings_on(island) {
            for &cell in &building.footprint {
                prop_assert!(seen.insert(cell), "footprint overlap at {:?}", cell);
            }
        }
    }

    /// The same request sequence on identical state yields the identical
    /// plan: candidate ordering and choice are reproducible
    #[test]
    fn test_scans_are_deterministic(choices in prop::collection::vec(0usize..REQUESTS.len(), 1..20)) {
        let (mut world_a, catalog, config, mut production_a, mut stock_a) = fixture();
        let (mut world_b, _, _, mut production_b, mut stock_b) = fixture();
        let mut counters_a = SettlementCounters::default();
        let mut counters_b = SettlementCounters::default();

        for &choice in &choices {
            let a = production_a.attempt_build(
                &mut world_a,
                &catalog,
                &config,
                &mut stock_a,
                &mut counters_a,
                REQUESTS[choice],
            );
            let b = production_b.attempt_build(
                &mut world_b,
                &catalog,
                &config,
                &mut stock_b,
                &mut counters_b,
                REQUESTS[choice],
            );
            prop_assert_eq!(a, b);
        }
        prop_assert_eq!(plan_purposes(&production_a), plan_purposes(&production_b));
        prop_assert_eq!(stock_a, stock_b);
    }
}

/// Re-running a failed scan must not consume anything: the classic
/// double-spend check on the unused-field queues
#[test]
fn test_unused_fields_are_spent_at_most_once() {
    let (mut world, catalog, config, mut production, mut stock) = fixture();
    let mut counters = SettlementCounters::default();

    let outcome = production.attempt_build(
        &mut world,
        &catalog,
        &config,
        &mut stock,
        &mut counters,
        ProductionRequest::FoodProducer,
    );
    assert_eq!(outcome, BuildOutcome::Ok);

    let mut spent = BTreeSet::new();
    loop {
        let queued: Vec<Coord> = production
            .unused_fields()
            .queue(tideholm::plan::grid_plan::FieldKind::Potato)
            .iter()
            .copied()
            .collect();
        let Some(&next) = queued.first() else {
            break;
        };
        let outcome = production.attempt_build(
            &mut world,
            &catalog,
            &config,
            &mut stock,
            &mut counters,
            ProductionRequest::FoodProducer,
        );
        if outcome != BuildOutcome::Ok {
            break;
        }
        // FIFO: the oldest plot is the one consumed, and never twice
        if production.plan().purpose(next) == Some(Purpose::PotatoField) {
            assert!(spent.insert(next), "plot {:?} consumed twice", next);
        }
    }
    assert!(!spent.is_empty());
}
