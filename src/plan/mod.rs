//! Settlement planning: the grid plan, builders, evaluators and the
//! production/village builders that decide what gets placed where

pub mod builder;
pub mod evaluator;
pub mod grid_plan;
pub mod production;
pub mod village;

pub use builder::Builder;
pub use evaluator::{Evaluator, EvaluatorDetail, SiteCtx};
pub use grid_plan::{FieldKind, GridPlan, PlanEntry, Purpose};
pub use production::{ProductionBuilder, ProductionRequest, SettlementCounters};
pub use village::VillageBuilder;

use serde::{Deserialize, Serialize};

/// Outcome of one build attempt
///
/// Every fallible step in a build attempt resolves to one of these; none of
/// them is an error in the `Result` sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildOutcome {
    /// One building placed; the grid plan changed
    Ok,
    /// The cheapest viable candidate is not affordable; retry later
    NeedResources,
    /// No legal site exists under the current plan; do not retry this tick
    Impossible,
    /// The candidate footprint leaves the claimed settlement ground
    OutOfSettlement,
    /// A placement that passed the legality checks was refused by
    /// construction; hard stop for this build kind this tick
    UnknownError,
    /// No precomputed plan slot matched the request
    Skip,
}
