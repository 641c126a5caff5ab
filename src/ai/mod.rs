//! Mission state machines and the AI player tick loop

pub mod mission;
pub mod player;

pub use mission::{Mission, MissionProgress, MissionState, MissionTask};
pub use player::{AiPlayer, ShipAssignment};
