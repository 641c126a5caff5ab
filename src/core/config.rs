//! AI tuning configuration with documented constants
//!
//! All tuned thresholds are collected here. The defaults reproduce the
//! behavior the rest of the crate is tested against; they can be overridden
//! from a TOML file for experiments.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{Result, TideholmError};
use crate::core::types::Resource;

/// Configuration for the settlement AI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Scheduler ticks between two AI planning passes
    ///
    /// Resource management and settlement founding both run on this cadence.
    /// Mission progress is advanced every tick regardless.
    pub tick_period: u64,

    /// Buy/sell band for food: (max_buy, min_sell)
    ///
    /// Inventory below max_buy puts the resource on the buy list, above
    /// min_sell on the sell list, strictly between on neither.
    pub food_thresholds: (u32, u32),
    /// Buy/sell band for boards
    pub boards_thresholds: (u32, u32),
    /// Buy/sell band for tools
    pub tools_thresholds: (u32, u32),

    /// Minimum player money before founding a regular village
    pub village_min_money: u32,
    /// Boards required on the founding ship (or reachable settlement stock)
    pub village_min_boards: u32,
    /// Food required for a regular village
    pub village_min_food: u32,
    /// Tools required for a regular village
    pub village_min_tools: u32,

    /// Minimum player money before founding a feeder island
    pub feeder_min_money: u32,
    /// Boards required for a feeder island
    pub feeder_min_boards: u32,
    /// Tools required for a feeder island
    pub feeder_min_tools: u32,

    /// Island size tiers searched in order when founding; the first tier
    /// with a qualifying island wins
    pub island_size_tiers: Vec<u32>,
    /// Minimum flat constructible land for a feeder island candidate
    pub feeder_island_min_size: u32,
    /// A settlement with fewer free 3x3 squares than this wants a feeder
    pub feeder_space_threshold: u32,

    /// Candidate lumberjack sites below this aggregate cell value are
    /// excluded outright
    pub lumberjack_min_value: u32,
    /// Aggregate cell value is capped here before the alignment bonus
    pub lumberjack_value_cap: u32,

    /// Fraction of assigned residences that must be built before a
    /// secondary village building (pavilion, school, tavern) is placed
    pub service_ratio: f64,

    /// Base added to road distance in the collector arrangement value,
    /// so that adjacent collectors do not dominate the weighting
    pub collector_distance_base: f64,
    /// Weight of the alignment penalty when scoring storage sites
    pub storage_alignment_weight: f64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            tick_period: 37,

            food_thresholds: (20, 40),
            boards_thresholds: (20, 30),
            tools_thresholds: (20, 40),

            village_min_money: 8000,
            village_min_boards: 17,
            village_min_food: 10,
            village_min_tools: 5,

            feeder_min_money: 4000,
            feeder_min_boards: 20,
            feeder_min_tools: 10,

            island_size_tiers: vec![500, 300, 150],
            feeder_island_min_size: 400,
            feeder_space_threshold: 30,

            lumberjack_min_value: 30,
            lumberjack_value_cap: 100,

            service_ratio: 0.75,

            collector_distance_base: 5.0,
            storage_alignment_weight: 0.001,
        }
    }
}

impl AiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buy/sell threshold pairs for all tracked resources
    pub fn buy_sell_thresholds(&self) -> [(Resource, (u32, u32)); 3] {
        [
            (Resource::Food, self.food_thresholds),
            (Resource::Boards, self.boards_thresholds),
            (Resource::Tools, self.tools_thresholds),
        ]
    }

    /// Resource floors for founding a settlement of the given kind
    pub fn founding_floors(&self, feeder: bool) -> (u32, Vec<(Resource, u32)>) {
        if feeder {
            (
                self.feeder_min_money,
                vec![
                    (Resource::Boards, self.feeder_min_boards),
                    (Resource::Tools, self.feeder_min_tools),
                ],
            )
        } else {
            (
                self.village_min_money,
                vec![
                    (Resource::Boards, self.village_min_boards),
                    (Resource::Food, self.village_min_food),
                    (Resource::Tools, self.village_min_tools),
                ],
            )
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AiConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        for (resource, (max_buy, min_sell)) in self.buy_sell_thresholds() {
            if max_buy >= min_sell {
                return Err(TideholmError::Config(format!(
                    "{:?}: max_buy ({}) must be below min_sell ({})",
                    resource, max_buy, min_sell
                )));
            }
        }

        if self.island_size_tiers.is_empty() {
            return Err(TideholmError::Config(
                "island_size_tiers must not be empty".into(),
            ));
        }
        if self.island_size_tiers.windows(2).any(|w| w[0] <= w[1]) {
            return Err(TideholmError::Config(
                "island_size_tiers must be strictly decreasing".into(),
            ));
        }

        if self.lumberjack_min_value > self.lumberjack_value_cap {
            return Err(TideholmError::Config(format!(
                "lumberjack_min_value ({}) must not exceed lumberjack_value_cap ({})",
                self.lumberjack_min_value, self.lumberjack_value_cap
            )));
        }

        if !(0.0..=1.0).contains(&self.service_ratio) {
            return Err(TideholmError::Config(format!(
                "service_ratio ({}) must be within [0, 1]",
                self.service_ratio
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AiConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_band_rejected() {
        let mut config = AiConfig::default();
        config.food_thresholds = (40, 20);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tiers_must_decrease() {
        let mut config = AiConfig::default();
        config.island_size_tiers = vec![150, 300, 500];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_override() {
        let base = AiConfig::default();
        let text = toml::to_string(&base).unwrap().replace(
            "tick_period = 37",
            "tick_period = 5",
        );
        let config = AiConfig::from_toml_str(&text).unwrap();
        assert_eq!(config.tick_period, 5);
        assert_eq!(config.village_min_money, 8000);
    }
}
