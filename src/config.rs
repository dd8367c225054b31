//! Simulation parameters.
//!
//! Defaults reproduce the classic run: a 100x100 grid, 500 walkers and a
//! budget of 1000 steps per walker. Values may be loaded from a JSON file,
//! missing fields fall back to the defaults.

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::DlaError;

pub const GRID_SIZE: usize = 100;
pub const NUM_WALKERS: usize = 500;
pub const N_STEPS: usize = 1000;

/// How a walker decides whether it touches the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Adjacency {
    /// Look at the occupancy grid under the walker and its four neighbours.
    GridLookup,
    /// Compare against every aggregate point in the order they stuck.
    LinearScan,
}

impl Default for Adjacency {
    fn default() -> Self {
        Adjacency::GridLookup
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Side length of the square grid.
    pub grid_size: usize,
    /// Number of walkers released one after another.
    pub num_walkers: usize,
    /// Step budget of a single walker.
    pub max_steps: usize,
    /// RNG seed; a fresh one is drawn from entropy when absent.
    pub seed: Option<u64>,
    pub adjacency: Adjacency,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            grid_size: GRID_SIZE,
            num_walkers: NUM_WALKERS,
            max_steps: N_STEPS,
            seed: None,
            adjacency: Adjacency::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(text: &str) -> Result<SimulationConfig, DlaError> {
        let config: SimulationConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_path(path: &Path) -> Result<SimulationConfig, DlaError> {
        let text = fs::read_to_string(path)?;
        SimulationConfig::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), DlaError> {
        check_grid_size(self.grid_size)
    }
}

pub(crate) fn check_grid_size(grid_size: usize) -> Result<(), DlaError> {
    if grid_size == 0 {
        return Err(DlaError::InvalidConfig("grid_size must be positive"));
    }
    // Rendered images are u32 wide and the seed marker is drawn in i32 pixels.
    if grid_size > i32::MAX as usize {
        return Err(DlaError::InvalidConfig("grid_size is too large"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::Cluster;

    #[test]
    fn defaults_match_classic_run() {
        let config = SimulationConfig::default();
        assert_eq!(config.grid_size, 100);
        assert_eq!(config.num_walkers, 500);
        assert_eq!(config.max_steps, 1000);
        assert_eq!(config.seed, None);
        assert_eq!(config.adjacency, Adjacency::GridLookup);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_grid_is_rejected() {
        let config = SimulationConfig {
            grid_size: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DlaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn grid_beyond_pixel_range_is_rejected() {
        let config = SimulationConfig {
            grid_size: i32::MAX as usize + 1,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DlaError::InvalidConfig("grid_size is too large"))
        ));
        assert!(Cluster::init(i32::MAX as usize + 1).is_err());
    }

    #[test]
    fn adjacency_parses_from_the_command_line() {
        assert_eq!(
            Adjacency::from_str("linear-scan", false),
            Ok(Adjacency::LinearScan)
        );
        assert_eq!(
            Adjacency::from_str("grid-lookup", false),
            Ok(Adjacency::GridLookup)
        );
        assert!(Adjacency::from_str("diagonal", false).is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config =
            SimulationConfig::from_json_str(r#"{ "grid_size": 40, "adjacency": "linear_scan", "seed": 7 }"#)
                .unwrap();
        assert_eq!(config.grid_size, 40);
        assert_eq!(config.num_walkers, NUM_WALKERS);
        assert_eq!(config.max_steps, N_STEPS);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.adjacency, Adjacency::LinearScan);
    }

    #[test]
    fn invalid_json_is_reported() {
        assert!(matches!(
            SimulationConfig::from_json_str("{ grid_size: }"),
            Err(DlaError::Json(_))
        ));
        assert!(matches!(
            SimulationConfig::from_json_str(r#"{ "grid_size": 0 }"#),
            Err(DlaError::InvalidConfig(_))
        ));
    }
}
