//! Generation parameters and the single fallible boundary of the pipeline:
//! configuration validation.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::biome::DensityTables;
use crate::world::Compass;

/// Side length of one coarse region block, in cells.
pub const REGION_SIZE: usize = 64;
pub const REGION_AREA: usize = REGION_SIZE * REGION_SIZE;

/// Water volume at which a cell is promoted to river.
pub const WATER_SATURATION: f64 = 4.0;

/// One independent noise seed per synthesized field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FieldSeeds {
    pub height: u32,
    pub moisture: u32,
    pub soil: u32,
    pub tree: u32,
    pub rock: u32,
    pub plant: u32,
}

impl Default for FieldSeeds {
    fn default() -> Self {
        Self {
            height: 1,
            moisture: 2,
            soil: 3,
            tree: 4,
            rock: 5,
            plant: 6,
        }
    }
}

/// Base noise frequency per field. Density fields (tree, rock, plant) share
/// one high frequency: discrete features vary on a much finer scale than
/// elevation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FieldFrequencies {
    pub height: f64,
    pub moisture: f64,
    pub soil: f64,
    pub density: f64,
}

impl Default for FieldFrequencies {
    fn default() -> Self {
        Self {
            height: 5.0,
            moisture: 2.0,
            soil: 20.0,
            density: 200.0,
        }
    }
}

/// Directional bias applied to the height field after noise synthesis,
/// shaping an island or a tilted landmass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IslandBias {
    /// Height subtracted at the grid edge; 0 disables the island shape.
    pub edge_drop: f64,
    /// Falloff exponent over normalized distance from the grid centre.
    pub falloff: f64,
    /// Linear north-south tilt; positive raises the northern edge.
    pub y_bias: f64,
}

impl Default for IslandBias {
    fn default() -> Self {
        Self {
            edge_drop: 0.0,
            falloff: 2.0,
            y_bias: 0.0,
        }
    }
}

/// How the moisture field is produced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum MoistureModel {
    /// Seeded octave noise, the same shape as every other field.
    Noise,
    /// Discrete cloud agents advected across the grid in a fixed wind
    /// direction, replacing the noise field entirely.
    Clouds {
        wind: Compass,
        /// Moisture each cloud carries when it enters the grid.
        initial: f64,
    },
}

/// Full configuration for one generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Grid width in cells. Must divide evenly into regions and worker bands.
    pub width: usize,
    /// Grid height in cells. Same divisibility rules as `width`.
    pub height: usize,
    /// Number of parallel worker bands for the partitioned phases.
    pub workers: usize,
    pub seeds: FieldSeeds,
    pub frequencies: FieldFrequencies,
    pub island: IslandBias,
    pub moisture_model: MoistureModel,
    /// Whether soil depth participates in biome classification.
    pub soil_in_biome: bool,
    /// Water volume at which a cell saturates into a river.
    pub saturation: f64,
    /// Per-biome tree/rock/plant placement quotas.
    pub densities: DensityTables,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            workers: 4,
            seeds: FieldSeeds::default(),
            frequencies: FieldFrequencies::default(),
            island: IslandBias::default(),
            moisture_model: MoistureModel::Noise,
            soil_in_biome: true,
            saturation: WATER_SATURATION,
            densities: DensityTables::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("world dimensions must be non-zero, got {width}x{height}")]
    EmptyWorld { width: usize, height: usize },
    #[error("worker count must be non-zero")]
    NoWorkers,
    #[error("{axis} {value} must be a multiple of {required}")]
    NotDivisible {
        axis: &'static str,
        value: usize,
        required: usize,
    },
}

impl WorldConfig {
    /// Check the startup invariants. Called once before any simulation work;
    /// nothing inside the pipeline can fail after this passes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyWorld {
                width: self.width,
                height: self.height,
            });
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        let required = REGION_SIZE * self.workers;
        if self.width % required != 0 {
            return Err(ConfigError::NotDivisible {
                axis: "width",
                value: self.width,
                required,
            });
        }
        if self.height % required != 0 {
            return Err(ConfigError::NotDivisible {
                axis: "height",
                value: self.height,
                required,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(WorldConfig::default().validate().is_ok());
    }

    #[test]
    fn indivisible_width_is_rejected() {
        let config = WorldConfig {
            width: 500,
            ..WorldConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotDivisible { axis: "width", .. })
        ));
    }

    #[test]
    fn worker_count_participates_in_divisibility() {
        // 512 is a multiple of REGION_SIZE but not of REGION_SIZE * 3.
        let config = WorldConfig {
            workers: 3,
            ..WorldConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_workers_rejected() {
        let config = WorldConfig {
            workers: 0,
            ..WorldConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoWorkers)));
    }
}
