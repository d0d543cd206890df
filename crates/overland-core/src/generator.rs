//! Pipeline orchestrator: runs all generation phases in order.
//!
//! Phases are strictly staged; a parallel pass returning is the barrier that
//! lets the next phase read what the previous one wrote. Flow adjacency and
//! hydrology are the only sequential phases.
use std::time::Instant;

use tracing::{debug, info};

use crate::biome;
use crate::cloud;
use crate::config::{ConfigError, MoistureModel, WorldConfig};
use crate::diffuse;
use crate::flow;
use crate::hydrology;
use crate::noise::OctaveNoise;
use crate::regions;
use crate::synth;
use crate::terrace;
use crate::world::World;

pub struct WorldGenerator {
    config: WorldConfig,
}

impl WorldGenerator {
    /// Validate the configuration and build a generator. The only fallible
    /// step of the whole pipeline.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Run the full pipeline.
    ///
    /// Phase order:
    ///   1. Height synthesis + terrace bands
    ///   2. Moisture (noise field or cloud advection)
    ///   3. Soil depth and density fields
    ///   4. Flow adjacency (sequential)
    ///   5. Biome classification + wall detection
    ///   6. Hydrology (sequential)
    ///   7. Banks, shadow hints, ground blending
    ///   8. Region analysis and feature placement
    ///
    /// Degenerate outputs (all ocean, no rivers) are valid, not errors.
    pub fn generate(&self) -> World {
        let cfg = &self.config;
        let workers = cfg.workers;
        let start = Instant::now();
        info!(
            width = cfg.width,
            height = cfg.height,
            workers,
            "generating overworld"
        );

        let mut world = World::new(cfg.width, cfg.height);

        // ── 1. Height, then its terrace bands ───────────────────────────────
        let t = Instant::now();
        let height_noise = OctaveNoise::new(cfg.seeds.height, cfg.frequencies.height);
        synth::synth_height(&mut world, &height_noise, &cfg.island, workers);
        terrace::classify_terraces(&mut world, workers);
        debug!(elapsed_ms = t.elapsed().as_millis() as u64, "height and terraces");

        // ── 2. Moisture ─────────────────────────────────────────────────────
        let t = Instant::now();
        match cfg.moisture_model {
            MoistureModel::Noise => {
                let noise = OctaveNoise::new(cfg.seeds.moisture, cfg.frequencies.moisture);
                synth::synth_moisture(&mut world, &noise, workers);
            }
            MoistureModel::Clouds { wind, initial } => {
                cloud::advect_moisture(&mut world, wind, initial);
            }
        }
        debug!(elapsed_ms = t.elapsed().as_millis() as u64, "moisture");

        // ── 3. Soil depth and density fields ────────────────────────────────
        let t = Instant::now();
        let soil_noise = OctaveNoise::new(cfg.seeds.soil, cfg.frequencies.soil);
        synth::synth_soil(&mut world, &soil_noise, workers);
        let tree_noise = OctaveNoise::new(cfg.seeds.tree, cfg.frequencies.density);
        let rock_noise = OctaveNoise::new(cfg.seeds.rock, cfg.frequencies.density);
        let plant_noise = OctaveNoise::new(cfg.seeds.plant, cfg.frequencies.density);
        synth::synth_densities(&mut world, &tree_noise, &rock_noise, &plant_noise, workers);
        debug!(elapsed_ms = t.elapsed().as_millis() as u64, "soil and density fields");

        // ── 4. Flow adjacency ───────────────────────────────────────────────
        let t = Instant::now();
        flow::build_flow_graph(&mut world);
        debug!(
            elapsed_ms = t.elapsed().as_millis() as u64,
            peaks = world.peaks().len(),
            lakes = world.lakes().len(),
            "flow graph"
        );

        // ── 5. Biomes and walls ─────────────────────────────────────────────
        let t = Instant::now();
        biome::classify_biomes(&mut world, workers, cfg.soil_in_biome);
        debug!(elapsed_ms = t.elapsed().as_millis() as u64, "biomes");

        // ── 6. Hydrology ────────────────────────────────────────────────────
        let t = Instant::now();
        let rivers = hydrology::add_rivers(&mut world, cfg.saturation);
        info!(
            elapsed_ms = t.elapsed().as_millis() as u64,
            channels = rivers.channels.len(),
            river_cells = rivers.river_cells,
            terminal_basins = rivers.terminal_basins,
            "river network"
        );

        // ── 7. Banks, shadow hints, ground blending ─────────────────────────
        let t = Instant::now();
        hydrology::add_river_banks(&mut world, workers);
        flow::mark_shadow_hints(&mut world, workers);
        diffuse::diffuse_ground(&mut world, workers);
        debug!(elapsed_ms = t.elapsed().as_millis() as u64, "banks and blending");

        // ── 8. Region analysis and feature placement ────────────────────────
        let t = Instant::now();
        regions::analyse_regions(&mut world, workers, &cfg.densities);
        debug!(elapsed_ms = t.elapsed().as_millis() as u64, "regions");

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "generation complete"
        );
        world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{feature, Compass};

    fn small_config() -> WorldConfig {
        WorldConfig {
            width: 128,
            height: 128,
            workers: 2,
            ..WorldConfig::default()
        }
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = WorldConfig {
            width: 100,
            ..WorldConfig::default()
        };
        assert!(WorldGenerator::new(config).is_err());
    }

    #[test]
    fn identical_configs_generate_identical_worlds() {
        let a = WorldGenerator::new(small_config()).unwrap().generate();
        let b = WorldGenerator::new(small_config()).unwrap().generate();

        for (ca, cb) in a.cells().iter().zip(b.cells()) {
            assert_eq!(ca.biome, cb.biome);
            assert_eq!(ca.terrace, cb.terrace);
            assert_eq!(ca.features(), cb.features());
            assert_eq!(ca.is_river, cb.is_river);
            assert_eq!(ca.river_bank, cb.river_bank);
            assert_eq!(ca.is_wall, cb.is_wall);
        }
        assert_eq!(a.regions(), b.regions());
    }

    #[test]
    fn worker_count_does_not_change_the_world() {
        let one = WorldGenerator::new(WorldConfig {
            workers: 1,
            ..small_config()
        })
        .unwrap()
        .generate();
        let two = WorldGenerator::new(small_config()).unwrap().generate();

        for (ca, cb) in one.cells().iter().zip(two.cells()) {
            assert_eq!(ca.biome, cb.biome);
            assert_eq!(ca.features(), cb.features());
        }
    }

    #[test]
    fn placements_stay_mutually_exclusive() {
        let world = WorldGenerator::new(small_config()).unwrap().generate();
        for cell in world.cells() {
            let kinds = [feature::TREE, feature::ROCK, feature::PLANT]
                .iter()
                .filter(|&&bit| cell.has_feature(bit))
                .count();
            assert!(kinds <= 1, "cell ({}, {}) holds {kinds} placement kinds", cell.x, cell.y);
        }
    }

    #[test]
    fn cloud_moisture_variant_completes() {
        let config = WorldConfig {
            moisture_model: MoistureModel::Clouds {
                wind: Compass::East,
                initial: 6.0,
            },
            ..small_config()
        };
        let world = WorldGenerator::new(config).unwrap().generate();
        // Moisture only ever accumulates from rain.
        assert!(world.cells().iter().all(|c| c.moisture >= 0.0));
    }
}
