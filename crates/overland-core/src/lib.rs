//! overland-core: procedural overworld terrain generation.
//!
//! A seeded, deterministic pipeline derives a full terrain grid from a
//! handful of octave-noise fields: elevation and terraces, moisture (noise
//! or cloud advection), biomes, a river network with banks and walls,
//! region-bounded vegetation/rock placement, and an on-demand shortest-path
//! overlay. See [`generator::WorldGenerator`] for the entry point.

pub mod biome;
pub mod cloud;
pub mod config;
pub mod diffuse;
pub mod flow;
pub mod generator;
pub mod hydrology;
pub mod noise;
pub mod path;
pub mod regions;
pub mod synth;
pub mod terrace;
pub mod world;

pub use biome::{Biome, DensityTables};
pub use config::{ConfigError, MoistureModel, WorldConfig, REGION_SIZE};
pub use generator::WorldGenerator;
pub use path::{generate_path, PathResult};
pub use terrace::Terrace;
pub use world::{feature, Bank, Compass, World};
