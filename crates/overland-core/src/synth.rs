//! Field synthesis: fills the continuous per-cell attributes from seeded
//! octave noise, one independent seed per field.
//!
//! Each pass partitions the cell array into contiguous worker bands; a band
//! is written by exactly one worker and no pass reads another cell's state,
//! so the phase needs no synchronization beyond the closing barrier.
use rayon::prelude::*;

use crate::config::IslandBias;
use crate::noise::OctaveNoise;
use crate::world::{Cell, World};

fn fill<F>(world: &mut World, workers: usize, write: F)
where
    F: Fn(&mut Cell, f64, f64) + Sync,
{
    let width = world.width() as f64;
    let height = world.height() as f64;
    let band = world.cell_count() / workers;
    world.cells_mut().par_chunks_mut(band).for_each(|cells| {
        for cell in cells {
            let xf = cell.x as f64 / width;
            let yf = cell.y as f64 / height;
            write(cell, xf, yf);
        }
    });
}

/// Height: octave noise plus the directional island bias. Runs first; every
/// later phase reads the finished height field.
pub fn synth_height(world: &mut World, noise: &OctaveNoise, island: &IslandBias, workers: usize) {
    let island = *island;
    fill(world, workers, |cell, xf, yf| {
        let mut h = noise.sample(xf, yf);
        if island.edge_drop != 0.0 {
            let dx = xf - 0.5;
            let dy = yf - 0.5;
            // Normalized so a grid corner sits at distance 1.
            let dist = (dx * dx + dy * dy).sqrt() * std::f64::consts::SQRT_2;
            h -= island.edge_drop * dist.powf(island.falloff);
        }
        h += island.y_bias * (1.0 - yf);
        cell.height = h;
    });
}

pub fn synth_moisture(world: &mut World, noise: &OctaveNoise, workers: usize) {
    fill(world, workers, |cell, xf, yf| {
        cell.moisture = noise.sample(xf, yf);
    });
}

/// Soil accumulates where the terrain is low: the height field is subtracted
/// from the raw noise, thinning soil on ridges.
pub fn synth_soil(world: &mut World, noise: &OctaveNoise, workers: usize) {
    fill(world, workers, |cell, xf, yf| {
        cell.soil_depth = noise.sample(xf, yf) - cell.height;
    });
}

/// Tree, rock and plant density fields, sampled from three independent seeds
/// at the shared density frequency.
pub fn synth_densities(
    world: &mut World,
    tree: &OctaveNoise,
    rock: &OctaveNoise,
    plant: &OctaveNoise,
    workers: usize,
) {
    fill(world, workers, |cell, xf, yf| {
        cell.tree = tree.sample(xf, yf);
        cell.rock = rock.sample(xf, yf);
        cell.plant = plant.sample(xf, yf);
    });
}
