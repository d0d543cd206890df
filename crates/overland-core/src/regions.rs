//! Region analysis: dominant biome per coarse block and bounded-density
//! feature placement.
//!
//! Each REGION_SIZE × REGION_SIZE block elects its most frequent biome, then
//! seats trees, rocks and plants on its densest eligible cells via max-heaps,
//! with quotas drawn from the per-biome density tables. A pop that collides
//! with an already-placed feature of another kind is discarded and popping
//! continues with the quota unchanged, so a cell never carries two placement
//! kinds.
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rayon::prelude::*;

use crate::biome::{Biome, DensityTables, BIOME_COUNT};
use crate::config::{REGION_AREA, REGION_SIZE};
use crate::world::{feature, Cell, World};

struct DensityEntry {
    value: f64,
    offset: usize,
}

impl PartialEq for DensityEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DensityEntry {}

impl PartialOrd for DensityEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DensityEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap on density; ties resolve to the lower cell index so the
        // pop order is fully deterministic.
        self.value
            .total_cmp(&other.value)
            .then_with(|| other.offset.cmp(&self.offset))
    }
}

// Disqualified cells carry zero density and never enter a heap.

fn tree_density(cell: &Cell) -> f64 {
    if matches!(cell.biome, Biome::Ocean | Biome::Beach | Biome::River)
        || cell.is_wall
        || cell.is_river_bank()
    {
        0.0
    } else {
        cell.tree
    }
}

fn rock_density(cell: &Cell) -> f64 {
    if cell.is_wall || cell.is_river_bank() {
        0.0
    } else {
        cell.rock
    }
}

fn plant_density(cell: &Cell) -> f64 {
    if matches!(cell.biome, Biome::Ocean | Biome::Beach) || cell.is_wall {
        0.0
    } else {
        cell.plant
    }
}

/// Analyse every region block. Banded-parallel over whole region rows; each
/// worker owns its cells and its region summaries.
pub fn analyse_regions(world: &mut World, workers: usize, tables: &DensityTables) {
    let width = world.width();
    let height = world.height();
    let regions_per_row = width / REGION_SIZE;
    let region_rows = height / REGION_SIZE;
    let band_region_rows = region_rows / workers;

    let (cells, regions) = world.cells_and_regions();
    cells
        .par_chunks_mut(band_region_rows * REGION_SIZE * width)
        .zip(regions.par_chunks_mut(band_region_rows * regions_per_row))
        .for_each(|(band_cells, band_regions)| {
            for rr in 0..band_region_rows {
                for rc in 0..regions_per_row {
                    band_regions[rr * regions_per_row + rc] =
                        analyse_block(band_cells, width, rr, rc, tables);
                }
            }
        });
}

fn analyse_block(
    cells: &mut [Cell],
    width: usize,
    rr: usize,
    rc: usize,
    tables: &DensityTables,
) -> Biome {
    let mut counts = [0usize; BIOME_COUNT];
    let mut trees = BinaryHeap::with_capacity(REGION_AREA);
    let mut rocks = BinaryHeap::with_capacity(REGION_AREA);
    let mut plants = BinaryHeap::with_capacity(REGION_AREA);

    for ry in 0..REGION_SIZE {
        for rx in 0..REGION_SIZE {
            let offset = (rr * REGION_SIZE + ry) * width + rc * REGION_SIZE + rx;
            let cell = &cells[offset];
            counts[cell.biome.index()] += 1;

            for (heap, value) in [
                (&mut trees, tree_density(cell)),
                (&mut rocks, rock_density(cell)),
                (&mut plants, plant_density(cell)),
            ] {
                if value > 0.0 {
                    heap.push(DensityEntry { value, offset });
                }
            }
        }
    }

    // First biome to reach the running maximum wins ties.
    let mut max = 0;
    let mut dominant = Biome::Ocean;
    for biome in Biome::ALL {
        if counts[biome.index()] > max {
            max = counts[biome.index()];
            dominant = biome;
        }
    }

    place(cells, &mut trees, tables.tree[dominant.index()], feature::TREE);
    place(cells, &mut rocks, tables.rock[dominant.index()], feature::ROCK);
    place(cells, &mut plants, tables.plant[dominant.index()], feature::PLANT);

    dominant
}

fn place(cells: &mut [Cell], heap: &mut BinaryHeap<DensityEntry>, quota: usize, bit: u16) {
    let mut placed = 0;
    while placed < quota {
        let Some(entry) = heap.pop() else {
            // Heap exhausted: nothing left to place, not an error.
            break;
        };
        let cell = &mut cells[entry.offset];
        if cell.features() & feature::PLACED != 0 {
            // Collision with another placement kind: discard this pick and
            // keep popping without touching the remaining quota.
            continue;
        }
        cell.add_feature(bit);
        placed += 1;
    }
}
