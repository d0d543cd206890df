//! Hydrology: turns the static height and moisture fields into a discrete
//! river network.
//!
//! Flow accumulation is greedy over a descending-height visitation order:
//! when a cell is visited every higher cell has already flowed, so its
//! accumulated water is final. The phase is the only globally-sequential one
//! in the pipeline; the ordering cannot be column-partitioned.
use rayon::prelude::*;

use crate::biome::Biome;
use crate::world::{Bank, Dir, World};

/// What the river pass produced, for logging and invariant tests.
pub struct RiverSummary {
    /// Cells that crossed the saturation threshold themselves (channel
    /// cores); the full river set also includes the squared neighbourhoods.
    pub channels: Vec<u32>,
    /// Total cells marked river after squaring.
    pub river_cells: usize,
    /// Visited cells with water but no valid downhill successor.
    pub terminal_basins: usize,
}

/// Height-sorted greedy flow with validity-gated promotion.
///
/// Each visited cell adds its own moisture to the water it has received,
/// promotes itself to river when the total exceeds `saturation`, and sends
/// the total to its lowest valid successor. A cell with no valid successor
/// is a terminal basin, skipped without error.
pub fn add_rivers(world: &mut World, saturation: f64) -> RiverSummary {
    let n = world.cell_count();
    let mut order: Vec<u32> = (0..n as u32).collect();
    order.sort_by(|&a, &b| {
        world.cells()[b as usize]
            .height
            .total_cmp(&world.cells()[a as usize].height)
    });

    let mut channels = Vec::new();
    let mut terminal_basins = 0usize;

    for &idx in &order {
        let idx = idx as usize;
        let cell = &world.cells()[idx];
        let flow = cell.water + cell.moisture;

        if flow > saturation && cell.biome != Biome::Ocean {
            promote(world, idx);
            channels.push(idx as u32);
        }

        // Lowest valid successor takes the whole flow.
        let mut succs: [u32; 4] = [0; 4];
        let count = world.cells()[idx].successors().len();
        succs[..count].copy_from_slice(world.cells()[idx].successors());

        let mut best: Option<(usize, f64)> = None;
        for &succ in &succs[..count] {
            let succ = succ as usize;
            if !valid_step(world, idx, succ) {
                continue;
            }
            let sh = world.cells()[succ].height;
            if best.map_or(true, |(_, bh)| sh < bh) {
                best = Some((succ, sh));
            }
        }

        match best {
            Some((succ, _)) => world.cells_mut()[succ].water += flow,
            None => {
                if flow > 0.0 {
                    terminal_basins += 1;
                }
            }
        }
        world.cells_mut()[idx].water = flow;
    }

    let river_cells = world.cells().iter().filter(|c| c.is_river).count();
    RiverSummary {
        channels,
        river_cells,
        terminal_basins,
    }
}

/// Mark a saturated cell and its 3×3 neighbourhood as river, so no water
/// body is narrower than 3 cells. Ocean cells stay ocean.
fn promote(world: &mut World, idx: usize) {
    let width = world.width();
    let height = world.height();
    let x = (idx % width) as i64;
    let y = (idx / width) as i64;
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            let nx = x + dx;
            let ny = y + dy;
            if nx < 0 || nx >= width as i64 || ny < 0 || ny >= height as i64 {
                continue;
            }
            let cell = &mut world.cells_mut()[ny as usize * width + nx as usize];
            if cell.biome != Biome::Ocean {
                cell.is_river = true;
                cell.biome = Biome::River;
            }
        }
    }
}

/// Whether flow may cross from `from` onto `to`.
///
/// Within a terrace the step is always valid. Across a descending terrace
/// edge the step must widen an established channel: both in-bounds cells
/// flanking `to` (diagonal to `from`) must already be river or touch one.
/// Rejecting the step otherwise prevents isolated mid-slope waterfalls.
fn valid_step(world: &World, from: usize, to: usize) -> bool {
    if world.cells()[to].terrace == world.cells()[from].terrace {
        return true;
    }
    let width = world.width() as i64;
    let height = world.height() as i64;
    let (fx, fy) = ((from % world.width()) as i64, (from / world.width()) as i64);
    let (tx, ty) = ((to % world.width()) as i64, (to / world.width()) as i64);
    // Perpendicular of the step direction points at the two flanks.
    let (px, py) = (ty - fy, tx - fx);
    for sign in [1i64, -1] {
        let x = tx + px * sign;
        let y = ty + py * sign;
        if x < 0 || x >= width || y < 0 || y >= height {
            continue;
        }
        if !river_adjacent(world, y as usize * world.width() + x as usize) {
            return false;
        }
    }
    true
}

fn river_adjacent(world: &World, idx: usize) -> bool {
    if world.cells()[idx].is_river {
        return true;
    }
    Dir::ALL
        .iter()
        .any(|&dir| world.neighbour(idx, dir).is_some_and(|n| world.cells()[n].is_river))
}

/// Tag every land cell adjacent to river or ocean with the 8-way orientation
/// of the water it faces. Corner codes take priority over single edges; a
/// cell with no qualifying neighbour is not a bank.
pub fn add_river_banks(world: &mut World, workers: usize) {
    let width = world.width();
    let water: Vec<bool> = world
        .cells()
        .iter()
        .map(|c| c.is_river || c.biome == Biome::Ocean)
        .collect();

    let band = world.cell_count() / workers;
    world.cells_mut().par_chunks_mut(band).for_each(|cells| {
        for cell in cells {
            let (cx, cy) = (cell.x as i64, cell.y as i64);
            if water[cy as usize * width + cx as usize] {
                continue;
            }
            let water = &water;
            let wet = move |dir: Dir| -> bool {
                let (dx, dy) = dir.offset();
                let x = cx + dx;
                let y = cy + dy;
                if x < 0 || x >= width as i64 || y < 0 {
                    return false;
                }
                let n = y as usize * width + x as usize;
                n < water.len() && water[n]
            };
            let (n, e, s, w) = (wet(Dir::North), wet(Dir::East), wet(Dir::South), wet(Dir::West));

            cell.river_bank = if n && w {
                Some(Bank::TopLeft)
            } else if n && e {
                Some(Bank::TopRight)
            } else if s && w {
                Some(Bank::BottomLeft)
            } else if s && e {
                Some(Bank::BottomRight)
            } else if n {
                Some(Bank::Top)
            } else if e {
                Some(Bank::Right)
            } else if s {
                Some(Bank::Bottom)
            } else if w {
                Some(Bank::Left)
            } else {
                None
            };
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::build_flow_graph;
    use crate::terrace::terrace_for;

    /// 3-wide slope descending to the south, all rows on one terrace so the
    /// validity gate never triggers. Each column is an independent stream.
    fn slope(rows: usize) -> World {
        let mut world = World::new(3, rows);
        for cell in world.cells_mut() {
            cell.height = 0.45 - cell.y as f64 * 0.04;
            cell.terrace = terrace_for(cell.height);
            cell.moisture = 1.0;
            cell.biome = Biome::Grassland;
        }
        build_flow_graph(&mut world);
        world
    }

    #[test]
    fn river_run_starts_at_saturation_point() {
        let mut world = slope(8);
        let summary = add_rivers(&mut world, 4.0);

        // Cumulative flow down a column is y+1, exceeding 4.0 at row 4.
        for y in 4..8 {
            for x in 0..3 {
                assert!(world.is_river(x, y), "({x},{y}) must be river");
            }
        }
        // Squaring spills one row uphill of the first channel row.
        assert!(world.is_river(1, 3));
        for y in 0..3 {
            for x in 0..3 {
                assert!(!world.is_river(x, y), "({x},{y}) must stay dry");
            }
        }
        assert_eq!(summary.channels.len(), 12);
        assert_eq!(summary.river_cells, 15);
    }

    #[test]
    fn channel_neighbourhoods_are_fully_river() {
        let mut world = slope(12);
        let summary = add_rivers(&mut world, 4.0);

        // Minimum-width invariant: every channel core's fully-in-bounds 3×3
        // neighbourhood is river.
        for &idx in &summary.channels {
            let x = idx as usize % 3;
            let y = idx as usize / 3;
            if x == 0 || x == 2 || y == 0 || y == 11 {
                continue;
            }
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let (nx, ny) = ((x as i64 + dx) as usize, (y as i64 + dy) as usize);
                    assert!(world.is_river(nx, ny), "hole at ({nx},{ny})");
                }
            }
        }
    }

    #[test]
    fn terrace_edge_blocks_unestablished_flow() {
        // Top row a full terrace above the rest; no river exists yet, so the
        // descent is invalid and the highland water stays put.
        let mut world = World::new(3, 3);
        for cell in world.cells_mut() {
            cell.height = if cell.y == 0 { 0.9 - cell.x as f64 * 0.01 } else { -0.1 - cell.y as f64 * 0.01 };
            cell.terrace = terrace_for(cell.height);
            cell.moisture = 1.0;
            cell.biome = Biome::Grassland;
        }
        build_flow_graph(&mut world);
        let summary = add_rivers(&mut world, 100.0);

        // Highland cells flow along their own row but never down the cliff.
        assert!(summary.terminal_basins > 0);
        let lowland_inflow = world.cell(0, 1).water + world.cell(1, 1).water + world.cell(2, 1).water;
        // Row 1 receives nothing from row 0: only its own moisture plus
        // whatever moved within the lower block.
        assert!(
            lowland_inflow <= 3.0 + 3.0,
            "terrace gate must hold back highland water, got {lowland_inflow}"
        );
    }

    #[test]
    fn ocean_is_never_promoted() {
        let mut world = World::new(3, 4);
        for cell in world.cells_mut() {
            cell.height = if cell.y == 3 { -0.5 } else { 0.4 - cell.y as f64 * 0.1 };
            cell.terrace = terrace_for(cell.height);
            cell.moisture = 5.0;
            cell.biome = if cell.y == 3 { Biome::Ocean } else { Biome::Grassland };
        }
        build_flow_graph(&mut world);
        add_rivers(&mut world, 4.0);

        for x in 0..3 {
            assert!(!world.is_river(x, 3));
            assert_eq!(world.biome_at(x, 3), Biome::Ocean);
        }
    }

    #[test]
    fn bank_orientation_prefers_corners() {
        let mut world = World::new(4, 4);
        for cell in world.cells_mut() {
            cell.biome = Biome::Grassland;
        }
        // L-shaped water: river east and south of the corner cell (0,0).
        world.cell_mut(1, 0).is_river = true;
        world.cell_mut(1, 0).biome = Biome::River;
        world.cell_mut(0, 1).is_river = true;
        world.cell_mut(0, 1).biome = Biome::River;

        add_river_banks(&mut world, 1);

        assert_eq!(world.river_bank(0, 0), Some(Bank::BottomRight));
        assert_eq!(world.river_bank(2, 0), Some(Bank::Left));
        assert_eq!(world.river_bank(1, 1), Some(Bank::TopLeft));
        assert_eq!(world.river_bank(0, 2), Some(Bank::Top));
        assert_eq!(world.river_bank(3, 3), None);
        assert!(!world.is_river_bank(3, 3));
    }
}
