//! Flow adjacency: classifies each cardinal neighbour as successor (strictly
//! lower) or predecessor (strictly higher), accumulates the total downhill
//! gradient, and collects peaks and lake sinks.
//!
//! A single sequential pass over the whole grid, since it may consult any
//! neighbour; must complete before hydrology starts. The shadow-hint pass
//! runs after hydrology and only feeds the renderer.
use rayon::prelude::*;

use crate::biome::Biome;
use crate::terrace::Terrace;
use crate::world::{feature, Compass, Dir, World};

/// Build successor/predecessor links and the peak/lake lists.
///
/// A cell with no predecessor is a peak; one with no successor is a lake
/// sink. Both lists are append-only and owned by the world.
pub fn build_flow_graph(world: &mut World) {
    for idx in 0..world.cell_count() {
        let h = world.cells()[idx].height;

        let mut succs: [(usize, f64); 4] = [(0, 0.0); 4];
        let mut preds: [usize; 4] = [0; 4];
        let mut num_succs = 0;
        let mut num_preds = 0;

        for dir in Dir::ALL {
            let Some(nidx) = world.neighbour(idx, dir) else {
                continue;
            };
            let nh = world.cells()[nidx].height;
            if nh < h {
                succs[num_succs] = (nidx, nh);
                num_succs += 1;
            } else if nh > h {
                preds[num_preds] = nidx;
                num_preds += 1;
            }
        }

        let cell = &mut world.cells_mut()[idx];
        for &(sidx, sh) in &succs[..num_succs] {
            cell.add_successor(sidx);
            cell.total_gradient += h - sh;
        }
        for &pidx in &preds[..num_preds] {
            cell.add_predecessor(pidx);
        }

        if num_preds == 0 {
            world.add_peak(idx);
        } else if num_succs == 0 {
            world.add_lake(idx);
        }
    }
}

/// Record directional cliff- and water-shadow hint bits.
///
/// Land cells take a shadow bit for each neighbouring land cell on a higher
/// terrace; river cells take a water-shadow bit where the bank rises above
/// the water terrace. Ocean and river neighbours are skipped for the land
/// hints. Renderer-only output.
pub fn mark_shadow_hints(world: &mut World, workers: usize) {
    let width = world.width();
    let cell_count = world.cell_count();
    let terraces: Vec<Terrace> = world.cells().iter().map(|c| c.terrace).collect();
    let water: Vec<bool> = world
        .cells()
        .iter()
        .map(|c| c.is_river || c.biome == Biome::Ocean)
        .collect();

    let band = world.cell_count() / workers;
    world.cells_mut().par_chunks_mut(band).for_each(|cells| {
        for cell in cells {
            let (cx, cy) = (cell.x as i64, cell.y as i64);
            let idx = cy as usize * width + cx as usize;
            let at = move |dir: Compass| -> Option<usize> {
                let (dx, dy) = dir.offset();
                let x = cx + dx;
                let y = cy + dy;
                if x < 0 || x >= width as i64 || y < 0 {
                    return None;
                }
                let n = y as usize * width + x as usize;
                (n < cell_count).then_some(n)
            };

            if cell.is_river {
                for (dir, bit) in [
                    (Compass::West, feature::WATER_SHADOW_LEFT),
                    (Compass::East, feature::WATER_SHADOW_RIGHT),
                ] {
                    if let Some(n) = at(dir) {
                        if !water[n] && terraces[n] > terraces[idx] {
                            cell.add_feature(bit);
                        }
                    }
                }
                continue;
            }
            if cell.biome == Biome::Ocean {
                continue;
            }

            for (dir, bit) in [
                (Compass::West, feature::SHADOW_LEFT),
                (Compass::East, feature::SHADOW_RIGHT),
                (Compass::North, feature::SHADOW_TOP),
                (Compass::SouthWest, feature::SHADOW_BOTTOM_LEFT),
                (Compass::SouthEast, feature::SHADOW_BOTTOM_RIGHT),
            ] {
                if let Some(n) = at(dir) {
                    if !water[n] && terraces[n] > terraces[idx] {
                        cell.add_feature(bit);
                    }
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrace::terrace_for;
    use approx::assert_relative_eq;

    /// 3×3 grid, height strictly decreasing left-to-right then top-to-bottom.
    fn decreasing_grid() -> World {
        let mut world = World::new(3, 3);
        for cell in world.cells_mut() {
            cell.height = 2.0 - (cell.y as f64 * 3.0 + cell.x as f64) * 0.2;
        }
        world
    }

    #[test]
    fn strict_gradient_yields_one_peak_one_lake() {
        let mut world = decreasing_grid();
        build_flow_graph(&mut world);

        assert_eq!(world.peaks(), &[0], "top-left must be the only peak");
        assert_eq!(
            world.lakes(),
            &[world.idx(2, 2) as u32],
            "bottom-right must be the only lake"
        );
        assert!(world.cell(0, 0).predecessors().is_empty());
        assert!(world.cell(2, 2).successors().is_empty());
    }

    #[test]
    fn total_gradient_sums_downhill_deltas() {
        let mut world = decreasing_grid();
        build_flow_graph(&mut world);

        // The centre cell drops 0.2 east and 0.6 south.
        let centre = world.cell(1, 1);
        assert_eq!(centre.successors().len(), 2);
        assert_relative_eq!(centre.total_gradient, 0.8, epsilon = 1e-12);
    }

    #[test]
    fn flat_grid_is_all_peaks() {
        // No strictly-lower neighbour anywhere: every cell is both peak-like
        // and sink-like; the pass records each as a peak (checked first).
        let mut world = World::new(3, 3);
        build_flow_graph(&mut world);
        assert_eq!(world.peaks().len(), 9);
        assert_eq!(world.lakes().len(), 0);
    }

    #[test]
    fn cliff_casts_top_shadow() {
        let mut world = World::new(3, 3);
        for cell in world.cells_mut() {
            cell.height = if cell.y == 0 { 0.9 } else { 0.1 };
            cell.terrace = terrace_for(cell.height);
            cell.biome = Biome::Grassland;
        }
        mark_shadow_hints(&mut world, 1);

        assert!(world.has_feature(1, 1, feature::SHADOW_TOP));
        assert!(world.has_feature(0, 1, feature::SHADOW_TOP));
        assert!(!world.has_feature(1, 0, feature::SHADOW_TOP));
        assert!(!world.has_feature(1, 2, feature::SHADOW_TOP));
    }
}
