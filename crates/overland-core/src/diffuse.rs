//! Ground-feature diffusion: border cells whose neighbourhood is dominated
//! by a different biome take a blend hint so the renderer can soften the
//! transition. Purely cosmetic; the biome itself never changes.
use rayon::prelude::*;

use crate::biome::{Biome, BIOME_COUNT};
use crate::terrace::Terrace;
use crate::world::{feature, Compass, World};

/// Tally the 8 neighbours of every eligible land cell, restricted to
/// same-terrace, non-river, non-ocean cells; a differing biome with the
/// plurality wins the blend.
pub fn diffuse_ground(world: &mut World, workers: usize) {
    let width = world.width();
    let biomes: Vec<Biome> = world.cells().iter().map(|c| c.biome).collect();
    let terraces: Vec<Terrace> = world.cells().iter().map(|c| c.terrace).collect();
    let rivers: Vec<bool> = world.cells().iter().map(|c| c.is_river).collect();

    let band = world.cell_count() / workers;
    world.cells_mut().par_chunks_mut(band).for_each(|cells| {
        for cell in cells {
            if cell.is_river
                || cell.is_river_bank()
                || cell.is_wall
                || matches!(cell.biome, Biome::Ocean | Biome::Beach)
            {
                continue;
            }
            let idx = cell.y as usize * width + cell.x as usize;

            let mut counts = [0usize; BIOME_COUNT];
            for dir in Compass::ALL {
                let (dx, dy) = dir.offset();
                let x = cell.x as i64 + dx;
                let y = cell.y as i64 + dy;
                if x < 0 || x >= width as i64 || y < 0 {
                    continue;
                }
                let n = y as usize * width + x as usize;
                if n >= biomes.len() || rivers[n] || biomes[n] == Biome::Ocean {
                    continue;
                }
                if terraces[n] != terraces[idx] {
                    continue;
                }
                counts[biomes[n].index()] += 1;
            }

            let mut max = 0;
            let mut winner = None;
            for biome in Biome::ALL {
                if counts[biome.index()] > max {
                    max = counts[biome.index()];
                    winner = Some(biome);
                }
            }
            if let Some(winner) = winner {
                if winner != cell.biome {
                    cell.add_feature(feature::GROUND_BLEND);
                    cell.blend = Some(winner);
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrace::terrace_for;

    fn land(biome: Biome) -> impl Fn(&mut crate::world::Cell) {
        move |cell| {
            cell.height = 0.2;
            cell.terrace = terrace_for(0.2);
            cell.biome = biome;
        }
    }

    #[test]
    fn lone_cell_blends_toward_surrounding_biome() {
        let mut world = World::new(3, 3);
        for cell in world.cells_mut() {
            land(Biome::Forest)(cell);
        }
        land(Biome::Grassland)(world.cell_mut(1, 1));

        diffuse_ground(&mut world, 1);

        let centre = world.cell(1, 1);
        assert!(centre.has_feature(feature::GROUND_BLEND));
        assert_eq!(centre.blend, Some(Biome::Forest));
        // Interior of a uniform patch never blends.
        assert!(!world.cell(0, 0).has_feature(feature::GROUND_BLEND));
    }

    #[test]
    fn majority_of_own_biome_wins_no_blend() {
        let mut world = World::new(3, 3);
        for cell in world.cells_mut() {
            land(Biome::Forest)(cell);
        }
        land(Biome::Grassland)(world.cell_mut(0, 0));

        diffuse_ground(&mut world, 1);
        assert!(!world.cell(1, 1).has_feature(feature::GROUND_BLEND));
        assert_eq!(world.cell(1, 1).blend, None);
    }

    #[test]
    fn other_terrace_neighbours_are_ignored() {
        let mut world = World::new(3, 3);
        for cell in world.cells_mut() {
            land(Biome::Forest)(cell);
        }
        // Surround the centre with grassland sitting on a higher terrace.
        for (x, y) in [(0, 0), (1, 0), (2, 0), (0, 1), (2, 1), (0, 2), (1, 2), (2, 2)] {
            let cell = world.cell_mut(x, y);
            cell.biome = Biome::Grassland;
            cell.height = 0.9;
            cell.terrace = terrace_for(0.9);
        }
        diffuse_ground(&mut world, 1);
        assert!(
            !world.cell(1, 1).has_feature(feature::GROUND_BLEND),
            "cross-terrace neighbours must not vote"
        );
    }
}
