//! Biome classification.
//!
//! A deterministic decision table maps (height, moisture, soil depth) to one
//! of twelve biomes using nested threshold comparisons. Soil participation is
//! optional; without it classification follows the thick-soil column.
//!
//! The same row-major scan marks wall cells: a cell whose northward neighbour
//! sits on a strictly higher terrace is a cliff face.
use serde::{Deserialize, Serialize};

use crate::config::{REGION_AREA, REGION_SIZE};
use crate::terrace::{Terrace, BEACH_LEVEL, HIGHLANDS, MIDLANDS, WATER_LEVEL};
use crate::world::World;

// Moisture thresholds.
pub const DRY: f64 = -0.5;
pub const MOIST: f64 = 0.0;
pub const WET: f64 = 0.3;

// Soil depth thresholds.
pub const NO_SOIL: f64 = -1.5;
pub const SHALLOW_SOIL: f64 = -0.7;
pub const THICK_SOIL: f64 = -0.2;

pub const BIOME_COUNT: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Biome {
    Ocean = 0,
    River,
    Beach,
    DryRock,
    MoistRock,
    Heathland,
    Shrubland,
    Grassland,
    Moorland,
    Fenland,
    Woodland,
    Forest,
}

impl Biome {
    pub const ALL: [Biome; BIOME_COUNT] = [
        Biome::Ocean,
        Biome::River,
        Biome::Beach,
        Biome::DryRock,
        Biome::MoistRock,
        Biome::Heathland,
        Biome::Shrubland,
        Biome::Grassland,
        Biome::Moorland,
        Biome::Fenland,
        Biome::Woodland,
        Biome::Forest,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

// ── Placement quota tables ────────────────────────────────────────────────────
// Per-biome feature counts for a REGION_SIZE × REGION_SIZE block, indexed by
// the region's dominant biome. Ocean rows are zero so an all-ocean region
// places nothing.

pub const TREE_DENSITY: [usize; BIOME_COUNT] = [
    0,                 // Ocean
    0,                 // River
    REGION_SIZE / 1024, // Beach
    REGION_AREA / 512, // DryRock
    REGION_AREA / 256, // MoistRock
    REGION_AREA / 96,  // Heathland
    REGION_AREA / 64,  // Shrubland
    REGION_AREA / 128, // Grassland
    REGION_AREA / 128, // Moorland
    REGION_AREA / 128, // Fenland
    REGION_AREA / 32,  // Woodland
    REGION_AREA / 16,  // Forest
];

pub const ROCK_DENSITY: [usize; BIOME_COUNT] = [
    0,                 // Ocean
    REGION_AREA / 512, // River
    REGION_AREA / 128, // Beach
    REGION_AREA / 32,  // DryRock
    REGION_AREA / 32,  // MoistRock
    REGION_AREA / 128, // Heathland
    REGION_AREA / 256, // Shrubland
    REGION_AREA / 256, // Grassland
    REGION_AREA / 128, // Moorland
    REGION_AREA / 256, // Fenland
    REGION_AREA / 256, // Woodland
    REGION_AREA / 256, // Forest
];

pub const PLANT_DENSITY: [usize; BIOME_COUNT] = [
    0,                 // Ocean
    REGION_AREA / 256, // River
    0,                 // Beach
    REGION_AREA / 512, // DryRock
    REGION_AREA / 256, // MoistRock
    REGION_AREA / 64,  // Heathland
    REGION_AREA / 48,  // Shrubland
    REGION_AREA / 32,  // Grassland
    REGION_AREA / 64,  // Moorland
    REGION_AREA / 64,  // Fenland
    REGION_AREA / 96,  // Woodland
    REGION_AREA / 64,  // Forest
];

/// Per-biome placement quotas, overridable through the configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DensityTables {
    pub tree: [usize; BIOME_COUNT],
    pub rock: [usize; BIOME_COUNT],
    pub plant: [usize; BIOME_COUNT],
}

impl Default for DensityTables {
    fn default() -> Self {
        Self {
            tree: TREE_DENSITY,
            rock: ROCK_DENSITY,
            plant: PLANT_DENSITY,
        }
    }
}

// ── Decision table ────────────────────────────────────────────────────────────

/// Classify a cell from its raw field values. Pure and side-effect free.
///
/// `soil` of `None` follows the thick-soil column, making the reduced table a
/// strict projection of the full one.
pub fn classify(height: f64, moisture: f64, soil: Option<f64>) -> Biome {
    if height < WATER_LEVEL {
        return Biome::Ocean;
    } else if height < BEACH_LEVEL {
        return Biome::Beach;
    }

    let s = soil.unwrap_or(0.0);
    if s < NO_SOIL {
        if moisture < DRY {
            return Biome::DryRock;
        }
        return Biome::MoistRock;
    }

    if height > HIGHLANDS {
        if s > THICK_SOIL {
            if moisture > WET {
                Biome::Moorland
            } else if moisture > MOIST {
                Biome::Shrubland
            } else {
                Biome::Grassland
            }
        } else if s > SHALLOW_SOIL {
            if moisture > WET {
                Biome::Woodland
            } else if moisture > MOIST {
                Biome::Shrubland
            } else {
                Biome::Grassland
            }
        } else {
            Biome::Grassland
        }
    } else if height > MIDLANDS {
        if s > THICK_SOIL {
            if moisture > WET {
                Biome::Forest
            } else if moisture > MOIST {
                Biome::Woodland
            } else {
                Biome::Shrubland
            }
        } else if s > SHALLOW_SOIL {
            if moisture > WET {
                Biome::Woodland
            } else if moisture > MOIST {
                Biome::Shrubland
            } else {
                Biome::Grassland
            }
        } else if moisture > WET {
            Biome::Shrubland
        } else {
            Biome::Grassland
        }
    } else if s > THICK_SOIL {
        // Lowlands.
        if moisture > WET {
            Biome::Fenland
        } else if moisture > MOIST {
            Biome::Forest
        } else {
            Biome::Woodland
        }
    } else if s > SHALLOW_SOIL {
        if moisture > WET {
            Biome::Woodland
        } else if moisture > MOIST {
            Biome::Shrubland
        } else {
            Biome::Heathland
        }
    } else if moisture > WET {
        Biome::Shrubland
    } else if moisture > MOIST {
        Biome::Grassland
    } else {
        Biome::Heathland
    }
}

/// Classify every cell and mark cliff-face walls.
///
/// Banded-parallel: biome derives from the cell's own fields; the wall check
/// reads the terrace of the cell immediately north from a snapshot taken
/// before the pass, so cross-band reads never observe in-flight writes.
pub fn classify_biomes(world: &mut World, workers: usize, soil_in_biome: bool) {
    use rayon::prelude::*;

    let width = world.width();
    let terraces: Vec<Terrace> = world.cells().iter().map(|c| c.terrace).collect();

    let band = world.cell_count() / workers;
    world
        .cells_mut()
        .par_chunks_mut(band)
        .for_each(|cells| {
            for cell in cells {
                let soil = soil_in_biome.then_some(cell.soil_depth);
                cell.biome = classify(cell.height, cell.moisture, soil);
                if cell.y > 0 {
                    let north = (cell.y as usize - 1) * width + cell.x as usize;
                    cell.is_wall = terraces[north] > cell.terrace;
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrace::terrace_for;
    use crate::world::World;

    #[test]
    fn water_and_beach_override_everything() {
        assert_eq!(classify(-0.5, 1.0, Some(1.0)), Biome::Ocean);
        assert_eq!(classify(-0.35, -1.0, Some(-2.0)), Biome::Beach);
    }

    #[test]
    fn bare_rock_splits_on_moisture() {
        assert_eq!(classify(0.2, -0.8, Some(-1.8)), Biome::DryRock);
        assert_eq!(classify(0.2, 0.1, Some(-1.8)), Biome::MoistRock);
    }

    #[test]
    fn wet_lowland_deep_soil_is_fenland() {
        assert_eq!(classify(-0.1, 0.5, Some(0.0)), Biome::Fenland);
    }

    #[test]
    fn soilless_table_follows_thick_soil_column() {
        // With soil absent the midlands wet case lands in Forest, exactly as
        // a deep-soil cell would.
        assert_eq!(classify(0.2, 0.5, None), classify(0.2, 0.5, Some(0.0)));
        assert_eq!(classify(0.2, 0.5, None), Biome::Forest);
    }

    #[test]
    fn wall_marked_below_higher_terrace() {
        let mut world = World::new(4, 4);
        for cell in world.cells_mut() {
            // Top row on the highlands terrace, everything else lowlands.
            cell.height = if cell.y == 0 { 0.9 } else { -0.1 };
            cell.terrace = terrace_for(cell.height);
        }
        classify_biomes(&mut world, 1, true);

        assert!(world.cell(2, 1).is_wall, "cell south of a cliff must be a wall");
        assert!(!world.cell(2, 0).is_wall);
        assert!(!world.cell(2, 2).is_wall);
    }
}
