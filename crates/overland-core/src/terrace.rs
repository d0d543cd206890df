//! Discrete elevation bands.
//!
//! Terraces quantize the continuous height field into five bands. Cliffs,
//! walls, valid water flow and path traversal are all gated on terrace
//! membership rather than raw height.
use serde::Serialize;

use crate::world::World;

// Height thresholds, shared with the biome decision table.
pub const WATER_LEVEL: f64 = -0.4;
pub const BEACH_LEVEL: f64 = -0.3;
pub const MIDLANDS: f64 = 0.0;
pub const HIGHLANDS: f64 = 0.5;

/// Elevation band, ordered lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum Terrace {
    Water = 0,
    Beach,
    Lowlands,
    Midlands,
    Highlands,
}

/// Band for a raw height value. Non-decreasing in `height`.
pub fn terrace_for(height: f64) -> Terrace {
    if height < WATER_LEVEL {
        Terrace::Water
    } else if height < BEACH_LEVEL {
        Terrace::Beach
    } else if height < MIDLANDS {
        Terrace::Lowlands
    } else if height < HIGHLANDS {
        Terrace::Midlands
    } else {
        Terrace::Highlands
    }
}

/// Assign every cell its terrace band. Runs banded-parallel; reads only the
/// finished height field.
pub fn classify_terraces(world: &mut World, workers: usize) {
    use rayon::prelude::*;

    let band = world.cell_count() / workers;
    world
        .cells_mut()
        .par_chunks_mut(band)
        .for_each(|cells| {
            for cell in cells {
                cell.terrace = terrace_for(cell.height);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terrace_is_monotonic_in_height() {
        // Sweep a height range crossing every threshold; the band must never
        // decrease as height increases.
        let mut prev = terrace_for(-2.0);
        let mut h = -2.0;
        while h < 2.0 {
            let t = terrace_for(h);
            assert!(t >= prev, "terrace decreased at height {h}");
            prev = t;
            h += 0.001;
        }
    }

    #[test]
    fn thresholds_map_to_expected_bands() {
        assert_eq!(terrace_for(-0.5), Terrace::Water);
        assert_eq!(terrace_for(-0.35), Terrace::Beach);
        assert_eq!(terrace_for(-0.1), Terrace::Lowlands);
        assert_eq!(terrace_for(0.2), Terrace::Midlands);
        assert_eq!(terrace_for(0.9), Terrace::Highlands);
    }
}
