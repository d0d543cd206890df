//! The terrain grid: a flat row-major arena of cells plus per-region
//! summaries and the peak/lake lists discovered during the adjacency pass.
//!
//! Cells reference each other by index into the backing array, never by
//! pointer; neighbour links are populated exactly once and read-only
//! afterwards.
use serde::{Deserialize, Serialize};

use crate::biome::Biome;
use crate::config::REGION_SIZE;
use crate::terrace::Terrace;

// ── Feature bits ──────────────────────────────────────────────────────────────

/// Per-cell feature bitmask values. Tree, rock and plant are mutually
/// exclusive placements; the remaining bits are renderer hints and may
/// coexist freely.
pub mod feature {
    pub const TREE: u16 = 1;
    pub const ROCK: u16 = 1 << 1;
    pub const PLANT: u16 = 1 << 2;

    pub const SHADOW_RIGHT: u16 = 1 << 3;
    pub const SHADOW_TOP: u16 = 1 << 4;
    pub const SHADOW_LEFT: u16 = 1 << 5;
    pub const SHADOW_BOTTOM_LEFT: u16 = 1 << 6;
    pub const SHADOW_BOTTOM_RIGHT: u16 = 1 << 7;
    pub const WATER_SHADOW_LEFT: u16 = 1 << 8;
    pub const WATER_SHADOW_RIGHT: u16 = 1 << 9;

    pub const GROUND_BLEND: u16 = 1 << 10;
    pub const PATH: u16 = 1 << 11;

    /// The placement kinds that exclude one another.
    pub const PLACED: u16 = TREE | ROCK | PLANT;
}

// ── Directions ────────────────────────────────────────────────────────────────

/// Cardinal adjacency direction. North is toward decreasing `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    North,
    East,
    South,
    West,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::North, Dir::East, Dir::South, Dir::West];

    #[inline]
    pub fn offset(self) -> (i64, i64) {
        match self {
            Dir::North => (0, -1),
            Dir::East => (1, 0),
            Dir::South => (0, 1),
            Dir::West => (-1, 0),
        }
    }
}

/// Eight-way compass heading, used for wind and cloud advection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compass {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Compass {
    pub const ALL: [Compass; 8] = [
        Compass::North,
        Compass::NorthEast,
        Compass::East,
        Compass::SouthEast,
        Compass::South,
        Compass::SouthWest,
        Compass::West,
        Compass::NorthWest,
    ];

    #[inline]
    pub fn offset(self) -> (i64, i64) {
        match self {
            Compass::North => (0, -1),
            Compass::NorthEast => (1, -1),
            Compass::East => (1, 0),
            Compass::SouthEast => (1, 1),
            Compass::South => (0, 1),
            Compass::SouthWest => (-1, 1),
            Compass::West => (-1, 0),
            Compass::NorthWest => (-1, -1),
        }
    }

    /// One compass step clockwise.
    pub fn rotate_cw(self) -> Compass {
        Compass::ALL[(self as usize + 1) % 8]
    }

    /// One compass step counter-clockwise.
    pub fn rotate_ccw(self) -> Compass {
        Compass::ALL[(self as usize + 7) % 8]
    }
}

/// Which side(s) of a bank cell face water. Corner codes take priority over
/// single-edge codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum Bank {
    TopLeft,
    Top,
    TopRight,
    Left,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

// ── Cell ──────────────────────────────────────────────────────────────────────

/// One grid cell. Owned exclusively by the `World`; identity `(x, y)` is
/// immutable after creation.
#[derive(Debug, Clone)]
pub struct Cell {
    pub x: u32,
    pub y: u32,

    // Raw noise-derived scalars, roughly in [-2, 2].
    pub height: f64,
    pub moisture: f64,
    pub soil_depth: f64,
    pub tree: f64,
    pub rock: f64,
    pub plant: f64,

    // Hydrology bookkeeping.
    pub water: f64,
    pub total_gradient: f64,
    pub is_river: bool,
    pub river_bank: Option<Bank>,

    pub biome: Biome,
    pub terrace: Terrace,
    pub is_wall: bool,
    /// Neighbouring biome to blend toward when `GROUND_BLEND` is set.
    pub blend: Option<Biome>,

    features: u16,

    succs: [u32; 4],
    preds: [u32; 4],
    num_succs: u8,
    num_preds: u8,
}

impl Cell {
    fn new(x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            height: 0.0,
            moisture: 0.0,
            soil_depth: 0.0,
            tree: 0.0,
            rock: 0.0,
            plant: 0.0,
            water: 0.0,
            total_gradient: 0.0,
            is_river: false,
            river_bank: None,
            biome: Biome::Ocean,
            terrace: Terrace::Water,
            is_wall: false,
            blend: None,
            features: 0,
            succs: [0; 4],
            preds: [0; 4],
            num_succs: 0,
            num_preds: 0,
        }
    }

    #[inline]
    pub fn add_feature(&mut self, bits: u16) {
        self.features |= bits;
    }

    #[inline]
    pub fn has_feature(&self, bits: u16) -> bool {
        self.features & bits == bits
    }

    #[inline]
    pub fn features(&self) -> u16 {
        self.features
    }

    #[inline]
    pub fn is_river_bank(&self) -> bool {
        self.river_bank.is_some()
    }

    pub(crate) fn add_successor(&mut self, idx: usize) {
        self.succs[self.num_succs as usize] = idx as u32;
        self.num_succs += 1;
    }

    pub(crate) fn add_predecessor(&mut self, idx: usize) {
        self.preds[self.num_preds as usize] = idx as u32;
        self.num_preds += 1;
    }

    /// Indices of the strictly-lower cardinal neighbours.
    #[inline]
    pub fn successors(&self) -> &[u32] {
        &self.succs[..self.num_succs as usize]
    }

    /// Indices of the strictly-higher cardinal neighbours.
    #[inline]
    pub fn predecessors(&self) -> &[u32] {
        &self.preds[..self.num_preds as usize]
    }
}

// ── World ─────────────────────────────────────────────────────────────────────

/// The full grid. Created once per generation run with fixed dimensions,
/// mutated in place by every pipeline phase, never resized.
pub struct World {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    /// Dominant biome per REGION_SIZE × REGION_SIZE block, row-major.
    regions: Vec<Biome>,
    peaks: Vec<u32>,
    lakes: Vec<u32>,
}

impl World {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(Cell::new(x as u32, y as u32));
            }
        }
        let region_count = (width / REGION_SIZE).max(1) * (height / REGION_SIZE).max(1);
        Self {
            width,
            height,
            cells,
            regions: vec![Biome::Ocean; region_count],
            peaks: Vec::new(),
            lakes: Vec::new(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn cell(&self, x: usize, y: usize) -> &Cell {
        &self.cells[y * self.width + x]
    }

    #[inline]
    pub(crate) fn cell_mut(&mut self, x: usize, y: usize) -> &mut Cell {
        &mut self.cells[y * self.width + x]
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Mutable views of the cell array and the region summaries at once, for
    /// the allocator phase which writes both.
    pub(crate) fn cells_and_regions(&mut self) -> (&mut [Cell], &mut [Biome]) {
        (&mut self.cells, &mut self.regions)
    }

    /// Index of the cardinal neighbour, or `None` at the grid edge.
    pub fn neighbour(&self, idx: usize, dir: Dir) -> Option<usize> {
        let (dx, dy) = dir.offset();
        self.offset_index(idx, dx, dy)
    }

    /// Index of the 8-way neighbour, or `None` at the grid edge.
    pub fn step(&self, idx: usize, dir: Compass) -> Option<usize> {
        let (dx, dy) = dir.offset();
        self.offset_index(idx, dx, dy)
    }

    fn offset_index(&self, idx: usize, dx: i64, dy: i64) -> Option<usize> {
        let x = (idx % self.width) as i64 + dx;
        let y = (idx / self.width) as i64 + dy;
        if x < 0 || x >= self.width as i64 || y < 0 || y >= self.height as i64 {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    // ── Read-only accessors for renderers and exporters ───────────────────────

    pub fn height_at(&self, x: usize, y: usize) -> f64 {
        self.cell(x, y).height
    }

    pub fn moisture_at(&self, x: usize, y: usize) -> f64 {
        self.cell(x, y).moisture
    }

    pub fn soil_depth_at(&self, x: usize, y: usize) -> f64 {
        self.cell(x, y).soil_depth
    }

    pub fn biome_at(&self, x: usize, y: usize) -> Biome {
        self.cell(x, y).biome
    }

    pub fn terrace_at(&self, x: usize, y: usize) -> Terrace {
        self.cell(x, y).terrace
    }

    pub fn has_feature(&self, x: usize, y: usize, bits: u16) -> bool {
        self.cell(x, y).has_feature(bits)
    }

    pub fn is_river(&self, x: usize, y: usize) -> bool {
        self.cell(x, y).is_river
    }

    pub fn is_river_bank(&self, x: usize, y: usize) -> bool {
        self.cell(x, y).is_river_bank()
    }

    pub fn is_wall(&self, x: usize, y: usize) -> bool {
        self.cell(x, y).is_wall
    }

    pub fn river_bank(&self, x: usize, y: usize) -> Option<Bank> {
        self.cell(x, y).river_bank
    }

    /// Dominant biome of the region containing cell `(x, y)`.
    pub fn region_biome(&self, x: usize, y: usize) -> Biome {
        let per_row = self.width / REGION_SIZE;
        self.regions[(y / REGION_SIZE) * per_row + x / REGION_SIZE]
    }

    pub fn regions(&self) -> &[Biome] {
        &self.regions
    }

    // ── Peak / lake lists (built once by the adjacency pass) ─────────────────

    pub(crate) fn add_peak(&mut self, idx: usize) {
        self.peaks.push(idx as u32);
    }

    pub(crate) fn add_lake(&mut self, idx: usize) {
        self.lakes.push(idx as u32);
    }

    pub fn peaks(&self) -> &[u32] {
        &self.peaks
    }

    pub fn lakes(&self) -> &[u32] {
        &self.lakes
    }
}
