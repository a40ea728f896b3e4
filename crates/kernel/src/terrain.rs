use std::collections::{HashMap, HashSet};

use glam::{IVec2, IVec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use warpgate_common::Cell;

/// Width of a chunk in blocks along X and Z.
pub const CHUNK_SIZE: i32 = 32;

/// A chunk coordinate in the world grid (columns are grouped along X/Z only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk holding block column `(x, z)`.
    pub fn from_block(x: i32, z: i32) -> Self {
        Self {
            x: x.div_euclid(CHUNK_SIZE),
            z: z.div_euclid(CHUNK_SIZE),
        }
    }
}

/// Owned copy of one column, cells indexed by Y from 0 upward.
///
/// Cells outside the stored range read as air.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnSnapshot {
    pub x: i32,
    pub z: i32,
    cells: Vec<Cell>,
}

impl ColumnSnapshot {
    pub fn new(x: i32, z: i32, cells: Vec<Cell>) -> Self {
        Self { x, z, cells }
    }

    pub fn cell(&self, y: i32) -> Cell {
        usize::try_from(y)
            .ok()
            .and_then(|i| self.cells.get(i))
            .copied()
            .unwrap_or(Cell::AIR)
    }

    /// Height of the stored cell stack.
    pub fn height(&self) -> usize {
        self.cells.len()
    }
}

/// Block storage for one world, chunked so that residency can be tracked.
///
/// Every column that has been written exists in storage, but only columns
/// whose chunk is resident can be read synchronously. Fetching a column makes
/// its chunk resident.
#[derive(Debug, Clone, Default)]
pub struct Terrain {
    columns: HashMap<IVec2, Vec<Cell>>,
    resident: HashSet<ChunkCoord>,
}

impl Terrain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flat square of solid ground from Y 0 up to `ground` (inclusive),
    /// spanning `[-half_extent, half_extent]` on X and Z. Fully resident.
    pub fn flat(half_extent: i32, ground: i32) -> Self {
        let mut terrain = Self::new();
        for x in -half_extent..=half_extent {
            for z in -half_extent..=half_extent {
                terrain.fill_ground(x, z, ground);
            }
        }
        terrain.load_all();
        terrain
    }

    /// Rolling terrain with scattered ponds and overhangs, reproducible from
    /// `seed`. Nothing is resident until loaded.
    pub fn generate(seed: u64, half_extent: i32) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut terrain = Self::new();
        for x in -half_extent..=half_extent {
            for z in -half_extent..=half_extent {
                let wave = ((x as f64 * 0.11).sin() + (z as f64 * 0.07).cos()) * 6.0;
                let ground = 64 + wave.round() as i32 + rng.gen_range(0..2);
                terrain.fill_ground(x, z, ground);
                let roll: f64 = rng.gen_range(0.0..1.0);
                if roll < 0.15 {
                    for y in ground + 1..=ground + 3 {
                        terrain.set_cell(IVec3::new(x, y, z), Cell::FLUID);
                    }
                } else if roll < 0.25 {
                    // Ledge two blocks above the ground leaves a one-block gap.
                    terrain.set_cell(IVec3::new(x, ground + 2, z), Cell::SOLID);
                }
            }
        }
        terrain
    }

    /// Solid cells from Y 0 up to `ground` inclusive.
    pub fn fill_ground(&mut self, x: i32, z: i32, ground: i32) {
        for y in 0..=ground {
            self.set_cell(IVec3::new(x, y, z), Cell::SOLID);
        }
    }

    pub fn set_cell(&mut self, pos: IVec3, cell: Cell) {
        let Ok(y) = usize::try_from(pos.y) else {
            return;
        };
        let column = self.columns.entry(IVec2::new(pos.x, pos.z)).or_default();
        if column.len() <= y {
            column.resize(y + 1, Cell::AIR);
        }
        column[y] = cell;
    }

    /// Cell at `pos` regardless of residency.
    pub fn cell(&self, pos: IVec3) -> Cell {
        let Ok(y) = usize::try_from(pos.y) else {
            return Cell::AIR;
        };
        self.columns
            .get(&IVec2::new(pos.x, pos.z))
            .and_then(|c| c.get(y))
            .copied()
            .unwrap_or(Cell::AIR)
    }

    pub fn column(&self, x: i32, z: i32) -> ColumnSnapshot {
        let cells = self
            .columns
            .get(&IVec2::new(x, z))
            .cloned()
            .unwrap_or_default();
        ColumnSnapshot::new(x, z, cells)
    }

    pub fn is_resident(&self, x: i32, z: i32) -> bool {
        self.resident.contains(&ChunkCoord::from_block(x, z))
    }

    pub fn load_chunk(&mut self, coord: ChunkCoord) {
        if self.resident.insert(coord) {
            tracing::debug!(?coord, "loading chunk");
        }
    }

    pub fn unload_chunk(&mut self, coord: ChunkCoord) {
        if self.resident.remove(&coord) {
            tracing::debug!(?coord, "unloading chunk");
        }
    }

    /// Make every chunk that holds stored columns resident.
    pub fn load_all(&mut self) {
        let coords: Vec<ChunkCoord> = self
            .columns
            .keys()
            .map(|c| ChunkCoord::from_block(c.x, c.y))
            .collect();
        self.resident.extend(coords);
    }

    pub fn resident_chunks(&self) -> &HashSet<ChunkCoord> {
        &self.resident
    }

    /// Number of stored columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}
