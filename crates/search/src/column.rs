use glam::IVec3;
use warpgate_common::{Cell, WorldId};
use warpgate_kernel::{ColumnSnapshot, WorldQuery};

use crate::config::SearchConfig;

/// Read access to one column of cells.
pub trait ColumnView {
    fn cell(&self, y: i32) -> Cell;
}

impl ColumnView for ColumnSnapshot {
    fn cell(&self, y: i32) -> Cell {
        ColumnSnapshot::cell(self, y)
    }
}

/// A column read in place through [`WorldQuery`]. Only meaningful while the
/// column is resident.
pub struct ResidentColumn<'a> {
    query: &'a dyn WorldQuery,
    world: &'a WorldId,
    x: i32,
    z: i32,
}

impl<'a> ResidentColumn<'a> {
    pub fn new(query: &'a dyn WorldQuery, world: &'a WorldId, x: i32, z: i32) -> Self {
        Self { query, world, x, z }
    }
}

impl ColumnView for ResidentColumn<'_> {
    fn cell(&self, y: i32) -> Cell {
        let pos = IVec3::new(self.x, y, self.z);
        Cell {
            material: self.query.block_material(self.world, pos),
            fluid: self.query.has_fluid(self.world, pos),
        }
    }
}

/// Outcome of scanning one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnVerdict {
    /// Feet go at this Y.
    Spawn(i32),
    /// Fluid at this Y ruled the whole column out.
    Fluid(i32),
    /// Reached the floor without a standable ground.
    Exhausted,
}

/// Scan a column top-down for the highest ground with free, dry headroom.
///
/// Fluid met before any ground rejects the column outright. Ground whose
/// headroom is dry but obstructed is an overhang: the scan continues below it.
pub fn scan_column(column: &impl ColumnView, config: &SearchConfig) -> ColumnVerdict {
    let mut found_ground = false;
    for y in (config.floor..=config.ceiling).rev() {
        let cell = column.cell(y);
        if cell.fluid && !found_ground {
            return ColumnVerdict::Fluid(y);
        }
        if !cell.is_solid() {
            continue;
        }
        found_ground = true;
        // No room above ground this close to i32::MAX.
        let Some(feet) = y.checked_add(1) else {
            continue;
        };
        let Some(top) = feet.checked_add(config.player_height) else {
            continue;
        };
        let headroom = feet..top;
        if let Some(wet) = headroom.clone().find(|&h| column.cell(h).fluid) {
            return ColumnVerdict::Fluid(wet);
        }
        if headroom.clone().all(|h| !column.cell(h).is_solid()) {
            return ColumnVerdict::Spawn(feet);
        }
    }
    ColumnVerdict::Exhausted
}

#[cfg(test)]
mod tests {
    use super::*;
    use warpgate_kernel::Terrain;

    fn column(cells: &[(i32, Cell)]) -> ColumnSnapshot {
        let mut terrain = Terrain::new();
        for &(y, cell) in cells {
            terrain.set_cell(IVec3::new(0, y, 0), cell);
        }
        terrain.column(0, 0)
    }

    fn ground(top: i32) -> Vec<(i32, Cell)> {
        (0..=top).map(|y| (y, Cell::SOLID)).collect()
    }

    #[test]
    fn ground_at_ten_spawns_at_eleven() {
        let col = column(&ground(10));
        assert_eq!(
            scan_column(&col, &SearchConfig::default()),
            ColumnVerdict::Spawn(11)
        );
    }

    #[test]
    fn fluid_above_ground_rejects_column() {
        let mut cells = ground(5);
        cells.push((15, Cell::FLUID));
        let col = column(&cells);
        assert_eq!(
            scan_column(&col, &SearchConfig::default()),
            ColumnVerdict::Fluid(15)
        );
    }

    #[test]
    fn fluid_resting_on_ground_rejects_column() {
        let mut cells = ground(10);
        cells.push((11, Cell::FLUID));
        let col = column(&cells);
        assert_eq!(
            scan_column(&col, &SearchConfig::default()),
            ColumnVerdict::Fluid(11)
        );
    }

    #[test]
    fn highest_free_ground_wins() {
        // Ground at 10 and a ledge at 12: the ledge has free headroom.
        let mut cells = ground(10);
        cells.push((12, Cell::SOLID));
        let col = column(&cells);
        assert_eq!(
            scan_column(&col, &SearchConfig::default()),
            ColumnVerdict::Spawn(13)
        );
    }

    #[test]
    fn blocked_headroom_continues_below() {
        // Thick roof from 20 to 30 with the ceiling inside it, ground at 10.
        let mut cells = ground(10);
        for y in 20..=30 {
            cells.push((y, Cell::SOLID));
        }
        let col = column(&cells);
        let config = SearchConfig {
            ceiling: 29,
            ..SearchConfig::default()
        };
        assert_eq!(scan_column(&col, &config), ColumnVerdict::Spawn(11));
    }

    #[test]
    fn one_cell_gap_under_roof_is_skipped() {
        // Below the roof a block at 18 has only 19 free before 20.
        let mut cells = ground(10);
        cells.push((18, Cell::SOLID));
        for y in 20..=45 {
            cells.push((y, Cell::SOLID));
        }
        let col = column(&cells);
        let config = SearchConfig {
            ceiling: 40,
            ..SearchConfig::default()
        };
        assert_eq!(scan_column(&col, &config), ColumnVerdict::Spawn(11));
    }

    #[test]
    fn buried_column_is_exhausted() {
        let mut cells = ground(10);
        for y in 12..=45 {
            cells.push((y, Cell::SOLID));
        }
        let col = column(&cells);
        let config = SearchConfig {
            ceiling: 40,
            ..SearchConfig::default()
        };
        // 11 is the only free cell and it is one cell tall.
        assert_eq!(scan_column(&col, &config), ColumnVerdict::Exhausted);
    }

    #[test]
    fn empty_column_is_exhausted() {
        let col = ColumnSnapshot::default();
        assert_eq!(
            scan_column(&col, &SearchConfig::default()),
            ColumnVerdict::Exhausted
        );
    }

    #[test]
    fn fluid_met_after_ground_does_not_reject() {
        // Roof at 50 blocked by the cell above it, a stray fluid cell in the
        // cave below, and dry ground at 10.
        let mut cells = ground(10);
        cells.push((30, Cell::FLUID));
        cells.push((50, Cell::SOLID));
        cells.push((51, Cell::SOLID));
        let col = column(&cells);
        let config = SearchConfig {
            ceiling: 50,
            ..SearchConfig::default()
        };
        assert_eq!(scan_column(&col, &config), ColumnVerdict::Spawn(11));
    }

    /// Solid up to `ground` inclusive, air above.
    struct Stack {
        ground: i32,
    }

    impl ColumnView for Stack {
        fn cell(&self, y: i32) -> Cell {
            if y <= self.ground { Cell::SOLID } else { Cell::AIR }
        }
    }

    #[test]
    fn ground_at_top_of_range_does_not_overflow() {
        let config = SearchConfig {
            ceiling: i32::MAX,
            floor: i32::MAX - 8,
            ..SearchConfig::default()
        };
        // Headroom for every ground cell here would pass i32::MAX.
        let solid = Stack { ground: i32::MAX };
        assert_eq!(scan_column(&solid, &config), ColumnVerdict::Exhausted);

        let ledge = Stack {
            ground: i32::MAX - 3,
        };
        assert_eq!(
            scan_column(&ledge, &config),
            ColumnVerdict::Spawn(i32::MAX - 2)
        );
    }

    #[test]
    fn floor_at_bottom_of_range_does_not_underflow() {
        let config = SearchConfig {
            ceiling: i32::MIN + 4,
            floor: i32::MIN,
            ..SearchConfig::default()
        };
        let open = Stack { ground: i32::MIN };
        assert_eq!(
            scan_column(&open, &config),
            ColumnVerdict::Spawn(i32::MIN + 1)
        );
    }

    #[test]
    fn huge_player_height_finds_no_headroom() {
        let config = SearchConfig {
            ceiling: 20,
            player_height: i32::MAX,
            ..SearchConfig::default()
        };
        let col = column(&ground(10));
        assert_eq!(scan_column(&col, &config), ColumnVerdict::Exhausted);
    }
}
