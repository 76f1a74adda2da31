//! Occupancy grid derived from the map's collision layer, plus the
//! pixel <-> cell conversion shared by movement, fog and camera code.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::game::fixed_math::{FixedNum, FixedVec2};


/// One grid-aligned unit of the map. `x` is the column, `y` the row.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Per-axis step (-1, 0 or +1) from `self` toward `other`.
    pub fn step_toward(self, other: Cell) -> IVec2 {
        IVec2::new(
            (other.x as i32 - self.x as i32).signum(),
            (other.y as i32 - self.y as i32).signum(),
        )
    }
}

/// Passable/blocked table, `false` = passable, `true` = blocked.
///
/// Built once per map from the collision tile layer and never mutated
/// afterwards; a map reload builds a fresh one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OccupancyGrid {
    width: usize,
    height: usize,
    blocked: Vec<bool>,
}

impl OccupancyGrid {
    /// A non-zero tile index means a floor tile was painted there, so the cell
    /// is passable; an empty (zero) tile is blocked.
    pub fn build(layer_data: &[u32], width: usize, height: usize) -> Self {
        debug_assert_eq!(
            layer_data.len(),
            width * height,
            "collision layer has {} tiles, expected {}x{}",
            layer_data.len(),
            width,
            height
        );

        let blocked = (0..width * height)
            .map(|idx| layer_data.get(idx).copied().unwrap_or(0) == 0)
            .collect();

        Self { width, height, blocked }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get_index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    /// `[row][col]` lookup. Out-of-range cells read as blocked.
    pub fn get(&self, row: usize, col: usize) -> bool {
        if row >= self.height || col >= self.width {
            return true;
        }
        self.blocked[self.get_index(col, row)]
    }

    pub fn is_blocked(&self, cell: Cell) -> bool {
        self.get(cell.y, cell.x)
    }

    pub fn passable_count(&self) -> usize {
        self.blocked.iter().filter(|b| !**b).count()
    }
}

/// Occupancy grid together with the tile size needed to map pixels to cells.
#[derive(Resource, Clone, Debug)]
pub struct CollisionGrid {
    pub occupancy: OccupancyGrid,
    pub tile_size: FixedVec2,
}

impl Default for CollisionGrid {
    fn default() -> Self {
        Self {
            occupancy: OccupancyGrid::default(),
            tile_size: FixedVec2::from_int(16, 16),
        }
    }
}

impl CollisionGrid {
    pub fn new(occupancy: OccupancyGrid, tile_width: u32, tile_height: u32) -> Self {
        Self {
            occupancy,
            tile_size: FixedVec2::from_int(tile_width as i64, tile_height as i64),
        }
    }

    /// Map extent in pixels.
    pub fn pixel_size(&self) -> FixedVec2 {
        FixedVec2::new(
            FixedNum::from_num(self.occupancy.width()) * self.tile_size.x,
            FixedNum::from_num(self.occupancy.height()) * self.tile_size.y,
        )
    }

    /// Cell containing a world-local pixel, `None` outside the map.
    pub fn cell_at(&self, pixel: FixedVec2) -> Option<Cell> {
        if pixel.x < FixedNum::ZERO || pixel.y < FixedNum::ZERO {
            return None;
        }

        let x = (pixel.x / self.tile_size.x).floor().to_num::<usize>();
        let y = (pixel.y / self.tile_size.y).floor().to_num::<usize>();
        let cell = Cell::new(x, y);

        self.occupancy.contains(cell).then_some(cell)
    }

    /// Top-left pixel of a cell.
    pub fn cell_origin(&self, cell: Cell) -> FixedVec2 {
        FixedVec2::new(
            FixedNum::from_num(cell.x) * self.tile_size.x,
            FixedNum::from_num(cell.y) * self.tile_size.y,
        )
    }

    /// True when the pixel lies on the map and its cell is passable.
    pub fn is_cell_valid(&self, pixel: FixedVec2) -> bool {
        self.cell_at(pixel)
            .is_some_and(|cell| !self.occupancy.is_blocked(cell))
    }
}
