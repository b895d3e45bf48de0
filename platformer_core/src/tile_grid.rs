//! Static solidity map for tile-based levels.
//!
//! The grid is produced once by a level loader and never mutated afterwards.
//! Cells are stored row-major with the origin at the top-left; any query
//! outside the grid reports "not solid".

use thiserror::Error;

use crate::math::{Rect, Vec2};

/// A cell position in tile coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("expected {expected} cells for a {width}x{height} grid, got {actual}")]
    CellCountMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
    #[error("row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Immutable boolean solidity grid with a fixed square tile size.
#[derive(Clone, Debug)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_size: f32,
    solid: Vec<bool>, // Row-major: [y * width + x]
}

impl TileGrid {
    /// Build a grid from a row-major solidity array.
    pub fn new(
        width: usize,
        height: usize,
        tile_size: f32,
        solid: Vec<bool>,
    ) -> Result<Self, GridError> {
        let expected = width * height;
        if solid.len() != expected {
            return Err(GridError::CellCountMismatch {
                width,
                height,
                expected,
                actual: solid.len(),
            });
        }
        Ok(Self {
            width,
            height,
            tile_size,
            solid,
        })
    }

    /// A grid with no solid cells.
    pub fn empty(width: usize, height: usize, tile_size: f32) -> Self {
        Self {
            width,
            height,
            tile_size,
            solid: vec![false; width * height],
        }
    }

    /// Build a grid from text rows where `#` marks a solid cell and any other
    /// character is empty.
    pub fn from_rows(rows: &[&str], tile_size: f32) -> Result<Self, GridError> {
        let width = rows.first().map(|row| row.chars().count()).unwrap_or(0);
        let mut solid = Vec::with_capacity(width * rows.len());
        for (index, row) in rows.iter().enumerate() {
            let count = row.chars().count();
            if count != width {
                return Err(GridError::RaggedRow {
                    row: index,
                    expected: width,
                    actual: count,
                });
            }
            solid.extend(row.chars().map(|c| c == '#'));
        }
        Self::new(width, rows.len(), tile_size, solid)
    }

    /// Get the width of the grid in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Get the height of the grid in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// A non-positive (or NaN) tile size means collision should ignore the grid.
    pub fn is_usable(&self) -> bool {
        self.tile_size > 0.0
    }

    /// World-space rectangle covered by the whole grid.
    pub fn world_bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.width as f32 * self.tile_size,
            self.height as f32 * self.tile_size,
        )
    }

    /// Check if a grid coordinate is valid (within bounds).
    pub fn is_valid(&self, coord: GridCoord) -> bool {
        coord.x >= 0 && coord.x < self.width as i32 && coord.y >= 0 && coord.y < self.height as i32
    }

    pub fn is_solid(&self, coord: GridCoord) -> bool {
        if !self.is_valid(coord) {
            return false;
        }
        let index = (coord.y as usize) * self.width + (coord.x as usize);
        self.solid.get(index).copied().unwrap_or(false)
    }

    /// Solidity of the cell containing a world position.
    pub fn is_solid_at(&self, world_pos: Vec2) -> bool {
        self.is_usable() && self.is_solid(self.world_to_tile(world_pos))
    }

    /// Convert world position to tile coordinates.
    pub fn world_to_tile(&self, world_pos: Vec2) -> GridCoord {
        GridCoord {
            x: self.column_of(world_pos.x),
            y: self.row_of(world_pos.y),
        }
    }

    pub fn column_of(&self, world_x: f32) -> i32 {
        (world_x / self.tile_size).floor() as i32
    }

    pub fn row_of(&self, world_y: f32) -> i32 {
        (world_y / self.tile_size).floor() as i32
    }

    /// World-space rectangle of a tile.
    pub fn tile_rect(&self, coord: GridCoord) -> Rect {
        Rect::new(
            coord.x as f32 * self.tile_size,
            coord.y as f32 * self.tile_size,
            self.tile_size,
            self.tile_size,
        )
    }

    /// Tile coordinates of every solid cell touching `area`, row by row.
    pub fn solid_tiles_in(&self, area: &Rect) -> Vec<GridCoord> {
        if !self.is_usable() {
            return Vec::new();
        }
        let first_col = self.column_of(area.left()).max(0);
        let last_col = self.column_of(area.right()).min(self.width as i32 - 1);
        let first_row = self.row_of(area.top()).max(0);
        let last_row = self.row_of(area.bottom()).min(self.height as i32 - 1);

        let mut tiles = Vec::new();
        for y in first_row..=last_row {
            for x in first_col..=last_col {
                let coord = GridCoord::new(x, y);
                if self.is_solid(coord) {
                    tiles.push(coord);
                }
            }
        }
        tiles
    }
}
