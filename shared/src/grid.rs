//! Static walkable/blocked tile map.
//!
//! The grid is loaded once at startup and never mutated. Cell code 0 is
//! walkable, every other code is blocked; this one convention is applied to
//! both collision queries and spawn selection.

use crate::TILE_SIZE;
use rand::Rng;
use std::path::Path;

/// Cell code that marks a walkable tile. Everything else blocks.
pub const WALKABLE_CODE: i32 = 0;

/// How many uniform-random cells to draw before falling back to a linear
/// scan when looking for a spawn point. Keeps spawn selection bounded even
/// on maps that are almost entirely walls.
const MAX_SPAWN_ATTEMPTS: usize = 64;

/// Immutable rectangular map of blocked/walkable cells.
#[derive(Debug, Clone)]
pub struct CollisionGrid {
    width: usize,
    height: usize,
    cells: Vec<i32>,
}

impl CollisionGrid {
    /// Parses a grid from comma-separated rows, one row per line.
    ///
    /// The table must be rectangular, non-empty, and contain at least one
    /// walkable cell (otherwise no player could ever spawn).
    pub fn parse(text: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut cells = Vec::new();
        let mut width = 0usize;
        let mut height = 0usize;

        for (row, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let mut row_cells = Vec::new();
            for token in line.split(',') {
                let code: i32 = token
                    .trim()
                    .parse()
                    .map_err(|_| format!("row {}: invalid cell code {:?}", row, token.trim()))?;
                row_cells.push(code);
            }

            if width == 0 {
                width = row_cells.len();
            } else if row_cells.len() != width {
                return Err(format!(
                    "row {}: expected {} cells, found {}",
                    row,
                    width,
                    row_cells.len()
                )
                .into());
            }

            cells.extend(row_cells);
            height += 1;
        }

        if width == 0 || height == 0 {
            return Err("map is empty".into());
        }
        if !cells.iter().any(|&code| code == WALKABLE_CODE) {
            return Err("map has no walkable cell".into());
        }

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Reads and parses a grid from a map file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("reading map {}: {}", path.display(), e))?;
        Self::parse(&text)
    }

    pub fn width_cells(&self) -> usize {
        self.width
    }

    pub fn height_cells(&self) -> usize {
        self.height
    }

    /// World-space width covered by the grid.
    pub fn world_width(&self) -> f32 {
        self.width as f32 * TILE_SIZE
    }

    /// World-space height covered by the grid.
    pub fn world_height(&self) -> f32 {
        self.height as f32 * TILE_SIZE
    }

    fn cell_blocked(&self, col: isize, row: isize) -> bool {
        if col < 0 || row < 0 || col >= self.width as isize || row >= self.height as isize {
            return true;
        }
        self.cells[row as usize * self.width + col as usize] != WALKABLE_CODE
    }

    /// Whether the cell containing a world coordinate is blocked.
    /// Out-of-bounds coordinates are always blocked.
    pub fn is_blocked(&self, x: f32, y: f32) -> bool {
        let col = (x / TILE_SIZE).floor() as isize;
        let row = (y / TILE_SIZE).floor() as isize;
        self.cell_blocked(col, row)
    }

    /// Whether any cell under the square bounding box of a body centered at
    /// `(x, y)` with the given radius is blocked or outside the grid.
    pub fn is_area_blocked(&self, x: f32, y: f32, radius: f32) -> bool {
        let min_col = ((x - radius) / TILE_SIZE).floor() as isize;
        let max_col = ((x + radius) / TILE_SIZE).floor() as isize;
        let min_row = ((y - radius) / TILE_SIZE).floor() as isize;
        let max_row = ((y + radius) / TILE_SIZE).floor() as isize;

        for row in min_row..=max_row {
            for col in min_col..=max_col {
                if self.cell_blocked(col, row) {
                    return true;
                }
            }
        }
        false
    }

    /// Picks a walkable spawn point, returned as a cell center in world
    /// coordinates.
    ///
    /// Draws uniform-random cells up to a fixed attempt cap, then falls
    /// back to the first walkable cell in row-major order. Parsing already
    /// guarantees at least one walkable cell, so the fallback always finds
    /// one and the search terminates even on wall-dense maps.
    pub fn find_walkable_spawn<R: Rng>(&self, rng: &mut R) -> (f32, f32) {
        for _ in 0..MAX_SPAWN_ATTEMPTS {
            let col = rng.gen_range(0..self.width);
            let row = rng.gen_range(0..self.height);
            if self.cells[row * self.width + col] == WALKABLE_CODE {
                return self.cell_center(col, row);
            }
        }

        for (index, &code) in self.cells.iter().enumerate() {
            if code == WALKABLE_CODE {
                return self.cell_center(index % self.width, index / self.width);
            }
        }

        // Unreachable: parse() rejects maps without a walkable cell.
        self.cell_center(0, 0)
    }

    fn cell_center(&self, col: usize, row: usize) -> (f32, f32) {
        (
            (col as f32 + 0.5) * TILE_SIZE,
            (row as f32 + 0.5) * TILE_SIZE,
        )
    }
}
