use bevy::prelude::*;
use fixedbitset::FixedBitSet;

use crate::game::config::RaceConfig;

mod drag;

pub use drag::DragGesture;

/// Integer coordinates of a grid cell. `x` is the column, `y` the row,
/// counted from the top-left corner of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    pub x: u32,
    pub y: u32,
}

impl GridCell {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Obstacle grid covering the play area.
///
/// Cells are square and `cell_size` pixels wide. A set bit means the cell is
/// an obstacle. The grid is sized once from the window and never resized.
///
/// # Coordinates
///
/// Positions are in window pixels with the origin at the top-left corner and
/// y growing downwards, the same space the cursor is reported in. Rendering
/// converts to world space separately.
///
/// # Storage
///
/// Bits are laid out column-major (`x * rows + y`), so iterating set bits
/// visits columns left to right and, inside a column, rows top to bottom.
/// Collision scans rely on that order.
#[derive(Resource, Debug, Clone)]
pub struct ObstacleGrid {
    columns: u32,
    rows: u32,
    cell_size: f32,
    blocked: FixedBitSet,
}

impl ObstacleGrid {
    pub fn new(columns: u32, rows: u32, cell_size: f32) -> Self {
        Self {
            columns,
            rows,
            cell_size,
            blocked: FixedBitSet::with_capacity((columns * rows) as usize),
        }
    }

    pub fn from_config(config: &RaceConfig) -> Self {
        let dims = config.grid_dimensions();
        Self::new(dims.x, dims.y, config.cell_size.max(1) as f32)
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    fn index(&self, cell: GridCell) -> Option<usize> {
        (cell.x < self.columns && cell.y < self.rows)
            .then(|| (cell.x * self.rows + cell.y) as usize)
    }

    fn cell_from_index(&self, idx: usize) -> GridCell {
        let idx = idx as u32;
        GridCell::new(idx / self.rows, idx % self.rows)
    }

    pub fn contains(&self, cell: GridCell) -> bool {
        self.index(cell).is_some()
    }

    /// Cells outside the grid are never blocked.
    pub fn is_blocked(&self, cell: GridCell) -> bool {
        self.index(cell).is_some_and(|idx| self.blocked.contains(idx))
    }

    pub fn set_blocked(&mut self, cell: GridCell, blocked: bool) {
        if let Some(idx) = self.index(cell) {
            self.blocked.set(idx, blocked);
        }
    }

    /// Flip a cell between passable and obstacle.
    ///
    /// Returns the new state, or `None` if the cell lies outside the grid.
    pub fn toggle(&mut self, cell: GridCell) -> Option<bool> {
        let idx = self.index(cell)?;
        self.blocked.toggle(idx);
        Some(self.blocked.contains(idx))
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.count_ones(..)
    }

    pub fn blocked_cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        self.blocked.ones().map(|idx| self.cell_from_index(idx))
    }

    /// Every cell in storage order.
    pub fn cells(&self) -> impl Iterator<Item = GridCell> {
        let rows = self.rows;
        (0..self.columns).flat_map(move |x| (0..rows).map(move |y| GridCell::new(x, y)))
    }

    /// Cell under a pixel position, by floor division. `None` when the
    /// position falls outside the grid.
    pub fn cell_at(&self, pos: Vec2) -> Option<GridCell> {
        if !pos.is_finite() || pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        let cell = GridCell::new(
            (pos.x / self.cell_size).floor() as u32,
            (pos.y / self.cell_size).floor() as u32,
        );
        self.contains(cell).then_some(cell)
    }

    /// Pixel rectangle covered by a cell.
    pub fn cell_rect(&self, cell: GridCell) -> Rect {
        let min = Vec2::new(cell.x as f32, cell.y as f32) * self.cell_size;
        Rect::from_corners(min, min + Vec2::splat(self.cell_size))
    }

}

impl FromWorld for ObstacleGrid {
    fn from_world(world: &mut World) -> Self {
        let config = world.get_resource::<RaceConfig>().cloned().unwrap_or_default();
        let grid = ObstacleGrid::from_config(&config);
        info!("Obstacle grid {}x{} with {}px cells", grid.columns(), grid.rows(), grid.cell_size());
        grid
    }
}

/// Strict overlap test. Rectangles that only share an edge do not overlap.
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    !a.intersect(b).is_empty()
}
