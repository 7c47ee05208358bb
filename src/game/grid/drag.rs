use bevy::prelude::*;
use rustc_hash::FxHashSet;

use super::{GridCell, ObstacleGrid};

/// Cells touched during the current mouse gesture.
///
/// Pressing starts a gesture, dragging adds cells, releasing toggles every
/// collected cell once and ends the gesture. The set is empty whenever no
/// gesture is active.
#[derive(Resource, Default, Debug)]
pub struct DragGesture {
    active: bool,
    cells: FxHashSet<GridCell>,
}

impl DragGesture {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: GridCell) -> bool {
        self.cells.contains(&cell)
    }

    /// Start a gesture. `cell` is `None` when the pointer is off the grid.
    pub fn press(&mut self, cell: Option<GridCell>) {
        self.active = true;
        self.cells.extend(cell);
    }

    /// Add the cell under the pointer while the button is held.
    pub fn extend(&mut self, cell: Option<GridCell>) {
        if self.active {
            self.cells.extend(cell);
        }
    }

    /// Finish the gesture, toggling each collected cell exactly once.
    ///
    /// Returns how many cells were toggled.
    pub fn release(&mut self, grid: &mut ObstacleGrid) -> usize {
        if !self.active {
            return 0;
        }
        self.active = false;

        let mut toggled = 0;
        for cell in self.cells.drain() {
            if grid.toggle(cell).is_some() {
                toggled += 1;
            }
        }
        toggled
    }
}
