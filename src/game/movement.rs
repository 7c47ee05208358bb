/// Move resolution for one tick.
///
/// Both players move together or not at all: if either tentative square
/// overlaps an obstacle cell, neither position is committed.

use bevy::prelude::*;

use crate::game::grid::{rects_overlap, GridCell, ObstacleGrid};
use crate::game::player::{player_rect, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    Committed,
    /// First hit found by the scan. The scan stops there, so other overlaps
    /// in the same tick are not reported.
    Blocked { player: PlayerId, cell: GridCell },
}

/// Tentative position after one Euler step.
pub fn tentative_position(position: Vec2, velocity: Vec2) -> Vec2 {
    position + velocity
}

/// Check every tentative square against the obstacles.
///
/// Cells are scanned in grid storage order; for each cell the players are
/// checked in the order given.
pub fn resolve_moves(grid: &ObstacleGrid, player_size: f32, tentative: &[(PlayerId, Vec2)]) -> MoveOutcome {
    let rects: Vec<(PlayerId, Rect)> = tentative
        .iter()
        .map(|&(id, pos)| (id, player_rect(pos, player_size)))
        .collect();

    grid.blocked_cells()
        .find_map(|cell| {
            let cell_rect = grid.cell_rect(cell);
            rects
                .iter()
                .find(|(_, rect)| rects_overlap(*rect, cell_rect))
                .map(|&(player, _)| MoveOutcome::Blocked { player, cell })
        })
        .unwrap_or(MoveOutcome::Committed)
}
