/// Frame rendering.
///
/// Game state lives in window pixels (origin top-left, y down). The 2D camera
/// looks at world space with the origin at the window center and y up, so
/// every drawable goes through [`screen_to_world`].

use bevy::math::Isometry2d;
use bevy::prelude::*;

use crate::game::config::{rgb, ActivePalette, Palette, RaceConfig};
use crate::game::grid::{DragGesture, GridCell, ObstacleGrid};
use crate::game::player::{Player, PlayerId, PlayerPosition};

const CELL_Z: f32 = 0.0;
const PLAYER_Z: f32 = 1.0;

/// Filled square drawn over one grid cell.
#[derive(Component, Debug, Clone, Copy)]
pub struct CellTile(pub GridCell);

/// How a cell should be filled this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFill {
    Empty,
    Obstacle,
    /// Part of the active drag gesture. Shown instead of the obstacle fill
    /// until the gesture is released.
    DragHighlight,
}

pub fn cell_fill(grid: &ObstacleGrid, drag: &DragGesture, cell: GridCell) -> CellFill {
    if drag.contains(cell) {
        CellFill::DragHighlight
    } else if grid.is_blocked(cell) {
        CellFill::Obstacle
    } else {
        CellFill::Empty
    }
}

/// World-space center of a window-pixel rectangle.
pub fn screen_to_world(rect: Rect, window: Vec2) -> Vec2 {
    let center = rect.center();
    Vec2::new(center.x - window.x / 2.0, window.y / 2.0 - center.y)
}

pub fn player_color(palette: &Palette, id: PlayerId) -> Color {
    match id {
        PlayerId::One => rgb(palette.player1),
        PlayerId::Two => rgb(palette.player2),
    }
}

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(rgb(Palette::default().background)))
           .add_systems(Startup, setup_scene)
           .add_systems(Update, (
               attach_player_sprites,
               sync_player_sprites,
               paint_cells,
               draw_grid_lines,
           ).chain());
    }
}

fn setup_scene(mut commands: Commands, grid: Res<ObstacleGrid>, config: Res<RaceConfig>) {
    commands.spawn(Camera2d);

    let window = config.window_size();
    let size = Vec2::splat(grid.cell_size());
    for cell in grid.cells() {
        let center = screen_to_world(grid.cell_rect(cell), window);
        commands.spawn((
            CellTile(cell),
            Sprite::from_color(Color::NONE, size),
            Transform::from_translation(center.extend(CELL_Z)),
            Visibility::Hidden,
        ));
    }
    info!("Scene ready: {} cell tiles", grid.columns() * grid.rows());
}

fn attach_player_sprites(
    mut commands: Commands,
    players: Query<(Entity, &Player), Added<Player>>,
    palette: Res<ActivePalette>,
    config: Res<RaceConfig>,
) {
    for (entity, player) in &players {
        commands.entity(entity).insert((
            Sprite::from_color(player_color(&palette.0, player.0), Vec2::splat(config.player_size)),
            Transform::default(),
        ));
    }
}

fn sync_player_sprites(
    mut players: Query<(&Player, &PlayerPosition, &mut Transform, &mut Sprite)>,
    palette: Res<ActivePalette>,
    config: Res<RaceConfig>,
) {
    let window = config.window_size();
    for (player, position, mut transform, mut sprite) in &mut players {
        let rect = crate::game::player::player_rect(position.0, config.player_size);
        transform.translation = screen_to_world(rect, window).extend(PLAYER_Z);
        sprite.color = player_color(&palette.0, player.0);
    }
}

fn paint_cells(
    grid: Res<ObstacleGrid>,
    drag: Res<DragGesture>,
    palette: Res<ActivePalette>,
    mut tiles: Query<(&CellTile, &mut Sprite, &mut Visibility)>,
) {
    for (tile, mut sprite, mut visibility) in &mut tiles {
        match cell_fill(&grid, &drag, tile.0) {
            CellFill::Empty => *visibility = Visibility::Hidden,
            CellFill::Obstacle => {
                sprite.color = rgb(palette.0.obstacle);
                *visibility = Visibility::Inherited;
            }
            CellFill::DragHighlight => {
                sprite.color = rgb(palette.0.drag_highlight);
                *visibility = Visibility::Inherited;
            }
        }
    }
}

fn draw_grid_lines(
    mut gizmos: Gizmos,
    grid: Res<ObstacleGrid>,
    palette: Res<ActivePalette>,
    config: Res<RaceConfig>,
) {
    let window = config.window_size();
    let color = rgb(palette.0.grid_line);
    let size = Vec2::splat(grid.cell_size());
    for cell in grid.cells() {
        let center = screen_to_world(grid.cell_rect(cell), window);
        gizmos.rect_2d(Isometry2d::from_translation(center), size, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_highlight_wins_over_obstacle() {
        let mut grid = ObstacleGrid::new(20, 15, 40.0);
        let mut drag = DragGesture::default();
        let blocked = GridCell::new(1, 1);
        let free = GridCell::new(2, 1);
        grid.set_blocked(blocked, true);

        assert_eq!(cell_fill(&grid, &drag, blocked), CellFill::Obstacle);
        assert_eq!(cell_fill(&grid, &drag, free), CellFill::Empty);

        drag.press(Some(blocked));
        drag.extend(Some(free));
        assert_eq!(cell_fill(&grid, &drag, blocked), CellFill::DragHighlight);
        assert_eq!(cell_fill(&grid, &drag, free), CellFill::DragHighlight);

        drag.release(&mut grid);
        assert_eq!(cell_fill(&grid, &drag, blocked), CellFill::Empty);
        assert_eq!(cell_fill(&grid, &drag, free), CellFill::Obstacle);
    }

    #[test]
    fn test_screen_to_world_flips_y_around_window_center() {
        let window = Vec2::new(800.0, 600.0);
        let top_left = Rect::new(0.0, 0.0, 40.0, 40.0);
        assert_eq!(screen_to_world(top_left, window), Vec2::new(-380.0, 280.0));

        let player = Rect::new(100.0, 300.0, 150.0, 350.0);
        assert_eq!(screen_to_world(player, window), Vec2::new(-275.0, -25.0));
    }
}
