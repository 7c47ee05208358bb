use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::game::grid::{DragGesture, ObstacleGrid};
use crate::game::RunState;

/// Pointer activity relevant to grid editing, in window pixels.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Left button went down. `None` when the cursor is outside the window.
    Pressed(Option<Vec2>),
    /// Cursor position while the left button is held.
    Dragged(Vec2),
    Released,
}

pub struct GridEditPlugin;

impl Plugin for GridEditPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ObstacleGrid>()
           .init_resource::<DragGesture>()
           .add_message::<PointerEvent>()
           .add_systems(Update, (
               read_pointer,
               apply_pointer_events,
           ).chain().run_if(in_state(RunState::Running)));
    }
}

/// Translate mouse button state and cursor position into [`PointerEvent`]s.
pub fn read_pointer(
    buttons: Option<Res<ButtonInput<MouseButton>>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut pointer: MessageWriter<PointerEvent>,
) {
    let Some(buttons) = buttons else { return };
    let cursor = windows.single().ok().and_then(|window| window.cursor_position());

    if buttons.just_pressed(MouseButton::Left) {
        pointer.write(PointerEvent::Pressed(cursor));
    } else if buttons.pressed(MouseButton::Left) {
        if let Some(pos) = cursor {
            pointer.write(PointerEvent::Dragged(pos));
        }
    }

    if buttons.just_released(MouseButton::Left) {
        pointer.write(PointerEvent::Released);
    }
}

/// Feed pointer events into the drag gesture; a release toggles the
/// collected cells.
pub fn apply_pointer_events(
    mut events: MessageReader<PointerEvent>,
    mut drag: ResMut<DragGesture>,
    mut grid: ResMut<ObstacleGrid>,
) {
    for event in events.read() {
        match *event {
            PointerEvent::Pressed(pos) => drag.press(pos.and_then(|p| grid.cell_at(p))),
            PointerEvent::Dragged(pos) => {
                let cell = grid.cell_at(pos);
                drag.extend(cell);
            }
            PointerEvent::Released => {
                let toggled = drag.release(&mut grid);
                if toggled > 0 {
                    info!("Toggled {} cell(s), {} obstacle(s) on the grid", toggled, grid.blocked_count());
                }
            }
        }
    }
}
