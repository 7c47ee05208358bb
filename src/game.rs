use bevy::prelude::*;

pub mod config;
pub mod grid;
pub mod input;
pub mod movement;
pub mod player;
pub mod receiver;
pub mod scene;
pub mod simulation;

use config::RaceConfigPlugin;
use input::GridEditPlugin;
use receiver::CommandReceiverPlugin;
use scene::ScenePlugin;
use simulation::RaceSimulationPlugin;

/// Whether the race loop is live. `Stopped` is terminal: the node is shut
/// down and the app exits.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunState {
    #[default]
    Running,
    Stopped,
}

pub struct RaceGamePlugin;

impl Plugin for RaceGamePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<RunState>()
           .add_plugins((
               RaceConfigPlugin,
               RaceSimulationPlugin,
               GridEditPlugin,
               CommandReceiverPlugin,
               ScenePlugin,
           ));
    }
}
