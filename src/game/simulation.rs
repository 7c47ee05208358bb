use bevy::prelude::*;
use bevy::window::WindowCloseRequested;

use crate::game::config::RaceConfig;
use crate::game::grid::{GridCell, ObstacleGrid};
use crate::game::movement::{resolve_moves, tentative_position, MoveOutcome};
use crate::game::player::{spawn_players, Player, PlayerId, PlayerPosition, PlayerVelocity};
use crate::game::receiver::VelocityMailbox;
use crate::game::RunState;

pub struct RaceSimulationPlugin;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum TickSet {
    Sample,   // Copy the latest commanded velocities onto the players
    Movement, // Tentative step, obstacle check, commit
}

/// Number of fixed ticks simulated so far.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimTick(pub u64);

/// A tick whose movement was discarded because a player would have entered
/// an obstacle.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct MoveBlocked {
    pub tick: u64,
    pub player: PlayerId,
    pub cell: GridCell,
}

impl Plugin for RaceSimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RaceConfig>();
        let tick_rate = app.world().resource::<RaceConfig>().tick_rate;
        app.insert_resource(Time::<Fixed>::from_hz(tick_rate));
        info!("Simulation ticking at {} Hz", tick_rate);

        app.init_resource::<ObstacleGrid>()
           .init_resource::<VelocityMailbox>()
           .init_resource::<SimTick>()
           .add_message::<MoveBlocked>()
           .add_message::<WindowCloseRequested>();

        app.configure_sets(FixedUpdate, (
            TickSet::Sample,
            TickSet::Movement,
        ).chain().run_if(in_state(RunState::Running)));

        app.add_systems(Startup, spawn_players)
           .add_systems(FixedUpdate, (
               sample_velocities.in_set(TickSet::Sample),
               advance_players.in_set(TickSet::Movement),
           ))
           .add_systems(Update, request_stop_on_close)
           .add_systems(OnEnter(RunState::Stopped), exit_app);
    }
}

/// Snapshot the mailbox once per tick so both players move on the same
/// command set even if a message lands mid-tick.
pub fn sample_velocities(
    mailbox: Res<VelocityMailbox>,
    mut players: Query<(&Player, &mut PlayerVelocity)>,
) {
    for (player, mut velocity) in &mut players {
        velocity.0 = mailbox.velocity(player.0);
    }
}

pub fn advance_players(
    mut tick: ResMut<SimTick>,
    grid: Res<ObstacleGrid>,
    config: Res<RaceConfig>,
    mut players: Query<(&Player, &mut PlayerPosition, &PlayerVelocity)>,
    mut blocked: MessageWriter<MoveBlocked>,
) {
    tick.0 += 1;

    let mut tentative: Vec<(PlayerId, Vec2)> = players
        .iter()
        .map(|(player, position, velocity)| (player.0, tentative_position(position.0, velocity.0)))
        .collect();
    tentative.sort_by_key(|&(id, _)| id);

    match resolve_moves(&grid, config.player_size, &tentative) {
        MoveOutcome::Committed => {
            for (player, mut position, _) in &mut players {
                if let Some(&(_, next)) = tentative.iter().find(|(id, _)| *id == player.0) {
                    position.0 = next;
                }
            }
        }
        MoveOutcome::Blocked { player, cell } => {
            debug!("Tick {}: {} blocked by obstacle at ({}, {})", tick.0, player, cell.x, cell.y);
            blocked.write(MoveBlocked { tick: tick.0, player, cell });
        }
    }
}

fn request_stop_on_close(
    mut close_requests: MessageReader<WindowCloseRequested>,
    mut next_state: ResMut<NextState<RunState>>,
) {
    if close_requests.read().count() > 0 {
        info!("Window close requested, stopping");
        next_state.set(RunState::Stopped);
    }
}

fn exit_app(mut exit: MessageWriter<AppExit>) {
    info!("Race stopped");
    exit.write(AppExit::Success);
}
