use bevy::prelude::*;

use crate::game::config::RaceConfig;

/// The two racers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    pub const fn index(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }

    pub fn spawn_point(self, config: &RaceConfig) -> Vec2 {
        match self {
            PlayerId::One => config.player1_spawn,
            PlayerId::Two => config.player2_spawn,
        }
    }

    pub fn topic(self, config: &RaceConfig) -> &str {
        match self {
            PlayerId::One => &config.player1_topic,
            PlayerId::Two => &config.player2_topic,
        }
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player{}", self.index() + 1)
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Player(pub PlayerId);

/// Top-left corner of the player's square, in window pixels.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerPosition(pub Vec2);

/// Pixels per tick, as last sampled from the velocity mailbox.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerVelocity(pub Vec2);

/// Bounding square of a player whose top-left corner is at `pos`.
///
/// The corner is truncated to whole pixels; positions keep their fractional
/// part between ticks, the square does not.
pub fn player_rect(pos: Vec2, size: f32) -> Rect {
    let corner = pos.trunc();
    Rect::from_corners(corner, corner + Vec2::splat(size))
}

pub fn spawn_players(mut commands: Commands, config: Res<RaceConfig>) {
    for id in PlayerId::ALL {
        let spawn = id.spawn_point(&config);
        commands.spawn((
            Name::new(id.to_string()),
            Player(id),
            PlayerPosition(spawn),
            PlayerVelocity::default(),
        ));
        info!("Spawned {} at ({}, {})", id, spawn.x, spawn.y);
    }
}
