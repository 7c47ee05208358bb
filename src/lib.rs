pub mod game;
pub mod messaging;
