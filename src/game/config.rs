use std::path::Path;

use bevy::prelude::*;
use bevy_common_assets::ron::RonAssetPlugin;
use serde::{Deserialize, Serialize};

pub const RACE_CONFIG_PATH: &str = "assets/race_config.ron";

/// Static configuration read once before the app is built. Window size and
/// cell size fix the grid dimensions for the lifetime of the process, so
/// nothing here is hot-reloaded.
#[derive(Resource, Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct RaceConfig {
    // Display
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,

    // Play area
    pub cell_size: u32,
    pub player_size: f32,
    pub player1_spawn: Vec2,
    pub player2_spawn: Vec2,

    // Loop timing
    pub tick_rate: f64,
    pub spin_timeout_ms: u64,

    // Messaging
    pub node_name: String,
    pub player1_topic: String,
    pub player2_topic: String,
    pub bind_addr: String,
    pub qos_depth: usize,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            window_title: "Race Game".into(),
            window_width: 800,
            window_height: 600,
            cell_size: 40,
            player_size: 50.0,
            player1_spawn: Vec2::new(100.0, 300.0),
            player2_spawn: Vec2::new(200.0, 300.0),
            tick_rate: 60.0,
            spin_timeout_ms: 10,
            node_name: "race_game_node".into(),
            player1_topic: "player1/cmd_vel".into(),
            player2_topic: "player2/cmd_vel".into(),
            bind_addr: "127.0.0.1:7400".into(),
            qos_depth: 10,
        }
    }
}

impl RaceConfig {
    /// Read the config from `path`, falling back to defaults when the file is
    /// missing or does not parse.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => match ron::from_str::<RaceConfig>(&contents) {
                Ok(config) => {
                    info!("Loaded race config from {}", path.display());
                    config
                }
                Err(e) => {
                    error!("Failed to parse race config: {}", e);
                    error!("Using default RaceConfig");
                    RaceConfig::default()
                }
            },
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                error!("Using default RaceConfig");
                RaceConfig::default()
            }
        }
    }

    /// Grid columns and rows that fit in the window.
    pub fn grid_dimensions(&self) -> UVec2 {
        let cell = self.cell_size.max(1);
        UVec2::new(self.window_width / cell, self.window_height / cell)
    }

    pub fn window_size(&self) -> Vec2 {
        Vec2::new(self.window_width as f32, self.window_height as f32)
    }
}

/// Scene colors as RGB bytes. Hot-reloaded from `assets/palette.ron`.
#[derive(Deserialize, Serialize, Asset, TypePath, Clone, Debug, PartialEq)]
pub struct Palette {
    pub background: [u8; 3],
    pub grid_line: [u8; 3],
    pub obstacle: [u8; 3],
    pub drag_highlight: [u8; 3],
    pub player1: [u8; 3],
    pub player2: [u8; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: [0, 0, 0],
            grid_line: [128, 128, 128],
            obstacle: [0, 255, 0],
            drag_highlight: [255, 255, 0],
            player1: [255, 0, 0],
            player2: [0, 0, 255],
        }
    }
}

pub fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::srgb_u8(r, g, b)
}

/// Palette currently used for drawing. Starts from the defaults and follows
/// the palette asset once it has loaded.
#[derive(Resource, Default, Clone, Debug)]
pub struct ActivePalette(pub Palette);

#[derive(Resource)]
pub struct PaletteHandle(pub Handle<Palette>);

pub struct RaceConfigPlugin;

impl Plugin for RaceConfigPlugin {
    fn build(&self, app: &mut App) {
        // `main` inserts the config read from disk; headless apps get defaults.
        app.init_resource::<RaceConfig>()
           .init_resource::<ActivePalette>()
           .add_plugins(RonAssetPlugin::<Palette>::new(&["palette.ron"]))
           .add_systems(Startup, load_palette)
           .add_systems(Update, apply_palette_updates);
    }
}

fn load_palette(mut commands: Commands, asset_server: Res<AssetServer>) {
    let handle = asset_server.load("palette.ron");
    commands.insert_resource(PaletteHandle(handle));
}

/// Copy the palette asset into [`ActivePalette`] whenever it (re)loads.
fn apply_palette_updates(
    palette_handle: Res<PaletteHandle>,
    palettes: Res<Assets<Palette>>,
    mut events: MessageReader<AssetEvent<Palette>>,
    mut active: ResMut<ActivePalette>,
    mut clear_color: Option<ResMut<ClearColor>>,
) {
    for event in events.read() {
        if event.is_modified(palette_handle.0.id()) || event.is_loaded_with_dependencies(palette_handle.0.id()) {
            if let Some(palette) = palettes.get(&palette_handle.0) {
                active.0 = palette.clone();
                if let Some(clear_color) = clear_color.as_mut() {
                    clear_color.0 = rgb(palette.background);
                }
                info!("Palette loaded/updated");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_is_twenty_by_fifteen() {
        assert_eq!(RaceConfig::default().grid_dimensions(), UVec2::new(20, 15));
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_fields() {
        let config: RaceConfig = ron::from_str("(cell_size: 20, player1_topic: \"p1/vel\")").unwrap();
        assert_eq!(config.cell_size, 20);
        assert_eq!(config.player1_topic, "p1/vel");
        assert_eq!(config.player2_topic, "player2/cmd_vel");
        assert_eq!(config.grid_dimensions(), UVec2::new(40, 30));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = RaceConfig::load_or_default("does/not/exist.ron");
        assert_eq!(config, RaceConfig::default());
    }
}
