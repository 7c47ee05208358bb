use std::time::{Duration, Instant};

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use race_game::game::config::{rgb, ActivePalette, Palette, PaletteHandle};
use race_game::game::player::{Player, PlayerPosition};
use race_game::game::scene::CellTile;
use race_game::game::RaceGamePlugin;

/// The whole game plugin on a headless app: assets load from `assets/`, no
/// window or renderer.
fn game_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(StatesPlugin);
    app.add_plugins(AssetPlugin::default());
    app.add_plugins(bevy::gizmos::GizmoPlugin);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::ZERO));
    app.add_plugins(RaceGamePlugin);
    app.update();
    app
}

fn wait_for_palette(app: &mut App) {
    let handle = app.world().resource::<PaletteHandle>().0.clone();
    let deadline = Instant::now() + Duration::from_secs(5);
    while !app.world().resource::<AssetServer>().is_loaded_with_dependencies(&handle) {
        assert!(Instant::now() < deadline, "palette.ron never loaded");
        std::thread::sleep(Duration::from_millis(10));
        app.update();
    }
    // Let the load event reach the palette system.
    app.update();
}

#[test]
fn test_game_plugin_builds_scene_and_players() {
    let mut app = game_app();

    let tiles = app.world_mut().query::<&CellTile>().iter(app.world()).count();
    assert_eq!(tiles, 20 * 15);

    let mut players = app.world_mut().query::<(&Player, &PlayerPosition, &Sprite)>();
    assert_eq!(players.iter(app.world()).count(), 2);
}

#[test]
fn test_palette_asset_drives_active_colors() {
    let mut app = game_app();
    wait_for_palette(&mut app);
    assert_eq!(app.world().resource::<ActivePalette>().0, Palette::default());

    let custom = Palette {
        background: [10, 20, 30],
        obstacle: [200, 0, 200],
        ..Palette::default()
    };
    let handle = app.world().resource::<PaletteHandle>().0.clone();
    let _ = app.world_mut().resource_mut::<Assets<Palette>>().insert(handle.id(), custom.clone());
    app.update();

    assert_eq!(app.world().resource::<ActivePalette>().0, custom);
    assert_eq!(app.world().resource::<ClearColor>().0, rgb([10, 20, 30]));
}
