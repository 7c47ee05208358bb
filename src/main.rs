use std::error::Error;
use std::fs;
use std::path::Path;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::window::WindowResolution;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use race_game::game::config::{RaceConfig, RACE_CONFIG_PATH};
use race_game::game::receiver::MessagingNode;
use race_game::game::RaceGamePlugin;
use race_game::messaging::{Node, UdpTransport};

const LOG_DIR: &str = "logs";
const LOG_PREFIX: &str = "race_game";
const KEEP_LOGS: usize = 25;

fn setup_file_logging() -> std::io::Result<String> {
    let log_dir = Path::new(LOG_DIR);
    fs::create_dir_all(log_dir)?;

    cleanup_old_logs(log_dir, KEEP_LOGS);

    let now = chrono::Local::now();
    let log_filename = format!("{}_{}.log", LOG_PREFIX, now.format("%Y%m%d_%H%M%S"));
    let log_path = log_dir.join(&log_filename).to_string_lossy().to_string();

    // One file per run
    let file_appender = RollingFileAppender::new(Rotation::NEVER, log_dir, &log_filename);

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wgpu=error,bevy_render=info,race_game=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(log_path)
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    let Ok(entries) = fs::read_dir(log_dir) else { return };

    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(LOG_PREFIX) && name.ends_with(".log"))
        })
        .collect();

    // Oldest first
    log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

    if log_files.len() > keep_count {
        for file in log_files.iter().take(log_files.len() - keep_count) {
            let _ = fs::remove_file(file.path());
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let log_file = setup_file_logging()?;
    println!("Race Game - logging to {}", log_file);

    let config = RaceConfig::load_or_default(RACE_CONFIG_PATH);

    let transport = UdpTransport::bind(config.bind_addr.as_str())?;
    let node = Node::new(config.node_name.clone(), transport);

    App::new()
        .insert_resource(config.clone())
        .insert_resource(MessagingNode(node))
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: config.window_title.clone(),
                resolution: WindowResolution::new(config.window_width, config.window_height),
                resizable: false,
                ..default()
            }),
            close_when_requested: false,
            ..default()
        }).build().disable::<LogPlugin>()) // Logging is set up above
        .add_plugins(RaceGamePlugin)
        .run();

    info!("Node '{}' shut down, exiting", config.node_name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_keeps_newest_logs_and_ignores_other_files() {
        let dir = std::env::temp_dir().join(format!("race_game_logs_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        for i in 0..30 {
            fs::write(dir.join(format!("{}_{:02}.log", LOG_PREFIX, i)), "").unwrap();
        }
        fs::write(dir.join("other.log"), "").unwrap();
        fs::write(dir.join(format!("{}_notes.txt", LOG_PREFIX)), "").unwrap();

        cleanup_old_logs(&dir, KEEP_LOGS);

        let remaining: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        let logs = remaining
            .iter()
            .filter(|name| name.starts_with(LOG_PREFIX) && name.ends_with(".log"))
            .count();
        assert_eq!(logs, KEEP_LOGS);
        assert!(remaining.iter().any(|name| name == "other.log"));
        assert!(remaining.iter().any(|name| name.ends_with("_notes.txt")));

        fs::remove_dir_all(&dir).unwrap();
    }
}
