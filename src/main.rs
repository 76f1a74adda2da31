use bevy::prelude::*;

use bevy::window::WindowResolution;

use tilescape::game::GamePlugin;
use tilescape::game::config::InitialConfig;

use bevy::log::LogPlugin;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use std::fs;
use std::path::{Path, PathBuf};

/// Log to stdout and, when the `logs` directory is writable, to a timestamped
/// file in it. Returns the log file path.
fn setup_logging() -> Option<PathBuf> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wgpu=error,bevy_render=info,bevy_ecs=info,tilescape=info"));

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false);

    let log_dir = Path::new("logs");
    if let Err(e) = fs::create_dir_all(log_dir) {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stdout).with_target(false))
            .init();
        warn!("Cannot create {}: {}, logging to stdout only", log_dir.display(), e);
        return None;
    }
    cleanup_old_logs(log_dir, 25);

    let log_filename = format!("tilescape_{}.log", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    // One file per run
    let file_appender = RollingFileAppender::new(Rotation::NEVER, log_dir, &log_filename);
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Some(log_dir.join(log_filename))
}

/// Delete the oldest `tilescape_*.log` files until `keep` remain.
fn cleanup_old_logs(log_dir: &Path, keep: usize) {
    let Ok(entries) = fs::read_dir(log_dir) else { return };

    let mut logs: Vec<_> = entries
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with("tilescape_") && name.ends_with(".log")
        })
        .collect();
    if logs.len() <= keep {
        return;
    }

    logs.sort_by_key(|entry| entry.metadata().and_then(|m| m.modified()).ok());
    for entry in &logs[..logs.len() - keep] {
        let _ = fs::remove_file(entry.path());
    }
}

fn read_canvas_size() -> (u32, u32) {
    let config = fs::read_to_string("assets/initial_config.ron")
        .ok()
        .and_then(|contents| ron::from_str::<InitialConfig>(&contents).ok())
        .unwrap_or_default();
    (config.canvas_width as u32, config.canvas_height as u32)
}

fn main() {
    if let Some(log_file) = setup_logging() {
        info!("Logging to {}", log_file.display());
    }

    // The window is the canvas; its size has to be known before the app is built
    let canvas = read_canvas_size();

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Tilescape".into(),
                resolution: WindowResolution::new(canvas.0, canvas.1),
                resizable: false,
                ..default()
            }),
            ..default()
        }).build().disable::<LogPlugin>()) // Disable Bevy's default logging since we set up our own
        .add_plugins(GamePlugin)
        .run();
}

