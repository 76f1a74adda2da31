use bevy::prelude::*;
use bevy_common_assets::ron::RonAssetPlugin;
use serde::{Deserialize, Serialize};

/// Static configuration loaded once at startup. These values shape the
/// simulation (tick rate, speeds, grid adjacency) and must not change while a
/// map is being played.
#[derive(Resource, Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct InitialConfig {
    pub tick_rate: f64,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub map_path: String,

    // Movement & camera
    pub map_move_speed: f32,
    pub player_move_speed: f32,
    pub diagonal_movement: bool,

    // Fog of war
    pub fog_reveal_radius: u32,
    pub fog_cache_delay_ms: u64,
}

/// Runtime configuration that can be hot-reloaded during play (controls only).
#[derive(Deserialize, Serialize, Asset, TypePath, Clone, Debug)]
pub struct GameConfig {
    pub move_button: MouseButton,
    pub key_center_on_player: KeyCode,
    pub key_reload_map: KeyCode,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            move_button: MouseButton::Left,
            key_center_on_player: KeyCode::KeyC,
            key_reload_map: KeyCode::F5,
        }
    }
}

#[derive(Resource)]
pub struct GameConfigHandle(pub Handle<GameConfig>);

pub struct GameConfigPlugin;

impl Plugin for GameConfigPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RonAssetPlugin::<GameConfig>::new(&["game_config.ron"]))
           .add_systems(PreStartup, load_initial_config)
           .add_systems(Startup, setup_runtime_config)
           .add_systems(Update, log_runtime_config_changes);
    }
}

/// Load static initial configuration synchronously before any startup system
/// reads it.
fn load_initial_config(mut commands: Commands) {
    let initial_config_path = "assets/initial_config.ron";

    match std::fs::read_to_string(initial_config_path) {
        Ok(contents) => {
            match ron::from_str::<InitialConfig>(&contents) {
                Ok(config) => {
                    info!("Loaded initial config from {}", initial_config_path);
                    commands.insert_resource(config);
                }
                Err(e) => {
                    error!("Failed to parse initial config: {}", e);
                    error!("Using default InitialConfig");
                    commands.insert_resource(InitialConfig::default());
                }
            }
        }
        Err(e) => {
            error!("Failed to read {}: {}", initial_config_path, e);
            error!("Using default InitialConfig");
            commands.insert_resource(InitialConfig::default());
        }
    }
}

/// Load runtime configuration asynchronously (can be hot-reloaded).
fn setup_runtime_config(mut commands: Commands, asset_server: Res<AssetServer>) {
    let handle = asset_server.load("game_config.ron");
    commands.insert_resource(GameConfigHandle(handle));
}

fn log_runtime_config_changes(
    config_handle: Option<Res<GameConfigHandle>>,
    game_configs: Res<Assets<GameConfig>>,
    mut events: MessageReader<AssetEvent<GameConfig>>,
) {
    let Some(config_handle) = config_handle else { return };
    for event in events.read() {
        if event.is_modified(config_handle.0.id()) || event.is_loaded_with_dependencies(config_handle.0.id()) {
            if let Some(config) = game_configs.get(&config_handle.0) {
                info!("Runtime config loaded/updated: {:?}", config);
            }
        }
    }
}

/// Current runtime config, falling back to the defaults until the asset loads.
pub fn runtime_config(
    config_handle: Option<&GameConfigHandle>,
    game_configs: &Assets<GameConfig>,
) -> GameConfig {
    config_handle
        .and_then(|handle| game_configs.get(&handle.0))
        .cloned()
        .unwrap_or_default()
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30.0,
            canvas_width: 800.0,
            canvas_height: 600.0,
            map_path: "assets/maps/demo.json".to_string(),
            map_move_speed: 8.0,
            player_move_speed: 4.0,
            diagonal_movement: false,
            fog_reveal_radius: 4,
            fog_cache_delay_ms: 120,
        }
    }
}
