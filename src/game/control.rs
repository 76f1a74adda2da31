use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::game::GameState;
use crate::game::config::{runtime_config, GameConfig, GameConfigHandle};
use crate::game::fixed_math::FixedVec2;
use crate::game::movement::Controlled;
use crate::game::simulation::{CenterOnEntity, LoadMapRequest, MapStatus, MoveCommand, TurnState};

pub struct ControlPlugin;

impl Plugin for ControlPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, handle_input.run_if(in_state(GameState::InGame)));
    }
}

/// Clicks become move orders for the controlled object; keys center the map on
/// it or reload the current map.
pub fn handle_input(
    mouse_button: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    q_window: Query<&Window, With<PrimaryWindow>>,
    q_controlled: Query<Entity, With<Controlled>>,
    turn: Res<TurnState>,
    map_status: Res<MapStatus>,
    config_handle: Option<Res<GameConfigHandle>>,
    game_configs: Res<Assets<GameConfig>>,
    mut move_events: MessageWriter<MoveCommand>,
    mut center_events: MessageWriter<CenterOnEntity>,
    mut load_events: MessageWriter<LoadMapRequest>,
) {
    let config = runtime_config(config_handle.as_deref(), &game_configs);

    if keys.just_pressed(config.key_reload_map) {
        match &map_status.path {
            Some(path) => {
                info!("Reloading map {}", path);
                load_events.write(LoadMapRequest { path: path.clone() });
            }
            None => warn!("No map file to reload"),
        }
        return;
    }

    let Some(entity) = q_controlled.iter().next() else { return };

    if keys.just_pressed(config.key_center_on_player) {
        center_events.write(CenterOnEntity { entity });
    }

    if !mouse_button.just_pressed(config.move_button) || turn.in_progress {
        return;
    }
    let Some(window) = q_window.iter().next() else { return };
    let Some(cursor_position) = window.cursor_position() else { return };

    // Window coordinates are canvas pixels: top-left origin, y down.
    move_events.write(MoveCommand {
        entity,
        target: FixedVec2::from_f32(cursor_position.x, cursor_position.y),
    });
}
