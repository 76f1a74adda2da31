//! Core simulation systems.
//!
//! Config initialization, map loading and installation of a freshly loaded map
//! into the grid, graph, fog and viewport resources.

use bevy::prelude::*;
use crate::game::GameState;
use crate::game::camera::{CenteringRequest, Viewport};
use crate::game::config::InitialConfig;
use crate::game::fixed_math::{FixedNum, FixedVec2};
use crate::game::fog::{FogCacheDelay, FogOfWar};
use crate::game::grid::{CollisionGrid, OccupancyGrid};
use crate::game::map::load_map;
use crate::game::movement::MovementController;
use crate::game::pathfinding::{Adjacency, MovementGraph};

use super::events::LoadMapRequest;
use super::resources::*;

// ============================================================================
// Tick
// ============================================================================

pub fn increment_sim_tick(mut tick: ResMut<SimTick>) {
    tick.increment();
}

// ============================================================================
// Configuration
// ============================================================================

/// Initialize SimConfig from InitialConfig at startup
pub fn init_sim_config_from_initial(
    mut fixed_time: ResMut<Time<Fixed>>,
    mut sim_config: ResMut<SimConfig>,
    initial_config: Option<Res<InitialConfig>>,
) {
    let default_config = InitialConfig::default();
    let config = match &initial_config {
        Some(cfg) => cfg.as_ref(),
        None => {
            warn!("InitialConfig not found, using defaults");
            &default_config
        }
    };

    let defaults = SimConfig::default();
    let tick_rate = if config.tick_rate > 0.0 {
        config.tick_rate
    } else {
        warn!("tick_rate {} is not positive, using {}", config.tick_rate, defaults.tick_rate);
        defaults.tick_rate
    };
    fixed_time.set_timestep_seconds(1.0 / tick_rate);

    sim_config.tick_rate = tick_rate;
    sim_config.canvas_size = FixedVec2::from_f32(config.canvas_width, config.canvas_height);
    sim_config.map_path = config.map_path.clone();
    sim_config.map_move_speed = positive_speed("map_move_speed", config.map_move_speed, defaults.map_move_speed);
    sim_config.player_move_speed =
        positive_speed("player_move_speed", config.player_move_speed, defaults.player_move_speed);
    sim_config.fog_reveal_radius = config.fog_reveal_radius;
    sim_config.fog_cache_delay_ms = config.fog_cache_delay_ms;
    sim_config.adjacency = Adjacency::from_diagonal(config.diagonal_movement);

    info!(
        "SimConfig initialized: {} ticks/s, canvas {}x{}, {:?} movement",
        sim_config.tick_rate, config.canvas_width, config.canvas_height, sim_config.adjacency
    );
}

/// A step of zero pixels never reaches the next cell.
fn positive_speed(name: &str, value: f32, fallback: FixedNum) -> FixedNum {
    let speed = FixedNum::from_num(value);
    if speed > FixedNum::ZERO {
        speed
    } else {
        warn!("{} {} is not positive, using {}", name, value, fallback);
        fallback
    }
}

// ============================================================================
// Map Loading
// ============================================================================

/// Load the map named in the config. An empty path leaves loading to whoever
/// inserts [`ActiveMap`] directly.
pub fn load_initial_map(
    mut commands: Commands,
    sim_config: Res<SimConfig>,
    mut map_status: ResMut<MapStatus>,
) {
    if sim_config.map_path.is_empty() {
        debug!("No initial map configured");
        return;
    }

    match load_map(&sim_config.map_path) {
        Ok(map) => {
            info!("Loaded map {} ({}x{} tiles)", sim_config.map_path, map.width, map.height);
            map_status.path = Some(sim_config.map_path.clone());
            commands.insert_resource(ActiveMap(map));
        }
        Err(e) => {
            error!("Failed to load map {}: {}", sim_config.map_path, e);
        }
    }
}

pub fn load_requested_maps(
    mut commands: Commands,
    mut requests: MessageReader<LoadMapRequest>,
    mut map_status: ResMut<MapStatus>,
) {
    // Only the latest request matters
    let Some(request) = requests.read().last() else { return };

    match load_map(&request.path) {
        Ok(map) => {
            info!("Loaded map {} ({}x{} tiles)", request.path, map.width, map.height);
            map_status.path = Some(request.path.clone());
            commands.insert_resource(ActiveMap(map));
        }
        Err(e) => {
            error!("Failed to load map {}: {}", request.path, e);
        }
    }
}

/// Rebuild everything derived from the map. Runs whenever [`ActiveMap`] is
/// inserted or replaced.
pub fn install_active_map(
    mut commands: Commands,
    active_map: Res<ActiveMap>,
    sim_config: Res<SimConfig>,
    mut collision_grid: ResMut<CollisionGrid>,
    mut graph: ResMut<MovementGraph>,
    mut fog: ResMut<FogOfWar>,
    mut viewport: ResMut<Viewport>,
    mut controller: ResMut<MovementController>,
    mut centering: ResMut<CenteringRequest>,
    mut turn: ResMut<TurnState>,
    mut map_status: ResMut<MapStatus>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let map = &active_map.0;
    let Some(collision_layer) = map.collision_layer() else {
        error!("Active map has no collision layer, keeping the previous grids");
        return;
    };

    let occupancy = OccupancyGrid::build(&collision_layer.data, map.width, map.height);
    let passable = occupancy.passable_count();
    *collision_grid = CollisionGrid::new(occupancy, map.tile_width, map.tile_height);
    *graph = MovementGraph::build(&collision_grid.occupancy, sim_config.adjacency);

    *fog = FogOfWar::new(map.width, map.height);
    if map.fog_disabled() {
        info!("Map disables fog of war");
        fog.disable();
    }
    commands.insert_resource(FogCacheDelay::new(sim_config.fog_cache_delay_ms));

    *viewport = Viewport::new(sim_config.canvas_size, collision_grid.pixel_size());
    controller.reset();
    centering.clear();
    turn.in_progress = false;

    map_status.loaded = true;
    next_state.set(GameState::InGame);

    info!(
        "Installed map {}x{} ({} passable cells, {} graph nodes)",
        map.width, map.height, passable, graph.len()
    );
}
