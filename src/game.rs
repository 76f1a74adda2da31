use bevy::prelude::*;

pub mod camera;
pub mod config;
pub mod control;
pub mod fixed_math;
pub mod fog;
pub mod grid;
pub mod map;
pub mod movement;
pub mod pathfinding;
pub mod render;
pub mod simulation;

use camera::MapCameraPlugin;
use config::GameConfigPlugin;
use control::ControlPlugin;
use fog::FogOfWar;
use grid::{Cell, CollisionGrid};
use movement::{
    Controlled, DisplayPosition, MoveSpeed, MovementAnimation, MovementPlugin, Observer, SimPosition, SpriteSize,
    Tracked,
};
use render::MapRenderPlugin;
use simulation::{ActiveMap, SimConfig, SimulationPlugin};

#[derive(States, Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum GameState {
    /// Waiting for the first map to be installed.
    #[default]
    Loading,
    InGame,
}

pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
           .add_plugins((
               GameConfigPlugin,
               SimulationPlugin,
               MovementPlugin,
               MapCameraPlugin,
               ControlPlugin,
               MapRenderPlugin,
               PlayerPlacementPlugin,
           ));
    }
}

/// Spawns the controlled player each time a map is installed.
pub struct PlayerPlacementPlugin;

impl Plugin for PlayerPlacementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PreUpdate,
            place_player
                .after(simulation::systems::install_active_map)
                .run_if(resource_exists_and_changed::<ActiveMap>)
        );
    }
}

/// Start point the player spawns at when a map has several.
const PLAYER_START_POINT: u32 = 0;

/// Put the player on the freshly installed map: at the map's start point, or
/// on the first passable cell when the map has none.
pub fn place_player(
    mut commands: Commands,
    active_map: Res<ActiveMap>,
    grid: Res<CollisionGrid>,
    sim_config: Res<SimConfig>,
    mut fog: ResMut<FogOfWar>,
    existing: Query<Entity, With<Controlled>>,
) {
    for entity in existing.iter() {
        commands.entity(entity).despawn();
    }

    let start = active_map
        .0
        .start_point(PLAYER_START_POINT)
        .and_then(|pixel| grid.cell_at(pixel))
        .filter(|cell| !grid.occupancy.is_blocked(*cell))
        .or_else(|| {
            (0..grid.occupancy.height())
                .flat_map(|y| (0..grid.occupancy.width()).map(move |x| Cell::new(x, y)))
                .find(|cell| !grid.occupancy.is_blocked(*cell))
        });

    let Some(cell) = start else {
        warn!("Map has no passable cell to place the player on");
        return;
    };

    // Steps are consumed on cell origins
    let position = grid.cell_origin(cell);
    let sprite_size = grid.tile_size;
    fog.reveal(cell, sim_config.fog_reveal_radius);

    commands.spawn((
        Name::new("Player"),
        SimPosition(position),
        DisplayPosition(position),
        MoveSpeed(sim_config.player_move_speed),
        SpriteSize(sprite_size),
        MovementAnimation::default(),
        (Observer, Tracked, Controlled),
        render::object_sprite(sprite_size),
        Transform::default(),
    ));

    info!("Placed player at cell ({}, {})", cell.x, cell.y);
}
