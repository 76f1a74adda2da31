//! Simulation layer - deterministic tick logic.
//!
//! This module is organized into:
//! - **resources**: Tick counter, active map, turn flag and fixed-point config
//! - **events**: Commands and notifications exchanged with input and rendering
//! - **systems**: Config init, map loading and map installation

use bevy::prelude::*;
use crate::game::GameState;
use crate::game::fog::{tick_fog_cache_delay, FogOfWar};
use crate::game::grid::CollisionGrid;
use crate::game::pathfinding::MovementGraph;

// Module declarations
pub mod resources;
pub mod events;
pub mod systems;

// Re-export commonly used items
pub use resources::*;
pub use events::*;

// System sets for organizing execution order
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum SimSet {
    Input,    // Turning commands into movement orders and centering requests
    Movement, // Advancing the active movement order by one step
    Camera,   // Shifting the viewport toward the centering target
}

/// Main simulation plugin
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Configure FixedUpdate timestep (overwritten from InitialConfig at startup)
        app.insert_resource(Time::<Fixed>::from_seconds(1.0 / 30.0));

        app.init_resource::<SimConfig>();
        app.init_resource::<SimTick>();
        app.init_resource::<MapStatus>();
        app.init_resource::<TurnState>();
        app.init_resource::<CollisionGrid>();
        app.init_resource::<MovementGraph>();
        app.init_resource::<FogOfWar>();

        // Register messages
        app.add_message::<MoveCommand>();
        app.add_message::<CenterOnEntity>();
        app.add_message::<LoadMapRequest>();
        app.add_message::<MovementEnded>();
        app.add_message::<CenteringFinished>();

        // Configure System Sets
        app.configure_sets(FixedUpdate, (
            SimSet::Input,
            SimSet::Movement,
            SimSet::Camera,
        ).chain().run_if(in_state(GameState::InGame)));

        // Startup systems
        app.add_systems(Startup, (
            systems::init_sim_config_from_initial,
            systems::load_initial_map,
        ).chain());

        // Grids are rebuilt before anything in Update or FixedUpdate sees the new map
        app.add_systems(PreUpdate,
            systems::install_active_map.run_if(resource_exists_and_changed::<ActiveMap>)
        );

        app.add_systems(Update, (
            systems::load_requested_maps,
            tick_fog_cache_delay,
        ));

        app.add_systems(FixedUpdate,
            systems::increment_sim_tick
                .before(SimSet::Input)
                .run_if(in_state(GameState::InGame))
        );
    }
}
