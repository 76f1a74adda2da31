//! Grid movement of map objects.
//!
//! One object at a time walks toward a clicked cell, one pathfinder step per
//! simulation tick. See [`MovementController`] for the state machine and
//! [`Mover`] for what it needs from the object being moved.

use bevy::prelude::*;

use crate::game::simulation::SimSet;

mod components;
mod controller;
mod systems;


pub use components::*;
pub use controller::{MovementController, MovementOrder, MovementState, Mover, TickOutcome};

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MovementController>();

        app.add_systems(FixedUpdate, (
            systems::process_move_commands.in_set(SimSet::Input),
            systems::movement_tick_actions.in_set(SimSet::Movement),
        ));
    }
}
