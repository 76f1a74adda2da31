//! Messages for driving the simulation from input and for reporting back.

use bevy::prelude::*;
use crate::game::fixed_math::FixedVec2;

// ============================================================================
// Commands
// ============================================================================

/// Move an entity to the cell under a canvas pixel.
#[derive(Event, Message, Debug, Clone)]
pub struct MoveCommand {
    pub entity: Entity,
    pub target: FixedVec2,
}

/// Scroll the map until the entity is centered (or an edge is reached).
#[derive(Event, Message, Debug, Clone)]
pub struct CenterOnEntity {
    pub entity: Entity,
}

/// Load and install a new map file.
#[derive(Event, Message, Debug, Clone)]
pub struct LoadMapRequest {
    pub path: String,
}

// ============================================================================
// Notifications
// ============================================================================

/// A move order reached Idle. `arrived` is false when the target was
/// unreachable or the order was rejected.
#[derive(Event, Message, Debug, Clone, PartialEq, Eq)]
pub struct MovementEnded {
    pub entity: Entity,
    pub arrived: bool,
}

/// A centering request ran out of shift.
#[derive(Event, Message, Debug, Clone, PartialEq, Eq)]
pub struct CenteringFinished {
    pub entity: Entity,
}
