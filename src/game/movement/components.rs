//! Component definitions for moving map objects.
//!
//! A mover has a world-local position (relative to the map's top-left pixel)
//! and an on-screen position. The camera keeps the two consistent:
//! `display == viewport.world_to_screen(sim)` for every tracked entity.

use bevy::prelude::*;
use crate::game::fixed_math::{FixedNum, FixedVec2};

// ============================================================================
// Position Components
// ============================================================================

/// Logical position in map pixels. Cell math is done on this value.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimPosition(pub FixedVec2);

/// Animated on-screen position in canvas pixels.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayPosition(pub FixedVec2);

/// Pixel distance covered per tick.
#[derive(Component, Debug, Clone, Copy)]
pub struct MoveSpeed(pub FixedNum);

/// Sprite frame size, used to find the on-screen center of an object.
#[derive(Component, Debug, Clone, Copy)]
pub struct SpriteSize(pub FixedVec2);

impl Default for SpriteSize {
    fn default() -> Self {
        Self(FixedVec2::from_int(16, 16))
    }
}

// ============================================================================
// Capability Markers
// ============================================================================

/// Movement of this object clears fog of war around it.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Observer;

/// Shifted along with the map when the camera scrolls.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Tracked;

/// Receives move orders from player input.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Controlled;

// ============================================================================
// Animation
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Facing {
    /// Facing for a per-axis step. Horizontal wins on diagonals; a zero step
    /// keeps the current facing.
    pub fn from_delta(delta: IVec2) -> Option<Self> {
        match (delta.x.signum(), delta.y.signum()) {
            (1, _) => Some(Facing::Right),
            (-1, _) => Some(Facing::Left),
            (0, 1) => Some(Facing::Down),
            (0, -1) => Some(Facing::Up),
            _ => None,
        }
    }
}

#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementAnimation {
    pub facing: Facing,
    pub walking: bool,
}

impl MovementAnimation {
    pub fn step(&mut self, delta: IVec2) {
        if let Some(facing) = Facing::from_delta(delta) {
            self.facing = facing;
        }
        self.walking = delta != IVec2::ZERO;
    }

    pub fn stop(&mut self) {
        self.walking = false;
    }
}
