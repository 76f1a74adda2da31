//! Resource definitions for the simulation.
//!
//! This module contains the tick counter, the map currently installed and the
//! fixed-point configuration every simulation system reads.

use bevy::prelude::*;
use crate::game::fixed_math::{FixedNum, FixedVec2};
use crate::game::map::TileMap;
use crate::game::pathfinding::Adjacency;

// ============================================================================
// Tick
// ============================================================================

/// Number of fixed simulation ticks run since startup.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 += 1;
    }
}

// ============================================================================
// Map Resources
// ============================================================================

/// Map loading status
#[derive(Resource, Default)]
pub struct MapStatus {
    pub loaded: bool,
    pub path: Option<String>,
}

/// The map currently shown. Replacing it reinstalls every derived grid.
#[derive(Resource, Clone, Debug)]
pub struct ActiveMap(pub TileMap);

/// Whether the controlled character is in the middle of a move order.
/// Input is ignored while a turn is in progress.
#[derive(Resource, Default, Debug)]
pub struct TurnState {
    pub in_progress: bool,
}

// ============================================================================
// Simulation Configuration
// ============================================================================

/// Fixed-point view of [`InitialConfig`](crate::game::config::InitialConfig).
///
/// Values are converted from the human-readable RON floats once at startup so
/// the tick systems only ever do fixed-point arithmetic.
#[derive(Resource, Clone, Debug)]
pub struct SimConfig {
    pub tick_rate: f64,
    pub canvas_size: FixedVec2,
    pub map_path: String,
    /// Scroll step used by standalone centering.
    pub map_move_speed: FixedNum,
    /// Per-tick step of the controlled character.
    pub player_move_speed: FixedNum,
    pub fog_reveal_radius: u32,
    pub fog_cache_delay_ms: u64,
    pub adjacency: Adjacency,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30.0,
            canvas_size: FixedVec2::from_int(800, 600),
            map_path: String::new(),
            map_move_speed: FixedNum::from_num(8),
            player_move_speed: FixedNum::from_num(4),
            fog_reveal_radius: 4,
            fog_cache_delay_ms: 120,
            adjacency: Adjacency::Four,
        }
    }
}
