//! Deterministic fixed-point mathematics.
//!
//! Pixel positions, move speeds and viewport offsets all live in fixed-point so
//! that a replayed sequence of move orders scrolls the map to exactly the same
//! offsets on every platform.

use fixed::types::I48F16;

pub use vec2::FixedVec2;

mod vec2;

/// Fixed-point number type used throughout the simulation.
///
/// I48F16: 48 integer bits, 16 fractional bits. Map pixel extents fit with
/// plenty of headroom and sub-pixel speeds stay exact to ~0.000015.
pub type FixedNum = I48F16;
