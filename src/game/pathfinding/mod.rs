//! Grid pathfinding: graph construction from the occupancy grid and a
//! deterministic A* search over it.

mod types;
mod graph;
mod astar;

#[cfg(test)]
mod tests;

pub use types::Adjacency;
pub use graph::{GraphNode, MovementGraph, STEP_COST};
pub use astar::search;
