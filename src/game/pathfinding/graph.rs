use bevy::prelude::*;
use smallvec::SmallVec;

use crate::game::grid::{Cell, OccupancyGrid};
use super::types::Adjacency;

/// Uniform cost of moving into a passable cell.
pub const STEP_COST: u32 = 1;

/// One occupancy cell as seen by the search.
#[derive(Clone, Debug)]
pub struct GraphNode {
    pub cell: Cell,
    pub blocked: bool,
    /// Cost to enter this node.
    pub cost: u32,
    /// Indices of passable neighbors, in `Adjacency::offsets` order.
    pub neighbors: SmallVec<[usize; 8]>,
}

/// Search graph with one node per occupancy cell.
///
/// Rebuilt together with the [`CollisionGrid`](crate::game::grid::CollisionGrid)
/// on every map install. Edges only ever point at passable cells, so a blocked
/// start still has a way out while a blocked goal is never reached.
#[derive(Resource, Clone, Debug, Default)]
pub struct MovementGraph {
    pub width: usize,
    pub height: usize,
    pub adjacency: Adjacency,
    pub nodes: Vec<GraphNode>,
}

impl MovementGraph {
    pub fn build(grid: &OccupancyGrid, adjacency: Adjacency) -> Self {
        let width = grid.width();
        let height = grid.height();
        let mut nodes = Vec::with_capacity(width * height);

        for y in 0..height {
            for x in 0..width {
                let cell = Cell::new(x, y);
                let mut neighbors = SmallVec::new();

                for &(dx, dy) in adjacency.offsets() {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                        continue;
                    }
                    let (nx, ny) = (nx as usize, ny as usize);
                    if grid.get(ny, nx) {
                        continue;
                    }
                    // No squeezing diagonally between two walls.
                    if dx != 0 && dy != 0 && (grid.get(y, nx) || grid.get(ny, x)) {
                        continue;
                    }
                    neighbors.push(ny * width + nx);
                }

                nodes.push(GraphNode {
                    cell,
                    blocked: grid.is_blocked(cell),
                    cost: STEP_COST,
                    neighbors,
                });
            }
        }

        Self { width, height, adjacency, nodes }
    }

    pub fn node_index(&self, cell: Cell) -> Option<usize> {
        (cell.x < self.width && cell.y < self.height).then(|| cell.y * self.width + cell.x)
    }

    pub fn node(&self, cell: Cell) -> Option<&GraphNode> {
        self.node_index(cell).map(|idx| &self.nodes[idx])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
