use bevy::prelude::*;
use fixedbitset::FixedBitSet;
use rustc_hash::FxHashMap;
use std::collections::BinaryHeap;

use crate::game::grid::Cell;
use super::graph::MovementGraph;
use super::types::{Adjacency, State};

pub(super) fn heuristic(a: Cell, b: Cell, adjacency: Adjacency) -> u32 {
    let dx = a.x.abs_diff(b.x) as u32;
    let dy = a.y.abs_diff(b.y) as u32;
    match adjacency {
        Adjacency::Four => dx + dy,
        Adjacency::Eight => dx.max(dy),
    }
}

fn reconstruct_path(came_from: &FxHashMap<usize, usize>, mut current: usize, graph: &MovementGraph) -> Vec<Cell> {
    let mut path = vec![graph.nodes[current].cell];

    while let Some(&prev) = came_from.get(&current) {
        current = prev;
        path.push(graph.nodes[current].cell);
    }

    // Drop the start cell; callers only want the cells still to walk.
    path.pop();
    path.reverse();
    path
}

/// A* over the movement graph.
///
/// Returns the cells from (excluding) `start` to (including) `goal` in walking
/// order, or an empty path when `start == goal`, either end lies off the graph,
/// or the goal cannot be reached. Identical inputs always give the identical
/// path.
pub fn search(graph: &MovementGraph, start: Cell, goal: Cell) -> Vec<Cell> {
    let (Some(start_idx), Some(goal_idx)) = (graph.node_index(start), graph.node_index(goal)) else {
        return Vec::new();
    };
    if start_idx == goal_idx || graph.nodes[goal_idx].blocked {
        return Vec::new();
    }

    // Every node can be expanded at most once; anything beyond that is a bug.
    let max_iterations = graph.len() + 1;
    let mut iterations = 0;
    let mut seq: u64 = 0;

    let mut open_set = BinaryHeap::new();
    let mut closed = FixedBitSet::with_capacity(graph.len());
    let mut came_from: FxHashMap<usize, usize> = FxHashMap::default();
    let mut g_score: FxHashMap<usize, u32> = FxHashMap::default();

    let h = heuristic(start, goal, graph.adjacency);
    g_score.insert(start_idx, 0);
    open_set.push(State { f: h, h, seq, node: start_idx });

    while let Some(State { node: current, .. }) = open_set.pop() {
        if closed.contains(current) {
            continue;
        }
        closed.insert(current);

        iterations += 1;
        if iterations > max_iterations {
            error!("[PATHFINDING] A* exceeded max iterations ({}) - Start: {:?}, Goal: {:?}",
                   max_iterations, start, goal);
            return Vec::new();
        }

        if current == goal_idx {
            return reconstruct_path(&came_from, current, graph);
        }

        let current_g = g_score[&current];
        for &neighbor in &graph.nodes[current].neighbors {
            if closed.contains(neighbor) {
                continue;
            }

            let tentative_g = current_g + graph.nodes[neighbor].cost;
            if tentative_g < *g_score.get(&neighbor).unwrap_or(&u32::MAX) {
                came_from.insert(neighbor, current);
                g_score.insert(neighbor, tentative_g);

                let h = heuristic(graph.nodes[neighbor].cell, goal, graph.adjacency);
                seq += 1;
                open_set.push(State { f: tentative_g + h, h, seq, node: neighbor });
            }
        }
    }

    Vec::new()
}
