//! Tests for grid graph construction and A* correctness.

use super::*;
use crate::game::grid::{Cell, OccupancyGrid};

/// Helper to build a fully passable grid with the given blocked cells.
fn create_test_grid(width: usize, height: usize, blocked: &[(usize, usize)]) -> OccupancyGrid {
    let mut data = vec![1u32; width * height];
    for &(x, y) in blocked {
        data[y * width + x] = 0;
    }
    OccupancyGrid::build(&data, width, height)
}

fn assert_contiguous(start: Cell, path: &[Cell], adjacency: Adjacency) {
    let mut prev = start;
    for &cell in path {
        let dx = prev.x.abs_diff(cell.x);
        let dy = prev.y.abs_diff(cell.y);
        match adjacency {
            Adjacency::Four => assert_eq!(dx + dy, 1, "non-cardinal step {:?} -> {:?}", prev, cell),
            Adjacency::Eight => assert!(dx <= 1 && dy <= 1 && dx + dy > 0, "bad step {:?} -> {:?}", prev, cell),
        }
        prev = cell;
    }
}

#[test]
fn test_start_equals_goal_is_empty() {
    let grid = create_test_grid(5, 5, &[]);
    let graph = MovementGraph::build(&grid, Adjacency::Four);

    assert!(search(&graph, Cell::new(2, 2), Cell::new(2, 2)).is_empty());
}

#[test]
fn test_enclosed_goal_is_unreachable() {
    // Goal (5,5) walled in on all four sides.
    let grid = create_test_grid(10, 10, &[(4, 5), (6, 5), (5, 4), (5, 6)]);
    let graph = MovementGraph::build(&grid, Adjacency::Four);

    assert!(search(&graph, Cell::new(0, 0), Cell::new(5, 5)).is_empty());
}

#[test]
fn test_blocked_goal_is_unreachable() {
    let grid = create_test_grid(4, 4, &[(3, 3)]);
    let graph = MovementGraph::build(&grid, Adjacency::Four);

    assert!(search(&graph, Cell::new(0, 0), Cell::new(3, 3)).is_empty());
}

#[test]
fn test_routes_around_single_obstacle() {
    let grid = create_test_grid(10, 10, &[(5, 5)]);
    let graph = MovementGraph::build(&grid, Adjacency::Four);

    let start = Cell::new(0, 0);
    let goal = Cell::new(9, 9);
    let path = search(&graph, start, goal);

    assert_eq!(path.len(), 18, "Manhattan-optimal path expected, got {:?}", path);
    assert_eq!(path.last(), Some(&goal));
    assert!(!path.contains(&Cell::new(5, 5)), "path must not cross the blocked cell");
    assert!(!path.contains(&start), "path excludes the start cell");
    assert_contiguous(start, &path, Adjacency::Four);
}

#[test]
fn test_eight_way_uses_diagonals() {
    let grid = create_test_grid(10, 10, &[(5, 5)]);
    let graph = MovementGraph::build(&grid, Adjacency::Eight);

    let start = Cell::new(0, 0);
    let path = search(&graph, start, Cell::new(9, 9));

    // The straight diagonal runs through (5,5); stepping one line over would
    // clip its corner, so the cheapest legal detour sits two lines away.
    assert_eq!(path.len(), 11, "got {:?}", path);
    assert!(!path.contains(&Cell::new(5, 5)));
    assert_contiguous(start, &path, Adjacency::Eight);

    let open = MovementGraph::build(&create_test_grid(10, 10, &[]), Adjacency::Eight);
    assert_eq!(search(&open, start, Cell::new(9, 9)).len(), 9);
}

#[test]
fn test_eight_way_does_not_cut_corners() {
    // Moving (0,0) -> (1,1) would squeeze between two walls.
    let grid = create_test_grid(3, 3, &[(1, 0), (0, 1)]);
    let graph = MovementGraph::build(&grid, Adjacency::Eight);

    assert!(search(&graph, Cell::new(0, 0), Cell::new(1, 1)).is_empty());
}

#[test]
fn test_detours_around_wall() {
    // Vertical wall at x=3 with a single gap at y=6.
    let blocked: Vec<(usize, usize)> = (0..7).filter(|&y| y != 6).map(|y| (3, y)).collect();
    let grid = create_test_grid(7, 7, &blocked);
    let graph = MovementGraph::build(&grid, Adjacency::Four);

    let start = Cell::new(0, 0);
    let path = search(&graph, start, Cell::new(6, 0));

    assert!(path.contains(&Cell::new(3, 6)), "path must use the gap: {:?}", path);
    assert_eq!(path.len(), 6 + 6 + 6);
    assert_contiguous(start, &path, Adjacency::Four);
}

#[test]
fn test_repeated_searches_are_identical() {
    let grid = create_test_grid(12, 8, &[(4, 2), (4, 3), (4, 4), (8, 5), (8, 6)]);
    let graph = MovementGraph::build(&grid, Adjacency::Four);

    let first = search(&graph, Cell::new(0, 3), Cell::new(11, 4));
    assert!(!first.is_empty());
    for _ in 0..20 {
        assert_eq!(search(&graph, Cell::new(0, 3), Cell::new(11, 4)), first);
    }
}

#[test]
fn test_blocked_start_can_still_leave() {
    let grid = create_test_grid(3, 1, &[(0, 0)]);
    let graph = MovementGraph::build(&grid, Adjacency::Four);

    assert_eq!(search(&graph, Cell::new(0, 0), Cell::new(2, 0)), vec![Cell::new(1, 0), Cell::new(2, 0)]);
}

#[test]
fn test_off_graph_endpoints_are_empty() {
    let grid = create_test_grid(3, 3, &[]);
    let graph = MovementGraph::build(&grid, Adjacency::Four);

    assert!(search(&graph, Cell::new(0, 0), Cell::new(3, 0)).is_empty());
    assert!(search(&graph, Cell::new(9, 9), Cell::new(0, 0)).is_empty());
}

#[test]
fn test_graph_links_only_passable_neighbors() {
    let grid = create_test_grid(3, 3, &[(1, 1)]);
    let graph = MovementGraph::build(&grid, Adjacency::Four);

    let corner = graph.node(Cell::new(1, 0)).expect("node exists");
    assert_eq!(corner.neighbors.len(), 2, "(1,0) touches (0,0) and (2,0) only");
    assert!(graph.node(Cell::new(1, 1)).expect("node exists").blocked);
    assert_eq!(graph.len(), 9);
}
