use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Which neighbors a cell is connected to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Adjacency {
    /// Cardinal neighbors only.
    #[default]
    Four,
    /// Cardinal plus diagonal neighbors. A diagonal is only linked when both
    /// orthogonal cells it passes between are passable.
    Eight,
}

impl Adjacency {
    pub fn from_diagonal(diagonal: bool) -> Self {
        if diagonal { Adjacency::Eight } else { Adjacency::Four }
    }

    /// Neighbor offsets in the order they are linked. The order is part of the
    /// tie-break, so it never changes.
    pub(super) fn offsets(self) -> &'static [(i32, i32)] {
        const FOUR: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        const EIGHT: [(i32, i32); 8] = [
            (-1, 0), (1, 0), (0, -1), (0, 1),
            (-1, -1), (1, -1), (-1, 1), (1, 1),
        ];
        match self {
            Adjacency::Four => &FOUR,
            Adjacency::Eight => &EIGHT,
        }
    }
}

/// Open-set entry. `BinaryHeap` is a max-heap, so the ordering is reversed:
/// lowest f first, then lowest h, then earliest pushed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct State {
    pub f: u32,
    pub h: u32,
    pub seq: u64,
    pub node: usize,
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other.f.cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
