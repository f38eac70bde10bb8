mod astar;
mod bfs;
mod local_search;
mod ucs;

pub use astar::{a_star_search, manhattan_distance, Heuristic};
pub use bfs::breadth_first_search;
pub use local_search::{
    hill_climbing_random_restarts, path_cost, LocalSearchParams, NeighborMode,
};
pub use ucs::uniform_cost_search;

use std::cmp::Ordering;
use std::rc::Rc;

use crate::common::{Path, SearchNode};

/// Priority-queue entry shared by the cost-ordered searches. `BinaryHeap` is
/// a max-heap, so the comparison is reversed: the smallest key pops first.
/// Keys end with an insertion counter, which makes every key unique and
/// breaks remaining ties first-in first-out.
#[derive(Debug)]
struct FrontierEntry<K> {
    key: K,
    node: Rc<SearchNode>,
}

impl<K: Ord> PartialEq for FrontierEntry<K> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Ord> Eq for FrontierEntry<K> {}

impl<K: Ord> PartialOrd for FrontierEntry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> Ord for FrontierEntry<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key.cmp(&self.key)
    }
}

/// Walks the parent chain from `node` back to the root.
fn construct_path(node: &SearchNode) -> Path {
    let mut path = Vec::with_capacity(node.depth + 1);
    let mut current = Some(node);
    while let Some(node) = current {
        path.push(node.state);
        current = node.parent.as_deref();
    }
    path.reverse();
    path
}
