use serde::{Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::rc::Rc;

use crate::map::{Action, Position};

/// Waypoints from start to goal, both inclusive.
pub type Path = Vec<Position>;

/// Accumulated traversal cost. `Infinite` marks an impassable move or an
/// unreachable goal and orders after every finite cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cost {
    Finite(usize),
    Infinite,
}

impl Cost {
    pub fn is_finite(&self) -> bool {
        matches!(self, Cost::Finite(_))
    }

    pub fn finite(&self) -> Option<usize> {
        match self {
            Cost::Finite(cost) => Some(*cost),
            Cost::Infinite => None,
        }
    }
}

impl Default for Cost {
    fn default() -> Self {
        Cost::Finite(0)
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, other: Cost) -> Cost {
        match (self, other) {
            (Cost::Finite(a), Cost::Finite(b)) => {
                a.checked_add(b).map_or(Cost::Infinite, Cost::Finite)
            }
            _ => Cost::Infinite,
        }
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::default(), |total, cost| total + cost)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cost::Finite(cost) => write!(f, "{cost}"),
            Cost::Infinite => write!(f, "inf"),
        }
    }
}

impl Serialize for Cost {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cost::Finite(cost) => serializer.serialize_u64(*cost as u64),
            Cost::Infinite => serializer.serialize_str("inf"),
        }
    }
}

/// A node of the search tree. Children hold their parent, parents never
/// hold children, so the tree is freed once the last frontier entry goes.
#[derive(Debug)]
pub struct SearchNode {
    pub state: Position,
    pub parent: Option<Rc<SearchNode>>,
    /// Move taken from the parent, `None` at the root.
    pub action: Option<Action>,
    pub path_cost: usize,
    pub depth: usize,
}

impl SearchNode {
    pub fn root(state: Position) -> Rc<Self> {
        Rc::new(SearchNode {
            state,
            parent: None,
            action: None,
            path_cost: 0,
            depth: 0,
        })
    }

    pub fn child(
        parent: &Rc<Self>,
        state: Position,
        action: Action,
        step_cost: usize,
    ) -> Rc<Self> {
        Rc::new(SearchNode {
            state,
            parent: Some(Rc::clone(parent)),
            action: Some(action),
            path_cost: parent.path_cost + step_cost,
            depth: parent.depth + 1,
        })
    }

    /// Moves from the root to this node.
    pub fn actions(&self) -> Vec<Action> {
        let mut actions = Vec::with_capacity(self.depth);
        let mut current = Some(self);
        while let Some(node) = current {
            actions.extend(node.action);
            current = node.parent.as_deref();
        }
        actions.reverse();
        actions
    }
}

/// Outcome of a graph search. An exhausted frontier is a normal outcome:
/// `path` is `None` and `cost` is `Infinite`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub path: Option<Path>,
    pub cost: Cost,
    pub nodes_expanded: usize,
}

impl SearchResult {
    pub(crate) fn found(path: Path, cost: usize, nodes_expanded: usize) -> Self {
        SearchResult {
            path: Some(path),
            cost: Cost::Finite(cost),
            nodes_expanded,
        }
    }

    pub(crate) fn no_path(nodes_expanded: usize) -> Self {
        SearchResult {
            path: None,
            cost: Cost::Infinite,
            nodes_expanded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_ordering_and_sum() {
        assert!(Cost::Finite(usize::MAX) < Cost::Infinite);
        assert!(Cost::Finite(3) < Cost::Finite(4));
        assert_eq!(Cost::Finite(3) + Cost::Finite(4), Cost::Finite(7));
        assert_eq!(Cost::Finite(3) + Cost::Infinite, Cost::Infinite);
        assert_eq!(Cost::Finite(usize::MAX) + Cost::Finite(1), Cost::Infinite);

        let total: Cost = [Cost::Finite(1), Cost::Finite(2)].into_iter().sum();
        assert_eq!(total, Cost::Finite(3));
        let empty: Cost = std::iter::empty().sum();
        assert_eq!(empty, Cost::Finite(0));
    }

    #[test]
    fn test_cost_display_and_json() {
        assert_eq!(Cost::Finite(12).to_string(), "12");
        assert_eq!(Cost::Infinite.to_string(), "inf");
        assert_eq!(serde_json::to_string(&Cost::Finite(12)).unwrap(), "12");
        assert_eq!(serde_json::to_string(&Cost::Infinite).unwrap(), "\"inf\"");
    }

    #[test]
    fn test_search_node_chain() {
        let root = SearchNode::root((0, 0));
        let first = SearchNode::child(&root, (0, 1), Action::Right, 3);
        let second = SearchNode::child(&first, (1, 1), Action::Down, 2);

        assert_eq!(second.depth, 2);
        assert_eq!(second.path_cost, 5);
        assert_eq!(second.actions(), vec![Action::Right, Action::Down]);
        assert!(root.actions().is_empty());
    }
}
