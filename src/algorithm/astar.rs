use super::{construct_path, FrontierEntry};
use crate::common::{Cost, SearchNode, SearchResult};
use crate::map::{GridCity, Position};
use crate::stat::Stats;

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use tracing::{debug, instrument, trace};

/// Estimate of the remaining cost from a state to the goal. A* stays optimal
/// on static terrain only for estimates that never exceed the true cost.
pub trait Heuristic {
    fn estimate(&self, state: Position, goal: Position) -> usize;
}

impl<F> Heuristic for F
where
    F: Fn(Position, Position) -> usize,
{
    fn estimate(&self, state: Position, goal: Position) -> usize {
        self(state, goal)
    }
}

/// Admissible and consistent on a 4-connected grid whose cheapest step costs 1.
pub fn manhattan_distance(state: Position, goal: Position) -> usize {
    state.0.abs_diff(goal.0) + state.1.abs_diff(goal.1)
}

/// Time-aware A*.
///
/// A child reached at depth `d` pays `get_cost(child, Some(d))`, so cells held
/// by a dynamic obstacle at that exact time step are refused. The explored
/// set is keyed by position only: a cell that could be entered later, after
/// the obstacle leaves, is not revisited, and routes that need waiting are
/// not found.
///
/// Frontier order is `f`, then larger `g`, then insertion order.
#[instrument(skip_all, name = "a_star", fields(start = ?city.start(), goal = ?city.goal()), level = "debug")]
pub fn a_star_search<H: Heuristic + ?Sized>(
    city: &GridCity,
    heuristic: &H,
    stats: &mut Stats,
) -> SearchResult {
    let start = city.start();
    let goal = city.goal();
    if city.is_goal(start) {
        debug!("start is the goal");
        let result = SearchResult::found(vec![start], 0, 1);
        stats.record(&result);
        return result;
    }

    let mut frontier = BinaryHeap::new();
    let mut explored = HashSet::new();
    let mut sequence = 0usize;
    let mut nodes_expanded = 0;

    frontier.push(FrontierEntry {
        key: (heuristic.estimate(start, goal), Reverse(0), sequence),
        node: SearchNode::root(start),
    });

    while let Some(FrontierEntry { node, .. }) = frontier.pop() {
        nodes_expanded += 1;

        if !explored.insert(node.state) {
            continue;
        }
        trace!(
            "expand node: {:?} g {} depth {}",
            node.state,
            node.path_cost,
            node.depth
        );

        if city.is_goal(node.state) {
            let result = SearchResult::found(construct_path(&node), node.path_cost, nodes_expanded);
            stats.record(&result);
            return result;
        }

        let time_step = node.depth + 1;
        for action in city.get_actions(node.state) {
            let child_state = city.get_result(node.state, action);
            let Cost::Finite(step_cost) = city.get_cost(child_state, Some(time_step)) else {
                trace!("{child_state:?} is occupied at time step {time_step}");
                continue;
            };

            let child = SearchNode::child(&node, child_state, action, step_cost);
            let g_cost = child.path_cost;
            sequence += 1;
            frontier.push(FrontierEntry {
                key: (
                    g_cost + heuristic.estimate(child_state, goal),
                    Reverse(g_cost),
                    sequence,
                ),
                node: child,
            });
        }
    }

    debug!("cannot find solution");
    let result = SearchResult::no_path(nodes_expanded);
    stats.record(&result);
    result
}
