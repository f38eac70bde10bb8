use super::{construct_path, FrontierEntry};
use crate::common::{Cost, SearchNode, SearchResult};
use crate::map::GridCity;
use crate::stat::Stats;

use std::collections::{BinaryHeap, HashSet};
use tracing::{debug, instrument, trace};

/// Minimum terrain-cost search with time-independent costs.
///
/// The frontier may hold several entries for one state; only the first pop
/// of a state is expanded and later ones are discarded. The goal test runs at
/// pop time, so the first goal popped is optimal.
#[instrument(skip_all, name = "ucs", fields(start = ?city.start(), goal = ?city.goal()), level = "debug")]
pub fn uniform_cost_search(city: &GridCity, stats: &mut Stats) -> SearchResult {
    let start = city.start();
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
        key: (0, sequence),
        node: SearchNode::root(start),
    });

    while let Some(FrontierEntry { node, .. }) = frontier.pop() {
        nodes_expanded += 1;

        if !explored.insert(node.state) {
            continue;
        }
        trace!("expand node: {:?} cost {}", node.state, node.path_cost);

        if city.is_goal(node.state) {
            let result = SearchResult::found(construct_path(&node), node.path_cost, nodes_expanded);
            stats.record(&result);
            return result;
        }

        for action in city.get_actions(node.state) {
            let child_state = city.get_result(node.state, action);
            let Cost::Finite(step_cost) = city.get_cost(child_state, None) else {
                continue;
            };

            let child = SearchNode::child(&node, child_state, action, step_cost);
            sequence += 1;
            frontier.push(FrontierEntry {
                key: (child.path_cost, sequence),
                node: child,
            });
        }
    }

    debug!("cannot find solution");
    let result = SearchResult::no_path(nodes_expanded);
    stats.record(&result);
    result
}
