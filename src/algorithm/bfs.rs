use super::construct_path;
use crate::common::{SearchNode, SearchResult};
use crate::map::GridCity;
use crate::stat::Stats;

use std::collections::{HashSet, VecDeque};
use tracing::{debug, instrument, trace};

/// Fewest-edges search that ignores terrain cost; the reported cost is the
/// edge count. A state is marked explored when it is enqueued and the goal
/// test runs on generated children.
#[instrument(skip_all, name = "bfs", fields(start = ?city.start(), goal = ?city.goal()), level = "debug")]
pub fn breadth_first_search(city: &GridCity, stats: &mut Stats) -> SearchResult {
    let root = SearchNode::root(city.start());
    if city.is_goal(root.state) {
        debug!("start is the goal");
        let result = SearchResult::found(Vec::new(), 0, 1);
        stats.record(&result);
        return result;
    }

    let mut frontier = VecDeque::from([root]);
    let mut explored = HashSet::from([city.start()]);
    let mut nodes_expanded = 0;

    while let Some(node) = frontier.pop_front() {
        trace!("expand node: {:?} depth {}", node.state, node.depth);
        nodes_expanded += 1;

        for action in city.get_actions(node.state) {
            let child_state = city.get_result(node.state, action);
            if !explored.insert(child_state) {
                continue;
            }

            let child = SearchNode::child(&node, child_state, action, 1);
            if city.is_goal(child.state) {
                let result =
                    SearchResult::found(construct_path(&child), child.path_cost, nodes_expanded);
                stats.record(&result);
                return result;
            }
            frontier.push_back(child);
        }
    }

    debug!("cannot find solution");
    let result = SearchResult::no_path(nodes_expanded);
    stats.record(&result);
    result
}
