use tracing::info;

use crate::common::{Cost, SearchResult};

#[derive(Debug, Clone)]
pub struct Stats {
    pub(crate) costs: Cost,
    pub(crate) time_us: u64,
    pub(crate) searches: usize,
    pub(crate) expand_nodes: usize,
    pub(crate) local_search_moves: usize,
    pub(crate) restart_improvements: usize,
}

impl Default for Stats {
    fn default() -> Self {
        Stats {
            costs: Cost::Infinite,
            time_us: 0,
            searches: 0,
            expand_nodes: 0,
            local_search_moves: 0,
            restart_improvements: 0,
        }
    }
}

impl Stats {
    /// Folds one finished graph search into the totals.
    pub(crate) fn record(&mut self, result: &SearchResult) {
        self.searches += 1;
        self.expand_nodes += result.nodes_expanded;
    }

    pub fn expand_nodes(&self) -> usize {
        self.expand_nodes
    }

    pub(crate) fn print(&self) {
        info!(
            "Cost {} Time(microseconds) {:?} Searches {:?} Expand nodes number {:?} Local search moves {:?} Improving restarts {:?}",
            self.costs,
            self.time_us,
            self.searches,
            self.expand_nodes,
            self.local_search_moves,
            self.restart_improvements
        );
    }
}
