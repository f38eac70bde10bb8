use crate::algorithm::{
    a_star_search, breadth_first_search, hill_climbing_random_restarts, manhattan_distance,
    uniform_cost_search,
};
use crate::common::{Cost, Path, SearchResult};
use crate::config::Config;
use crate::map::{GridCity, Position};
use crate::stat::Stats;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[clap(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PlannerKind {
    #[clap(help = "Breadth-first search, fewest moves.")]
    Bfs,
    #[clap(help = "Uniform-cost search, cheapest route on static terrain.")]
    Ucs,
    #[clap(help = "A* with the Manhattan heuristic, avoids dynamic obstacles.")]
    AStar,
    #[clap(
        help = "A*, then an obstacle appears mid-route and the route is \
        repaired by hill climbing with random restarts."
    )]
    Replan,
}

/// What a planning run hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub planner: PlannerKind,
    pub start: Position,
    pub goal: Position,
    pub path: Option<Path>,
    pub cost: Cost,
    /// `None` when the final path comes from local search.
    pub nodes_expanded: Option<usize>,
    /// Cell that became blocked during a replan run.
    pub disruption: Option<Position>,
    pub elapsed_us: u64,
}

impl Report {
    pub fn print(&self) {
        println!("Planner: {:?}", self.planner);
        println!("Start: {:?}, Goal: {:?}", self.start, self.goal);
        if let Some(position) = self.disruption {
            println!("Obstacle appeared at: {position:?}");
        }
        match &self.path {
            Some(path) => {
                println!("Path: {path:?}");
                println!("Path Cost: {}", self.cost);
                match self.nodes_expanded {
                    Some(nodes) => println!("Nodes Expanded: {nodes}"),
                    None => println!("Nodes Expanded: N/A for local search"),
                }
            }
            None => println!("No path found."),
        }
        println!("Time taken: {} microseconds", self.elapsed_us);
    }
}

struct Outcome {
    path: Option<Path>,
    cost: Cost,
    nodes_expanded: Option<usize>,
    disruption: Option<Position>,
}

impl From<SearchResult> for Outcome {
    fn from(result: SearchResult) -> Self {
        Outcome {
            path: result.path,
            cost: result.cost,
            nodes_expanded: Some(result.nodes_expanded),
            disruption: None,
        }
    }
}

/// Runs one planner against `city`. Only `PlannerKind::Replan` mutates the
/// city, and only between its searches.
pub fn run_planner<R: Rng + ?Sized>(
    kind: PlannerKind,
    city: &mut GridCity,
    config: &Config,
    rng: &mut R,
) -> Report {
    let mut stats = Stats::default();
    let start_time = Instant::now();

    let outcome: Outcome = match kind {
        PlannerKind::Bfs => breadth_first_search(city, &mut stats).into(),
        PlannerKind::Ucs => uniform_cost_search(city, &mut stats).into(),
        PlannerKind::AStar => a_star_search(city, &manhattan_distance, &mut stats).into(),
        PlannerKind::Replan => replan(city, config, rng, &mut stats),
    };

    stats.time_us = u64::try_from(start_time.elapsed().as_micros()).unwrap_or(u64::MAX);
    stats.costs = outcome.cost;
    stats.print();

    Report {
        planner: kind,
        start: city.start(),
        goal: city.goal(),
        path: outcome.path,
        cost: outcome.cost,
        nodes_expanded: outcome.nodes_expanded,
        disruption: outcome.disruption,
        elapsed_us: stats.time_us,
    }
}

fn replan<R: Rng + ?Sized>(
    city: &mut GridCity,
    config: &Config,
    rng: &mut R,
    stats: &mut Stats,
) -> Outcome {
    let initial = a_star_search(city, &manhattan_distance, stats);
    let Some(initial_path) = initial.path.clone() else {
        info!("no initial path, nothing to replan");
        return initial.into();
    };
    info!(
        "initial path found: cost {} length {} expanded {}",
        initial.cost,
        initial_path.len(),
        initial.nodes_expanded
    );

    let midpoint = initial_path[initial_path.len() / 2];
    let disruption = match city.add_static_obstacle(midpoint) {
        Ok(()) => {
            info!("dynamic obstacle appeared at {midpoint:?}");
            Some(midpoint)
        }
        Err(err) => {
            warn!("skipping obstacle event: {err}");
            None
        }
    };

    // Fresh obstacle-aware baseline for the local search.
    let baseline = a_star_search(city, &manhattan_distance, stats);
    let Some(baseline_path) = baseline.path else {
        info!("no path after the obstacle appeared");
        return Outcome {
            path: None,
            cost: Cost::Infinite,
            nodes_expanded: Some(baseline.nodes_expanded),
            disruption,
        };
    };

    let (path, cost) =
        hill_climbing_random_restarts(city, &baseline_path, &config.local_search(), rng, stats);
    Outcome {
        path: Some(path),
        cost,
        nodes_expanded: None,
        disruption,
    }
}
