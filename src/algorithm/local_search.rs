use crate::common::{Cost, Path};
use crate::map::{GridCity, Position};
use crate::stat::Stats;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, instrument, trace};

/// How a perturbed waypoint is joined to the rest of the path.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[clap(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum NeighborMode {
    /// Substitute the waypoint and keep the tail as is. The following
    /// waypoint may then be more than one move away.
    Unchecked,
    /// Substitute the waypoint and splice in a shortest segment from it to the
    /// following waypoint, so the path stays a chain of unit moves.
    Reconnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalSearchParams {
    pub max_restarts: usize,
    /// Neighbours drawn per descent step.
    pub neighbor_samples: usize,
    pub neighbor_mode: NeighborMode,
}

impl Default for LocalSearchParams {
    fn default() -> Self {
        LocalSearchParams {
            max_restarts: 10,
            neighbor_samples: 3,
            neighbor_mode: NeighborMode::Reconnect,
        }
    }
}

/// Cost of following `path`, entering `path[i]` at time step `i`.
pub fn path_cost(city: &GridCity, path: &[Position]) -> Cost {
    path.iter()
        .enumerate()
        .skip(1)
        .map(|(time_step, &position)| city.get_cost(position, Some(time_step)))
        .sum()
}

/// Repairs `initial_path` by greedy descent over random single-waypoint
/// perturbations, restarting each round from the best path seen so far.
///
/// A round moves to the cheapest sampled neighbour only while it is strictly
/// cheaper than the current path. Perturbations only step onto cells offered
/// by `get_actions`, so the result never crosses a static obstacle that the
/// input avoided.
#[instrument(skip_all, name = "hill_climbing", fields(restarts = params.max_restarts, mode = ?params.neighbor_mode), level = "debug")]
pub fn hill_climbing_random_restarts<R: Rng + ?Sized>(
    city: &GridCity,
    initial_path: &[Position],
    params: &LocalSearchParams,
    rng: &mut R,
    stats: &mut Stats,
) -> (Path, Cost) {
    let mut best_path = initial_path.to_vec();
    let mut best_cost = path_cost(city, &best_path);
    debug!("initial cost {best_cost}");

    for restart in 0..params.max_restarts {
        let mut current_path = best_path.clone();
        let mut current_cost = best_cost;

        loop {
            let Some((next_path, next_cost)) = sample_neighbors(city, &current_path, params, rng)
                .into_iter()
                .map(|path| {
                    let cost = path_cost(city, &path);
                    (path, cost)
                })
                .min_by_key(|(_, cost)| *cost)
            else {
                break;
            };

            if next_cost >= current_cost {
                break;
            }
            trace!("restart {restart}: {current_cost} -> {next_cost}");
            current_path = next_path;
            current_cost = next_cost;
            stats.local_search_moves += 1;
        }

        if current_cost < best_cost {
            debug!("restart {restart} improved cost {best_cost} -> {current_cost}");
            best_path = current_path;
            best_cost = current_cost;
            stats.restart_improvements += 1;
        }
    }

    (best_path, best_cost)
}

fn sample_neighbors<R: Rng + ?Sized>(
    city: &GridCity,
    path: &[Position],
    params: &LocalSearchParams,
    rng: &mut R,
) -> Vec<Path> {
    // Start and goal are fixed, so there must be an interior waypoint.
    if path.len() <= 2 {
        return Vec::new();
    }

    (0..params.neighbor_samples)
        .filter_map(|_| perturb(city, path, params.neighbor_mode, &mut *rng))
        .collect()
}

fn perturb<R: Rng + ?Sized>(
    city: &GridCity,
    path: &[Position],
    mode: NeighborMode,
    rng: &mut R,
) -> Option<Path> {
    let index = rng.gen_range(1..path.len() - 1);
    let previous = path[index - 1];
    let action = *city.get_actions(previous).choose(rng)?;
    let waypoint = city.get_result(previous, action);

    match mode {
        NeighborMode::Unchecked => {
            let mut neighbor = path.to_vec();
            neighbor[index] = waypoint;
            Some(neighbor)
        }
        NeighborMode::Reconnect => {
            let segment = shortest_segment(city, waypoint, path[index + 1])?;
            let mut neighbor = Vec::with_capacity(path.len() + segment.len());
            neighbor.extend_from_slice(&path[..index]);
            neighbor.extend(segment);
            neighbor.extend_from_slice(&path[index + 2..]);
            Some(neighbor)
        }
    }
}

/// Fewest-moves segment from `from` to `to`, both inclusive, over the cells
/// currently free of static obstacles.
fn shortest_segment(city: &GridCity, from: Position, to: Position) -> Option<Path> {
    let mut trace = HashMap::from([(from, from)]);
    let mut frontier = VecDeque::from([from]);

    while let Some(current) = frontier.pop_front() {
        if current == to {
            let mut segment = vec![current];
            let mut position = current;
            while position != from {
                position = trace[&position];
                segment.push(position);
            }
            segment.reverse();
            return Some(segment);
        }

        for action in city.get_actions(current) {
            let next = city.get_result(current, action);
            if !trace.contains_key(&next) {
                trace.insert(next, current);
                frontier.push_back(next);
            }
        }
    }

    None
}
