use anyhow::{bail, Context};
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::algorithm::{LocalSearchParams, NeighborMode};
use crate::planner::PlannerKind;

#[derive(Parser, Debug)]
#[command(
    name = "Delivery Planner",
    about = "Route planning for a delivery agent on a grid city.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(help = "Path to the map file")]
    pub map_path: Option<String>,

    #[arg(value_enum, help = "Planner to use")]
    pub planner: Option<PlannerKind>,

    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<u64>,

    #[arg(long, help = "Local search: number of restart rounds")]
    pub max_restarts: Option<usize>,

    #[arg(long, help = "Local search: neighbours sampled per step")]
    pub neighbor_samples: Option<usize>,

    #[arg(long, value_enum, help = "Local search: how a perturbed waypoint rejoins the path")]
    pub neighbor_mode: Option<NeighborMode>,

    #[arg(long, value_enum, help = "Output format of the result")]
    pub output: Option<OutputFormat>,

    #[arg(long, help = "Log filter used when RUST_LOG is unset, e.g. `debug`")]
    pub log_level: Option<String>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[clap(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub map_path: String,
    pub planner: PlannerKind,
    pub seed: u64,
    pub max_restarts: usize,
    pub neighbor_samples: usize,
    pub neighbor_mode: NeighborMode,
    pub output: OutputFormat,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let local_search = LocalSearchParams::default();
        Config {
            map_path: String::new(),
            planner: PlannerKind::AStar,
            seed: 0,
            max_restarts: local_search.max_restarts,
            neighbor_samples: local_search.neighbor_samples,
            neighbor_mode: local_search.neighbor_mode,
            output: OutputFormat::Text,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("invalid config YAML")
    }

    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(map_path) = &cli.map_path {
            self.map_path = map_path.clone();
        }
        if let Some(planner) = cli.planner {
            self.planner = planner;
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }
        if let Some(max_restarts) = cli.max_restarts {
            self.max_restarts = max_restarts;
        }
        if let Some(neighbor_samples) = cli.neighbor_samples {
            self.neighbor_samples = neighbor_samples;
        }
        if let Some(neighbor_mode) = cli.neighbor_mode {
            self.neighbor_mode = neighbor_mode;
        }
        if let Some(output) = cli.output {
            self.output = output;
        }
        if let Some(log_level) = &cli.log_level {
            self.log_level = log_level.clone();
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.map_path.is_empty() {
            bail!("No map file given, pass it on the command line or set `map_path` in the config file");
        }
        if self.neighbor_samples == 0 {
            bail!("Neighbor samples must be at least 1, got 0");
        }
        Ok(())
    }

    pub fn local_search(&self) -> LocalSearchParams {
        LocalSearchParams {
            max_restarts: self.max_restarts,
            neighbor_samples: self.neighbor_samples,
            neighbor_mode: self.neighbor_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_yaml() {
        let config = Config::from_yaml_str(
            "map_path: map_file/test/open.map\nplanner: replan\nseed: 42\nneighbor_mode: unchecked\n",
        )
        .unwrap();

        assert_eq!(config.map_path, "map_file/test/open.map");
        assert_eq!(config.planner, PlannerKind::Replan);
        assert_eq!(config.seed, 42);
        assert_eq!(config.neighbor_mode, NeighborMode::Unchecked);
        // Unset keys keep their defaults.
        assert_eq!(config.max_restarts, 10);
        assert_eq!(config.output, OutputFormat::Text);
    }

    #[test]
    fn test_config_rejects_unknown_key() {
        assert!(Config::from_yaml_str("map_path: a.map\nrestarts: 3\n").is_err());
    }

    #[test]
    fn test_command_line_overrides_file() {
        let cli = Cli::parse_from([
            "delivery_rust",
            "map_file/test/maze.map",
            "a-star",
            "--seed",
            "9",
            "--neighbor-samples",
            "5",
            "--output",
            "json",
        ]);
        let config = Config::from_yaml_str("map_path: other.map\nplanner: bfs\nseed: 1\n")
            .unwrap()
            .override_from_command_line(&cli)
            .unwrap();

        assert_eq!(config.map_path, "map_file/test/maze.map");
        assert_eq!(config.planner, PlannerKind::AStar);
        assert_eq!(config.seed, 9);
        assert_eq!(config.output, OutputFormat::Json);
        assert_eq!(config.local_search().neighbor_samples, 5);
        assert_eq!(config.local_search().neighbor_mode, NeighborMode::Reconnect);
    }

    #[test]
    fn test_validate() {
        let cli = Cli::parse_from(["delivery_rust"]);
        assert!(Config::default().override_from_command_line(&cli).is_err());

        let config = Config {
            map_path: "map_file/test/open.map".to_string(),
            neighbor_samples: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
