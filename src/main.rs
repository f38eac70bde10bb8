use delivery_rust::config::{Cli, Config, OutputFormat};
use delivery_rust::map::GridCity;
use delivery_rust::planner::run_planner;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)
            .with_context(|| format!("cannot read config file: {config_file}"))?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut city = GridCity::from_file(&config.map_path)
        .with_context(|| format!("error loading map: {}", config.map_path))?;
    info!("running {:?} on {}", config.planner, config.map_path);
    info!("start: {:?}, goal: {:?}", city.start(), city.goal());

    let mut rng = StdRng::seed_from_u64(config.seed);
    let report = run_planner(config.planner, &mut city, &config, &mut rng);

    match config.output {
        OutputFormat::Text => report.print(),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}
