mod config;
mod data;
mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interpolate the stations, clip to the boundary and summarise per region
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Print the interpolated value at a single point
    Estimate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(short, long, allow_negative_numbers = true)]
        x: f64,
        #[arg(short, long, allow_negative_numbers = true)]
        y: f64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { config } => {
            info!("Generating with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            // 1. Load inputs
            let records = data::load_stations(&app_config.input.stations)?;
            let boundary = data::load_boundary(&app_config.input.boundary)?;
            let regions = data::load_regions(
                &app_config.input.regions,
                &app_config.input.region_id_field,
            )?;

            // 2. Interpolate, mask and aggregate
            let result = rainmap::run(&records, &boundary, &regions, &app_config.run)
                .context("Interpolation run failed")?;

            // 3. Write outputs
            output::write_grid_csv(&result.grid, &app_config.output.grid_csv)?;
            output::write_stats_csv(&result.statistics, &app_config.output.stats_csv)?;

            info!("Generation complete!");
        }
        Commands::Estimate { config, x, y } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let records = data::load_stations(&app_config.input.stations)?;
            let samples = rainmap::filter(&records, &app_config.run.excluded_ids)?;
            let value = rainmap::estimate(&samples, *x, *y, &app_config.run.idw)?;
            println!("{}", value);
        }
    }

    Ok(())
}
