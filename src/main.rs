//! Solarscan - Solar Irradiance CSV Analysis & Chart Generator
//!
//! Loads a solar sensor dataset from CSV, prints descriptive statistics and
//! renders exploratory charts, opening each one with the system viewer.

mod charts;
mod data;
mod stats;

use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{error, info, warn};

use charts::ChartPlotter;
use data::DataLoader;
use stats::StatsCalculator;

/// Dataset file name, resolved against the working directory.
const DATA_FILE: &str = "sierraleone-bumbuna.csv";
/// Directory the rendered charts are written to.
const PLOT_DIR: &str = "plots";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Every failure is reported; the process itself always exits cleanly.
    if let Err(e) = run() {
        error!("{e:#}");
    }
}

fn run() -> anyhow::Result<()> {
    let mut loader = DataLoader::new();
    if let Err(e) = loader.load_csv(Path::new(DATA_FILE)) {
        error!("{e}");
        return Ok(());
    }

    // Free-text comments are irrelevant to the analysis.
    loader.drop_column("Comments")?;

    let Some(df) = loader.dataframe() else {
        return Ok(());
    };
    info!(
        "analyzing {} rows; numeric columns: [{}]",
        loader.row_count(),
        loader.numeric_columns().join(", ")
    );

    StatsCalculator::print_report(df);

    let out_dir = PathBuf::from(PLOT_DIR);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating chart directory '{}'", out_dir.display()))?;

    let results = [
        ("time series", ChartPlotter::time_series(df, &out_dir)),
        (
            "correlation heatmap",
            ChartPlotter::correlation_heatmap(df, &out_dir),
        ),
        ("wind scatter", ChartPlotter::wind_scatter(df, &out_dir)),
        (
            "temperature scatter",
            ChartPlotter::temperature_scatter(df, &out_dir),
        ),
    ];

    for (name, result) in results {
        match result {
            Ok(path) => {
                info!("{name} chart written to {}", path.display());
                if let Err(e) = open::that(&path) {
                    warn!("could not open {}: {e}", path.display());
                }
            }
            Err(e) => warn!("skipping {name} chart: {e}"),
        }
    }

    Ok(())
}
