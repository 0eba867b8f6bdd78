//! Command-line parsing for the sales explorer and forecaster.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Growth, SeasonalityToggle, DEFAULT_HORIZON_DAYS};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sales", version, about = "Retail sales explorer and per-segment forecaster")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Explore the table, then forecast every (country, store, product) segment.
    Run(RunArgs),
    /// Print unique values and write the overview chart only.
    Explore(DataArgs),
    /// List segment keys with their row counts.
    Segments(DataArgs),
    /// Browse the overview and per-segment forecasts in a terminal UI.
    View(RunArgs),
}

/// Input/output locations shared by every command.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Sales CSV (date, country, store, product, num_sold).
    #[arg(short = 'd', long, env = "SALES_DATA", default_value = "data/train.csv")]
    pub data: PathBuf,

    /// Directory for charts.
    #[arg(short = 'o', long, env = "SALES_OUT", default_value = "output")]
    pub out: PathBuf,
}

/// Options for the forecasting run (and the viewer, which forecasts on demand).
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Days to forecast past the last observed date.
    #[arg(long, default_value_t = DEFAULT_HORIZON_DAYS)]
    pub horizon: usize,

    /// Trend shape.
    #[arg(long, value_enum, default_value_t = Growth::Linear)]
    pub growth: Growth,

    /// Yearly seasonality.
    #[arg(long, value_enum, default_value_t = SeasonalityToggle::Auto)]
    pub yearly: SeasonalityToggle,

    /// Weekly seasonality.
    #[arg(long, value_enum, default_value_t = SeasonalityToggle::Auto)]
    pub weekly: SeasonalityToggle,

    /// Maximum number of potential trend changepoints.
    #[arg(long, default_value_t = 25)]
    pub n_changepoints: usize,

    /// Fraction of the history where changepoints may be placed.
    #[arg(long, default_value_t = 0.8)]
    pub changepoint_range: f64,

    /// Flexibility of the trend (larger = more changepoint freedom).
    #[arg(long, default_value_t = 0.05)]
    pub changepoint_prior_scale: f64,

    /// Strength of the seasonal components.
    #[arg(long, default_value_t = 10.0)]
    pub seasonality_prior_scale: f64,

    /// Width of the prediction interval.
    #[arg(long, default_value_t = 0.8)]
    pub interval_width: f64,

    /// Simulations for the prediction interval (0 disables intervals).
    #[arg(long, default_value_t = 1000)]
    pub uncertainty_samples: usize,

    /// Random seed for the interval simulation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Skip the per-segment forecast/component charts.
    #[arg(long)]
    pub no_plots: bool,

    /// Export per-segment forecasts to CSV files in this directory.
    #[arg(long, value_name = "DIR")]
    pub export: Option<PathBuf>,

    /// Only forecast the first N segments.
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults_match_the_model_defaults() {
        let cli = Cli::parse_from(["sales", "run", "--data", "x.csv"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.data.data, PathBuf::from("x.csv"));
        assert_eq!(args.horizon, 1095);
        assert_eq!(args.growth, Growth::Linear);
        assert_eq!(args.n_changepoints, 25);
        assert!(!args.no_plots);
        assert!(args.limit.is_none());
    }

    #[test]
    fn parses_model_flags() {
        let cli = Cli::parse_from([
            "sales",
            "run",
            "--growth",
            "flat",
            "--weekly",
            "off",
            "--uncertainty-samples",
            "0",
            "--no-plots",
            "--limit",
            "3",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.growth, Growth::Flat);
        assert_eq!(args.weekly, SeasonalityToggle::Off);
        assert_eq!(args.uncertainty_samples, 0);
        assert!(args.no_plots);
        assert_eq!(args.limit, Some(3));
    }
}
