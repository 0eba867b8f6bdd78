//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - loads the sales table and prints its unique values
//! - writes the overview chart
//! - runs the per-segment forecasting loop
//! - launches the terminal viewer

use std::io::Write;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Command, DataArgs, RunArgs};
use crate::domain::{ProphetConfig, RunConfig};
use crate::error::AppError;
use crate::io::{load_sales_table, SalesTable};
use crate::report::{format_dataset_stats, format_run_summary, format_segment_keys, format_unique_values, unique_values};
use crate::segment::SegmentIndex;

pub mod pipeline;

/// Entry point for the `sales` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // `sales` and `sales --data x.csv` behave like `sales run ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => {
            init_tracing();
            handle_run(args)
        }
        Command::Explore(args) => {
            init_tracing();
            handle_explore(args)
        }
        Command::Segments(args) => {
            init_tracing();
            handle_segments(args)
        }
        // Log lines would corrupt the alternate screen.
        Command::View(args) => crate::tui::run(run_config_from_args(&args)?),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sales_forecast=warn".into()),
        )
        .try_init();
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    let table = load_table(&config.data_path)?;
    print_unique_values(&table);

    let overview = pipeline::run_overview(&table, &config.out_dir)?;
    println!("Wrote {}", overview.display());

    let index = SegmentIndex::build(&table.records);
    println!("{}", format_segment_keys(&index, false));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = pipeline::run_forecasts(&table, &index, &config, &mut out)?;
    writeln!(out, "{}", format_run_summary(&summary))
        .map_err(|e| AppError::new(4, format!("Failed to write output: {e}")))?;
    Ok(())
}

fn handle_explore(args: DataArgs) -> Result<(), AppError> {
    let data_path = crate::cli::picker::resolve_data_path(&args.data)?;
    let table = load_table(&data_path)?;
    print_unique_values(&table);

    let overview = pipeline::run_overview(&table, &args.out)?;
    println!("Wrote {}", overview.display());
    Ok(())
}

fn handle_segments(args: DataArgs) -> Result<(), AppError> {
    let data_path = crate::cli::picker::resolve_data_path(&args.data)?;
    let table = load_table(&data_path)?;
    print_unique_values(&table);

    let index = SegmentIndex::build(&table.records);
    println!("{}", format_segment_keys(&index, true));
    Ok(())
}

fn load_table(path: &std::path::Path) -> Result<SalesTable, AppError> {
    let table = load_sales_table(path)?;
    tracing::info!(path = %path.display(), rows = table.stats.n_rows, "loaded sales table");
    println!("{}", format_dataset_stats(&table.stats));
    Ok(table)
}

fn print_unique_values(table: &SalesTable) {
    println!("{}", format_unique_values("store", &unique_values(&table.records, |r| &r.store)));
    println!("{}", format_unique_values("country", &unique_values(&table.records, |r| &r.country)));
    println!("{}", format_unique_values("product", &unique_values(&table.records, |r| &r.product)));
}

/// Turn parsed flags into a validated run configuration.
pub fn run_config_from_args(args: &RunArgs) -> Result<RunConfig, AppError> {
    let model = ProphetConfig {
        growth: args.growth,
        yearly: args.yearly,
        weekly: args.weekly,
        n_changepoints: args.n_changepoints,
        changepoint_range: args.changepoint_range,
        changepoint_prior_scale: args.changepoint_prior_scale,
        seasonality_prior_scale: args.seasonality_prior_scale,
        interval_width: args.interval_width,
        uncertainty_samples: args.uncertainty_samples,
        seed: args.seed,
    };
    model.validate()?;

    Ok(RunConfig {
        data_path: crate::cli::picker::resolve_data_path(&args.data.data)?,
        out_dir: args.data.out.clone(),
        horizon: args.horizon,
        plots: !args.no_plots,
        export_dir: args.export.clone(),
        limit: args.limit,
        model,
    })
}

/// Rewrite argv so `sales` defaults to `sales run`.
///
/// Rules:
/// - `sales`                         -> `sales run`
/// - `sales --data x.csv ...`        -> `sales run --data x.csv ...`
/// - `sales --help/--version/-h`     -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    if matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help") {
        return argv;
    }
    if matches!(arg1.as_str(), "run" | "explore" | "segments" | "view") {
        return argv;
    }
    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_runs_everything() {
        assert_eq!(rewrite_args(argv(&["sales"])), argv(&["sales", "run"]));
        assert_eq!(
            rewrite_args(argv(&["sales", "-d", "x.csv"])),
            argv(&["sales", "run", "-d", "x.csv"])
        );
    }

    #[test]
    fn explicit_subcommands_and_help_are_untouched() {
        assert_eq!(rewrite_args(argv(&["sales", "view"])), argv(&["sales", "view"]));
        assert_eq!(rewrite_args(argv(&["sales", "--help"])), argv(&["sales", "--help"]));
    }

    #[test]
    fn config_rejects_out_of_range_interval() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("train.csv");
        std::fs::write(&data, "date,country,store,product,num_sold\n").unwrap();
        let data = data.display().to_string();

        let cli = crate::cli::Cli::parse_from(["sales", "run", "-d", data.as_str(), "--interval-width", "1.2"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(run_config_from_args(&args).unwrap_err().exit_code(), 2);

        let cli = crate::cli::Cli::parse_from(["sales", "run", "-d", data.as_str(), "--no-plots"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = run_config_from_args(&args).unwrap();
        assert!(!config.plots);
        assert_eq!(config.horizon, 1095);
    }
}
