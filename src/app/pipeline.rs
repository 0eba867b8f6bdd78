//! Shared pipeline logic used by both the CLI and the terminal viewer.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! table -> overview aggregates -> segment index -> per-segment fit/extend/predict
//!
//! The CLI and the viewer can then focus on presentation (printing vs widgets).

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::{Forecast, Observation, ProphetConfig, RunConfig, SegmentKey};
use crate::error::AppError;
use crate::fit::{fit, FittedModel, ForecastError};
use crate::io::{write_forecast_csv, SalesTable};
use crate::plot::{write_forecast_svgs, write_overview_svg};
use crate::report::{format_segment_error, summarize, ForecastRunSummary};
use crate::segment::SegmentIndex;

/// Subdirectory of the output directory holding per-segment charts.
pub const FORECAST_DIR: &str = "forecasts";

/// A fitted segment and its prediction over history + horizon.
#[derive(Debug, Clone)]
pub struct SegmentForecast {
    pub key: SegmentKey,
    pub model: FittedModel,
    pub forecast: Forecast,
}

/// Fit one segment's series, extend it by `horizon` days and predict.
///
/// The model is built from this series alone and dropped with the result.
pub fn forecast_segment(
    key: &SegmentKey,
    series: &[Observation],
    config: &ProphetConfig,
    horizon: usize,
) -> Result<SegmentForecast, ForecastError> {
    let model = fit(series, config)?;
    let dates = model.make_future_dates(horizon)?;
    let forecast = model.predict(&dates)?;
    tracing::debug!(
        segment = %key,
        n = model.history.len(),
        changepoints = model.layout.changepoints.len(),
        rmse = model.rmse,
        "fitted segment"
    );
    Ok(SegmentForecast {
        key: key.clone(),
        model,
        forecast,
    })
}

/// Aggregate the table and write the overview grid.
pub fn run_overview(table: &SalesTable, out_dir: &Path) -> Result<PathBuf, AppError> {
    let summary = summarize(&table.records)?;
    tracing::info!(
        months = summary.monthly.len(),
        countries = summary.by_country.len(),
        products = summary.by_product.len(),
        stores = summary.by_store.len(),
        "aggregated sales table"
    );
    write_overview_svg(out_dir, &summary)
}

/// Forecast every segment in index order, one at a time.
///
/// Value-class fitting errors are written to `out` and the loop moves on;
/// any other failure aborts the run.
pub fn run_forecasts<W: Write>(
    table: &SalesTable,
    index: &SegmentIndex,
    config: &RunConfig,
    out: &mut W,
) -> Result<ForecastRunSummary, AppError> {
    let mut summary = ForecastRunSummary::default();
    let chart_dir = config.out_dir.join(FORECAST_DIR);
    let limit = config.limit.unwrap_or(usize::MAX);

    for segment in index.segments.iter().take(limit) {
        let key = &segment.key;
        let series = segment.series(&table.records);
        emit(out, &key.to_string())?;
        tracing::info!(segment = %key, rows = series.len(), "forecasting segment");

        let result = match forecast_segment(key, &series, &config.model, config.horizon) {
            Ok(result) => result,
            Err(err) if err.is_value_error() => {
                tracing::warn!(segment = %key, error = %err, "skipping segment");
                emit(out, &format_segment_error(&err))?;
                summary.skipped.push((key.clone(), err));
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        if config.plots {
            for path in write_forecast_svgs(&chart_dir, key, &result.model, &result.forecast)? {
                emit(out, &format!("  wrote {}", path.display()))?;
                summary.files.push(path);
            }
        }
        if let Some(dir) = &config.export_dir {
            let path = write_forecast_csv(dir, key, &result.forecast)?;
            emit(out, &format!("  wrote {}", path.display()))?;
            summary.files.push(path);
        }
        summary.forecast.push(key.clone());
    }

    Ok(summary)
}

fn emit<W: Write>(out: &mut W, line: &str) -> Result<(), AppError> {
    writeln!(out, "{line}").map_err(|e| AppError::new(4, format!("Failed to write output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read_sales_table;

    fn config(out_dir: PathBuf) -> RunConfig {
        RunConfig {
            data_path: PathBuf::from("unused.csv"),
            out_dir,
            horizon: 30,
            plots: false,
            export_dir: None,
            limit: None,
            model: ProphetConfig {
                uncertainty_samples: 10,
                ..ProphetConfig::default()
            },
        }
    }

    fn table() -> SalesTable {
        let mut csv = String::from("id,date,country,store,product,num_sold\n");
        for day in 1..=28 {
            csv.push_str(&format!("{day},2010-02-{day:02},Canada,Shop,Goose,{}\n", 100 + day));
        }
        csv.push_str("99,2010-02-01,Norway,Shop,Goose,0\n");
        csv.push_str("100,2010-02-02,Norway,Shop,Goose,0\n");
        read_sales_table(csv.as_bytes()).unwrap()
    }

    #[test]
    fn value_errors_are_printed_and_skipped() {
        let table = table();
        let index = SegmentIndex::build(&table.records);
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();

        let summary = run_forecasts(&table, &index, &config(dir.path().to_path_buf()), &mut out).unwrap();
        assert_eq!(summary.forecast, vec![SegmentKey::new("Canada", "Shop", "Goose")]);
        assert_eq!(summary.skipped.len(), 1);
        assert!(summary.skipped[0].1.is_value_error());

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("(Norway, Shop, Goose)\nError: insufficient data"));
    }

    #[test]
    fn invalid_settings_abort_the_run() {
        let table = table();
        let index = SegmentIndex::build(&table.records);
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path().to_path_buf());
        cfg.model.changepoint_prior_scale = -1.0;

        let err = run_forecasts(&table, &index, &cfg, &mut Vec::new()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn writes_charts_and_exports_when_enabled() {
        let table = table();
        let index = SegmentIndex::build(&table.records);
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path().to_path_buf());
        cfg.plots = true;
        cfg.export_dir = Some(dir.path().join("csv"));
        cfg.limit = Some(1);

        let summary = run_forecasts(&table, &index, &cfg, &mut Vec::new()).unwrap();
        assert_eq!(summary.files.len(), 3);
        assert!(dir.path().join("forecasts").join("canada_shop_goose_forecast.svg").exists());
        assert!(dir.path().join("forecasts").join("canada_shop_goose_components.svg").exists());
        assert!(dir.path().join("csv").join("canada_shop_goose_forecast.csv").exists());
    }

    #[test]
    fn overview_is_written_to_the_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = run_overview(&table(), dir.path()).unwrap();
        assert!(path.ends_with("overview.svg"));
        assert!(path.exists());
    }
}
