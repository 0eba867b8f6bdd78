//! End-to-end checks of the per-segment forecasting loop.

use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::{Days, NaiveDate};
use sales_forecast::app::pipeline::{forecast_segment, run_forecasts};
use sales_forecast::domain::{ProphetConfig, RunConfig, SegmentKey, DEFAULT_HORIZON_DAYS};
use sales_forecast::io::{read_sales_table, SalesTable};
use sales_forecast::segment::SegmentIndex;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
}

/// Rows in CSV order: segment B (two rows), then segment C when requested
/// (60 daily rows, all zero), then segment A (365 daily rows, values 10..374).
/// The degenerate segments come first so the loop has to recover before A.
fn table(with_zero_segment: bool) -> SalesTable {
    let mut csv = String::from("id,date,country,store,product,num_sold\n");
    let mut id = 0;
    for (i, n) in [(0u64, 5), (1, 9)] {
        let date = start() + Days::new(i);
        writeln!(csv, "{id},{date},Norway,Discount Stickers,Kaggle,{n}").unwrap();
        id += 1;
    }
    if with_zero_segment {
        for i in 0..60u64 {
            let date = start() + Days::new(i);
            writeln!(csv, "{id},{date},Italy,Stickers for Less,Kerneler,0").unwrap();
            id += 1;
        }
    }
    for i in 0..365u64 {
        let date = start() + Days::new(i);
        writeln!(csv, "{id},{date},Canada,Discount Stickers,Kaggle,{}", 10 + i).unwrap();
        id += 1;
    }
    read_sales_table(csv.as_bytes()).unwrap()
}

fn segment_a() -> SegmentKey {
    SegmentKey::new("Canada", "Discount Stickers", "Kaggle")
}

fn config(out_dir: PathBuf, plots: bool) -> RunConfig {
    RunConfig {
        data_path: PathBuf::from("train.csv"),
        out_dir,
        horizon: DEFAULT_HORIZON_DAYS,
        plots,
        export_dir: None,
        limit: None,
        model: ProphetConfig {
            uncertainty_samples: 50,
            ..ProphetConfig::default()
        },
    }
}

#[test]
fn short_segment_is_reported_and_the_long_one_is_forecast() {
    let table = table(false);
    let index = SegmentIndex::build(&table.records);
    let dir = tempfile::tempdir().unwrap();
    let mut out = Vec::new();

    let summary = run_forecasts(&table, &index, &config(dir.path().to_path_buf(), true), &mut out).unwrap();

    let b = SegmentKey::new("Norway", "Discount Stickers", "Kaggle");
    assert_eq!(summary.forecast, vec![segment_a()]);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].0, b);

    let text = String::from_utf8(out).unwrap();
    let error_at = text
        .find("Error: insufficient data: need at least 7 non-missing rows, got 2")
        .unwrap();
    let a_at = text.find("(Canada, Discount Stickers, Kaggle)").unwrap();
    assert!(error_at < a_at, "B should be reported before A is forecast:\n{text}");

    let charts = dir.path().join("forecasts");
    assert!(charts.join("canada_discount-stickers_kaggle_forecast.svg").exists());
    assert!(charts.join("canada_discount-stickers_kaggle_components.svg").exists());
    assert!(!charts.join("norway_discount-stickers_kaggle_forecast.svg").exists());
}

#[test]
fn degenerate_segment_does_not_stop_later_segments() {
    let table = table(true);
    let index = SegmentIndex::build(&table.records);
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path().to_path_buf(), true);
    cfg.model.uncertainty_samples = 0;
    let mut out = Vec::new();

    let summary = run_forecasts(&table, &index, &cfg, &mut out).unwrap();
    assert_eq!(summary.skipped.len(), 2);
    assert!(summary.skipped.iter().all(|(_, err)| err.is_value_error()));
    assert_eq!(summary.skipped[0].0.country, "Norway");
    assert_eq!(summary.skipped[1].0.country, "Italy");
    assert_eq!(summary.forecast, vec![segment_a()]);

    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches("Error: ").count(), 2);

    let charts = dir.path().join("forecasts");
    assert!(charts.join("canada_discount-stickers_kaggle_forecast.svg").exists());
    assert!(charts.join("canada_discount-stickers_kaggle_components.svg").exists());
    assert!(!charts.join("italy_stickers-for-less_kerneler_forecast.svg").exists());
}

#[test]
fn horizon_has_exactly_1095_daily_points() {
    let table = table(false);
    let index = SegmentIndex::build(&table.records);
    let segment = index.get(&segment_a()).unwrap();
    let series = segment.series(&table.records);

    let model = ProphetConfig {
        uncertainty_samples: 50,
        ..ProphetConfig::default()
    };
    let result = forecast_segment(&segment.key, &series, &model, DEFAULT_HORIZON_DAYS).unwrap();

    let last = result.model.last_history_date();
    assert_eq!(last, start() + Days::new(364));

    let future = result.forecast.future(last);
    assert_eq!(future.len(), 1095);
    for (i, row) in future.iter().enumerate() {
        assert_eq!(row.ds, last + Days::new(i as u64 + 1));
        assert!(row.yhat.is_finite());
        assert!(row.yhat_lower <= row.yhat_upper);
    }
    assert_eq!(result.forecast.rows.len(), 365 + 1095);

    // The trend keeps rising past the history.
    assert!(future[future.len() - 1].trend > future[0].trend);
}
