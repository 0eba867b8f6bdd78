//! Exploratory overview: a 2x2 grid of the table aggregates.
//!
//! Panels, in reading order:
//! - total sales per month (line)
//! - total sales per country (horizontal bars)
//! - total sales per product (horizontal bars)
//! - total sales per store (horizontal bars)

use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::domain::MonthKey;
use crate::error::AppError;
use crate::plot::{font, format_count, render_svg, ChartTheme};
use crate::report::SalesSummary;

/// Draw the full overview grid onto `root`.
pub fn draw_overview<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    summary: &SalesSummary,
    theme: &ChartTheme,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    if let Some(bg) = theme.background {
        root.fill(&bg)?;
    }

    let panels = root.split_evenly((2, 2));
    draw_monthly_totals(&panels[0], &summary.monthly, theme)?;
    draw_totals(&panels[1], "Sales by Country", &summary.by_country, theme)?;
    draw_totals(&panels[2], "Sales by Product", &summary.by_product, theme)?;
    draw_totals(&panels[3], "Sales by Store", &summary.by_store, theme)?;
    Ok(())
}

/// Line chart of monthly totals; x is the month index.
pub fn draw_monthly_totals<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    monthly: &[(MonthKey, u64)],
    theme: &ChartTheme,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let x_max = monthly.len().saturating_sub(1).max(1) as f64;
    let y_max = monthly.iter().map(|&(_, v)| v).max().unwrap_or(0).max(1) as f64 * 1.05;

    let mut chart = ChartBuilder::on(area)
        .caption("Monthly Sales Trend", font(theme, theme.caption_size))
        .margin(theme.margin)
        .x_label_area_size(theme.x_label_area)
        .y_label_area_size(theme.y_label_area)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

    let fmt_x = |v: &f64| {
        let i = v.round();
        if (v - i).abs() > 1e-6 || i < 0.0 {
            return String::new();
        }
        monthly
            .get(i as usize)
            .map(|(m, _)| m.to_string())
            .unwrap_or_default()
    };
    let fmt_y = |v: &f64| format_count(*v);

    let mut mesh = chart.configure_mesh();
    if !theme.mesh {
        mesh.disable_mesh();
    }
    mesh.x_labels(6)
        .y_labels(5)
        .x_label_formatter(&fmt_x)
        .y_label_formatter(&fmt_y)
        .x_desc("Month")
        .y_desc("Total Sales")
        .label_style(font(theme, theme.font_size))
        .axis_desc_style(font(theme, theme.font_size))
        .axis_style(&theme.axis)
        .draw()?;

    chart.draw_series(LineSeries::new(
        monthly.iter().enumerate().map(|(i, &(_, v))| (i as f64, v as f64)),
        theme.forecast.stroke_width(2),
    ))?;
    Ok(())
}

/// Horizontal bar chart of `(name, total)` pairs, first pair at the bottom.
pub fn draw_totals<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    totals: &[(String, u64)],
    theme: &ChartTheme,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let n = totals.len().max(1);
    let x_max = totals.iter().map(|(_, v)| *v).max().unwrap_or(0).max(1) as f64 * 1.05;

    let mut chart = ChartBuilder::on(area)
        .caption(title, font(theme, theme.caption_size))
        .margin(theme.margin)
        .x_label_area_size(theme.x_label_area)
        .y_label_area_size(theme.bar_label_area)
        .build_cartesian_2d(0f64..x_max, (0..n).into_segmented())?;

    let fmt_x = |v: &f64| format_count(*v);
    let fmt_y = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) => totals.get(*i).map(|(name, _)| name.clone()).unwrap_or_default(),
        _ => String::new(),
    };

    let mut mesh = chart.configure_mesh();
    if !theme.mesh {
        mesh.disable_mesh();
    }
    mesh.x_labels(5)
        .y_labels(n + 1)
        .x_label_formatter(&fmt_x)
        .y_label_formatter(&fmt_y)
        .x_desc("Total Sales")
        .label_style(font(theme, theme.font_size))
        .axis_desc_style(font(theme, theme.font_size))
        .axis_style(&theme.axis)
        .draw()?;

    chart.draw_series(totals.iter().enumerate().map(|(i, (_, v))| {
        let mut bar = Rectangle::new(
            [(0.0, SegmentValue::Exact(i)), (*v as f64, SegmentValue::Exact(i + 1))],
            theme.bar.filled(),
        );
        bar.set_margin(2, 2, 0, 0);
        bar
    }))?;
    Ok(())
}

/// Write `<out_dir>/overview.svg`.
pub fn write_overview_svg(out_dir: &Path, summary: &SalesSummary) -> Result<PathBuf, AppError> {
    let path = out_dir.join("overview.svg");
    render_svg(&path, |root| draw_overview(root, summary, &ChartTheme::PAPER))?;
    Ok(path)
}
