//! Per-segment forecast and component charts.
//!
//! The x axis is "days since the first history date" so charts need no
//! date-aware coordinate support; tick labels map offsets back to dates.

use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::domain::{Forecast, SegmentKey};
use crate::error::AppError;
use crate::fit::FittedModel;
use crate::models::SeasonalityKind;
use crate::plot::{font, format_count, padded_bounds, render_svg, ChartTheme};

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn offset_days(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

fn date_label(origin: NaiveDate, offset: f64, fmt: &str) -> String {
    if !offset.is_finite() || offset < 0.0 {
        return String::new();
    }
    origin
        .checked_add_days(Days::new(offset.round() as u64))
        .map(|d| d.format(fmt).to_string())
        .unwrap_or_default()
}

/// History, point forecast and interval band for one segment.
pub fn draw_forecast<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    key: &SegmentKey,
    model: &FittedModel,
    forecast: &Forecast,
    theme: &ChartTheme,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    if let Some(bg) = theme.background {
        root.fill(&bg)?;
    }
    let Some(first) = forecast.rows.first() else {
        return Ok(());
    };
    let origin = first.ds;
    let x_max = forecast
        .rows
        .last()
        .map(|r| offset_days(origin, r.ds))
        .unwrap_or(0.0)
        .max(1.0);

    let history: Vec<(f64, f64)> = model
        .history
        .iter()
        .filter_map(|o| o.y.map(|y| (offset_days(origin, o.ds), y)))
        .collect();

    let (y0, y1) = padded_bounds(
        history
            .iter()
            .map(|&(_, y)| y)
            .chain(forecast.rows.iter().flat_map(|r| [r.yhat_lower, r.yhat_upper])),
    );

    let mut chart = ChartBuilder::on(root)
        .caption(format!("Forecast {key}"), font(theme, theme.caption_size))
        .margin(theme.margin)
        .x_label_area_size(theme.x_label_area)
        .y_label_area_size(theme.y_label_area)
        .build_cartesian_2d(0f64..x_max, y0..y1)?;

    let fmt_x = |v: &f64| date_label(origin, *v, "%Y-%m");
    let fmt_y = |v: &f64| format_count(*v);
    let mut mesh = chart.configure_mesh();
    if !theme.mesh {
        mesh.disable_mesh();
    }
    mesh.x_labels(8)
        .y_labels(6)
        .x_label_formatter(&fmt_x)
        .y_label_formatter(&fmt_y)
        .x_desc("ds")
        .y_desc("num_sold")
        .label_style(font(theme, theme.font_size))
        .axis_desc_style(font(theme, theme.font_size))
        .axis_style(&theme.axis)
        .draw()?;

    // Interval band: upper edge forward, lower edge back.
    let band: Vec<(f64, f64)> = forecast
        .rows
        .iter()
        .map(|r| (offset_days(origin, r.ds), r.yhat_upper))
        .chain(
            forecast
                .rows
                .iter()
                .rev()
                .map(|r| (offset_days(origin, r.ds), r.yhat_lower)),
        )
        .collect();
    chart.draw_series(std::iter::once(Polygon::new(band, theme.band.mix(0.35).filled())))?;

    if theme.markers {
        chart.draw_series(
            history
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 1, theme.history.filled())),
        )?;
    } else {
        chart.draw_series(history.iter().map(|&(x, y)| Pixel::new((x, y), theme.history)))?;
    }

    chart.draw_series(LineSeries::new(
        forecast.rows.iter().map(|r| (offset_days(origin, r.ds), r.yhat)),
        theme.forecast.stroke_width(1),
    ))?;

    let cutoff = offset_days(origin, model.last_history_date());
    chart.draw_series(std::iter::once(PathElement::new(
        vec![(cutoff, y0), (cutoff, y1)],
        theme.axis,
    )))?;
    Ok(())
}

/// Stacked component panels: trend, then each fitted seasonality.
pub fn draw_components<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    model: &FittedModel,
    forecast: &Forecast,
    theme: &ChartTheme,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    if let Some(bg) = theme.background {
        root.fill(&bg)?;
    }

    let weekly = model.weekly_profile();
    let yearly = model.yearly_profile();
    let n_panels = 1 + usize::from(weekly.is_some()) + usize::from(yearly.is_some());
    let panels = root.split_evenly((n_panels, 1));

    let Some(first) = forecast.rows.first() else {
        return Ok(());
    };
    let origin = first.ds;
    let trend: Vec<(f64, f64)> = forecast
        .rows
        .iter()
        .map(|r| (offset_days(origin, r.ds), r.trend))
        .collect();
    let fmt_date = |v: &f64| date_label(origin, *v, "%Y-%m");
    draw_component_panel(&panels[0], "trend", &trend, 8, &fmt_date, theme)?;

    let mut next = 1;
    if let Some(profile) = weekly {
        let points: Vec<(f64, f64)> = profile.iter().enumerate().map(|(i, &(_, v))| (i as f64, v)).collect();
        let fmt_day = |v: &f64| {
            let i = v.round();
            if (v - i).abs() > 1e-6 || !(0.0..7.0).contains(&i) {
                return String::new();
            }
            WEEKDAY_NAMES[i as usize].to_string()
        };
        draw_component_panel(&panels[next], SeasonalityKind::Weekly.display_name(), &points, 7, &fmt_day, theme)?;
        next += 1;
    }
    if let Some(profile) = yearly {
        let Some(&(jan1, _)) = profile.first() else {
            return Ok(());
        };
        let points: Vec<(f64, f64)> = profile.iter().map(|&(d, v)| (offset_days(jan1, d), v)).collect();
        let fmt_month = |v: &f64| {
            let label = date_label(jan1, *v, "%m");
            label
                .parse::<usize>()
                .ok()
                .and_then(|m| MONTH_NAMES.get(m.wrapping_sub(1)))
                .map(|s| s.to_string())
                .unwrap_or_default()
        };
        draw_component_panel(&panels[next], SeasonalityKind::Yearly.display_name(), &points, 12, &fmt_month, theme)?;
    }
    Ok(())
}

fn draw_component_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    points: &[(f64, f64)],
    x_labels: usize,
    fmt_x: &dyn Fn(&f64) -> String,
    theme: &ChartTheme,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let x0 = points.first().map(|p| p.0).unwrap_or(0.0);
    let x1 = points.last().map(|p| p.0).unwrap_or(1.0).max(x0 + 1.0);
    let (y0, y1) = padded_bounds(points.iter().map(|p| p.1));

    let mut chart = ChartBuilder::on(area)
        .caption(title, font(theme, theme.caption_size))
        .margin(theme.margin)
        .x_label_area_size(theme.x_label_area)
        .y_label_area_size(theme.y_label_area)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    let fmt_y = |v: &f64| format!("{v:.1}");
    let mut mesh = chart.configure_mesh();
    if !theme.mesh {
        mesh.disable_mesh();
    }
    mesh.x_labels(x_labels)
        .y_labels(5)
        .x_label_formatter(fmt_x)
        .y_label_formatter(&fmt_y)
        .label_style(font(theme, theme.font_size))
        .axis_style(&theme.axis)
        .draw()?;

    chart.draw_series(LineSeries::new(points.iter().copied(), theme.forecast.stroke_width(2)))?;
    Ok(())
}

/// Write `<dir>/<slug>_forecast.svg` and `<dir>/<slug>_components.svg`.
pub fn write_forecast_svgs(
    dir: &Path,
    key: &SegmentKey,
    model: &FittedModel,
    forecast: &Forecast,
) -> Result<Vec<PathBuf>, AppError> {
    let slug = key.slug();
    let forecast_path = dir.join(format!("{slug}_forecast.svg"));
    render_svg(&forecast_path, |root| {
        draw_forecast(root, key, model, forecast, &ChartTheme::PAPER)
    })?;

    let components_path = dir.join(format!("{slug}_components.svg"));
    render_svg(&components_path, |root| {
        draw_components(root, model, forecast, &ChartTheme::PAPER)
    })?;

    Ok(vec![forecast_path, components_path])
}
