//! Plotters-powered chart widget for Ratatui.
//!
//! The same drawing functions that write the SVG files render here, through
//! `plotters-ratatui-backend`, with the terminal theme.

use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::app::pipeline::SegmentForecast;
use crate::plot::{draw_components, draw_forecast, draw_overview, ChartTheme};
use crate::report::SalesSummary;

/// What the chart area shows.
#[derive(Debug, Clone, Copy)]
pub enum ChartView<'a> {
    Overview(&'a SalesSummary),
    Forecast(&'a SegmentForecast),
    Components(&'a SegmentForecast),
}

/// Render-only chart: all data is prepared before `render`.
pub struct SalesChart<'a> {
    pub view: ChartView<'a>,
}

impl Widget for SalesChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to lay out tiny areas; show a hint instead.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let view = self.view;
        let widget = widget_fn(move |root| {
            let theme = ChartTheme::TERMINAL;
            match view {
                ChartView::Overview(summary) => draw_overview(&root, summary, &theme)?,
                ChartView::Forecast(result) => {
                    draw_forecast(&root, &result.key, &result.model, &result.forecast, &theme)?
                }
                ChartView::Components(result) => draw_components(&root, &result.model, &result.forecast, &theme)?,
            }
            Ok(())
        });

        widget.render(area, buf);
    }
}
