//! Ratatui-based terminal viewer.
//!
//! A segment list on the left, a chart on the right. The chart shows the
//! overview grid or the selected segment's forecast / components. Segments
//! are fitted on demand and cached for the session.

use std::collections::HashMap;
use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Terminal,
};

use crate::app::pipeline::{forecast_segment, SegmentForecast};
use crate::domain::RunConfig;
use crate::error::AppError;
use crate::fit::ForecastError;
use crate::io::{load_sales_table, SalesTable};
use crate::report::{summarize, SalesSummary};
use crate::segment::SegmentIndex;

mod plotters_chart;

use plotters_chart::{ChartView, SalesChart};

/// Start the viewer.
pub fn run(config: RunConfig) -> Result<(), AppError> {
    let table = load_sales_table(&config.data_path)?;
    let mut app = App::new(config, table)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewMode {
    Overview,
    Forecast,
    Components,
}

impl ViewMode {
    fn next(self) -> Self {
        match self {
            ViewMode::Overview => ViewMode::Forecast,
            ViewMode::Forecast => ViewMode::Components,
            ViewMode::Components => ViewMode::Overview,
        }
    }

    fn title(self) -> &'static str {
        match self {
            ViewMode::Overview => "Overview",
            ViewMode::Forecast => "Forecast",
            ViewMode::Components => "Components",
        }
    }
}

struct App {
    config: RunConfig,
    table: SalesTable,
    index: SegmentIndex,
    summary: SalesSummary,
    selected: usize,
    mode: ViewMode,
    /// Fit outcome per segment position; value-class failures are kept too.
    fits: HashMap<usize, Result<SegmentForecast, ForecastError>>,
    status: String,
}

impl App {
    fn new(config: RunConfig, table: SalesTable) -> Result<Self, AppError> {
        let index = SegmentIndex::build(&table.records);
        let summary = summarize(&table.records)?;
        let status = format!("{} rows, {} segments", table.stats.n_rows, index.len());
        Ok(Self {
            config,
            table,
            index,
            summary,
            selected: 0,
            mode: ViewMode::Overview,
            fits: HashMap::new(),
            status,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => needs_redraw = true,
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                self.ensure_fitted()?;
            }
            KeyCode::Down => {
                if self.selected + 1 < self.index.len() {
                    self.selected += 1;
                }
                self.ensure_fitted()?;
            }
            KeyCode::Tab => {
                self.mode = self.mode.next();
                self.ensure_fitted()?;
            }
            KeyCode::Char('o') => self.mode = ViewMode::Overview,
            KeyCode::Enter => {
                if self.mode == ViewMode::Overview {
                    self.mode = ViewMode::Forecast;
                }
                self.ensure_fitted()?;
            }
            _ => {}
        }
        Ok(false)
    }

    /// Fit the selected segment if a segment view needs it.
    ///
    /// Value-class failures are shown; anything else ends the session.
    fn ensure_fitted(&mut self) -> Result<(), AppError> {
        if self.mode == ViewMode::Overview || self.fits.contains_key(&self.selected) {
            return Ok(());
        }
        let Some(segment) = self.index.segments.get(self.selected) else {
            return Ok(());
        };

        let series = segment.series(&self.table.records);
        let outcome = forecast_segment(&segment.key, &series, &self.config.model, self.config.horizon);
        self.status = match &outcome {
            Ok(result) => format!(
                "{}: n={} rmse={:.2}",
                result.key,
                result.model.history.len(),
                result.model.rmse
            ),
            Err(err) if err.is_value_error() => format!("{}: Error: {err}", segment.key),
            Err(err) => return Err(err.clone().into()),
        };
        self.fits.insert(self.selected, outcome);
        Ok(())
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(44), Constraint::Min(0)])
            .split(chunks[1]);
        self.draw_segments(frame, body[0]);
        self.draw_chart(frame, body[1]);

        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let stats = &self.table.stats;
        let line = Line::from(vec![
            Span::styled("sales", Style::default().fg(Color::Cyan)),
            Span::styled(
                format!(
                    "  {} | {} .. {} | horizon {} days | {}",
                    self.config.data_path.display(),
                    stats.date_min,
                    stats.date_max,
                    self.config.horizon,
                    self.mode.title(),
                ),
                Style::default().fg(Color::Gray),
            ),
        ]);
        let p = Paragraph::new(Text::from(line)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_segments(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .index
            .segments
            .iter()
            .enumerate()
            .map(|(i, seg)| {
                let (mark, color) = match self.fits.get(&i) {
                    Some(Ok(_)) => ("+", Color::Green),
                    Some(Err(_)) => ("x", Color::Red),
                    None => (" ", Color::Gray),
                };
                ListItem::new(Line::from(vec![
                    Span::styled(mark, Style::default().fg(color)),
                    Span::raw(format!(" {} / {} / {}", seg.key.country, seg.key.store, seg.key.product)),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!("Segments ({})", self.index.len()))
                    .borders(Borders::ALL),
            )
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title(self.mode.title()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let view = match self.mode {
            ViewMode::Overview => ChartView::Overview(&self.summary),
            ViewMode::Forecast | ViewMode::Components => match self.fits.get(&self.selected) {
                Some(Ok(result)) if self.mode == ViewMode::Forecast => ChartView::Forecast(result),
                Some(Ok(result)) => ChartView::Components(result),
                Some(Err(err)) => {
                    let msg = Paragraph::new(format!("Error: {err}")).style(Style::default().fg(Color::Red));
                    frame.render_widget(msg, inner);
                    return;
                }
                None => {
                    let msg = Paragraph::new("Press Enter to fit the selected segment.")
                        .style(Style::default().fg(Color::Yellow));
                    frame.render_widget(msg, inner);
                    return;
                }
            },
        };
        frame.render_widget(SalesChart { view }, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ segment  Enter fit  Tab view  o overview  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}
