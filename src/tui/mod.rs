//! Ratatui-based terminal UI.
//!
//! The TUI provides a symbol search box, then renders the overview cards, the
//! price/forecast chart and the technical indicator panel for the loaded symbol.
//!
//! Loads run as tasks on the current-thread runtime and report back over a
//! channel, so the UI keeps redrawing while requests are in flight. The
//! controller decides whether a finished load is still current.

use std::io;

use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tokio::sync::mpsc;

use crate::chart::{ChartPresenter, ChartSpec};
use crate::cli::TuiArgs;
use crate::dashboard::{DashboardController, Phase, RequestTicket};
use crate::domain::{RsiSignal, TechnicalIndicatorSnapshot, Trend};
use crate::error::AppError;
use crate::fetch::{FetchOrchestrator, LoadOutcome};
use crate::report::{indicator_rows, overview_cards};

mod plotters_chart;

use plotters_chart::PriceChart;

/// Longest symbol the search box accepts.
const MAX_INPUT: usize = 12;

type Finished = (RequestTicket, LoadOutcome);

/// Start the TUI.
pub fn run(args: TuiArgs) -> Result<(), AppError> {
    let config = crate::app::config_from_args(&args.conn)?;
    let orchestrator = crate::app::orchestrator_for(&config)?;
    let runtime = crate::app::build_runtime()?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::io(format!("Failed to initialize terminal: {e}")))?;

    let (tx, rx) = mpsc::unbounded_channel();
    let mut app = App::new(DashboardController::new(config.label_format), orchestrator, tx);
    if let Some(symbol) = args.symbol {
        app.input = normalize_input(&symbol);
    }

    runtime.block_on(app.event_loop(&mut terminal, rx, true))
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::io(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::io(format!("Failed to enter alternate screen: {e}")));
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

struct App {
    controller: DashboardController,
    orchestrator: FetchOrchestrator,
    presenter: ChartPresenter,
    tx: mpsc::UnboundedSender<Finished>,
    input: String,
    /// Chart for the current timeline; rebuilt whenever a load is applied.
    chart: Option<ChartSpec>,
    hover: Option<usize>,
}

impl App {
    fn new(controller: DashboardController, orchestrator: FetchOrchestrator, tx: mpsc::UnboundedSender<Finished>) -> Self {
        Self {
            controller,
            orchestrator,
            presenter: ChartPresenter::default(),
            tx,
            input: String::new(),
            chart: None,
            hover: None,
        }
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        mut rx: mpsc::UnboundedReceiver<Finished>,
        submit_initial: bool,
    ) -> Result<(), AppError> {
        if submit_initial {
            self.submit();
        }

        let mut events = EventStream::new();
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::io(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            tokio::select! {
                event = events.next() => match event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if self.handle_key(key) {
                            break;
                        }
                        needs_redraw = true;
                    }
                    Some(Ok(Event::Resize(_, _))) => needs_redraw = true,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(AppError::io(format!("Event read error: {e}"))),
                    None => break,
                },
                Some((ticket, outcome)) = rx.recv() => {
                    self.finish(&ticket, outcome);
                    needs_redraw = true;
                }
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'));
        }

        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Left => self.move_hover(-1),
            KeyCode::Right => self.move_hover(1),
            KeyCode::Home => self.hover = self.chart.as_ref().filter(|c| !c.is_empty()).map(|_| 0),
            KeyCode::End => self.hover = self.chart.as_ref().and_then(|c| c.len().checked_sub(1)),
            KeyCode::Char(c) if is_symbol_char(c) && self.input.len() < MAX_INPUT => {
                self.input.push(c.to_ascii_uppercase());
            }
            _ => {}
        }
        false
    }

    /// Hand the search box to the controller and start the load in the background.
    fn submit(&mut self) {
        let Some(ticket) = self.controller.submit(&self.input) else {
            return;
        };

        let orchestrator = self.orchestrator.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if let Some(outcome) = orchestrator.load(ticket.symbol().as_str()).await {
                // The receiver only goes away when the UI is shutting down.
                let _ = tx.send((ticket, outcome));
            }
        });
    }

    fn finish(&mut self, ticket: &RequestTicket, outcome: LoadOutcome) {
        if !self.controller.apply(ticket, outcome) {
            return;
        }
        self.chart = self.controller.state().chart(&self.presenter);
        self.hover = self
            .chart
            .as_ref()
            .and_then(|c| c.len().checked_sub(1));
    }

    fn move_hover(&mut self, delta: isize) {
        let Some(len) = self.chart.as_ref().map(ChartSpec::len).filter(|&n| n > 0) else {
            self.hover = None;
            return;
        };
        let cur = self.hover.unwrap_or(len - 1) as isize;
        self.hover = Some((cur + delta).clamp(0, len as isize - 1) as usize);
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let state = self.controller.state();
        let error_height = if state.error_message.is_some() { 3 } else { 0 };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(error_height),
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        if error_height > 0 {
            self.draw_error(frame, chunks[1]);
        }
        self.draw_cards(frame, chunks[2]);
        self.draw_body(frame, chunks[3]);
        self.draw_footer(frame, chunks[4]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let state = self.controller.state();
        let mut spans = vec![
            Span::styled("MarketSense", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw("  symbol: "),
            Span::styled(
                format!("{}_", self.input),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ];
        if state.loading {
            spans.push(Span::styled("  Loading...", Style::default().fg(Color::Yellow)));
        } else if state.phase == Phase::Loaded {
            spans.push(Span::styled(
                format!("  showing {}", state.symbol),
                Style::default().fg(Color::Gray),
            ));
        }

        let p = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_error(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(message) = &self.controller.state().error_message else {
            return;
        };
        let p = Paragraph::new(message.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Error").borders(Borders::ALL).border_style(Style::default().fg(Color::Red)));
        frame.render_widget(p, area);
    }

    fn draw_cards(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(area);

        let state = self.controller.state();
        let Some(overview) = &state.overview else {
            for (rect, title) in cols.iter().zip(["Current Price", "Volume", "Market Cap", "Company"]) {
                let p = Paragraph::new("-").block(Block::default().title(title).borders(Borders::ALL));
                frame.render_widget(p, *rect);
            }
            return;
        };

        let change_color = if overview.change_percent >= 0.0 { Color::Green } else { Color::Red };
        for (i, (rect, (title, value))) in cols.iter().zip(overview_cards(overview)).enumerate() {
            let style = if i == 0 {
                Style::default().fg(change_color).add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            let p = Paragraph::new(Span::styled(value, style))
                .block(Block::default().title(title).borders(Borders::ALL));
            frame.render_widget(p, *rect);
        }
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(34)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_indicators(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = self
            .chart
            .as_ref()
            .map(|c| c.title.clone())
            .unwrap_or_else(|| "Price History".to_string());
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(spec) = &self.chart else {
            let hint = if self.controller.state().loading {
                "Loading..."
            } else {
                "Type a symbol and press Enter."
            };
            let msg = Paragraph::new(hint).style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(inner);

        frame.render_widget(PriceChart { spec, hover: self.hover }, rows[0]);
        frame.render_widget(Paragraph::new(tooltip_line(spec, self.hover)), rows[1]);
    }

    fn draw_indicators(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Technical Indicators").borders(Borders::ALL);
        let Some(ind) = &self.controller.state().indicators else {
            frame.render_widget(Paragraph::new("-").block(block), area);
            return;
        };

        let colors = signal_colors(ind);
        let mut lines: Vec<Line> = Vec::new();
        for ((label, value, badge), color) in indicator_rows(ind).into_iter().zip(colors) {
            lines.push(Line::from(Span::styled(label, Style::default().fg(Color::Gray))));
            lines.push(Line::from(vec![
                Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("  "),
                Span::styled(format!("[{badge}]"), Style::default().fg(color)),
            ]));
            lines.push(Line::default());
        }

        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "type symbol  Enter load  ←/→ inspect  Home/End jump  Esc quit";
        let p = Paragraph::new(Span::styled(help, Style::default().fg(Color::Gray)))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '-'
}

fn normalize_input(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| is_symbol_char(*c))
        .take(MAX_INPUT)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// `date: Historical Price: $x | Predicted Price: $y` for the hovered index.
fn tooltip_line(spec: &ChartSpec, hover: Option<usize>) -> Line<'static> {
    let Some(i) = hover else {
        return Line::default();
    };
    let title = spec.tooltip_title(i).unwrap_or_default().to_string();
    let body = spec.tooltip(i).join(" | ");
    Line::from(vec![
        Span::styled(format!("{title}: "), Style::default().fg(Color::Gray)),
        Span::raw(body),
    ])
}

/// Badge colors for the moving average, RSI and MACD rows.
fn signal_colors(ind: &TechnicalIndicatorSnapshot) -> [Color; 3] {
    let trend = match ind.trend {
        Trend::Bullish => Color::Green,
        Trend::Bearish => Color::Red,
        Trend::Neutral => Color::Yellow,
    };
    let rsi = match ind.rsi_signal {
        RsiSignal::Overbought => Color::Red,
        RsiSignal::Oversold => Color::Green,
        RsiSignal::Neutral => Color::Yellow,
    };
    let macd = if ind.macd_signal.is_bullish() { Color::Green } else { Color::Red };
    [trend, rsi, macd]
}
