//! Session view state and its transitions.
//!
//! `DashboardController` is the single writer of [`ViewState`]. State only
//! changes in [`DashboardController::submit`] and [`DashboardController::apply`],
//! so readers always observe one of the four phases fully formed.

use tracing::{debug, info};

use crate::align::align_checked;
use crate::chart::{ChartPresenter, ChartSpec};
use crate::domain::{
    AlignedTimeline, DEFAULT_LABEL_FORMAT, StockOverview, Symbol, TechnicalIndicatorSnapshot,
};
use crate::fetch::{FetchOrchestrator, GENERIC_FAILURE, LoadOutcome, LoadPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Errored,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub phase: Phase,
    /// Normalized symbol of the most recent accepted submit.
    pub symbol: String,
    pub loading: bool,
    pub error_message: Option<String>,
    pub overview: Option<StockOverview>,
    pub timeline: Option<AlignedTimeline>,
    pub indicators: Option<TechnicalIndicatorSnapshot>,
}

impl ViewState {
    /// Chart description for the current timeline, if any.
    pub fn chart(&self, presenter: &ChartPresenter) -> Option<ChartSpec> {
        self.timeline
            .as_ref()
            .map(|t| presenter.present(t, &self.symbol))
    }
}

/// Identifies one accepted submit. Only the latest ticket's outcome is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    id: u64,
    symbol: Symbol,
}

impl RequestTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }
}

#[derive(Debug, Clone)]
pub struct DashboardController {
    state: ViewState,
    label_format: String,
    last_issued: u64,
}

impl Default for DashboardController {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL_FORMAT)
    }
}

impl DashboardController {
    pub fn new(label_format: impl Into<String>) -> Self {
        Self {
            state: ViewState::default(),
            label_format: label_format.into(),
            last_issued: 0,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Accept a query. Blank input is ignored and leaves the state untouched.
    ///
    /// Re-submitting while a load is in flight is allowed; the earlier ticket
    /// becomes stale.
    pub fn submit(&mut self, raw: &str) -> Option<RequestTicket> {
        let symbol = Symbol::parse(raw)?;
        self.last_issued += 1;

        self.state.phase = Phase::Loading;
        self.state.symbol = symbol.to_string();
        self.state.loading = true;
        self.state.error_message = None;
        debug!(%symbol, request = self.last_issued, "-> loading");

        Some(RequestTicket {
            id: self.last_issued,
            symbol,
        })
    }

    /// Apply a finished load. Returns `false` when the ticket is stale and the
    /// outcome was discarded.
    pub fn apply(&mut self, ticket: &RequestTicket, outcome: LoadOutcome) -> bool {
        if ticket.id != self.last_issued {
            info!(
                symbol = %ticket.symbol,
                request = ticket.id,
                latest = self.last_issued,
                "discarding stale load"
            );
            return false;
        }

        match outcome {
            LoadOutcome::Success(payload) => {
                let LoadPayload { overview, history } = *payload;
                match align_checked(&history.historical, &history.forecast, &self.label_format) {
                    Ok(timeline) => {
                        self.state = ViewState {
                            phase: Phase::Loaded,
                            symbol: ticket.symbol.to_string(),
                            loading: false,
                            error_message: None,
                            overview: Some(overview),
                            timeline: Some(timeline),
                            indicators: Some(history.indicators),
                        };
                        debug!(symbol = %ticket.symbol, "-> loaded");
                    }
                    Err(err) => self.fail(ticket, err.to_string()),
                }
            }
            LoadOutcome::Failure { message } => self.fail(ticket, message),
        }
        true
    }

    /// Submit, load and apply in one step. Returns `false` for blank input.
    pub async fn run(&mut self, orchestrator: &FetchOrchestrator, raw: &str) -> bool {
        let Some(ticket) = self.submit(raw) else {
            return false;
        };
        let Some(outcome) = orchestrator.load(ticket.symbol.as_str()).await else {
            return false;
        };
        self.apply(&ticket, outcome)
    }

    fn fail(&mut self, ticket: &RequestTicket, message: String) {
        let message = if message.trim().is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            message
        };
        debug!(symbol = %ticket.symbol, %message, "-> errored");
        self.state = ViewState {
            phase: Phase::Errored,
            symbol: ticket.symbol.to_string(),
            loading: false,
            error_message: Some(message),
            overview: None,
            timeline: None,
            indicators: None,
        };
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::chart::present;
    use crate::data::stub::{self, StubSource};

    fn success(symbol: &str, n_hist: usize, n_fcst: usize) -> LoadOutcome {
        LoadOutcome::Success(Box::new(LoadPayload {
            overview: stub::overview(symbol),
            history: stub::history(n_hist, n_fcst),
        }))
    }

    #[test]
    fn blank_submit_leaves_state_unchanged() {
        let mut c = DashboardController::default();
        assert!(c.submit("").is_none());
        assert!(c.submit("   ").is_none());
        assert_eq!(c.state(), &ViewState::default());
        assert_eq!(c.state().phase, Phase::Idle);

        let t = c.submit("msft").unwrap();
        c.apply(&t, success("MSFT", 3, 1));
        let before = c.state().clone();
        assert!(c.submit(" ").is_none());
        assert_eq!(c.state(), &before);
    }

    #[test]
    fn submit_enters_loading_and_clears_error() {
        let mut c = DashboardController::default();
        let t = c.submit("zzzz").unwrap();
        c.apply(&t, LoadOutcome::Failure { message: "nope".into() });
        assert_eq!(c.state().error_message.as_deref(), Some("nope"));

        let t = c.submit(" aapl ").unwrap();
        assert_eq!(t.symbol().as_str(), "AAPL");
        assert_eq!(c.state().phase, Phase::Loading);
        assert!(c.state().loading);
        assert_eq!(c.state().error_message, None);
        assert_eq!(c.state().symbol, "AAPL");
    }

    #[test]
    fn success_replaces_everything() {
        let mut c = DashboardController::default();
        let t = c.submit("AAPL").unwrap();
        assert!(c.apply(&t, success("AAPL", 5, 3)));

        let s = c.state();
        assert_eq!(s.phase, Phase::Loaded);
        assert!(!s.loading);
        assert_eq!(s.overview.as_ref().unwrap().symbol, "AAPL");
        assert_eq!(s.timeline.as_ref().unwrap().len(), 8);
        assert!(s.indicators.is_some());

        let t = c.submit("MSFT").unwrap();
        c.apply(&t, success("MSFT", 2, 0));
        let s = c.state();
        assert_eq!(s.overview.as_ref().unwrap().symbol, "MSFT");
        assert_eq!(s.timeline.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn failure_clears_prior_data() {
        let mut c = DashboardController::default();
        let t = c.submit("AAPL").unwrap();
        c.apply(&t, success("AAPL", 5, 3));

        let t = c.submit("ZZZZ").unwrap();
        c.apply(&t, LoadOutcome::Failure { message: "symbol not found".into() });

        let s = c.state();
        assert_eq!(s.phase, Phase::Errored);
        assert!(!s.loading);
        assert_eq!(s.error_message.as_deref(), Some("symbol not found"));
        assert!(s.overview.is_none());
        assert!(s.timeline.is_none());
        assert!(s.indicators.is_none());
    }

    #[test]
    fn blank_failure_message_falls_back_to_generic() {
        let mut c = DashboardController::default();
        let t = c.submit("AAPL").unwrap();
        c.apply(&t, LoadOutcome::Failure { message: " ".into() });
        assert_eq!(c.state().error_message.as_deref(), Some(GENERIC_FAILURE));
    }

    #[test]
    fn stale_outcome_is_discarded() {
        let mut c = DashboardController::default();
        let old = c.submit("AAPL").unwrap();
        let new = c.submit("MSFT").unwrap();
        assert!(new.id() > old.id());

        assert!(c.apply(&new, success("MSFT", 4, 2)));
        assert!(!c.apply(&old, success("AAPL", 5, 3)));

        let s = c.state();
        assert_eq!(s.symbol, "MSFT");
        assert_eq!(s.overview.as_ref().unwrap().symbol, "MSFT");
        assert_eq!(s.timeline.as_ref().unwrap().len(), 6);
    }

    #[test]
    fn overlapping_forecast_is_an_error() {
        let mut c = DashboardController::default();
        let t = c.submit("AAPL").unwrap();
        let mut payload = LoadPayload {
            overview: stub::overview("AAPL"),
            history: stub::history(3, 2),
        };
        payload.history.forecast[0].date = payload.history.historical[1].date;
        c.apply(&t, LoadOutcome::Success(Box::new(payload)));

        let s = c.state();
        assert_eq!(s.phase, Phase::Errored);
        assert!(s.error_message.as_deref().unwrap().starts_with("Forecast overlaps"));
        assert!(s.timeline.is_none());
    }

    #[tokio::test]
    async fn end_to_end_success() {
        let orch = FetchOrchestrator::new(Arc::new(StubSource::ok("AAPL", 5, 3)));
        let mut c = DashboardController::default();
        assert!(c.run(&orch, "AAPL").await);

        let timeline = c.state().timeline.clone().unwrap();
        assert_eq!(timeline.labels.len(), 8);
        assert!(timeline.historical[..5].iter().all(Option::is_some));
        assert!(timeline.historical[5..].iter().all(Option::is_none));
        assert!(timeline.forecast[..5].iter().all(Option::is_none));
        assert!(timeline.forecast[5..].iter().all(Option::is_some));

        let spec = c.state().chart(&ChartPresenter::default()).unwrap();
        assert_eq!(spec.series.len(), 2);
        assert_eq!(spec, present(&timeline, "AAPL"));
    }

    #[tokio::test]
    async fn end_to_end_failure() {
        let orch = FetchOrchestrator::new(Arc::new(StubSource::failing_overview(Some(
            "symbol not found",
        ))));
        let mut c = DashboardController::default();
        assert!(c.run(&orch, "ZZZZ").await);

        let s = c.state();
        assert_eq!(s.error_message.as_deref(), Some("symbol not found"));
        assert!(!s.loading);
        assert!(s.timeline.is_none());
    }

    #[tokio::test]
    async fn run_ignores_blank_input() {
        let src = Arc::new(StubSource::ok("AAPL", 5, 3));
        let orch = FetchOrchestrator::new(src.clone());
        let mut c = DashboardController::default();
        assert!(!c.run(&orch, "  ").await);
        assert_eq!(src.calls(), 0);
        assert_eq!(c.state().phase, Phase::Idle);
    }
}
