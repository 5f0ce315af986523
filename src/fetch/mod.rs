//! Concurrent overview + history load for one symbol.
//!
//! Both requests are issued together and joined; the load either yields both
//! payloads or a single failure message. Nothing here retries or touches view
//! state.

use std::sync::Arc;

use tracing::{info, warn};

use crate::data::{FetchError, StockDataSource};
use crate::domain::{StockHistory, StockOverview, Symbol};

pub const GENERIC_FAILURE: &str = "Failed to fetch stock data. Please try again.";

/// Both payloads from a successful load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadPayload {
    pub overview: StockOverview,
    pub history: StockHistory,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Success(Box<LoadPayload>),
    Failure { message: String },
}

impl LoadOutcome {
    pub fn from_error(err: &FetchError) -> Self {
        LoadOutcome::Failure {
            message: failure_message(err),
        }
    }
}

/// The service's own description when it sent one, else the generic message.
pub fn failure_message(err: &FetchError) -> String {
    err.detail().unwrap_or(GENERIC_FAILURE).to_string()
}

#[derive(Clone)]
pub struct FetchOrchestrator {
    source: Arc<dyn StockDataSource>,
}

impl FetchOrchestrator {
    pub fn new(source: Arc<dyn StockDataSource>) -> Self {
        Self { source }
    }

    /// Load everything the dashboard shows for `symbol`.
    ///
    /// Returns `None` without issuing a request when `symbol` is blank. The
    /// first failing request ends the join and the other one is dropped.
    pub async fn load(&self, symbol: &str) -> Option<LoadOutcome> {
        let symbol = Symbol::parse(symbol)?;
        info!(%symbol, "loading");

        let joined = tokio::try_join!(
            self.source.fetch_overview(&symbol),
            self.source.fetch_history(&symbol),
        );

        let outcome = match joined {
            Ok((overview, history)) => {
                info!(
                    %symbol,
                    historical = history.historical.len(),
                    forecast = history.forecast.len(),
                    "loaded"
                );
                LoadOutcome::Success(Box::new(LoadPayload { overview, history }))
            }
            Err(err) => {
                warn!(%symbol, error = %err, "load failed");
                LoadOutcome::from_error(&err)
            }
        };
        Some(outcome)
    }
}
