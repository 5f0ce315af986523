//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between the fetch layer and the controller without copying wire structs
//! - exported to JSON/CSV
//! - rendered by any front-end (TUI, plain text, external chart renderer)

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default chrono format for timeline labels (US short date, e.g. `1/15/2025`).
pub const DEFAULT_LABEL_FORMAT: &str = "%-m/%-d/%Y";

/// Default MarketSense API location when neither a flag nor the environment sets one.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// A validated ticker symbol: trimmed, upper-cased and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Normalize raw user input. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One observed daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// One model-predicted close following the observed history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_close: f64,
}

/// Price relative to its 20-day moving average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Bullish,
    Bearish,
    /// Any other label the service may send.
    Neutral,
}

impl Trend {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "bullish" => Trend::Bullish,
            "bearish" => Trend::Bearish,
            _ => Trend::Neutral,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Trend::Bullish => "Bullish",
            Trend::Bearish => "Bearish",
            Trend::Neutral => "Neutral",
        }
    }
}

/// RSI(14) classification (`< 30` oversold, `> 70` overbought upstream).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiSignal {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiSignal {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "overbought" => RsiSignal::Overbought,
            "oversold" => RsiSignal::Oversold,
            _ => RsiSignal::Neutral,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RsiSignal::Overbought => "Overbought",
            RsiSignal::Oversold => "Oversold",
            RsiSignal::Neutral => "Neutral",
        }
    }
}

/// MACD line relative to its signal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacdSignal {
    Buy,
    Sell,
}

impl MacdSignal {
    /// Anything but `Buy` reads as `Sell`, matching how the service labels a
    /// MACD that is not above its signal line.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("buy") {
            MacdSignal::Buy
        } else {
            MacdSignal::Sell
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MacdSignal::Buy => "Buy",
            MacdSignal::Sell => "Sell",
        }
    }

    /// Buy reads as a bullish badge, sell as bearish.
    pub fn is_bullish(self) -> bool {
        matches!(self, MacdSignal::Buy)
    }
}

/// Indicator values evaluated at the most recent historical point.
///
/// Numeric fields are optional: the service reports `null` when the history is
/// too short for the rolling window (e.g. fewer than 20 closes for MA20).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicatorSnapshot {
    pub moving_average_20: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal_line: Option<f64>,
    pub trend: Trend,
    pub rsi_signal: RsiSignal,
    pub macd_signal: MacdSignal,
}

/// Point-in-time quote and company summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockOverview {
    pub symbol: String,
    pub company_name: String,
    pub current_price: f64,
    pub change_percent: f64,
    pub volume: f64,
    pub market_cap: f64,
    /// Timestamp text as sent by the service (not interpreted).
    pub last_updated: Option<String>,
}

/// History, forecast and indicators as returned together by the history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockHistory {
    pub historical: Vec<PricePoint>,
    pub forecast: Vec<ForecastPoint>,
    pub indicators: TechnicalIndicatorSnapshot,
}

/// A single label axis with two position-exclusive value series.
///
/// `labels`, `historical` and `forecast` always have the same length. Indices
/// below `split` carry only historical values, indices from `split` on carry
/// only forecast values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlignedTimeline {
    pub labels: Vec<String>,
    pub historical: Vec<Option<f64>>,
    pub forecast: Vec<Option<f64>>,
    pub split: usize,
}

impl AlignedTimeline {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Every present value from both series, in index order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.historical
            .iter()
            .chain(self.forecast.iter())
            .filter_map(|v| *v)
    }
}

/// A full session's configuration as understood by the clients and renderers.
///
/// This is derived from CLI flags layered over the environment.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    /// chrono format string used for timeline labels.
    pub label_format: String,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            label_format: DEFAULT_LABEL_FORMAT.to_string(),
            plot: true,
            plot_width: 100,
            plot_height: 25,
        }
    }
}
