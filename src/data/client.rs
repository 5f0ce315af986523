//! MarketSense REST API integration.
//!
//! Two read endpoints keyed by symbol:
//!
//! - `GET {base}/stocks/{symbol}`: quote + company overview
//! - `GET {base}/stocks/{symbol}/history`: daily closes, forecast, indicators
//!
//! Every failure is normalized into [`FetchError`] here, so nothing above this
//! boundary sees `reqwest` or `serde_json` errors.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::{
    ForecastPoint, MacdSignal, PricePoint, RsiSignal, StockHistory, StockOverview, Symbol,
    TechnicalIndicatorSnapshot, Trend,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The service answered with a non-success status.
    #[error("request rejected with status {status}{}", detail_suffix(.detail))]
    Rejected { status: u16, detail: Option<String> },
    /// The request never produced a response (DNS, connect, timeout).
    #[error("request failed: {0}")]
    Transport(String),
    /// The response body did not match the expected schema.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Human-readable description supplied by the service, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            FetchError::Rejected { detail, .. } => detail.as_deref().filter(|d| !d.trim().is_empty()),
            FetchError::Transport(_) | FetchError::Malformed(_) => None,
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

/// Upstream collaborator providing the two payloads for a symbol.
#[async_trait]
pub trait StockDataSource: Send + Sync {
    async fn fetch_overview(&self, symbol: &Symbol) -> Result<StockOverview, FetchError>;

    async fn fetch_history(&self, symbol: &Symbol) -> Result<StockHistory, FetchError>;
}

pub struct HttpStockClient {
    client: Client,
    base: Url,
}

impl HttpStockClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build HTTP client: {e}")))?;
        let base = Url::parse(base_url.trim())
            .map_err(|e| FetchError::Transport(format!("invalid base URL '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::Transport(format!("invalid base URL '{base_url}'")));
        }
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// `{base}/stocks/{symbol}`
    pub fn overview_url(&self, symbol: &Symbol) -> Url {
        self.endpoint(&["stocks", symbol.as_str()])
    }

    /// `{base}/stocks/{symbol}/history`
    pub fn history_url(&self, symbol: &Symbol) -> Url {
        self.endpoint(&["stocks", symbol.as_str(), "history"])
    }

    /// Append path segments to the base; each segment is percent-encoded, so a
    /// symbol can never add segments, a query or a fragment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        debug!(%url, "GET");

        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(format!("failed to read response body: {e}")))?;
        debug!(%url, status = status.as_u16(), bytes = body.len(), "response");

        if !status.is_success() {
            return Err(FetchError::Rejected {
                status: status.as_u16(),
                detail: parse_error_detail(&body),
            });
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl StockDataSource for HttpStockClient {
    async fn fetch_overview(&self, symbol: &Symbol) -> Result<StockOverview, FetchError> {
        let body = self.get(self.overview_url(symbol)).await?;
        parse_overview(&body)
    }

    async fn fetch_history(&self, symbol: &Symbol) -> Result<StockHistory, FetchError> {
        let body = self.get(self.history_url(symbol)).await?;
        parse_history(&body)
    }
}

#[derive(Debug, Deserialize)]
struct OverviewResponse {
    symbol: String,
    company_name: String,
    current_price: f64,
    change_percent: f64,
    volume: f64,
    market_cap: f64,
    #[serde(default)]
    last_updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    data: Vec<Bar>,
    #[serde(default)]
    predictions: Vec<Prediction>,
    technical_indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Bar {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Close")]
    close: f64,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Predicted_Close")]
    predicted_close: f64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    ma20: Option<f64>,
    rsi: Option<f64>,
    macd: Option<f64>,
    signal_line: Option<f64>,
    #[serde(default)]
    trend: String,
    #[serde(default)]
    rsi_signal: String,
    #[serde(default)]
    macd_signal: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

pub fn parse_overview(body: &[u8]) -> Result<StockOverview, FetchError> {
    let raw: OverviewResponse =
        serde_json::from_slice(body).map_err(|e| FetchError::Malformed(format!("overview: {e}")))?;
    Ok(StockOverview {
        symbol: raw.symbol,
        company_name: raw.company_name,
        current_price: raw.current_price,
        change_percent: raw.change_percent,
        volume: raw.volume,
        market_cap: raw.market_cap,
        last_updated: raw.last_updated,
    })
}

pub fn parse_history(body: &[u8]) -> Result<StockHistory, FetchError> {
    let raw: HistoryResponse =
        serde_json::from_slice(body).map_err(|e| FetchError::Malformed(format!("history: {e}")))?;

    let historical = raw
        .data
        .into_iter()
        .map(|b| PricePoint { date: b.date, close: b.close })
        .collect();
    let forecast = raw
        .predictions
        .into_iter()
        .map(|p| ForecastPoint { date: p.date, predicted_close: p.predicted_close })
        .collect();

    let ind = raw.technical_indicators;
    let indicators = TechnicalIndicatorSnapshot {
        moving_average_20: ind.ma20,
        rsi: ind.rsi,
        macd: ind.macd,
        signal_line: ind.signal_line,
        trend: Trend::from_label(&ind.trend),
        rsi_signal: RsiSignal::from_label(&ind.rsi_signal),
        macd_signal: MacdSignal::from_label(&ind.macd_signal),
    };

    Ok(StockHistory { historical, forecast, indicators })
}

/// Extract `{"detail": "..."}` from an error body.
///
/// Validation errors carry a structured (non-string) `detail`; those are not
/// meant for end users and are ignored.
pub fn parse_error_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OVERVIEW: &str = r#"{
        "symbol": "AAPL",
        "company_name": "Apple Inc",
        "current_price": 227.52,
        "change_percent": -1.234,
        "volume": 48123456,
        "market_cap": 3450000000000.0,
        "last_updated": "2025-01-15T16:00:00.000001"
    }"#;

    const HISTORY: &str = r#"{
        "symbol": "AAPL",
        "data": [
            {"Date": "2025-01-13", "Open": 1.0, "High": 2.0, "Low": 0.5, "Close": 234.4, "Volume": 100},
            {"Date": "2025-01-14", "Open": 1.0, "High": 2.0, "Low": 0.5, "Close": 233.28, "Volume": 100}
        ],
        "technical_indicators": {
            "ma20": null,
            "rsi": 41.5,
            "macd": -1.2,
            "signal_line": -0.8,
            "trend": "Bearish",
            "rsi_signal": "Neutral",
            "macd_signal": "Sell"
        },
        "predictions": [
            {"Date": "2025-01-15", "Predicted_Close": 232.1}
        ]
    }"#;

    #[test]
    fn parses_overview_payload() {
        let o = parse_overview(OVERVIEW.as_bytes()).unwrap();
        assert_eq!(o.symbol, "AAPL");
        assert_eq!(o.company_name, "Apple Inc");
        assert_eq!(o.volume, 48_123_456.0);
        assert_eq!(o.market_cap, 3.45e12);
        assert_eq!(o.last_updated.as_deref(), Some("2025-01-15T16:00:00.000001"));
    }

    #[test]
    fn parses_history_payload() {
        let h = parse_history(HISTORY.as_bytes()).unwrap();
        assert_eq!(h.historical.len(), 2);
        assert_eq!(h.historical[1].close, 233.28);
        assert_eq!(h.historical[0].date, NaiveDate::from_ymd_opt(2025, 1, 13).unwrap());
        assert_eq!(h.forecast.len(), 1);
        assert_eq!(h.forecast[0].predicted_close, 232.1);
        assert_eq!(h.indicators.moving_average_20, None);
        assert_eq!(h.indicators.rsi, Some(41.5));
        assert_eq!(h.indicators.trend, Trend::Bearish);
        assert_eq!(h.indicators.macd_signal, MacdSignal::Sell);
    }

    #[test]
    fn missing_fields_are_malformed() {
        let err = parse_overview(br#"{"symbol": "AAPL"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
        assert_eq!(err.detail(), None);

        let err = parse_history(b"not json").unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn error_detail_only_from_string_detail() {
        assert_eq!(
            parse_error_detail(br#"{"detail": "No data found for symbol ZZZZ"}"#).as_deref(),
            Some("No data found for symbol ZZZZ")
        );
        assert_eq!(parse_error_detail(br#"{"detail": [{"loc": ["path"]}]}"#), None);
        assert_eq!(parse_error_detail(br#"{"detail": "  "}"#), None);
        assert_eq!(parse_error_detail(b"<html>502</html>"), None);
    }

    #[test]
    fn rejected_error_exposes_detail() {
        let err = FetchError::Rejected { status: 404, detail: Some("symbol not found".into()) };
        assert_eq!(err.detail(), Some("symbol not found"));
        assert_eq!(err.to_string(), "request rejected with status 404: symbol not found");

        let err = FetchError::Rejected { status: 500, detail: None };
        assert_eq!(err.detail(), None);
        assert_eq!(err.to_string(), "request rejected with status 500");
    }

    #[test]
    fn client_trims_trailing_slash() {
        let c = HttpStockClient::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(c.base_url(), "http://localhost:8000");
    }

    #[test]
    fn endpoints_keep_the_symbol_in_one_segment() {
        let c = HttpStockClient::new("http://localhost:8000", Duration::from_secs(1)).unwrap();
        let aapl = Symbol::parse("aapl").unwrap();
        assert_eq!(c.overview_url(&aapl).as_str(), "http://localhost:8000/stocks/AAPL");
        assert_eq!(c.history_url(&aapl).as_str(), "http://localhost:8000/stocks/AAPL/history");

        let hash = Symbol::parse("A#B").unwrap();
        assert_eq!(c.history_url(&hash).as_str(), "http://localhost:8000/stocks/A%23B/history");

        let slash = Symbol::parse("msft/history").unwrap();
        assert_eq!(c.overview_url(&slash).as_str(), "http://localhost:8000/stocks/MSFT%2FHISTORY");

        let query = Symbol::parse("X?y=1").unwrap();
        assert_eq!(c.overview_url(&query).as_str(), "http://localhost:8000/stocks/X%3FY=1");
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let c = HttpStockClient::new("https://api.test/v1/", Duration::from_secs(1)).unwrap();
        let sym = Symbol::parse("BRK.B").unwrap();
        assert_eq!(c.history_url(&sym).as_str(), "https://api.test/v1/stocks/BRK.B/history");
        assert_eq!(c.base_url(), "https://api.test/v1");
    }

    #[test]
    fn unparseable_base_url_is_rejected() {
        assert!(HttpStockClient::new("not a url", Duration::from_secs(1)).is_err());
    }
}
