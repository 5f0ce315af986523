//! Upstream data collaborators.
//!
//! `StockDataSource` is the seam the core depends on; `HttpStockClient` is the
//! production implementation.

pub mod client;

pub use client::{FetchError, HttpStockClient, StockDataSource};

#[cfg(test)]
pub(crate) mod stub {
    //! In-memory `StockDataSource` for orchestrator and controller tests.

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};

    use super::{FetchError, StockDataSource};
    use crate::domain::{
        ForecastPoint, MacdSignal, PricePoint, RsiSignal, StockHistory, StockOverview, Symbol,
        TechnicalIndicatorSnapshot, Trend,
    };

    pub struct StubSource {
        pub overview: Mutex<Result<StockOverview, FetchError>>,
        pub history: Mutex<Result<StockHistory, FetchError>>,
        pub calls: AtomicUsize,
        /// Legs that ran to completion (a dropped leg never counts).
        pub finished: AtomicUsize,
        /// Time each leg waits before answering: `[overview, history]`.
        pub delays: [StdDuration; 2],
    }

    impl StubSource {
        pub fn ok(symbol: &str, n_hist: usize, n_fcst: usize) -> Self {
            Self {
                overview: Mutex::new(Ok(overview(symbol))),
                history: Mutex::new(Ok(history(n_hist, n_fcst))),
                calls: AtomicUsize::new(0),
                finished: AtomicUsize::new(0),
                delays: [StdDuration::ZERO; 2],
            }
        }

        pub fn with_delays(mut self, overview: StdDuration, history: StdDuration) -> Self {
            self.delays = [overview, history];
            self
        }

        pub fn failing_overview(detail: Option<&str>) -> Self {
            let src = Self::ok("X", 5, 3);
            *src.overview.lock().unwrap() = Err(FetchError::Rejected {
                status: 404,
                detail: detail.map(str::to_string),
            });
            src
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn finished(&self) -> usize {
            self.finished.load(Ordering::SeqCst)
        }

        async fn answer<T: Clone + Send>(
            &self,
            delay: StdDuration,
            slot: &Mutex<Result<T, FetchError>>,
        ) -> Result<T, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.finished.fetch_add(1, Ordering::SeqCst);
            let out = slot.lock().unwrap().clone();
            out
        }
    }

    #[async_trait]
    impl StockDataSource for StubSource {
        async fn fetch_overview(&self, _symbol: &Symbol) -> Result<StockOverview, FetchError> {
            self.answer(self.delays[0], &self.overview).await
        }

        async fn fetch_history(&self, _symbol: &Symbol) -> Result<StockHistory, FetchError> {
            self.answer(self.delays[1], &self.history).await
        }
    }

    pub fn overview(symbol: &str) -> StockOverview {
        StockOverview {
            symbol: symbol.to_string(),
            company_name: format!("{symbol} Corp"),
            current_price: 187.25,
            change_percent: 1.5,
            volume: 52_300_000.0,
            market_cap: 2.9e12,
            last_updated: None,
        }
    }

    /// `n_hist` consecutive days from 2025-01-01, then `n_fcst` forecast days.
    pub fn history(n_hist: usize, n_fcst: usize) -> StockHistory {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let historical = (0..n_hist)
            .map(|i| PricePoint {
                date: start + Duration::days(i as i64),
                close: 180.0 + i as f64,
            })
            .collect();
        let forecast = (0..n_fcst)
            .map(|i| ForecastPoint {
                date: start + Duration::days((n_hist + i) as i64),
                predicted_close: 190.0 + i as f64,
            })
            .collect();
        StockHistory {
            historical,
            forecast,
            indicators: TechnicalIndicatorSnapshot {
                moving_average_20: Some(182.4),
                rsi: Some(55.0),
                macd: Some(0.8),
                signal_line: Some(0.5),
                trend: Trend::Bullish,
                rsi_signal: RsiSignal::Neutral,
                macd_signal: MacdSignal::Buy,
            },
        }
    }
}
