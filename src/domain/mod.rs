//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the validated ticker (`Symbol`)
//! - upstream payload values (`PricePoint`, `ForecastPoint`, `StockOverview`,
//!   `TechnicalIndicatorSnapshot`)
//! - the derived overlay structure (`AlignedTimeline`)
//! - session configuration (`DashboardConfig`)

pub mod types;

pub use types::*;
