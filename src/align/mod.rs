//! Merge observed history and forecast into one overlay timeline.
//!
//! History occupies the prefix of the timeline and the forecast the suffix.
//! Each value series is padded with `None` over the other's region, so a
//! renderer can draw both against a single label axis.

use std::fmt::Write;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{AlignedTimeline, DEFAULT_LABEL_FORMAT, ForecastPoint, PricePoint};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignError {
    #[error(
        "Forecast overlaps historical data (history ends {last_historical}, forecast starts {first_forecast})."
    )]
    ForecastOverlap {
        last_historical: NaiveDate,
        first_forecast: NaiveDate,
    },
}

/// Align with the default label format.
pub fn align(historical: &[PricePoint], forecast: &[ForecastPoint]) -> AlignedTimeline {
    align_with(historical, forecast, DEFAULT_LABEL_FORMAT)
}

/// Align with an explicit chrono label format.
///
/// Input order is preserved; dates are neither sorted nor de-duplicated.
pub fn align_with(
    historical: &[PricePoint],
    forecast: &[ForecastPoint],
    label_format: &str,
) -> AlignedTimeline {
    let n = historical.len() + forecast.len();
    let mut labels = Vec::with_capacity(n);
    let mut hist = Vec::with_capacity(n);
    let mut pred = Vec::with_capacity(n);

    for p in historical {
        labels.push(label(p.date, label_format));
        hist.push(Some(p.close));
        pred.push(None);
    }
    for p in forecast {
        labels.push(label(p.date, label_format));
        hist.push(None);
        pred.push(Some(p.predicted_close));
    }

    AlignedTimeline {
        labels,
        historical: hist,
        forecast: pred,
        split: historical.len(),
    }
}

/// Render one date with `label_format`.
///
/// Returns `None` when the format needs fields a plain date does not have
/// (`%H`, `%z`, ...).
pub fn format_label(date: NaiveDate, label_format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(label_format)).ok()?;
    Some(out)
}

/// ISO date when `label_format` cannot render a date.
fn label(date: NaiveDate, label_format: &str) -> String {
    format_label(date, label_format).unwrap_or_else(|| date.format("%Y-%m-%d").to_string())
}

/// Like [`align_with`], but rejects a forecast that does not start strictly
/// after the last observed date.
pub fn align_checked(
    historical: &[PricePoint],
    forecast: &[ForecastPoint],
    label_format: &str,
) -> Result<AlignedTimeline, AlignError> {
    if let (Some(last), Some(first)) = (historical.last(), forecast.first())
        && first.date <= last.date
    {
        return Err(AlignError::ForecastOverlap {
            last_historical: last.date,
            first_forecast: first.date,
        });
    }
    Ok(align_with(historical, forecast, label_format))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn history(days: &[u32]) -> Vec<PricePoint> {
        days.iter()
            .map(|&d| PricePoint { date: day(d), close: 100.0 + d as f64 })
            .collect()
    }

    fn forecast(days: &[u32]) -> Vec<ForecastPoint> {
        days.iter()
            .map(|&d| ForecastPoint { date: day(d), predicted_close: 200.0 + d as f64 })
            .collect()
    }

    #[test]
    fn partitions_history_prefix_and_forecast_suffix() {
        let h = history(&[2, 3, 6, 7, 8]);
        let f = forecast(&[9, 10, 11]);
        let t = align(&h, &f);

        assert_eq!(t.labels.len(), 8);
        assert_eq!(t.historical.len(), 8);
        assert_eq!(t.forecast.len(), 8);
        assert_eq!(t.split, 5);

        for i in 0..5 {
            assert_eq!(t.historical[i], Some(h[i].close));
            assert_eq!(t.forecast[i], None);
        }
        for i in 5..8 {
            assert_eq!(t.historical[i], None);
            assert_eq!(t.forecast[i], Some(f[i - 5].predicted_close));
        }
    }

    #[test]
    fn labels_use_us_short_dates_in_input_order() {
        let h = history(&[15, 14]);
        let f = forecast(&[16]);
        let t = align(&h, &f);
        assert_eq!(t.labels, vec!["1/15/2025", "1/14/2025", "1/16/2025"]);
    }

    #[test]
    fn custom_label_format() {
        let t = align_with(&history(&[2]), &forecast(&[3]), "%Y-%m-%d");
        assert_eq!(t.labels, vec!["2025-01-02", "2025-01-03"]);
    }

    #[test]
    fn time_only_format_falls_back_to_iso_dates() {
        assert_eq!(format_label(day(2), "%H:%M"), None);
        assert_eq!(format_label(day(2), "%d.%m."), Some("02.01.".to_string()));

        let t = align_with(&history(&[2]), &forecast(&[3]), "%H:%M");
        assert_eq!(t.labels, vec!["2025-01-02", "2025-01-03"]);
    }

    #[test]
    fn empty_inputs_are_legal() {
        let t = align(&[], &[]);
        assert!(t.labels.is_empty());
        assert!(t.historical.is_empty());
        assert!(t.forecast.is_empty());
        assert_eq!(t.split, 0);

        let t = align(&history(&[2, 3]), &[]);
        assert_eq!(t.len(), 2);
        assert!(t.forecast.iter().all(Option::is_none));

        let t = align(&[], &forecast(&[4]));
        assert_eq!(t.historical, vec![None]);
        assert_eq!(t.forecast, vec![Some(204.0)]);
    }

    #[test]
    fn overlapping_dates_are_kept_by_unchecked_align() {
        let t = align(&history(&[5]), &forecast(&[5]));
        assert_eq!(t.labels, vec!["1/5/2025", "1/5/2025"]);
    }

    #[test]
    fn checked_align_rejects_overlap() {
        let err = align_checked(&history(&[4, 5]), &forecast(&[5, 6]), DEFAULT_LABEL_FORMAT).unwrap_err();
        assert_eq!(
            err,
            AlignError::ForecastOverlap { last_historical: day(5), first_forecast: day(5) }
        );
        assert!(err.to_string().contains("2025-01-05"));
    }

    #[test]
    fn checked_align_accepts_disjoint_or_one_sided_input() {
        assert!(align_checked(&history(&[4, 5]), &forecast(&[6]), DEFAULT_LABEL_FORMAT).is_ok());
        assert!(align_checked(&history(&[4]), &[], DEFAULT_LABEL_FORMAT).is_ok());
        assert!(align_checked(&[], &forecast(&[1]), DEFAULT_LABEL_FORMAT).is_ok());
    }
}
