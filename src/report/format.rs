//! Display formatting for headline statistics and indicator summaries.
//!
//! We keep formatting code in one place so:
//! - the controller and chart code stay free of presentation strings
//! - the TUI and the plain-text `show` command print identical numbers

use crate::dashboard::{Phase, ViewState};
use crate::domain::{StockOverview, TechnicalIndicatorSnapshot};

/// Abbreviate large magnitudes: `T`, `B`, `M` with two decimals, otherwise a
/// comma-grouped integer.
pub fn format_large_number(n: f64) -> String {
    if !n.is_finite() {
        return "-".to_string();
    }
    if n >= 1e12 {
        format!("{:.2}T", n / 1e12)
    } else if n >= 1e9 {
        format!("{:.2}B", n / 1e9)
    } else if n >= 1e6 {
        format!("{:.2}M", n / 1e6)
    } else {
        group_thousands(n.round() as i64)
    }
}

/// `12345` -> `12,345`.
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `$` + two decimals.
pub fn format_price(v: f64) -> String {
    format!("${v:.2}")
}

/// Signed percent with two decimals, e.g. `+1.50%` / `-0.25%`.
pub fn format_change_percent(v: f64) -> String {
    if v >= 0.0 {
        format!("+{v:.2}%")
    } else {
        format!("{v:.2}%")
    }
}

/// Optional indicator value; absent values render as `-`.
pub fn format_opt(v: Option<f64>, price: bool) -> String {
    match v {
        Some(v) if price => format_price(v),
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

/// The four headline cards as `(label, value)` pairs.
pub fn overview_cards(o: &StockOverview) -> [(&'static str, String); 4] {
    [
        (
            "Current Price",
            format!(
                "{} ({})",
                format_price(o.current_price),
                format_change_percent(o.change_percent)
            ),
        ),
        ("Volume", format_large_number(o.volume)),
        ("Market Cap", format!("${}", format_large_number(o.market_cap))),
        ("Company", o.company_name.clone()),
    ]
}

/// The three indicator panels as `(label, value, badge)` triples.
pub fn indicator_rows(ind: &TechnicalIndicatorSnapshot) -> [(&'static str, String, &'static str); 3] {
    [
        (
            "Moving Average (20-day)",
            format_opt(ind.moving_average_20, true),
            ind.trend.label(),
        ),
        ("RSI (14-day)", format_opt(ind.rsi, false), ind.rsi_signal.label()),
        ("MACD", format_opt(ind.macd, false), ind.macd_signal.label()),
    ]
}

/// Format the full dashboard summary for terminal output.
pub fn format_view_summary(state: &ViewState) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== MarketSense: {} ===\n", state.symbol));

    if let Some(message) = &state.error_message {
        out.push_str(&format!("Error: {message}\n"));
        return out;
    }
    if state.phase != Phase::Loaded {
        out.push_str("No data.\n");
        return out;
    }

    if let Some(o) = &state.overview {
        for (label, value) in overview_cards(o) {
            out.push_str(&format!("{label:<14} {value}\n"));
        }
        if let Some(ts) = &o.last_updated {
            out.push_str(&format!("{:<14} {ts}\n", "As of"));
        }
    }

    if let Some(t) = &state.timeline {
        out.push_str(&format!(
            "\nTimeline: {} points ({} historical, {} predicted)\n",
            t.len(),
            t.split,
            t.len() - t.split
        ));
    }

    if let Some(ind) = &state.indicators {
        out.push_str("\nTechnical analysis:\n");
        for (label, value, badge) in indicator_rows(ind) {
            out.push_str(&format!("  {label:<24} {value:>10}  [{badge}]\n"));
        }
        out.push_str(&format!(
            "  {:<24} {:>10}\n",
            "Signal Line",
            format_opt(ind.signal_line, false)
        ));
    }

    out
}
