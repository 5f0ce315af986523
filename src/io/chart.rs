//! Write `ChartSpec` JSON.
//!
//! This is the hand-off format for rendering surfaces that live outside this
//! process: every styling and formatting hint travels with the data.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::chart::ChartSpec;
use crate::error::AppError;

/// Pretty-printed JSON for a chart spec.
pub fn chart_json(spec: &ChartSpec) -> Result<String, AppError> {
    serde_json::to_string_pretty(spec).map_err(|e| AppError::io(format!("Failed to encode chart JSON: {e}")))
}

/// Write the chart spec to `path`, or to stdout when `path` is `None`.
pub fn write_chart_json(path: Option<&Path>, spec: &ChartSpec) -> Result<(), AppError> {
    let json = chart_json(spec)?;
    match path {
        Some(path) => {
            let mut file = File::create(path)
                .map_err(|e| AppError::io(format!("Failed to create chart JSON '{}': {e}", path.display())))?;
            writeln!(file, "{json}").map_err(|e| AppError::io(format!("Failed to write chart JSON: {e}")))
        }
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::present;
    use crate::domain::AlignedTimeline;

    #[test]
    fn json_round_trips_absent_values_as_null() {
        let t = AlignedTimeline {
            labels: vec!["1/2/2025".into(), "1/3/2025".into()],
            historical: vec![Some(10.0), None],
            forecast: vec![None, Some(11.0)],
            split: 1,
        };
        let spec = present(&t, "AAPL");
        let json = chart_json(&spec).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["series"][0]["values"], serde_json::json!([10.0, null]));
        assert_eq!(value["series"][1]["values"], serde_json::json!([null, 11.0]));

        let back: ChartSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
