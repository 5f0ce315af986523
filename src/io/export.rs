//! Export the aligned timeline to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts:
//! one row per label, empty cells where a series has no value.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::AlignedTimeline;
use crate::error::AppError;

/// Write `label,historical,predicted` rows to `path`.
pub fn write_timeline_csv(path: &Path, timeline: &AlignedTimeline) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_timeline(&mut file, timeline)
        .map_err(|e| AppError::io(format!("Failed to write export CSV: {e}")))
}

fn write_timeline<W: Write>(out: &mut W, timeline: &AlignedTimeline) -> std::io::Result<()> {
    writeln!(out, "label,historical,predicted")?;
    for ((label, h), f) in timeline
        .labels
        .iter()
        .zip(&timeline.historical)
        .zip(&timeline.forecast)
    {
        writeln!(out, "{},{},{}", csv_field(label), cell(*h), cell(*f))?;
    }
    Ok(())
}

fn cell(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.4}")).unwrap_or_default()
}

/// Quote a field when it contains a delimiter or quote.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
