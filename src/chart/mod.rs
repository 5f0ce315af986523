//! Declarative chart description for an aligned price/forecast timeline.
//!
//! `present` is a pure transform: it never draws anything. Renderers (the TUI
//! Plotters widget, the ASCII plot, or an external consumer of the JSON export)
//! read the resulting [`ChartSpec`] and decide how to honour each hint.

use serde::{Deserialize, Serialize};

use crate::domain::AlignedTimeline;

pub const HISTORICAL_LABEL: &str = "Historical Price";
pub const FORECAST_LABEL: &str = "Predicted Price";

/// RGBA color; `a` is in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

/// Display configuration for [`ChartPresenter`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub historical_color: Rgba,
    pub forecast_color: Rgba,
    pub fill_alpha: f32,
    pub line_width: f32,
    pub tension: f32,
    /// Dash pattern (on, off) for the forecast line.
    pub forecast_dash: [u8; 2],
    pub point_radius: f32,
    pub point_hover_radius: f32,
    /// Fixed x tick rotation in degrees.
    pub x_tick_rotation: f32,
    /// Fraction of the value span added above and below the fitted y range.
    pub y_padding: f64,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            historical_color: Rgba::rgb(59, 130, 246),
            forecast_color: Rgba::rgb(249, 115, 22),
            fill_alpha: 0.1,
            line_width: 2.0,
            tension: 0.4,
            forecast_dash: [5, 5],
            point_radius: 0.0,
            point_hover_radius: 4.0,
            x_tick_rotation: 45.0,
            y_padding: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub label: String,
    /// One entry per x label; `None` leaves a gap.
    pub values: Vec<Option<f64>>,
    pub line: LineKind,
    pub dash: Option<[u8; 2]>,
    pub border_color: Rgba,
    pub fill: bool,
    pub fill_color: Rgba,
    pub line_width: f32,
    pub tension: f32,
    pub point_radius: f32,
    pub point_hover_radius: f32,
}

impl SeriesSpec {
    /// Present `(index, value)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// How numeric values are turned into tick and tooltip text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ValueFormat {
    Currency { prefix: String, decimals: usize },
}

impl ValueFormat {
    pub fn dollars() -> Self {
        ValueFormat::Currency {
            prefix: "$".to_string(),
            decimals: 2,
        }
    }

    pub fn format(&self, value: f64) -> String {
        match self {
            ValueFormat::Currency { prefix, decimals } => {
                format!("{prefix}{value:.prec$}", prec = *decimals)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XAxisSpec {
    pub labels: Vec<String>,
    pub min_rotation: f32,
    pub max_rotation: f32,
    pub grid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YAxisSpec {
    pub begin_at_zero: bool,
    pub tick_format: ValueFormat,
    /// Fitted `[min, max]` over the present values; `None` when there are none.
    pub range: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    /// Hovering an x position highlights every series at that index.
    Index,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TooltipSpec {
    pub mode: InteractionMode,
    pub intersect: bool,
    pub value_format: ValueFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub series: Vec<SeriesSpec>,
    pub x_axis: XAxisSpec,
    pub y_axis: YAxisSpec,
    pub tooltip: TooltipSpec,
}

impl ChartSpec {
    pub fn len(&self) -> usize {
        self.x_axis.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x_axis.labels.is_empty()
    }

    /// Tooltip lines for one x index: one per series that has a value there.
    pub fn tooltip(&self, index: usize) -> Vec<String> {
        self.series
            .iter()
            .filter_map(|s| {
                let v = s.values.get(index).copied().flatten()?;
                Some(format!("{}: {}", s.label, self.tooltip.value_format.format(v)))
            })
            .collect()
    }

    /// Tooltip title for one x index (the label), if the index is in range.
    pub fn tooltip_title(&self, index: usize) -> Option<&str> {
        self.x_axis.labels.get(index).map(String::as_str)
    }
}

/// Builds [`ChartSpec`]s from aligned timelines.
#[derive(Debug, Clone, Default)]
pub struct ChartPresenter {
    style: ChartStyle,
}

impl ChartPresenter {
    pub fn new(style: ChartStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &ChartStyle {
        &self.style
    }

    pub fn present(&self, timeline: &AlignedTimeline, symbol_label: &str) -> ChartSpec {
        let s = &self.style;

        let historical = SeriesSpec {
            label: HISTORICAL_LABEL.to_string(),
            values: timeline.historical.clone(),
            line: LineKind::Solid,
            dash: None,
            border_color: s.historical_color,
            fill: true,
            fill_color: s.historical_color.with_alpha(s.fill_alpha),
            line_width: s.line_width,
            tension: s.tension,
            point_radius: s.point_radius,
            point_hover_radius: s.point_hover_radius,
        };
        let forecast = SeriesSpec {
            label: FORECAST_LABEL.to_string(),
            values: timeline.forecast.clone(),
            line: LineKind::Dashed,
            dash: Some(s.forecast_dash),
            border_color: s.forecast_color,
            fill: true,
            fill_color: s.forecast_color.with_alpha(s.fill_alpha),
            line_width: s.line_width,
            tension: s.tension,
            point_radius: s.point_radius,
            point_hover_radius: s.point_hover_radius,
        };

        ChartSpec {
            title: format!("{symbol_label} Stock Price History and Predictions"),
            series: vec![historical, forecast],
            x_axis: XAxisSpec {
                labels: timeline.labels.clone(),
                min_rotation: s.x_tick_rotation,
                max_rotation: s.x_tick_rotation,
                grid: false,
            },
            y_axis: YAxisSpec {
                begin_at_zero: false,
                tick_format: ValueFormat::dollars(),
                range: fitted_range(timeline, s.y_padding),
            },
            tooltip: TooltipSpec {
                mode: InteractionMode::Index,
                intersect: false,
                value_format: ValueFormat::dollars(),
            },
        }
    }
}

/// Present with the default style.
pub fn present(timeline: &AlignedTimeline, symbol_label: &str) -> ChartSpec {
    ChartPresenter::default().present(timeline, symbol_label)
}

fn fitted_range(timeline: &AlignedTimeline, padding: f64) -> Option<[f64; 2]> {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in timeline.values().filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    // A flat series still needs a non-degenerate axis.
    let span = if hi > lo { hi - lo } else { lo.abs().max(1.0) };
    let pad = span * padding;
    Some([lo - pad, hi + pad])
}
