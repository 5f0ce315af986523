//! Plotters-powered price chart widget for Ratatui.
//!
//! The widget draws a [`ChartSpec`] as-is: series colors, dash pattern, axis
//! range and tick formatting all come from the spec. The x axis is the timeline
//! index, labelled with the spec's date labels.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
// `ratatui::style::Color` below shadows the plotters trait that provides `mix`.
use plotters::style::Color as _;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::chart::{ChartSpec, LineKind, Rgba, SeriesSpec};

/// Render-only view over a chart spec plus the hovered index.
pub struct PriceChart<'a> {
    pub spec: &'a ChartSpec,
    pub hover: Option<usize>,
}

impl<'a> Widget for PriceChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let n = self.spec.len();
        let Some([y0, y1]) = y_bounds(self.spec) else {
            return;
        };
        let [x0, x1] = x_bounds(n);

        let spec = self.spec;
        let hover = self.hover.filter(|&i| i < n);

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 9)
                .set_label_area_size(LabelAreaPosition::Bottom, 2)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            let fmt_x = |v: &f64| label_at(&spec.x_axis.labels, *v);
            let fmt_y = |v: &f64| spec.y_axis.tick_format.format(*v);
            let mut mesh = chart.configure_mesh();
            if !spec.x_axis.grid {
                mesh.disable_x_mesh();
            }
            mesh.disable_y_mesh()
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&fmt_x)
                .y_label_formatter(&fmt_y)
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(WHITE)
                .bold_line_style(WHITE.mix(0.3))
                .draw()?;

            for series in &spec.series {
                let color = rgb(series.border_color);
                for run in runs(series) {
                    match series.line {
                        LineKind::Solid => {
                            chart.draw_series(LineSeries::new(run.iter().copied(), color))?;
                        }
                        LineKind::Dashed => {
                            chart.draw_series(
                                dashes(&run, series.dash.unwrap_or([5, 5]))
                                    .into_iter()
                                    .map(|seg| PathElement::new(seg.to_vec(), color)),
                            )?;
                        }
                    }
                    // A lone point has no line to show it.
                    if let [only] = run.as_slice() {
                        chart.draw_series(std::iter::once(Pixel::new(*only, color)))?;
                    }
                }
            }

            if let Some(i) = hover {
                let x = i as f64;
                chart.draw_series(std::iter::once(PathElement::new(
                    vec![(x, y0), (x, y1)],
                    WHITE.mix(0.5),
                )))?;
                for series in &spec.series {
                    if let Some(Some(v)) = series.values.get(i) {
                        chart.draw_series(std::iter::once(Pixel::new((x, *v), rgb(series.border_color))))?;
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

fn rgb(c: Rgba) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

fn x_bounds(n: usize) -> [f64; 2] {
    if n <= 1 {
        [-0.5, 0.5]
    } else {
        [0.0, (n - 1) as f64]
    }
}

fn y_bounds(spec: &ChartSpec) -> Option<[f64; 2]> {
    let [lo, hi] = spec.y_axis.range?;
    if lo.is_finite() && hi.is_finite() && hi > lo {
        Some([lo, hi])
    } else {
        None
    }
}

/// Tick label for a fractional index; only whole indices get a date.
fn label_at(labels: &[String], v: f64) -> String {
    let i = v.round();
    if i < 0.0 || (v - i).abs() > 1e-6 {
        return String::new();
    }
    labels.get(i as usize).cloned().unwrap_or_default()
}

/// Split a series into runs of consecutive present values.
fn runs(series: &SeriesSpec) -> Vec<Vec<(f64, f64)>> {
    let mut out: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut prev: Option<usize> = None;
    for (i, v) in series.points() {
        if prev.is_none_or(|p| p + 1 != i) {
            out.push(Vec::new());
        }
        if let Some(run) = out.last_mut() {
            run.push((i as f64, v));
        }
        prev = Some(i);
    }
    out
}

/// Break a polyline into "on" segments following an `[on, off]` pattern.
///
/// The pattern is applied per segment in relative units: `[5, 5]` draws the
/// first half of each tenth of a segment.
fn dashes(points: &[(f64, f64)], pattern: [u8; 2]) -> Vec<[(f64, f64); 2]> {
    let on = f64::from(pattern[0].max(1));
    let period = on + f64::from(pattern[1]);
    let steps = 5usize;

    let mut out = Vec::new();
    for w in points.windows(2) {
        let (a, b) = (w[0], w[1]);
        for k in 0..steps {
            let t0 = k as f64 / steps as f64;
            let t1 = t0 + (on / period) / steps as f64;
            out.push([lerp(a, b, t0), lerp(a, b, t1.min(1.0))]);
        }
    }
    out
}

fn lerp(a: (f64, f64), b: (f64, f64), t: f64) -> (f64, f64) {
    (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::present;
    use crate::domain::AlignedTimeline;

    fn spec() -> ChartSpec {
        let t = AlignedTimeline {
            labels: vec!["1/2/2025".into(), "1/3/2025".into(), "1/6/2025".into(), "1/7/2025".into()],
            historical: vec![Some(10.0), Some(11.0), None, None],
            forecast: vec![None, None, Some(12.0), Some(12.5)],
            split: 2,
        };
        present(&t, "AAPL")
    }

    #[test]
    fn runs_split_on_gaps() {
        let s = spec();
        assert_eq!(runs(&s.series[0]), vec![vec![(0.0, 10.0), (1.0, 11.0)]]);
        assert_eq!(runs(&s.series[1]), vec![vec![(2.0, 12.0), (3.0, 12.5)]]);
    }

    #[test]
    fn dashes_cover_half_of_each_step() {
        let d = dashes(&[(0.0, 0.0), (1.0, 1.0)], [5, 5]);
        assert_eq!(d.len(), 5);
        assert_eq!(d[0], [(0.0, 0.0), (0.1, 0.1)]);
        assert!((d[4][0].0 - 0.8).abs() < 1e-12);
    }

    #[test]
    fn only_whole_indices_get_labels() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert_eq!(label_at(&labels, 1.0), "b");
        assert_eq!(label_at(&labels, 0.5), "");
        assert_eq!(label_at(&labels, -1.0), "");
        assert_eq!(label_at(&labels, 7.0), "");
    }

    #[test]
    fn hovered_chart_draws_into_buffer() {
        let s = spec();
        let area = Rect::new(0, 0, 60, 20);
        let mut buf = Buffer::empty(area);
        PriceChart { spec: &s, hover: Some(1) }.render(area, &mut buf);
        assert!(buf.content().iter().any(|c| c.symbol() != " "));

        let mut small = Buffer::empty(Rect::new(0, 0, 10, 4));
        PriceChart { spec: &s, hover: None }.render(Rect::new(0, 0, 10, 4), &mut small);
    }
}
