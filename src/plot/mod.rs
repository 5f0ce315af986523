//! Non-interactive chart rendering.

pub mod ascii;

pub use ascii::render_timeline_plot;
