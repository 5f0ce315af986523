//! Input/output helpers.
//!
//! - aligned timeline CSV export (`export`)
//! - chart spec JSON export (`chart`)

pub mod chart;
pub mod export;

pub use chart::*;
pub use export::*;
