//! `marketsense` library crate.
//!
//! The binary (`marketsense`) is a thin wrapper around this library so that:
//!
//! - the load/align/present pipeline is testable without spawning processes
//! - the dashboard core can be driven from other front ends
//! - code stays easy to navigate as the project grows

pub mod align;
pub mod app;
pub mod chart;
pub mod cli;
pub mod dashboard;
pub mod data;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod io;
pub mod plot;
pub mod report;
pub mod tui;
