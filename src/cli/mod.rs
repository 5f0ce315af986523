//! Command-line parsing for the MarketSense dashboard.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! command dispatch (see `app`) and from the dashboard logic itself.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "marketsense", version, about = "Stock overview, indicators and price forecast dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard.
    Tui(TuiArgs),
    /// Load one symbol and print overview, indicators and a terminal plot.
    Show(ShowArgs),
    /// Load one symbol and write the chart description as JSON.
    Chart(ChartArgs),
}

/// Connection and logging options shared by every command.
#[derive(Debug, Args, Clone)]
pub struct ConnArgs {
    /// Base URL of the stock data API (overrides `MARKETSENSE_API_URL`).
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// chrono format string for chart labels.
    #[arg(long, value_name = "FMT")]
    pub date_format: Option<String>,

    /// Append logs to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    /// Symbol to load on start-up.
    #[arg(short = 's', long)]
    pub symbol: Option<String>,

    #[command(flatten)]
    pub conn: ConnArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Ticker symbol, e.g. AAPL.
    pub symbol: String,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the aligned timeline to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    #[command(flatten)]
    pub conn: ConnArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ChartArgs {
    /// Ticker symbol, e.g. AAPL.
    pub symbol: String,

    /// Write the JSON here instead of stdout.
    #[arg(long, value_name = "JSON")]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub conn: ConnArgs,
}
