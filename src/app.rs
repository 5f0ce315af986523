//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves configuration and installs logging
//! - drives the dashboard controller for one-shot commands
//! - prints reports/plots and writes optional exports

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::chart::ChartPresenter;
use crate::cli::{ChartArgs, Command, ConnArgs, ShowArgs};
use crate::dashboard::{DashboardController, Phase, ViewState};
use crate::data::HttpStockClient;
use crate::domain::{DEFAULT_API_URL, DEFAULT_LABEL_FORMAT, DashboardConfig};
use crate::error::AppError;
use crate::fetch::{FetchOrchestrator, GENERIC_FAILURE};

/// Environment variable consulted when `--api-url` is absent.
pub const API_URL_ENV: &str = "MARKETSENSE_API_URL";

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "marketsense=info";

/// Entry point for the `marketsense` binary.
pub fn run() -> Result<(), AppError> {
    // We want `marketsense` and `marketsense -s AAPL` to behave like
    // `marketsense tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => {
            init_logging(args.conn.log_file.as_deref(), true)?;
            crate::tui::run(args)
        }
        Command::Show(args) => {
            init_logging(args.conn.log_file.as_deref(), false)?;
            handle_show(args)
        }
        Command::Chart(args) => {
            init_logging(args.conn.log_file.as_deref(), false)?;
            handle_chart(args)
        }
    }
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let mut config = config_from_args(&args.conn)?;
    config.plot = !args.no_plot;
    config.plot_width = args.width;
    config.plot_height = args.height;

    let controller = load_once(&config, &args.symbol)?;
    let state = controller.state();

    println!("{}", crate::report::format_view_summary(state));

    if config.plot
        && let Some(timeline) = &state.timeline
    {
        let plot = crate::plot::render_timeline_plot(timeline, config.plot_width, config.plot_height);
        println!("{plot}");
    }

    if let Some(path) = &args.export
        && let Some(timeline) = &state.timeline
    {
        crate::io::write_timeline_csv(path, timeline)?;
        tracing::info!(path = %path.display(), rows = timeline.len(), "timeline exported");
    }

    Ok(())
}

fn handle_chart(args: ChartArgs) -> Result<(), AppError> {
    let config = config_from_args(&args.conn)?;
    let controller = load_once(&config, &args.symbol)?;

    let presenter = ChartPresenter::default();
    let Some(spec) = controller.state().chart(&presenter) else {
        return Err(AppError::fetch("No chart data available"));
    };
    crate::io::write_chart_json(args.out.as_deref(), &spec)
}

/// Run one submit/load/apply cycle on a fresh controller.
///
/// Blank input is a usage error and a failed load maps to the fetch exit code.
fn load_once(config: &DashboardConfig, raw_symbol: &str) -> Result<DashboardController, AppError> {
    let orchestrator = orchestrator_for(config)?;
    let mut controller = DashboardController::new(config.label_format.clone());

    let runtime = build_runtime()?;
    runtime.block_on(controller.run(&orchestrator, raw_symbol));

    ensure_loaded(controller.state())?;
    Ok(controller)
}

/// Map a finished one-shot run to the command result.
fn ensure_loaded(state: &ViewState) -> Result<(), AppError> {
    match state.phase {
        Phase::Loaded => Ok(()),
        Phase::Idle => Err(AppError::usage("Symbol must not be blank")),
        Phase::Loading | Phase::Errored => Err(AppError::fetch(
            state
                .error_message
                .clone()
                .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
        )),
    }
}

pub(crate) fn orchestrator_for(config: &DashboardConfig) -> Result<FetchOrchestrator, AppError> {
    let client = HttpStockClient::new(&config.api_base_url, config.request_timeout)
        .map_err(|e| AppError::usage(format!("Failed to build HTTP client: {e}")))?;
    Ok(FetchOrchestrator::new(Arc::new(client)))
}

pub(crate) fn build_runtime() -> Result<tokio::runtime::Runtime, AppError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::io(format!("Failed to start async runtime: {e}")))
}

/// Resolve configuration from flags, `.env` and the process environment.
pub fn config_from_args(conn: &ConnArgs) -> Result<DashboardConfig, AppError> {
    dotenvy::dotenv().ok();
    resolve_config(conn, std::env::var(API_URL_ENV).ok())
}

/// Layer CLI flags over an environment-provided base URL.
pub fn resolve_config(conn: &ConnArgs, env_url: Option<String>) -> Result<DashboardConfig, AppError> {
    let api_base_url = conn
        .api_url
        .clone()
        .or(env_url.filter(|u| !u.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let api_base_url = api_base_url.trim().to_string();
    if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
        return Err(AppError::usage(format!(
            "API URL must start with http:// or https:// (got '{api_base_url}')"
        )));
    }

    if conn.timeout_secs == 0 {
        return Err(AppError::usage("--timeout-secs must be at least 1"));
    }

    let label_format = conn
        .date_format
        .clone()
        .unwrap_or_else(|| DEFAULT_LABEL_FORMAT.to_string());
    // Rejects unknown specifiers and ones a date cannot fill (times, offsets).
    if crate::align::format_label(NaiveDate::MIN, &label_format).is_none() {
        return Err(AppError::usage(format!("Invalid --date-format '{label_format}'")));
    }

    Ok(DashboardConfig {
        api_base_url,
        request_timeout: Duration::from_secs(conn.timeout_secs),
        label_format,
        ..DashboardConfig::default()
    })
}

/// Install the global `tracing` subscriber.
///
/// With `log_file` the subscriber appends there. Without it, non-interactive
/// commands log to stderr and the TUI does not log at all (the alternate screen
/// owns the terminal).
pub fn init_logging(log_file: Option<&Path>, interactive: bool) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| AppError::io(format!("Failed to open log file '{}': {e}", path.display())))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None if interactive => return Ok(()),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    // A subscriber may already be installed (e.g. by a test harness); the
    // command still runs, just without our logs.
    if let Err(err) = installed {
        eprintln!("warning: logging not initialized: {err}");
    }
    Ok(())
}

/// Rewrite argv so `marketsense` defaults to `marketsense tui`.
///
/// Rules:
/// - `marketsense`                      -> `marketsense tui`
/// - `marketsense -s AAPL ...`          -> `marketsense tui -s AAPL ...`
/// - `marketsense --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "show" | "chart");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
