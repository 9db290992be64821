//! Logging setup built on `tracing-subscriber`.
//!
//! Verbosity comes from `-v`/`-q` unless `RUST_LOG` is set, in which case
//! the environment filter wins. Logs go to stderr so stdout stays clean for
//! annotated output. An optional log file receives JSON lines.

use crate::error::{BagzError, Result};
use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Filter directive for a verbosity level.
#[must_use]
pub fn level_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "bagzulla=error";
    }
    match verbose {
        0 => "bagzulla=warn",
        1 => "bagzulla=info",
        2 => "bagzulla=debug",
        _ => "bagzulla=trace",
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a global subscriber
/// is already installed.
pub fn init_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(verbose, quiet)));

    let use_ansi = io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(use_ansi)
        .with_target(verbose >= 2)
        .without_time()
        .with_filter(filter);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let file_filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bagzulla=debug"));
            Some(
                fmt::layer()
                    .json()
                    .with_writer(Mutex::new(file))
                    .with_filter(file_filter),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| BagzError::Config(format!("logging already initialized: {e}")))
}

/// Logging for tests: captured by the test harness, safe to call repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bagzulla=debug")),
        )
        .with_test_writer()
        .try_init();
}
