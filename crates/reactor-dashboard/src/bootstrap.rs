use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reactor_ui::app::EXPORT_DIR;

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure the data directory hierarchy exists.
///
/// Creates the following directories if absent (including any missing parents):
/// - `<data_dir>/`
/// - `<data_dir>/logs/`
/// - `<data_dir>/exports/`
pub fn ensure_directories(data_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(data_dir)?;
    std::fs::create_dir_all(data_dir.join("logs"))?;
    std::fs::create_dir_all(data_dir.join(EXPORT_DIR))?;
    Ok(())
}

/// Log file used by the TUI when `--log-file` is not given.
pub fn default_log_file(data_dir: &Path) -> PathBuf {
    data_dir.join("logs").join("dashboard.log")
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` name onto an [`EnvFilter`] directive.
///
/// Unknown names pass through unchanged so `RUST_LOG`-style directives such
/// as `reactor_runtime=debug` keep working.
pub fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// With a `log_file` the output is appended there without ANSI colours;
/// otherwise it goes to stderr. Falls back to `"info"` if the level string
/// is not recognised.
pub fn setup_logging(log_level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()?;
        }
        None => {
            let layer = fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()?;
        }
    }

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
