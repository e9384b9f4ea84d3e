use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the reactor dashboard.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Required reaction-condition fields were missing before a predict call.
    #[error("Missing required input parameters ({})", .missing.join(", "))]
    Validation { missing: Vec<String> },

    /// The prediction backend answered with a non-success status or an
    /// unusable body.
    #[error("Model prediction failed: {message}")]
    Backend {
        /// HTTP status code, `None` when the request never got a response.
        status: Option<u16>,
        message: String,
    },

    /// File content could not be parsed into tabular data.
    #[error("Failed to parse file: {0}")]
    Parse(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// An error originating from the terminal / TUI layer.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DashboardError {
    /// Build a [`DashboardError::Backend`] from an HTTP status and its
    /// canonical reason text.
    pub fn backend(status: u16, status_text: impl Into<String>) -> Self {
        Self::Backend {
            status: Some(status),
            message: status_text.into(),
        }
    }

    /// `true` for errors the UI shows as a dismissible banner instead of
    /// aborting the current view.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Terminal(_))
    }
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, DashboardError>;
