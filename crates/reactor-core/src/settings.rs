use clap::Parser;
use std::path::PathBuf;

use crate::error::{DashboardError, Result};
use crate::models::{ConditionsForm, ModelType, ReactionConditions};

/// Name of the per-user data directory under `$HOME`.
pub const DATA_DIR_NAME: &str = ".reactor-dashboard";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Polymer reactor ML dashboard
#[derive(Parser, Debug, Clone)]
#[command(
    name = "reactor-dashboard",
    about = "Polymer reactor ML dashboard: forward prediction, inverse problem and data management",
    version
)]
pub struct Settings {
    /// Run mode
    #[arg(long, default_value = "tui", value_parser = ["tui", "predict", "ingest"])]
    pub mode: String,

    /// Screen shown first in the interactive dashboard
    #[arg(long, default_value = "dashboard", value_parser = ["dashboard", "forward", "inverse", "data", "performance", "settings"])]
    pub screen: String,

    /// Base URL of the prediction backend
    #[arg(long, visible_alias = "endpoint", env = "FASTAPI_URL", default_value = "http://localhost:8000")]
    pub backend_url: String,

    /// Use the offline mock predictor instead of the backend
    #[arg(long)]
    pub mock: bool,

    /// Model discriminator forwarded to the backend
    #[arg(long, value_parser = ["pcinn", "nn"])]
    pub model_type: Option<String>,

    /// Comma-separated names of the m_output positions
    #[arg(long)]
    pub output_fields: Option<String>,

    /// Display theme (auto follows the persisted dark-mode preference)
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "auto"])]
    pub theme: String,

    /// Directory holding settings.json, predictions.json and logs
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Monomer concentration
    #[arg(long = "m")]
    pub m: Option<f64>,

    /// Solvent concentration
    #[arg(long = "s")]
    pub s: Option<f64>,

    /// Initiator concentration
    #[arg(long = "i")]
    pub i: Option<f64>,

    /// Temperature (K)
    #[arg(long)]
    pub temp: Option<f64>,

    /// Reaction time (s)
    #[arg(long)]
    pub time: Option<f64>,

    /// Reaction-rate scalar
    #[arg(long)]
    pub reaction: Option<f64>,

    /// File to ingest in `ingest` mode
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Delete persisted preferences before starting
    #[arg(long)]
    pub clear: bool,
}

impl Settings {
    /// Parse process arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Full URL of the `/predict` endpoint.
    pub fn predict_endpoint(&self) -> String {
        format!("{}/predict", self.backend_url.trim_end_matches('/'))
    }

    /// Directory for persisted state, `~/.reactor-dashboard` by default.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    /// Parsed `--model-type`, if given.
    pub fn model_type(&self) -> Result<Option<ModelType>> {
        self.model_type.as_deref().map(str::parse).transpose()
    }

    /// Parsed `--output-fields`, if given.
    ///
    /// Empty names are rejected so a stray comma cannot shift positions.
    pub fn output_fields(&self) -> Result<Option<Vec<String>>> {
        let Some(raw) = self.output_fields.as_deref() else {
            return Ok(None);
        };
        let names: Vec<String> = raw.split(',').map(|s| s.trim().to_string()).collect();
        if names.iter().any(String::is_empty) {
            return Err(DashboardError::Config(format!(
                "output field list contains an empty name: '{raw}'"
            )));
        }
        Ok(Some(names))
    }

    /// Reaction conditions from the CLI flags layered over the form
    /// pre-fill values.
    pub fn conditions_form(&self) -> ConditionsForm {
        let defaults = ReactionConditions::default();
        ConditionsForm {
            m: self.m.or(Some(defaults.m)),
            s: self.s.or(Some(defaults.s)),
            i: self.i.or(Some(defaults.i)),
            temp: self.temp.or(Some(defaults.temp)),
            time: self.time.or(Some(defaults.time)),
            reaction: self.reaction.or(Some(defaults.reaction)),
        }
    }

    /// Dark-mode flag forced by `--theme`, or `None` for `auto`, which
    /// defers to the persisted preference.
    pub fn theme_override(&self) -> Option<bool> {
        match self.theme.as_str() {
            "dark" => Some(true),
            "light" => Some(false),
            _ => None,
        }
    }
}

/// `~/.reactor-dashboard`, falling back to the working directory when no
/// home directory is known.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
