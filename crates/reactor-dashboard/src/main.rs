mod bootstrap;

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use reactor_core::preferences::PreferencesStore;
use reactor_core::settings::Settings;
use reactor_data::csv_ingest;
use reactor_data::history::PredictionHistory;
use reactor_runtime::prediction::{build_result, source_from_settings, PredictionSource};
use reactor_runtime::worker::PredictionWorker;
use reactor_ui::app::{App, AppConfig};
use reactor_ui::screens::Screen;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();
    let data_dir = settings.data_dir();

    bootstrap::ensure_directories(&data_dir)?;

    // The TUI owns the terminal, so its logs always go to a file.
    let log_file = match settings.mode.as_str() {
        "tui" => Some(
            settings
                .log_file
                .clone()
                .unwrap_or_else(|| bootstrap::default_log_file(&data_dir)),
        ),
        _ => settings.log_file.clone(),
    };
    bootstrap::setup_logging(&settings.log_level, log_file.as_deref())?;

    tracing::info!("Reactor dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        mode = %settings.mode,
        data_dir = %data_dir.display(),
        theme = %settings.theme,
        "settings loaded"
    );

    let mut preferences = PreferencesStore::load(PreferencesStore::path_in(&data_dir));
    if settings.clear {
        preferences.reset()?;
    }
    let history = PredictionHistory::load(PredictionHistory::path_in(&data_dir));

    match settings.mode.as_str() {
        "tui" => {
            let source = source_from_settings(&settings)?;
            let mut config = AppConfig::new(data_dir.clone(), source.name());
            config.screen = Screen::from_name(&settings.screen);
            config.theme_override = settings.theme_override();
            config.form = settings.conditions_form();

            let (handle, events) = PredictionWorker::new(source).start();
            let app = App::new(config, preferences, history, handle, events);

            // Run the TUI event loop. The loop exits on 'q' / Ctrl+C inside the TUI.
            app.run().await?;
            tracing::info!("dashboard closed");
        }

        "predict" => run_prediction(&settings, history).await?,

        "ingest" => {
            let path = settings
                .file
                .as_deref()
                .context("--file is required in ingest mode")?;
            run_ingest(path)?;
        }

        unknown => {
            eprintln!("Unknown mode: {}", unknown);
        }
    }

    Ok(())
}

/// Run one prediction from the condition flags, save it, and print it.
async fn run_prediction(settings: &Settings, mut history: PredictionHistory) -> Result<()> {
    let inputs = settings.conditions_form().validate()?;
    let source = source_from_settings(settings)?;
    tracing::info!(source = source.name(), "running headless prediction");

    let outputs = source.predict(&inputs).await?;
    let result = build_result(inputs, outputs);
    history.push(result.clone())?;
    tracing::info!(id = %result.id, saved = history.len(), "prediction saved");

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Parse a data file and print a summary with its preview rows.
fn run_ingest(path: &Path) -> Result<()> {
    let data = csv_ingest::read_file(path)
        .with_context(|| format!("failed to ingest {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        rows = data.rows.len(),
        columns = data.headers.len(),
        "file ingested"
    );

    let summary = json!({
        "file": path.display().to_string(),
        "rowCount": data.rows.len(),
        "columns": data.headers,
        "preview": data.preview,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
