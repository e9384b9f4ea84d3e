//! Write-only exports of a single prediction: CSV, JSON and an HTML report.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use reactor_core::error::{DashboardError, Result};
use reactor_core::models::{output_label, PredictionResult, ReactionConditions};
use tracing::info;

pub const MWD_HEADER: [&str; 2] = ["Molecular Weight (g/mol)", "Predicted Weight Fraction"];
pub const METRIC_HEADER: [&str; 2] = ["Metric", "Value"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Html,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Html => "html",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "html" | "pdf" => Ok(Self::Html),
            other => Err(DashboardError::Config(format!("unknown export format '{other}'"))),
        }
    }
}

// ── CSV ───────────────────────────────────────────────────────────────────────

/// MWD rows, a blank line, then `Metric,Value` rows: outputs in schema
/// order, `Confidence`, and the six input conditions.
pub fn to_csv(result: &PredictionResult) -> Result<String> {
    let mut curve = csv::Writer::from_writer(Vec::new());
    curve.write_record(MWD_HEADER).map_err(csv_error)?;
    for point in &result.mwd_data {
        curve
            .write_record([point.mw.to_string(), point.predicted.to_string()])
            .map_err(csv_error)?;
    }

    let mut metrics = csv::Writer::from_writer(Vec::new());
    metrics.write_record(METRIC_HEADER).map_err(csv_error)?;
    for (label, value) in metric_rows(result) {
        metrics
            .write_record([label, value.to_string()])
            .map_err(csv_error)?;
    }

    let mut out = into_string(curve)?;
    out.push('\n');
    out.push_str(&into_string(metrics)?);
    Ok(out)
}

// ── JSON ──────────────────────────────────────────────────────────────────────

pub fn to_json(result: &PredictionResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

// ── HTML report ───────────────────────────────────────────────────────────────

/// Self-contained printable report.
pub fn to_html(result: &PredictionResult) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Polymer Reactor Prediction Report</title>\n\
         <style>body{{font-family:sans-serif;margin:2em}}table{{border-collapse:collapse;margin-bottom:1.5em}}\
         th,td{{border:1px solid #ccc;padding:4px 8px;text-align:left}}th{{background:#f3f4f6}}</style>\n\
         </head>\n<body>\n<h1>Polymer Reactor Prediction Report</h1>\n\
         <p>Generated: {}</p>\n<p>Prediction ID: {}</p>\n",
        escape(&result.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        escape(&result.id),
    );

    html.push_str("<h2>Input Conditions</h2>\n<table>\n<tr><th>Parameter</th><th>Value</th></tr>\n");
    for (name, value) in ReactionConditions::FIELD_NAMES
        .iter()
        .zip(result.inputs.values())
    {
        let _ = writeln!(html, "<tr><td>{}</td><td>{}</td></tr>", escape(name), value);
    }
    html.push_str("</table>\n");

    html.push_str("<h2>Predicted Outputs</h2>\n<table>\n<tr><th>Metric</th><th>Value</th></tr>\n");
    for field in &result.outputs.fields {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape(&output_label(&field.name)),
            field.value
        );
    }
    let _ = writeln!(
        html,
        "<tr><td>Confidence</td><td>{}</td></tr>",
        result.outputs.confidence
    );
    html.push_str("</table>\n");

    let _ = writeln!(
        html,
        "<h2>Molecular Weight Distribution</h2>\n<table>\n<tr><th>{}</th><th>{}</th></tr>",
        MWD_HEADER[0], MWD_HEADER[1]
    );
    for point in &result.mwd_data {
        let _ = writeln!(html, "<tr><td>{}</td><td>{}</td></tr>", point.mw, point.predicted);
    }
    html.push_str("</table>\n</body>\n</html>\n");
    html
}

// ── Files ─────────────────────────────────────────────────────────────────────

/// Characters of the result id kept in export file names.
const ID_PREFIX_LEN: usize = 8;

/// `prediction_<yyyymmdd>_<hhmmss>_<id prefix>.<ext>`
pub fn export_file_name(result: &PredictionResult, format: ExportFormat) -> String {
    let id: String = result
        .id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(ID_PREFIX_LEN)
        .collect();
    format!(
        "prediction_{}_{}.{}",
        result.timestamp.format("%Y%m%d_%H%M%S"),
        id,
        format.extension()
    )
}

/// Render `result` in `format` and write it into `dir`.
pub fn write_export(dir: &Path, result: &PredictionResult, format: ExportFormat) -> Result<PathBuf> {
    let body = match format {
        ExportFormat::Csv => to_csv(result)?,
        ExportFormat::Json => to_json(result)?,
        ExportFormat::Html => to_html(result),
    };
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(result, format));
    std::fs::write(&path, body)?;
    info!(path = %path.display(), format = format.extension(), "prediction exported");
    Ok(path)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn metric_rows(result: &PredictionResult) -> Vec<(String, f64)> {
    let mut rows: Vec<(String, f64)> = result
        .outputs
        .fields
        .iter()
        .map(|f| (output_label(&f.name), f.value))
        .collect();
    rows.push(("Confidence".to_string(), result.outputs.confidence));
    rows.extend(
        ReactionConditions::FIELD_NAMES
            .iter()
            .zip(result.inputs.values())
            .map(|(name, value)| (name.to_string(), value)),
    );
    rows
}

fn csv_error(e: csv::Error) -> DashboardError {
    DashboardError::Other(e.into())
}

fn into_string(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing CSV buffer: {e}"))?;
    Ok(String::from_utf8(bytes).map_err(anyhow::Error::from)?)
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
