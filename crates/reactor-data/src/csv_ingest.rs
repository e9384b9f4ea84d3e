//! Tabular file ingestion.
//!
//! CSV text and the first worksheet of `.xlsx` / `.xls` workbooks are turned
//! into [`ParsedData`]: a header row, string rows and a short preview. Cells
//! are never coerced to numbers here.

use std::io::Cursor;
use std::path::Path;

use calamine::Reader;
use csv::{ReaderBuilder, Trim};
use reactor_core::error::{DashboardError, Result};
use reactor_core::models::ParsedData;
use tracing::{debug, warn};

/// Rows kept in [`ParsedData::preview`].
pub const PREVIEW_ROWS: usize = 5;
/// Size above which an upload is logged as unusually large. Not enforced.
pub const ADVISORY_MAX_BYTES: u64 = 10 * 1024 * 1024;

// ── File kinds ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Xlsx,
    Xls,
}

impl FileKind {
    /// Classify by extension, case-insensitively.
    pub fn from_name(name: &str) -> Result<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("xlsx") => Ok(Self::Xlsx),
            Some("xls") => Ok(Self::Xls),
            _ => Err(DashboardError::Parse(format!(
                "unsupported file type '{name}' (expected .csv, .xlsx or .xls)"
            ))),
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Parse CSV text.
///
/// The whole text is trimmed first. The first line is the header and every
/// other non-blank line is one row, even when all of its cells are empty.
/// Fields are whitespace-trimmed and stray double quotes are dropped; quoted
/// fields may contain commas but not line breaks, so an unterminated quote
/// is a parse error rather than one cell swallowing the rest of the file.
pub fn parse_text(text: &str) -> Result<ParsedData> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(ParsedData::default());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(trimmed.as_bytes());

    let mut records: Vec<Vec<String>> = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| DashboardError::Parse(format!("CSV record {}: {e}", index + 1)))?;
        let line = record.position().map_or(index as u64 + 1, |p| p.line());
        if record.iter().any(|f| f.contains(['\n', '\r'])) {
            return Err(DashboardError::Parse(format!(
                "unterminated quoted field starting on line {line}"
            )));
        }
        let fields: Vec<String> = record.iter().map(clean_field).collect();
        if is_blank_line(&fields) {
            continue;
        }
        records.push(fields);
    }

    Ok(from_records(records))
}

/// Parse raw CSV bytes, rejecting anything that is not UTF-8.
pub fn parse_bytes(bytes: &[u8]) -> Result<ParsedData> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| DashboardError::Parse(format!("file is not valid UTF-8: {e}")))?;
    parse_text(text)
}

/// Read the first worksheet of an `.xlsx` or `.xls` workbook.
pub fn parse_spreadsheet(bytes: Vec<u8>) -> Result<ParsedData> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| DashboardError::Parse(format!("cannot open workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DashboardError::Parse("workbook has no worksheets".to_string()))?
        .map_err(|e| DashboardError::Parse(format!("cannot read worksheet: {e}")))?;

    let records: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(|cell| clean_field(&cell.to_string())).collect::<Vec<_>>())
        .filter(|fields: &Vec<String>| !fields.iter().all(String::is_empty))
        .collect();

    Ok(from_records(records))
}

/// Parse an uploaded file's bytes according to its name.
pub fn ingest(name: &str, bytes: Vec<u8>) -> Result<ParsedData> {
    let kind = FileKind::from_name(name)?;
    if bytes.len() as u64 > ADVISORY_MAX_BYTES {
        warn!(name, size = bytes.len(), "upload exceeds the recommended 10 MB");
    }
    let data = match kind {
        FileKind::Csv => parse_bytes(&bytes)?,
        FileKind::Xlsx | FileKind::Xls => parse_spreadsheet(bytes)?,
    };
    debug!(
        name,
        columns = data.headers.len(),
        rows = data.rows.len(),
        "file ingested"
    );
    Ok(data)
}

/// Read a file from disk and ingest it.
pub fn read_file(path: &Path) -> Result<ParsedData> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    FileKind::from_name(&name)?;
    let bytes = std::fs::read(path).map_err(|source| DashboardError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    ingest(&name, bytes)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// A whitespace-only line reads as a single empty field.
fn is_blank_line(fields: &[String]) -> bool {
    matches!(fields, [only] if only.is_empty())
}

fn clean_field(field: &str) -> String {
    field.trim().replace('"', "").trim().to_string()
}

fn from_records(mut records: Vec<Vec<String>>) -> ParsedData {
    if records.is_empty() {
        return ParsedData::default();
    }
    let headers = records.remove(0);
    let preview = records.iter().take(PREVIEW_ROWS).cloned().collect();
    ParsedData {
        headers,
        rows: records,
        preview,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
