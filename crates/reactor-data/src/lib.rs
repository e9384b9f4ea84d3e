//! Data layer for the reactor dashboard.
//!
//! Parses uploaded CSV and spreadsheet files into tabular previews, tracks
//! upload status, persists the prediction history and writes result exports.

pub mod csv_ingest;
pub mod export;
pub mod history;
pub mod uploads;

pub use reactor_core as core;
