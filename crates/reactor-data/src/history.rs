//! Persistent prediction history (`predictions.json`).

use std::path::{Path, PathBuf};

use reactor_core::error::Result;
use reactor_core::models::PredictionResult;
use tracing::{debug, info, warn};

pub const PREDICTIONS_FILE: &str = "predictions.json";

/// Insertion-ordered list of successful predictions backed by a JSON array
/// on disk.
#[derive(Debug)]
pub struct PredictionHistory {
    path: PathBuf,
    results: Vec<PredictionResult>,
}

impl PredictionHistory {
    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join(PREDICTIONS_FILE)
    }

    /// Load the history. A missing file is an empty history; an unreadable
    /// or corrupt one is logged and treated as empty without touching it.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let results = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Vec<PredictionResult>>(&text) {
                Ok(results) => {
                    debug!(count = results.len(), "loaded prediction history");
                    results
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring corrupt prediction history");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read prediction history");
                Vec::new()
            }
        };
        Self { path, results }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn results(&self) -> &[PredictionResult] {
        &self.results
    }

    pub fn latest(&self) -> Option<&PredictionResult> {
        self.results.last()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Append a result and persist the whole list.
    pub fn push(&mut self, result: PredictionResult) -> Result<()> {
        self.results.push(result);
        self.save()
    }

    /// Write the list atomically (temp file + rename), replacing the file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.results)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Drop every result and delete the file.
    pub fn clear(&mut self) -> Result<()> {
        self.results.clear();
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        info!("prediction history cleared");
        Ok(())
    }
}
