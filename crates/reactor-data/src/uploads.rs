//! Registry of uploaded files and their parsed contents.
//!
//! Status only moves forward: `processing` ends in exactly one of
//! `completed` or `error`, and terminal records never change again.

use std::collections::HashMap;

use chrono::Utc;
use reactor_core::models::{ParsedData, UploadStatus, UploadedFile};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
pub struct UploadRegistry {
    files: Vec<UploadedFile>,
    parsed: HashMap<String, ParsedData>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new upload in `processing` state and return its id.
    pub fn begin(&mut self, name: impl Into<String>, size: u64) -> String {
        let file = UploadedFile {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            size,
            upload_date: Utc::now(),
            status: UploadStatus::Processing,
            row_count: 0,
            columns: Vec::new(),
            progress: 0,
            error: None,
        };
        debug!(id = %file.id, name = %file.name, size, "upload started");
        let id = file.id.clone();
        self.files.push(file);
        id
    }

    /// Advance progress. Ignored for finished uploads and never decreases.
    pub fn set_progress(&mut self, id: &str, progress: u8) -> bool {
        match self.processing_mut(id) {
            Some(file) => {
                file.progress = file.progress.max(progress.min(100));
                true
            }
            None => false,
        }
    }

    /// Mark an upload completed and keep its parsed data.
    pub fn complete(&mut self, id: &str, data: ParsedData) -> bool {
        let Some(file) = self.processing_mut(id) else {
            warn!(id, "ignoring completion of an upload that is not processing");
            return false;
        };
        file.status = UploadStatus::Completed;
        file.progress = 100;
        file.row_count = data.rows.len();
        file.columns = data.headers.clone();
        info!(id, name = %file.name, rows = file.row_count, "upload completed");
        self.parsed.insert(id.to_string(), data);
        true
    }

    /// Mark an upload failed. No partial data is kept.
    pub fn fail(&mut self, id: &str, message: impl Into<String>) -> bool {
        let Some(file) = self.processing_mut(id) else {
            warn!(id, "ignoring failure of an upload that is not processing");
            return false;
        };
        file.status = UploadStatus::Error;
        file.error = Some(message.into());
        warn!(id, name = %file.name, error = ?file.error, "upload failed");
        self.parsed.remove(id);
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<UploadedFile> {
        let index = self.files.iter().position(|f| f.id == id)?;
        self.parsed.remove(id);
        Some(self.files.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.id == id)
    }

    /// Uploads in the order they were started.
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn parsed(&self, id: &str) -> Option<&ParsedData> {
        self.parsed.get(id)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Sum of row counts of completed uploads.
    pub fn total_rows(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == UploadStatus::Completed)
            .map(|f| f.row_count)
            .sum()
    }

    fn processing_mut(&mut self, id: &str) -> Option<&mut UploadedFile> {
        self.files
            .iter_mut()
            .find(|f| f.id == id && f.status == UploadStatus::Processing)
    }
}
