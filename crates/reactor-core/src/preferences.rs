//! Persisted user preferences.
//!
//! [`PreferencesStore`] owns one JSON object on disk. It is loaded once,
//! merged key-by-key over [`Preferences::default`], written through on every
//! change, and deleted outright on [`PreferencesStore::reset`]. The store is
//! passed explicitly to whichever screen needs it; consumers that must react
//! to changes register a callback with [`PreferencesStore::subscribe`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::error::{DashboardError, Result};

/// File name of the persisted preferences inside the data directory.
pub const PREFERENCES_FILE: &str = "settings.json";

// ── Preferences ───────────────────────────────────────────────────────────────

/// Flat record of user-tunable preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub model_version: String,
    pub gpu_acceleration: bool,
    /// Minimum confidence (percent) before a prediction is flagged.
    pub confidence_threshold: u32,
    pub normalize_data: bool,
    pub outlier_detection: bool,
    pub data_augmentation: bool,
    pub color_scheme: String,
    pub show_confidence_intervals: bool,
    pub display_error_bars: bool,
    /// Default export format: `csv`, `json` or `html`.
    pub file_format: String,
    pub graph_resolution: String,
    pub include_metadata: bool,
    pub batch_size: u32,
    pub learning_rate: f64,
    pub early_stopping_epochs: u32,
    pub dark_mode: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            model_version: "v2.1.3".to_string(),
            gpu_acceleration: true,
            confidence_threshold: 70,
            normalize_data: true,
            outlier_detection: true,
            data_augmentation: false,
            color_scheme: "default".to_string(),
            show_confidence_intervals: true,
            display_error_bars: false,
            file_format: "csv".to_string(),
            graph_resolution: "300".to_string(),
            include_metadata: true,
            batch_size: 32,
            learning_rate: 0.001,
            early_stopping_epochs: 10,
            dark_mode: false,
        }
    }
}

impl Preferences {
    /// Merge a persisted JSON object over the defaults.
    ///
    /// Each key is applied on its own; keys that are unknown or carry a value
    /// of the wrong type are skipped, so an old or partially corrupt blob
    /// still yields a complete record.
    pub fn merged_over_defaults(persisted: &Map<String, Value>) -> Self {
        let mut merged = Self::default();
        for (key, value) in persisted {
            match merged.with_value(key, value.clone()) {
                Ok(updated) => merged = updated,
                Err(e) => tracing::warn!(key = %key, error = %e, "ignoring persisted preference"),
            }
        }
        merged
    }

    /// Return a copy with `key` replaced by `value`.
    pub fn with_value(&self, key: &str, value: Value) -> Result<Self> {
        let mut object = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => return Err(DashboardError::Config("preferences are not an object".to_string())),
        };
        if !object.contains_key(key) {
            return Err(DashboardError::Config(format!("unknown setting '{key}'")));
        }
        object.insert(key.to_string(), value);
        serde_json::from_value(Value::Object(object))
            .map_err(|e| DashboardError::Config(format!("invalid value for '{key}': {e}")))
    }

    /// Keys and current values sorted by key, for display.
    pub fn entries(&self) -> Vec<(String, Value)> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.into_iter().collect(),
            _ => Vec::new(),
        }
    }
}

// ── PreferencesStore ──────────────────────────────────────────────────────────

/// Identifier returned by [`PreferencesStore::subscribe`].
pub type SubscriptionId = usize;

type Listener = Box<dyn Fn(&Preferences) + Send>;

/// Owner of the current [`Preferences`] and their on-disk copy.
pub struct PreferencesStore {
    path: PathBuf,
    current: Preferences,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: SubscriptionId,
}

impl PreferencesStore {
    /// Path of the preferences file inside `data_dir`.
    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join(PREFERENCES_FILE)
    }

    /// Load from `path`, merging over defaults.
    ///
    /// A missing or unreadable file yields the defaults; nothing is written
    /// until the first change.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => Preferences::merged_over_defaults(&map),
                Ok(_) => {
                    tracing::warn!(path = %path.display(), "preferences file is not a JSON object");
                    Preferences::default()
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "error loading preferences");
                    Preferences::default()
                }
            },
            Err(_) => Preferences::default(),
        };

        Self {
            path,
            current,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Current preferences.
    pub fn get(&self) -> &Preferences {
        &self.current
    }

    /// Location of the persisted copy.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Change one preference, persist, and notify subscribers.
    ///
    /// Unknown keys and mistyped values are rejected and leave the store
    /// untouched.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let updated = self.current.with_value(key, value)?;
        if updated == self.current {
            return Ok(());
        }
        self.current = updated;
        tracing::debug!(key, "preference updated");
        self.save()?;
        self.notify();
        Ok(())
    }

    /// Flip a boolean preference.
    pub fn toggle(&mut self, key: &str) -> Result<()> {
        let current = self
            .current
            .entries()
            .into_iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_bool())
            .ok_or_else(|| DashboardError::Config(format!("'{key}' is not a boolean setting")))?;
        self.set(key, Value::Bool(!current))
    }

    /// Restore defaults in memory and delete the persisted file.
    pub fn reset(&mut self) -> Result<()> {
        self.current = Preferences::default();
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        tracing::info!(path = %self.path.display(), "preferences reset to defaults");
        self.notify();
        Ok(())
    }

    /// Atomically write the current preferences, creating parent
    /// directories if needed.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.current)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Register a callback invoked after every change.
    pub fn subscribe(&mut self, listener: impl Fn(&Preferences) + Send + 'static) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a previously registered callback.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(lid, _)| *lid != id);
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener(&self.current);
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
