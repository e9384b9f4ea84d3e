use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// The six scalar inputs driving a prediction.
///
/// JSON keys match the backend's request schema exactly (`M`, `S`, `I`,
/// `temp`, `time`, `Reaction`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReactionConditions {
    /// Monomer concentration.
    #[serde(rename = "M")]
    pub m: f64,
    /// Solvent concentration.
    #[serde(rename = "S")]
    pub s: f64,
    /// Initiator concentration.
    #[serde(rename = "I")]
    pub i: f64,
    /// Temperature in kelvin.
    pub temp: f64,
    /// Reaction time in seconds.
    pub time: f64,
    /// Reaction-rate-like scalar.
    #[serde(rename = "Reaction")]
    pub reaction: f64,
}

impl ReactionConditions {
    /// Canonical field names in request order.
    pub const FIELD_NAMES: [&'static str; 6] = ["M", "S", "I", "temp", "time", "Reaction"];

    /// Column headings for result tables.
    pub const LABELS: [&'static str; 6] = ["M", "S", "I", "Temp (K)", "Time (s)", "Reaction"];

    /// Decimal places each field is displayed with.
    pub const DECIMALS: [usize; 6] = [4, 4, 4, 1, 1, 4];

    /// Values in the same order as [`Self::FIELD_NAMES`].
    pub fn values(&self) -> [f64; 6] {
        [self.m, self.s, self.i, self.temp, self.time, self.reaction]
    }
}

impl Default for ReactionConditions {
    /// Form pre-fill values of the forward-prediction screen.
    fn default() -> Self {
        Self {
            m: 0.2,
            s: 1.0,
            i: 0.5,
            temp: 300.0,
            time: 60.0,
            reaction: 3.0,
        }
    }
}

/// Reaction conditions as held by an input form, where any field may still
/// be blank.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConditionsForm {
    pub m: Option<f64>,
    pub s: Option<f64>,
    pub i: Option<f64>,
    pub temp: Option<f64>,
    pub time: Option<f64>,
    pub reaction: Option<f64>,
}

impl ConditionsForm {
    /// A form with every field filled from `conditions`.
    pub fn filled(conditions: &ReactionConditions) -> Self {
        Self {
            m: Some(conditions.m),
            s: Some(conditions.s),
            i: Some(conditions.i),
            temp: Some(conditions.temp),
            time: Some(conditions.time),
            reaction: Some(conditions.reaction),
        }
    }

    /// Field slots in canonical order, for index-based editing.
    pub fn slot_mut(&mut self, index: usize) -> Option<&mut Option<f64>> {
        match index {
            0 => Some(&mut self.m),
            1 => Some(&mut self.s),
            2 => Some(&mut self.i),
            3 => Some(&mut self.temp),
            4 => Some(&mut self.time),
            5 => Some(&mut self.reaction),
            _ => None,
        }
    }

    /// Field values in canonical order.
    pub fn slots(&self) -> [Option<f64>; 6] {
        [self.m, self.s, self.i, self.temp, self.time, self.reaction]
    }

    /// Build a [`ReactionConditions`], or fail with a validation error that
    /// names every missing field in canonical order.
    pub fn validate(&self) -> Result<ReactionConditions> {
        let missing: Vec<String> = ReactionConditions::FIELD_NAMES
            .iter()
            .zip(self.slots())
            .filter(|(_, v)| v.is_none())
            .map(|(name, _)| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(DashboardError::Validation { missing });
        }

        Ok(ReactionConditions {
            m: self.m.unwrap_or_default(),
            s: self.s.unwrap_or_default(),
            i: self.i.unwrap_or_default(),
            temp: self.temp.unwrap_or_default(),
            time: self.time.unwrap_or_default(),
            reaction: self.reaction.unwrap_or_default(),
        })
    }
}

/// Which backend network answers a prediction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    /// Physics-constrained network (backend default).
    #[default]
    Pcinn,
    /// Plain feed-forward network.
    Nn,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::Pcinn => write!(f, "pcinn"),
            ModelType::Nn => write!(f, "nn"),
        }
    }
}

impl std::str::FromStr for ModelType {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pcinn" => Ok(ModelType::Pcinn),
            "nn" => Ok(ModelType::Nn),
            other => Err(DashboardError::Config(format!("unknown model type '{other}'"))),
        }
    }
}

/// One named numeric output of a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputValue {
    pub name: String,
    pub value: f64,
}

/// Named prediction outputs in schema order plus the confidence scalar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutputs {
    pub fields: Vec<OutputValue>,
    pub confidence: f64,
}

impl PredictionOutputs {
    /// Look up a named output.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value)
    }
}

/// Display label of an output field: `mn` becomes `Mn`, `mzPlus1` becomes
/// `MzPlus1`.
pub fn output_label(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One point of a molecular-weight distribution curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MwdPoint {
    /// Molecular weight in g/mol.
    pub mw: f64,
    /// Predicted weight fraction (normalised to a peak of 1.0).
    pub predicted: f64,
}

/// A completed forward prediction as kept in the history list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub inputs: ReactionConditions,
    pub outputs: PredictionOutputs,
    pub mwd_data: Vec<MwdPoint>,
}

/// Lifecycle of an uploaded file. Transitions once out of `Processing`
/// and never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Processing,
    Completed,
    Error,
}

impl UploadStatus {
    /// `true` once the record has reached a final state.
    pub fn is_terminal(self) -> bool {
        !matches!(self, UploadStatus::Processing)
    }
}

/// Metadata of a file selected on the data-management screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    pub upload_date: DateTime<Utc>,
    pub status: UploadStatus,
    pub row_count: usize,
    pub columns: Vec<String>,
    /// Simulated upload progress in percent.
    #[serde(default)]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Tabular content of an ingested file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// First rows of `rows`, for display only.
    pub preview: Vec<Vec<String>>,
}

/// Headline metrics of the deployed model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub r2_score: f64,
    pub mse: f64,
    pub mae: f64,
    pub rmse: f64,
    pub training_samples: u32,
    pub validation_samples: u32,
    pub epochs: u32,
    pub learning_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_conditions_json_keys() {
        let json = serde_json::to_value(ReactionConditions::default()).unwrap();
        for key in ReactionConditions::FIELD_NAMES {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(json["M"], 0.2);
        assert_eq!(json["Reaction"], 3.0);
    }

    #[test]
    fn test_form_validate_complete() {
        let form = ConditionsForm::filled(&ReactionConditions::default());
        let conditions = form.validate().expect("complete form validates");
        assert_eq!(conditions, ReactionConditions::default());
    }

    #[test]
    fn test_form_validate_lists_all_missing_fields_in_order() {
        let mut form = ConditionsForm::filled(&ReactionConditions::default());
        form.time = None;
        form.s = None;
        match form.validate() {
            Err(DashboardError::Validation { missing }) => {
                assert_eq!(missing, vec!["S".to_string(), "time".to_string()]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_form_validate_empty_form() {
        let err = ConditionsForm::default().validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required input parameters (M, S, I, temp, time, Reaction)"
        );
    }

    #[test]
    fn test_form_slot_mut_out_of_range() {
        let mut form = ConditionsForm::default();
        assert!(form.slot_mut(6).is_none());
        *form.slot_mut(3).unwrap() = Some(310.0);
        assert_eq!(form.temp, Some(310.0));
    }

    #[test]
    fn test_model_type_parse_and_display() {
        assert_eq!("PCINN".parse::<ModelType>().unwrap(), ModelType::Pcinn);
        assert_eq!("nn".parse::<ModelType>().unwrap(), ModelType::Nn);
        assert!("gpt".parse::<ModelType>().is_err());
        assert_eq!(ModelType::Nn.to_string(), "nn");
    }

    #[test]
    fn test_prediction_outputs_get() {
        let outputs = PredictionOutputs {
            fields: vec![OutputValue {
                name: "mw".to_string(),
                value: 12_000.0,
            }],
            confidence: 0.9,
        };
        assert_eq!(outputs.get("mw"), Some(12_000.0));
        assert_eq!(outputs.get("mn"), None);
    }

    #[test]
    fn test_upload_status_terminal() {
        assert!(!UploadStatus::Processing.is_terminal());
        assert!(UploadStatus::Completed.is_terminal());
        assert!(UploadStatus::Error.is_terminal());
    }

    #[test]
    fn test_prediction_result_camel_case_keys() {
        let result = PredictionResult {
            id: "p-1".to_string(),
            timestamp: Utc::now(),
            inputs: ReactionConditions::default(),
            outputs: PredictionOutputs::default(),
            mwd_data: vec![MwdPoint {
                mw: 100.0,
                predicted: 0.1,
            }],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("mwdData").is_some());
        assert_eq!(json["mwdData"][0]["mw"], 100.0);
    }

    #[test]
    fn test_output_label_capitalises() {
        assert_eq!(output_label("mn"), "Mn");
        assert_eq!(output_label("mzPlus1"), "MzPlus1");
        assert_eq!(output_label(""), "");
    }
}
