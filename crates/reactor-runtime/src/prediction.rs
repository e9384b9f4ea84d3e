//! Prediction client.
//!
//! A [`PredictionSource`] turns [`ReactionConditions`] into named
//! [`PredictionOutputs`]. [`RemoteSource`] posts to the backend's
//! `/predict` endpoint; [`MockSource`] computes plausible numbers offline.
//! Both map the raw positional arrays through the same [`OutputSchema`].

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reactor_core::error::{DashboardError, Result};
use reactor_core::models::{
    ModelType, OutputValue, PredictionOutputs, PredictionResult, ReactionConditions,
};
use reactor_core::mwd;
use reactor_core::settings::Settings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

/// Names of the `m_output` positions returned by the default backend.
pub const DEFAULT_OUTPUT_FIELDS: [&str; 5] = ["mn", "mw", "mz", "mzPlus1", "mv"];

const MOCK_CONFIDENCE_MIN: f64 = 0.7;
const MOCK_CONFIDENCE_MAX: f64 = 0.98;

// ── Output schema ─────────────────────────────────────────────────────────────

/// Maps names to positions in the backend's `m_output` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSchema {
    fields: Vec<String>,
}

impl Default for OutputSchema {
    fn default() -> Self {
        Self {
            fields: DEFAULT_OUTPUT_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl OutputSchema {
    /// Build a schema from field names. Names must be non-empty and unique.
    pub fn new(fields: Vec<String>) -> Result<Self> {
        if fields.is_empty() {
            return Err(DashboardError::Config("output schema has no fields".to_string()));
        }
        for (i, name) in fields.iter().enumerate() {
            if name.is_empty() {
                return Err(DashboardError::Config(format!(
                    "output field {i} has an empty name"
                )));
            }
            if fields[..i].contains(name) {
                return Err(DashboardError::Config(format!(
                    "output field '{name}' is listed twice"
                )));
            }
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Name the positional outputs. Extra trailing values are ignored;
    /// fewer values than fields is a malformed response.
    pub fn map(&self, raw: &RawPrediction) -> Result<PredictionOutputs> {
        if raw.m_output.len() < self.fields.len() {
            return Err(malformed(format!(
                "m_output has {} values, expected {}",
                raw.m_output.len(),
                self.fields.len()
            )));
        }
        let confidence = *raw
            .x_output
            .first()
            .ok_or_else(|| malformed("x_output is empty".to_string()))?;
        let fields = self
            .fields
            .iter()
            .zip(&raw.m_output)
            .map(|(name, &value)| OutputValue {
                name: name.clone(),
                value,
            })
            .collect();
        Ok(PredictionOutputs { fields, confidence })
    }
}

// ── Wire types ────────────────────────────────────────────────────────────────

/// Body of `POST /predict`.
#[derive(Debug, Clone, Serialize)]
pub struct PredictRequest {
    #[serde(flatten)]
    pub inputs: ReactionConditions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_type: Option<ModelType>,
}

/// Backend response, after unwrapping an optional `outputs` envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawPrediction {
    pub m_output: Vec<f64>,
    pub x_output: Vec<f64>,
    #[serde(default)]
    pub m_output_log10: Option<Vec<f64>>,
    #[serde(default)]
    pub model_type: Option<String>,
    #[serde(default)]
    pub input: Option<Value>,
}

impl RawPrediction {
    /// Accept both the flat backend shape and the proxy shape that nests the
    /// arrays under `outputs`.
    pub fn from_value(value: Value) -> Result<Self> {
        let payload = match value {
            Value::Object(mut map) => match map.remove("outputs") {
                Some(outputs @ Value::Object(_)) => outputs,
                Some(other) => {
                    map.insert("outputs".to_string(), other);
                    Value::Object(map)
                }
                None => Value::Object(map),
            },
            other => other,
        };
        serde_json::from_value(payload).map_err(|e| malformed(e.to_string()))
    }
}

fn malformed(detail: String) -> DashboardError {
    DashboardError::Backend {
        status: None,
        message: format!("malformed response: {detail}"),
    }
}

// ── PredictionSource ──────────────────────────────────────────────────────────

/// Anything that can answer a prediction request.
#[async_trait]
pub trait PredictionSource: Send + Sync {
    async fn predict(&self, inputs: &ReactionConditions) -> Result<PredictionOutputs>;

    /// Short label for logs and the header.
    fn name(&self) -> &'static str;
}

/// HTTP client for the prediction backend.
pub struct RemoteSource {
    client: reqwest::Client,
    endpoint: String,
    model_type: Option<ModelType>,
    schema: OutputSchema,
}

impl RemoteSource {
    pub fn new(endpoint: impl Into<String>, model_type: Option<ModelType>, schema: OutputSchema) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model_type,
            schema,
        }
    }
}

#[async_trait]
impl PredictionSource for RemoteSource {
    async fn predict(&self, inputs: &ReactionConditions) -> Result<PredictionOutputs> {
        let body = PredictRequest {
            inputs: *inputs,
            model_type: self.model_type,
        };
        debug!(endpoint = %self.endpoint, ?body, "sending prediction request");

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| DashboardError::Backend {
                status: None,
                message: format!("backend unreachable at {}: {e}", self.endpoint),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %text, "backend error response");
            return Err(DashboardError::backend(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status"),
            ));
        }

        let value: Value = resp
            .json()
            .await
            .map_err(|e| malformed(e.to_string()))?;
        let raw = RawPrediction::from_value(value)?;
        let outputs = self.schema.map(&raw)?;
        info!(
            source = "remote",
            model_type = raw.model_type.as_deref().unwrap_or("default"),
            confidence = outputs.confidence,
            "prediction complete"
        );
        Ok(outputs)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

/// Offline predictor built from simple arithmetic on the inputs.
pub struct MockSource {
    schema: OutputSchema,
    rng: Mutex<StdRng>,
}

impl MockSource {
    pub fn new(schema: OutputSchema) -> Self {
        Self {
            schema,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible variant for tests and demos.
    pub fn with_seed(schema: OutputSchema, seed: u64) -> Self {
        Self {
            schema,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Synthesize the positional arrays the backend would return.
    pub fn raw_prediction(&self, inputs: &ReactionConditions) -> RawPrediction {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let mut jitter = |spread: f64| 1.0 + rng.gen_range(-spread..=spread);

        // Mn grows with monomer-to-initiator ratio and falls with temperature.
        let ratio = inputs.m.max(0.0) / (inputs.i.max(0.0) + 0.1);
        let thermal = 300.0 / inputs.temp.max(1.0);
        let mn = (5_000.0 + 40_000.0 * ratio * thermal) * jitter(0.05);
        let dispersity = 1.5 + 0.05 * inputs.reaction.clamp(0.0, 10.0);
        let mut m_output = vec![mn, mn * dispersity];
        let mut last = mn * dispersity;
        while m_output.len() < self.schema.len().max(DEFAULT_OUTPUT_FIELDS.len()) {
            last *= 1.3 * jitter(0.02);
            m_output.push(last);
        }
        // Viscosity average sits between Mn and Mw.
        if m_output.len() >= 5 {
            m_output[4] = mn * (1.0 + 0.9 * (dispersity - 1.0));
        }

        let conversion = 0.75
            + 0.1 * (1.0 - (-inputs.time.max(0.0) / 60.0).exp())
            + 0.05 * inputs.i.clamp(0.0, 1.0);
        let confidence = (conversion + rng.gen_range(-0.03..=0.03))
            .clamp(MOCK_CONFIDENCE_MIN, MOCK_CONFIDENCE_MAX);

        RawPrediction {
            m_output_log10: Some(m_output.iter().map(|v| v.log10()).collect()),
            m_output,
            x_output: vec![confidence],
            model_type: Some("mock".to_string()),
            input: None,
        }
    }
}

#[async_trait]
impl PredictionSource for MockSource {
    async fn predict(&self, inputs: &ReactionConditions) -> Result<PredictionOutputs> {
        let raw = self.raw_prediction(inputs);
        let outputs = self.schema.map(&raw)?;
        debug!(source = "mock", confidence = outputs.confidence, "prediction complete");
        Ok(outputs)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ── Construction ──────────────────────────────────────────────────────────────

/// Pick the prediction source once, at startup.
pub fn source_from_settings(settings: &Settings) -> Result<Arc<dyn PredictionSource>> {
    let schema = match settings.output_fields()? {
        Some(fields) => OutputSchema::new(fields)?,
        None => OutputSchema::default(),
    };
    if settings.mock {
        info!("using offline mock predictor");
        return Ok(Arc::new(MockSource::new(schema)));
    }
    let endpoint = settings.predict_endpoint();
    info!(%endpoint, "using remote predictor");
    Ok(Arc::new(RemoteSource::new(
        endpoint,
        settings.model_type()?,
        schema,
    )))
}

/// Wrap a successful prediction into a history record.
pub fn build_result(inputs: ReactionConditions, outputs: PredictionOutputs) -> PredictionResult {
    PredictionResult {
        id: uuid::Uuid::new_v4().to_string(),
        timestamp: Utc::now(),
        inputs,
        mwd_data: mwd::curve_from_outputs(&outputs),
        outputs,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_keys() {
        let body = PredictRequest {
            inputs: ReactionConditions::default(),
            model_type: Some(ModelType::Nn),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["M"], 0.2);
        assert_eq!(value["Reaction"], 3.0);
        assert_eq!(value["temp"], 300.0);
        assert_eq!(value["model_type"], "nn");

        let body = PredictRequest {
            inputs: ReactionConditions::default(),
            model_type: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("model_type").is_none());
    }

    #[test]
    fn test_raw_prediction_flat_shape() {
        let raw = RawPrediction::from_value(json!({
            "m_output": [1.0, 2.0, 3.0, 4.0, 5.0],
            "x_output": [0.9],
            "model_type": "pcinn"
        }))
        .unwrap();
        assert_eq!(raw.m_output.len(), 5);
        assert_eq!(raw.model_type.as_deref(), Some("pcinn"));
    }

    #[test]
    fn test_raw_prediction_nested_shape() {
        let raw = RawPrediction::from_value(json!({
            "success": true,
            "outputs": {
                "m_output": [1.0, 2.0, 3.0, 4.0, 5.0],
                "x_output": [0.8],
                "m_output_log10": [0.0, 0.3, 0.47, 0.6, 0.69]
            },
            "input": {"M": 0.2}
        }))
        .unwrap();
        assert_eq!(raw.x_output, vec![0.8]);
        assert!(raw.m_output_log10.is_some());
    }

    #[test]
    fn test_raw_prediction_missing_arrays_is_malformed() {
        let err = RawPrediction::from_value(json!({"x_output": [0.5]})).unwrap_err();
        assert!(err.to_string().contains("malformed response"));
    }

    #[test]
    fn test_default_schema_maps_positions() {
        let raw = RawPrediction::from_value(json!({
            "m_output": [10.0, 20.0, 30.0, 40.0, 50.0, 60.0],
            "x_output": [0.93, 0.1]
        }))
        .unwrap();
        let outputs = OutputSchema::default().map(&raw).unwrap();
        assert_eq!(outputs.get("mn"), Some(10.0));
        assert_eq!(outputs.get("mzPlus1"), Some(40.0));
        assert_eq!(outputs.get("mv"), Some(50.0));
        assert_eq!(outputs.fields.len(), 5);
        assert_eq!(outputs.confidence, 0.93);
    }

    #[test]
    fn test_short_response_is_malformed() {
        let raw = RawPrediction::from_value(json!({
            "m_output": [10.0, 20.0],
            "x_output": [0.9]
        }))
        .unwrap();
        let err = OutputSchema::default().map(&raw).unwrap_err();
        assert!(matches!(err, DashboardError::Backend { status: None, .. }));
    }

    #[test]
    fn test_custom_schema() {
        let schema = OutputSchema::new(vec!["a".into(), "b".into()]).unwrap();
        let raw = RawPrediction::from_value(json!({"m_output": [1.0, 2.0], "x_output": [0.7]})).unwrap();
        let outputs = schema.map(&raw).unwrap();
        assert_eq!(outputs.get("b"), Some(2.0));
    }

    #[test]
    fn test_schema_rejects_duplicates_and_empty() {
        assert!(OutputSchema::new(vec![]).is_err());
        assert!(OutputSchema::new(vec!["a".into(), "a".into()]).is_err());
        assert!(OutputSchema::new(vec!["".into()]).is_err());
    }

    #[tokio::test]
    async fn test_mock_confidence_bounded() {
        let source = MockSource::with_seed(OutputSchema::default(), 3);
        for temp in [250.0, 300.0, 400.0] {
            for time in [0.0, 60.0, 10_000.0] {
                let inputs = ReactionConditions {
                    temp,
                    time,
                    ..ReactionConditions::default()
                };
                let outputs = source.predict(&inputs).await.unwrap();
                assert!((MOCK_CONFIDENCE_MIN..=MOCK_CONFIDENCE_MAX).contains(&outputs.confidence));
                let mn = outputs.get("mn").unwrap();
                let mw = outputs.get("mw").unwrap();
                assert!(mw > mn && mn > 0.0);
            }
        }
    }

    #[tokio::test]
    async fn test_mock_fills_longer_schema() {
        let names: Vec<String> = (0..7).map(|i| format!("f{i}")).collect();
        let source = MockSource::with_seed(OutputSchema::new(names).unwrap(), 1);
        let outputs = source.predict(&ReactionConditions::default()).await.unwrap();
        assert_eq!(outputs.fields.len(), 7);
    }

    #[test]
    fn test_mock_is_reproducible_with_seed() {
        let a = MockSource::with_seed(OutputSchema::default(), 9);
        let b = MockSource::with_seed(OutputSchema::default(), 9);
        let inputs = ReactionConditions::default();
        assert_eq!(a.raw_prediction(&inputs), b.raw_prediction(&inputs));
    }

    #[test]
    fn test_source_from_settings() {
        let settings = Settings::load_from_args(["reactor-dashboard", "--mock"]);
        assert_eq!(source_from_settings(&settings).unwrap().name(), "mock");

        let settings = Settings::load_from_args(["reactor-dashboard"]);
        assert_eq!(source_from_settings(&settings).unwrap().name(), "remote");

        let settings =
            Settings::load_from_args(["reactor-dashboard", "--output-fields", "a,a"]);
        assert!(source_from_settings(&settings).is_err());
    }

    #[test]
    fn test_build_result_uses_predicted_averages() {
        let outputs = PredictionOutputs {
            fields: vec![
                OutputValue {
                    name: "mn".into(),
                    value: 10_000.0,
                },
                OutputValue {
                    name: "mw".into(),
                    value: 20_000.0,
                },
            ],
            confidence: 0.9,
        };
        let result = build_result(ReactionConditions::default(), outputs);
        assert_eq!(result.mwd_data.len(), mwd::CURVE_POINTS);
        assert!(!result.id.is_empty());
    }
}
