// ============================================================
// Layer 2 — ServeUseCase
// ============================================================
// A JSON-lines request loop in front of the InferenceService.
// One request per input line, one response per output line:
//
//   → {"path": "/predict", "body": {"tenure": 5, ...}}
//   ← {"status": 200, "body": {"churn_prediction": 1, ...}}
//
//   → {"path": "/health"}
//   ← {"status": 200, "body": {"status": "healthy"}}
//
// Status codes follow HTTP so a thin HTTP adapter can forward
// them unchanged:
//   200 success, 400 bad request or classifier failure,
//   404 unknown route, 503 service not ready, 500 anything else.
//
// A bad line only ever produces an error response; the loop
// keeps going until input is exhausted.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{BufRead, Write};

use crate::application::predict_use_case::InferenceService;
use crate::domain::error::{ChurnError, ErrorKind};
use crate::domain::prediction::RiskPolicy;
use crate::infra::artifact_store::ArtifactStore;

pub const PREDICT_ROUTE: &str = "/predict";
pub const HEALTH_ROUTE:  &str = "/health";

// ─── Serve Configuration ──────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct ServeConfig {
    pub artifact_dir:   String,
    pub risk_threshold: f64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            artifact_dir:   "models".to_string(),
            risk_threshold: crate::domain::prediction::DEFAULT_RISK_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServeRequest {
    pub path: String,
    #[serde(default)]
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServeResponse {
    pub status: u16,
    pub body:   Value,
}

impl ServeResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self { status, body: json!({ "error": message.into() }) }
    }

    fn from_error(err: &ChurnError) -> Self {
        Self::error(status_for(err), err.to_string())
    }
}

/// HTTP-style status code for a failed request.
pub fn status_for(err: &ChurnError) -> u16 {
    match err.kind() {
        ErrorKind::Validation | ErrorKind::Classifier => 400,
        ErrorKind::Config => 503,
        ErrorKind::TrainingData | ErrorKind::Persist => 500,
    }
}

// ─── ServeUseCase ─────────────────────────────────────────────────────────────
pub struct ServeUseCase {
    service: InferenceService,
}

impl ServeUseCase {
    /// Load the bundle and start serving, or fail before reading any input.
    pub fn start(config: &ServeConfig) -> Result<Self> {
        let risk  = RiskPolicy::new(config.risk_threshold)?;
        let store = ArtifactStore::new(&config.artifact_dir);
        let service = InferenceService::from_store(&store, risk).with_context(|| {
            format!("Refusing to serve: no usable bundle under '{}'", config.artifact_dir)
        })?;
        Ok(Self { service })
    }

    pub fn with_service(service: InferenceService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &InferenceService {
        &self.service
    }

    /// Route one parsed request.
    pub fn handle(&self, request: &ServeRequest) -> ServeResponse {
        match request.path.as_str() {
            HEALTH_ROUTE => ServeResponse::ok(json!(self.service.health())),
            PREDICT_ROUTE => match self.service.predict_json(&request.body) {
                Ok(prediction) => ServeResponse::ok(json!(prediction)),
                Err(e) => {
                    tracing::warn!("Prediction failed: {e}");
                    ServeResponse::from_error(&e)
                }
            },
            other => ServeResponse::error(404, format!("unknown route '{other}'")),
        }
    }

    /// Parse and route one input line.
    pub fn handle_line(&self, line: &str) -> ServeResponse {
        match serde_json::from_str::<ServeRequest>(line) {
            Ok(request) => self.handle(&request),
            Err(e) => ServeResponse::error(400, format!("malformed request: {e}")),
        }
    }

    /// Serve until `input` is exhausted. Returns the number of requests handled.
    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<usize> {
        let mut handled = 0;
        for line in input.lines() {
            let line = line.context("Failed to read request line")?;
            if line.trim().is_empty() {
                continue;
            }

            let response = self.handle_line(&line);
            serde_json::to_writer(&mut output, &response).context("Failed to encode response")?;
            writeln!(output).context("Failed to write response")?;
            output.flush().context("Failed to flush response")?;
            handled += 1;
        }
        tracing::info!("Input closed after {handled} requests");
        Ok(handled)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{TrainConfig, TrainUseCase};
    use crate::data::synthetic::SyntheticCustomers;
    use std::sync::Arc;

    fn ready_server() -> ServeUseCase {
        let table  = SyntheticCustomers::new(300, 11).generate();
        let cfg    = TrainConfig { n_estimators: 10, ..TrainConfig::default() };
        let bundle = TrainUseCase::new(cfg).train(&table).unwrap().bundle;
        ServeUseCase::with_service(InferenceService::ready(Arc::new(bundle), RiskPolicy::default()))
    }

    fn unready_server() -> ServeUseCase {
        ServeUseCase::with_service(InferenceService::unready(RiskPolicy::default()))
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&ChurnError::validation("x")), 400);
        assert_eq!(status_for(&ChurnError::classifier("x")), 400);
        assert_eq!(status_for(&ChurnError::config("x")), 503);
        assert_eq!(status_for(&ChurnError::training_data("x")), 500);
    }

    #[test]
    fn test_health_route_without_bundle() {
        let response = unready_server().handle_line(r#"{"path": "/health"}"#);
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({ "status": "healthy" }));
    }

    #[test]
    fn test_predict_route_unready_is_503() {
        let response = unready_server().handle_line(r#"{"path": "/predict", "body": {"tenure": 1}}"#);
        assert_eq!(response.status, 503);
        assert!(response.body["error"].is_string());
    }

    #[test]
    fn test_predict_route_success_shape() {
        let server   = ready_server();
        let response = server.handle_line(
            r#"{"path": "/predict", "body": {"tenure": 2, "contract_type": "Month-to-month", "support_calls": 8}}"#,
        );
        assert_eq!(response.status, 200);

        let body = response.body.as_object().unwrap();
        assert_eq!(body.len(), 3);
        assert!(matches!(body["churn_prediction"].as_u64(), Some(0) | Some(1)));
        let p = body["churn_probability"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&p));
        assert!(matches!(body["churn_risk"].as_str(), Some("High") | Some("Low")));
    }

    #[test]
    fn test_bad_requests() {
        let server = ready_server();

        let response = server.handle_line("not json");
        assert_eq!(response.status, 400);

        let response = server.handle_line(r#"{"path": "/predict", "body": [1, 2]}"#);
        assert_eq!(response.status, 400);

        let response = server.handle_line(r#"{"path": "/retrain"}"#);
        assert_eq!(response.status, 404);
    }

    #[test]
    fn test_run_loop_answers_every_line() {
        let server = ready_server();
        let input  = concat!(
            "{\"path\": \"/health\"}\n",
            "\n",
            "garbage\n",
            "{\"path\": \"/predict\", \"body\": {\"tenure\": 40}}\n",
        );
        let mut output = Vec::new();

        let handled = server.run(input.as_bytes(), &mut output).unwrap();
        assert_eq!(handled, 3);

        let text   = String::from_utf8(output).unwrap();
        let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["status"], 200);
        assert_eq!(lines[1]["status"], 400);
        assert_eq!(lines[2]["status"], 200);
    }

    #[test]
    fn test_start_refuses_without_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ServeConfig {
            artifact_dir: dir.path().to_string_lossy().into_owned(),
            ..ServeConfig::default()
        };
        assert!(ServeUseCase::start(&cfg).is_err());
    }

    #[test]
    fn test_start_rejects_bad_threshold() {
        let cfg = ServeConfig { risk_threshold: 1.5, ..ServeConfig::default() };
        assert!(ServeUseCase::start(&cfg).is_err());
    }
}
