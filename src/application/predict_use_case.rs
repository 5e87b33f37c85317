// ============================================================
// Layer 2 — PredictUseCase (Inference Service)
// ============================================================
// Serves churn predictions from one loaded ArtifactBundle.
//
//   Unready ──load(bundle)──► Ready
//
// In `Unready` every predict fails fast with a configuration
// error. `Ready` is entered at most once and never left; the
// bundle behind it is immutable and shared by Arc, so `&self`
// predictions may run from any number of threads at once.
//
// A failed request leaves nothing behind: the next request sees
// exactly the same service.
//
// Reference: Rust Book §16 (Fearless Concurrency)
//            Rust Book §17.3 (State pattern)

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::domain::error::{ChurnError, ChurnResult};
use crate::domain::prediction::{Prediction, RiskPolicy};
use crate::domain::record::Record;
use crate::infra::artifact_store::ArtifactStore;
use crate::ml::bundle::ArtifactBundle;
use crate::ml::inferencer::Inferencer;

/// Lifecycle of the service.
#[derive(Debug, Clone)]
pub enum ServiceState {
    Unready,
    Ready(Inferencer),
}

/// Liveness payload. Says nothing about the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Health {
    pub status: &'static str,
}

pub struct InferenceService {
    state: ServiceState,
    risk:  RiskPolicy,
}

impl InferenceService {
    /// A service with no bundle yet.
    pub fn unready(risk: RiskPolicy) -> Self {
        Self { state: ServiceState::Unready, risk }
    }

    /// A service that is ready from the start.
    pub fn ready(bundle: Arc<ArtifactBundle>, risk: RiskPolicy) -> Self {
        Self { state: ServiceState::Ready(Inferencer::new(bundle)), risk }
    }

    /// Load the bundle from disk or refuse to start.
    pub fn from_store(store: &ArtifactStore, risk: RiskPolicy) -> ChurnResult<Self> {
        let bundle = store.load()?;
        tracing::info!(
            "Inference service ready: run {} ({} features, {} encoders, {} trees)",
            bundle.run_id(),
            bundle.schema().len(),
            bundle.encoders().len(),
            bundle.model().n_trees()
        );
        Ok(Self::ready(Arc::new(bundle), risk))
    }

    /// Unready → Ready. A second call is a configuration error.
    pub fn load(&mut self, bundle: Arc<ArtifactBundle>) -> ChurnResult<()> {
        if let ServiceState::Ready(current) = &self.state {
            return Err(ChurnError::config(format!(
                "service already serving run {}",
                current.bundle().run_id()
            )));
        }
        self.state = ServiceState::Ready(Inferencer::new(bundle));
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ServiceState::Ready(_))
    }

    pub fn state(&self) -> &ServiceState {
        &self.state
    }

    pub fn risk_policy(&self) -> RiskPolicy {
        self.risk
    }

    pub fn health(&self) -> Health {
        Health { status: "healthy" }
    }

    /// Predict from a raw JSON payload (one flat object).
    pub fn predict_json(&self, payload: &Value) -> ChurnResult<Prediction> {
        let inferencer = self.inferencer()?;
        let record     = Record::from_json(payload)?;
        self.score_with(inferencer, &record)
    }

    /// Predict from an already-typed record.
    pub fn predict(&self, record: &Record) -> ChurnResult<Prediction> {
        let inferencer = self.inferencer()?;
        self.score_with(inferencer, record)
    }

    fn inferencer(&self) -> ChurnResult<&Inferencer> {
        match &self.state {
            ServiceState::Ready(inferencer) => Ok(inferencer),
            ServiceState::Unready => Err(ChurnError::config("model bundle is not loaded")),
        }
    }

    fn score_with(&self, inferencer: &Inferencer, record: &Record) -> ChurnResult<Prediction> {
        let score = inferencer.score(record)?;
        Ok(Prediction {
            churn_prediction:  score.label,
            churn_probability: score.probability,
            churn_risk:        self.risk.tier(score.probability),
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{TrainConfig, TrainUseCase};
    use crate::data::synthetic::SyntheticCustomers;
    use crate::domain::error::ErrorKind;
    use crate::domain::prediction::RiskTier;
    use serde_json::json;

    fn small_bundle() -> Arc<ArtifactBundle> {
        let table = SyntheticCustomers::new(300, 7).generate();
        let cfg   = TrainConfig { n_estimators: 15, ..TrainConfig::default() };
        Arc::new(TrainUseCase::new(cfg).train(&table).unwrap().bundle)
    }

    fn customer() -> Value {
        json!({
            "tenure": 5,
            "monthly_charges": 85.5,
            "total_charges": 420.0,
            "contract_type": "Month-to-month",
            "paperless_billing": 1,
            "payment_method": "Electronic check",
            "monthly_usage_gb": 120.0,
            "support_calls": 7,
            "account_age_days": 200
        })
    }

    #[test]
    fn test_predict_before_load_is_config_error() {
        let service = InferenceService::unready(RiskPolicy::default());
        assert!(!service.is_ready());
        let err = service.predict_json(&customer()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_load_happens_once() {
        let mut service = InferenceService::unready(RiskPolicy::default());
        service.load(small_bundle()).unwrap();
        assert!(service.is_ready());

        let err = service.load(small_bundle()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(service.is_ready());
    }

    #[test]
    fn test_prediction_fields_consistent() {
        let service = InferenceService::ready(small_bundle(), RiskPolicy::default());
        let p       = service.predict_json(&customer()).unwrap();

        assert!((0.0..=1.0).contains(&p.churn_probability));
        assert_eq!(p.churn_prediction, u8::from(p.churn_probability > 0.5));
        let expected = if p.churn_probability > 0.5 { RiskTier::High } else { RiskTier::Low };
        assert_eq!(p.churn_risk, expected);
    }

    #[test]
    fn test_unseen_contract_type_still_predicts() {
        let service = InferenceService::ready(small_bundle(), RiskPolicy::default());
        let mut payload = customer();
        payload["contract_type"] = json!("Quarterly");

        let p = service.predict_json(&payload).unwrap();
        assert!((0.0..=1.0).contains(&p.churn_probability));
    }

    #[test]
    fn test_missing_and_extra_columns_tolerated() {
        let service = InferenceService::ready(small_bundle(), RiskPolicy::default());
        let payload = json!({ "tenure": 3, "favourite_colour": "green" });
        let p = service.predict_json(&payload).unwrap();
        assert!((0.0..=1.0).contains(&p.churn_probability));
    }

    #[test]
    fn test_repeat_predictions_identical() {
        let service = InferenceService::ready(small_bundle(), RiskPolicy::default());
        let a = service.predict_json(&customer()).unwrap();
        let b = service.predict_json(&customer()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bad_payload_is_validation_error_and_service_survives() {
        let service = InferenceService::ready(small_bundle(), RiskPolicy::default());

        let err = service.predict_json(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = service.predict_json(&json!({ "tenure": "a long time" })).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.is_request_level());

        assert!(service.predict_json(&customer()).is_ok());
    }

    #[test]
    fn test_threshold_drives_risk_tier() {
        let service = InferenceService::ready(small_bundle(), RiskPolicy::new(1.0).unwrap());
        let p = service.predict_json(&customer()).unwrap();
        assert_eq!(p.churn_risk, RiskTier::Low);
    }

    #[test]
    fn test_concurrent_predictions_agree() {
        let service  = InferenceService::ready(small_bundle(), RiskPolicy::default());
        let expected = service.predict_json(&customer()).unwrap();

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| service.predict_json(&customer()).unwrap()))
                .collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_from_store_refuses_missing_bundle() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let err   = InferenceService::from_store(&store, RiskPolicy::default()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_health_is_independent_of_bundle() {
        let service = InferenceService::unready(RiskPolicy::default());
        assert_eq!(service.health(), Health { status: "healthy" });
    }
}
