// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The two seams of the system:
//
//   Classifier  — anything that turns an aligned feature vector
//                 into a churn probability. RandomForest (Layer 5)
//                 is the only implementation today.
//
//   TableSource — anything that can hand the Trainer a table of
//                 customer records (a JSON file, the synthetic
//                 generator, ...).
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::error::ChurnResult;
use crate::domain::record::Table;

// ─── Classifier ───────────────────────────────────────────────────────────────
/// A trained binary classifier over aligned feature vectors.
///
/// `Send + Sync` so one instance can be shared across request threads.
pub trait Classifier: Send + Sync {
    /// Width of the feature vectors this classifier was trained on.
    fn n_features(&self) -> usize;

    /// Probability that the sample belongs to the churn class.
    fn predict_proba(&self, features: &[f64]) -> ChurnResult<f64>;

    /// Hard label: 1 when the churn class is the more probable one.
    fn predict(&self, features: &[f64]) -> ChurnResult<u8> {
        Ok(u8::from(self.predict_proba(features)? > 0.5))
    }
}

// ─── TableSource ──────────────────────────────────────────────────────────────
/// Any component that can produce a training table.
pub trait TableSource {
    fn load_table(&self) -> Result<Table>;
}
