// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Scores one raw record against a loaded ArtifactBundle:
//
//   raw Record → encode categoricals → align to schema
//              → classifier → (label, probability)
//
// Holds only an Arc to the immutable bundle, so it is cheap to
// clone and safe to share between threads. Nothing here mutates
// the encoders or the schema.

use std::sync::Arc;

use crate::data::dataset::vectorize;
use crate::domain::error::{ChurnError, ChurnResult};
use crate::domain::record::Record;
use crate::ml::bundle::ArtifactBundle;

/// Raw classifier output for one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub label:       u8,
    pub probability: f64,
}

#[derive(Debug, Clone)]
pub struct Inferencer {
    bundle: Arc<ArtifactBundle>,
}

impl Inferencer {
    pub fn new(bundle: Arc<ArtifactBundle>) -> Self {
        Self { bundle }
    }

    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }

    pub fn score(&self, record: &Record) -> ChurnResult<Score> {
        let features    = vectorize(self.bundle.encoders(), self.bundle.schema(), record)?;
        let probability = self.bundle.classifier().predict_proba(&features)?;

        if !(0.0..=1.0).contains(&probability) {
            return Err(ChurnError::classifier(format!(
                "classifier returned probability {probability} outside [0, 1]"
            )));
        }

        let label = u8::from(probability > 0.5);
        tracing::debug!("Scored record: label={} p={:.4}", label, probability);
        Ok(Score { label, probability })
    }
}
