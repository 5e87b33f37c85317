// ============================================================
// Layer 5 — Artifact Bundle
// ============================================================
// The three things inference needs, kept together:
//
//   RandomForest     — the trained classifier
//   EncoderRegistry  — categorical encoders fitted in the same run
//   FeatureSchema    — column order the classifier was fitted on
//
// All three carry the same run id. A bundle can only be built
// when they agree with each other:
//   - classifier width == schema length
//   - every encoded column is a schema column
//   - the forest is structurally valid
// Anything else is a configuration error.
//
// A bundle is immutable once built. Readers share it via Arc.

use uuid::Uuid;

use crate::data::{encoder::EncoderRegistry, schema::FeatureSchema};
use crate::domain::error::{ChurnError, ChurnResult};
use crate::domain::traits::Classifier;
use crate::ml::forest::RandomForest;

#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    run_id:   Uuid,
    model:    RandomForest,
    encoders: EncoderRegistry,
    schema:   FeatureSchema,
}

impl ArtifactBundle {
    pub fn new(
        run_id:   Uuid,
        model:    RandomForest,
        encoders: EncoderRegistry,
        schema:   FeatureSchema,
    ) -> ChurnResult<Self> {
        if model.n_features() != schema.len() {
            return Err(ChurnError::config(format!(
                "classifier expects {} features but the schema has {} columns",
                model.n_features(),
                schema.len()
            )));
        }
        if let Some(column) = encoders.columns().find(|c| !schema.contains(c)) {
            return Err(ChurnError::config(format!(
                "encoder for '{column}' has no matching schema column"
            )));
        }
        if !model.is_well_formed() {
            return Err(ChurnError::config("classifier artifact is structurally invalid"));
        }
        Ok(Self { run_id, model, encoders, schema })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn model(&self) -> &RandomForest {
        &self.model
    }

    pub fn classifier(&self) -> &dyn Classifier {
        &self.model
    }

    pub fn encoders(&self) -> &EncoderRegistry {
        &self.encoders
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encoder::LabelEncoder;
    use crate::domain::error::ErrorKind;
    use crate::ml::forest::ForestConfig;
    use ndarray::array;
    use serde_json::json;
    use std::collections::BTreeMap;

    /// Forest over two features: (tenure, contract_type code).
    fn two_feature_forest() -> RandomForest {
        let x = array![
            [1.0, 0.0], [2.0, 0.0], [3.0, 1.0], [4.0, 0.0],
            [30.0, 2.0], [40.0, 1.0], [50.0, 2.0], [60.0, 2.0],
        ];
        let y   = [1u8, 1, 1, 1, 0, 0, 0, 0];
        let cfg = ForestConfig { n_estimators: 3, max_depth: 3, ..ForestConfig::default() };
        RandomForest::fit(&cfg, x.view(), &y).unwrap()
    }

    fn schema(columns: &[&str]) -> FeatureSchema {
        FeatureSchema::new(columns.iter().map(|c| c.to_string()).collect()).unwrap()
    }

    fn encoders(columns: &[&str]) -> EncoderRegistry {
        let map: BTreeMap<String, LabelEncoder> = columns
            .iter()
            .map(|c| (c.to_string(), LabelEncoder::fit(c, ["One year", "Two year"]).unwrap()))
            .collect();
        EncoderRegistry::from_encoders(map)
    }

    #[test]
    fn test_matching_parts_build_a_bundle() {
        let bundle = ArtifactBundle::new(
            Uuid::new_v4(),
            two_feature_forest(),
            encoders(&["contract_type"]),
            schema(&["tenure", "contract_type"]),
        )
        .unwrap();
        assert_eq!(bundle.classifier().n_features(), 2);
    }

    #[test]
    fn test_width_mismatch_is_config_error() {
        let err = ArtifactBundle::new(
            Uuid::new_v4(),
            two_feature_forest(),
            encoders(&["contract_type"]),
            schema(&["tenure", "contract_type", "support_calls"]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_encoder_outside_schema_is_config_error() {
        let err = ArtifactBundle::new(
            Uuid::new_v4(),
            two_feature_forest(),
            encoders(&["contract_type", "payment_method"]),
            schema(&["tenure", "contract_type"]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("payment_method"));
    }

    #[test]
    fn test_cyclic_tree_is_config_error() {
        let mut raw = serde_json::to_value(two_feature_forest()).unwrap();
        raw["trees"][0] = json!({
            "nodes": [{ "Split": { "feature": 0, "threshold": 0.5, "left": 0, "right": 0 } }]
        });
        let model: RandomForest = serde_json::from_value(raw).unwrap();

        let err = ArtifactBundle::new(
            Uuid::new_v4(),
            model,
            encoders(&["contract_type"]),
            schema(&["tenure", "contract_type"]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
