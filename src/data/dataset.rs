// ============================================================
// Layer 4 — Encoded Dataset
// ============================================================
// Turns a table of raw records into the numeric matrix the
// classifier trains on:
//
//   raw Record ──EncoderRegistry──▶ encoded Record
//              ──FeatureSchema────▶ Vec<f64> (one row)
//
// `vectorize` is the single path from record to feature vector.
// Training and inference both call it, so a record seen during
// training reproduces exactly the row the model was fitted on.

use ndarray::{Array2, ArrayView2};

use crate::data::{encoder::EncoderRegistry, schema::FeatureSchema};
use crate::domain::error::{ChurnError, ChurnResult};
use crate::domain::record::{Record, Table};

/// Encode then align one record.
pub fn vectorize(
    registry: &EncoderRegistry,
    schema:   &FeatureSchema,
    record:   &Record,
) -> ChurnResult<Vec<f64>> {
    let encoded = registry.encode_record(record)?;
    schema.align(&encoded)
}

/// Read the binary target of a training record (0 or 1).
pub fn target_label(record: &Record, target_column: &str) -> ChurnResult<u8> {
    let value = record.get(target_column).ok_or_else(|| {
        ChurnError::training_data(format!("row is missing target column '{target_column}'"))
    })?;
    match value.as_number() {
        Some(n) if n == 0.0 => Ok(0),
        Some(n) if n == 1.0 => Ok(1),
        _ => Err(ChurnError::training_data(format!(
            "target column '{target_column}' must be 0 or 1, got {}",
            value.as_category()
        ))),
    }
}

/// Feature matrix plus labels, row-aligned.
#[derive(Debug, Clone)]
pub struct EncodedDataset {
    features: Array2<f64>,
    labels:   Vec<u8>,
}

impl EncodedDataset {
    /// Vectorize every row of `table` and read its label.
    pub fn build(
        table:         &Table,
        registry:      &EncoderRegistry,
        schema:        &FeatureSchema,
        target_column: &str,
    ) -> ChurnResult<Self> {
        let mut flat   = Vec::with_capacity(table.len() * schema.len());
        let mut labels = Vec::with_capacity(table.len());

        for (i, record) in table.rows().iter().enumerate() {
            let row = vectorize(registry, schema, record)
                .map_err(|e| ChurnError::training_data(format!("row {i}: {e}")))?;
            flat.extend(row);
            labels.push(target_label(record, target_column)?);
        }

        let features = Array2::from_shape_vec((labels.len(), schema.len()), flat)
            .map_err(|e| ChurnError::training_data(format!("feature matrix: {e}")))?;

        Ok(Self { features, labels })
    }

    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Churn rate of this dataset (share of label 1).
    pub fn positive_rate(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.labels.iter().filter(|&&l| l == 1).count() as f64 / self.labels.len() as f64
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;

    fn table() -> Table {
        Table::new(
            vec!["customer_id".into(), "tenure".into(), "contract_type".into(), "churn".into()],
            vec![
                Record::new().with("customer_id", 0.0).with("tenure", 3.0).with("contract_type", "Two year").with("churn", 1.0),
                Record::new().with("customer_id", 1.0).with("tenure", 40.0).with("contract_type", "One year").with("churn", 0.0),
            ],
        )
    }

    #[test]
    fn test_build_matrix_shape_and_values() {
        let t        = table();
        let schema   = FeatureSchema::derive(t.columns(), "customer_id", "churn").unwrap();
        let registry = EncoderRegistry::fit(&t, &["contract_type".to_string()]).unwrap();
        let ds       = EncodedDataset::build(&t, &registry, &schema, "churn").unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.n_features(), 2);
        assert_eq!(ds.labels(), &[1, 0]);
        // "One year" = 0, "Two year" = 1
        assert_eq!(ds.features()[[0, 1]], 1.0);
        assert_eq!(ds.features()[[1, 0]], 40.0);
        assert_eq!(ds.positive_rate(), 0.5);
    }

    #[test]
    fn test_rows_match_vectorize() {
        let t        = table();
        let schema   = FeatureSchema::derive(t.columns(), "customer_id", "churn").unwrap();
        let registry = EncoderRegistry::fit(&t, &["contract_type".to_string()]).unwrap();
        let ds       = EncodedDataset::build(&t, &registry, &schema, "churn").unwrap();

        for (i, record) in t.rows().iter().enumerate() {
            let v = vectorize(&registry, &schema, record).unwrap();
            assert_eq!(ds.features().row(i).to_vec(), v);
        }
    }

    #[test]
    fn test_target_label_rejects_non_binary() {
        let rec = Record::new().with("churn", 2.0);
        assert_eq!(target_label(&rec, "churn").unwrap_err().kind(), ErrorKind::TrainingData);
        let rec = Record::new();
        assert!(target_label(&rec, "churn").is_err());
        let rec = Record::new().with("churn", "1");
        assert_eq!(target_label(&rec, "churn").unwrap(), 1);
    }
}
