// ============================================================
// Layer 4 — Feature Schema
// ============================================================
// The ordered list of columns the model was trained on.
// Every feature vector handed to the classifier is produced by
// `align`, so its width and column order always match training.
//
// Alignment rules, applied per schema column in order:
//   1. value present and numeric         → that number
//   2. value present, numeric text       → the parsed number
//   3. value present, non-numeric text   → Validation error
//   4. value absent                      → 0.0
//   Columns the record has but the schema lacks are dropped.
//
// Rule 4 lets callers send partial payloads. The price is that a
// missing field silently degrades the prediction instead of being
// rejected; integrations that forget a field will not notice.
// This is an accepted trade-off and is kept as-is.
//
// Categorical columns must already be encoded (EncoderRegistry)
// before a record reaches `align`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::error::{ChurnError, ChurnResult};
use crate::domain::record::{FieldValue, Record};

/// Value substituted for schema columns missing from a record.
pub const MISSING_FEATURE_DEFAULT: f64 = 0.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Build a schema from an explicit column list. Duplicates are rejected.
    pub fn new(columns: Vec<String>) -> ChurnResult<Self> {
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(ChurnError::config(format!(
                    "feature schema lists column '{column}' twice"
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Training table columns minus the identifier and target columns,
    /// in table order.
    pub fn derive(table_columns: &[String], id_column: &str, target_column: &str) -> ChurnResult<Self> {
        let columns: Vec<String> = table_columns
            .iter()
            .filter(|c| c.as_str() != id_column && c.as_str() != target_column)
            .cloned()
            .collect();

        if columns.is_empty() {
            return Err(ChurnError::training_data(
                "table has no feature columns besides the identifier and target",
            ));
        }

        Self::new(columns).map_err(|e| ChurnError::training_data(e.to_string()))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Ordered numeric feature vector for an already-encoded record.
    pub fn align(&self, record: &Record) -> ChurnResult<Vec<f64>> {
        let mut defaulted = 0usize;
        let features = self
            .columns
            .iter()
            .map(|column| match record.get(column) {
                None => {
                    defaulted += 1;
                    Ok(MISSING_FEATURE_DEFAULT)
                }
                Some(value) => value.as_number().ok_or_else(|| {
                    ChurnError::validation(format!(
                        "column '{column}' expects a number, got {}",
                        describe(value)
                    ))
                }),
            })
            .collect::<ChurnResult<Vec<f64>>>()?;

        if defaulted > 0 {
            tracing::debug!(
                "{} of {} feature columns missing, filled with {}",
                defaulted,
                self.columns.len(),
                MISSING_FEATURE_DEFAULT,
            );
        }
        Ok(features)
    }
}

fn describe(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s)   => format!("text '{s}'"),
        FieldValue::Number(n) => n.to_string(),
    }
}
