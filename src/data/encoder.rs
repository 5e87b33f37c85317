// ============================================================
// Layer 4 — Categorical Encoders
// ============================================================
// Maps categorical string values to integer codes.
//
// Code assignment policy (pinned):
//   distinct values are sorted lexicographically and numbered
//   from 0, so the same training vocabulary always produces the
//   same codes regardless of row order.
//
//   fit(["Two year", "Month-to-month", "One year", "Two year"])
//     → Month-to-month = 0, One year = 1, Two year = 2
//
// Unseen labels:
//   a value that was not present during fit is encoded as the
//   code of the first fitted value (code 0). Inference never
//   fails because of a novel category.
//
// Encoders are frozen after fit. Nothing here takes `&mut self`
// once the registry has been built.
//
// Reference: Rust Book §8 (Collections), std::collections::BTreeSet

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::error::{ChurnError, ChurnResult};
use crate::domain::record::{FieldValue, Record, Table};

/// Code returned for values never seen during fit.
pub const FALLBACK_CODE: u32 = 0;

/// Encoder for a single categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    /// Sorted distinct training values; index = code
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit on the raw values of one column.
    pub fn fit<I, S>(column: &str, values: I) -> ChurnResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();

        if distinct.is_empty() {
            return Err(ChurnError::training_data(format!(
                "categorical column '{column}' has no values to fit"
            )));
        }

        Ok(Self { classes: distinct.into_iter().collect() })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// The value unseen labels are mapped onto.
    pub fn fallback_value(&self) -> &str {
        &self.classes[FALLBACK_CODE as usize]
    }

    /// Code of a known value, `None` for unseen labels.
    pub fn lookup(&self, value: &str) -> Option<u32> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
            .map(|i| i as u32)
    }

    /// Code of `value`, falling back to [`FALLBACK_CODE`] for unseen labels.
    pub fn encode(&self, value: &str) -> u32 {
        self.lookup(value).unwrap_or(FALLBACK_CODE)
    }
}

// ─── EncoderRegistry ──────────────────────────────────────────────────────────
/// One encoder per categorical column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncoderRegistry {
    encoders: BTreeMap<String, LabelEncoder>,
}

impl EncoderRegistry {
    /// Fit one encoder for each of `columns` on the given table.
    ///
    /// Only ever called with the training subset, the evaluation
    /// subset is encoded with the result but never fitted on.
    pub fn fit(table: &Table, columns: &[String]) -> ChurnResult<Self> {
        let mut encoders = BTreeMap::new();
        for column in columns {
            let values  = table.column_values(column).map(FieldValue::as_category);
            let encoder = LabelEncoder::fit(column, values)?;
            tracing::debug!(
                "Fitted encoder for '{}' with {} classes (fallback '{}')",
                column,
                encoder.len(),
                encoder.fallback_value(),
            );
            encoders.insert(column.clone(), encoder);
        }
        Ok(Self { encoders })
    }

    pub fn from_encoders(encoders: BTreeMap<String, LabelEncoder>) -> Self {
        Self { encoders }
    }

    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.encoders.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.encoders.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.encoders.keys()
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }

    /// Encode one value of a registered column.
    /// Asking for a column the registry never fitted is a configuration error.
    pub fn encode(&self, column: &str, value: &FieldValue) -> ChurnResult<u32> {
        let encoder = self.encoders.get(column).ok_or_else(|| {
            ChurnError::config(format!("no encoder registered for column '{column}'"))
        })?;
        let raw = value.as_category();
        match encoder.lookup(&raw) {
            Some(code) => Ok(code),
            None => {
                tracing::debug!(
                    "Unseen category '{}' in column '{}', using fallback '{}'",
                    raw,
                    column,
                    encoder.fallback_value(),
                );
                Ok(FALLBACK_CODE)
            }
        }
    }

    /// Copy of `record` with every registered categorical field replaced
    /// by its integer code. Fields the record lacks stay absent.
    pub fn encode_record(&self, record: &Record) -> ChurnResult<Record> {
        let mut encoded = record.clone();
        for column in self.encoders.keys() {
            if let Some(value) = record.get(column) {
                let code = self.encode(column, value)?;
                encoded.insert(column.clone(), FieldValue::Number(f64::from(code)));
            }
        }
        Ok(encoded)
    }
}
