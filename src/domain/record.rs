// ============================================================
// Layer 3 — Records and Tables
// ============================================================
// A Record is one customer snapshot: column name → value.
// A Table is an ordered set of columns plus many Records.
//
// Values are either numeric or categorical text. JSON payloads
// are converted into Records here, so shape problems surface
// as typed Validation errors instead of failing deep inside
// the encoder or the model:
//
//   number  → FieldValue::Number   (must be finite)
//   string  → FieldValue::Text
//   bool    → FieldValue::Number   (false = 0, true = 1)
//   null    → field treated as absent
//   array / object → Validation error
//
// Reference: serde_json documentation (Value, Map)
//            Rust Book §8 (Hash Maps)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::domain::error::{ChurnError, ChurnResult};

/// A single raw field value before encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric reading of the value. Text is accepted when it parses as a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s)   => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    /// Categorical reading of the value, used as the encoder lookup key.
    /// Integral numbers render without a fractional part ("1", not "1.0").
    pub fn as_category(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            FieldValue::Number(n) => n.to_string(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, FieldValue::Text(_))
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

// ─── Record ───────────────────────────────────────────────────────────────────
/// One customer snapshot. Field order carries no meaning here,
/// the Feature Schema decides the order presented to the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for tests and the synthetic generator.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Convert an arbitrary JSON payload into a Record.
    pub fn from_json(value: &Value) -> ChurnResult<Self> {
        match value {
            Value::Object(map) => Self::from_json_map(map),
            other => Err(ChurnError::validation(format!(
                "payload must be a JSON object, got {}",
                json_type_name(other)
            ))),
        }
    }

    pub fn from_json_map(map: &Map<String, Value>) -> ChurnResult<Self> {
        let mut record = Record::new();
        for (key, value) in map {
            let field = match value {
                Value::Null      => continue,
                Value::Bool(b)   => FieldValue::Number(if *b { 1.0 } else { 0.0 }),
                Value::String(s) => FieldValue::Text(s.clone()),
                Value::Number(n) => match n.as_f64() {
                    Some(f) if f.is_finite() => FieldValue::Number(f),
                    _ => {
                        return Err(ChurnError::validation(format!(
                            "field '{key}' is not a finite number"
                        )))
                    }
                },
                other => {
                    return Err(ChurnError::validation(format!(
                        "field '{key}' must be a string or number, got {}",
                        json_type_name(other)
                    )))
                }
            };
            record.fields.insert(key.clone(), field);
        }
        Ok(record)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null      => "null",
        Value::Bool(_)   => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_)  => "array",
        Value::Object(_) => "object",
    }
}

// ─── Table ────────────────────────────────────────────────────────────────────
/// Tabular training input. `columns` keeps first-appearance order,
/// which becomes the Feature Schema order after training.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    rows:    Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Record>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A new table with the same columns holding only the given rows.
    pub fn select(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows:    indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Every present value of one column, in row order.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a FieldValue> + 'a {
        self.rows.iter().filter_map(move |r| r.get(column))
    }
}
