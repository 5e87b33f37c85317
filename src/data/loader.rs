// ============================================================
// Layer 4 — Table Loader
// ============================================================
// Reads a training table from disk. Two layouts are accepted:
//
//   JSON array   [ {"customer_id": 0, "tenure": 12, ...}, ... ]
//   JSON lines   {"customer_id": 0, "tenure": 12, ...}
//                {"customer_id": 1, "tenure": 3,  ...}
//
// Column order is the order in which column names first appear
// (serde_json is built with `preserve_order`), which becomes the
// Feature Schema order after training.
//
// Reference: serde_json documentation
//            Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::record::{FieldValue, Record, Table};
use crate::domain::traits::TableSource;

/// Loads a table from a `.json` or `.jsonl` file.
pub struct JsonTableLoader {
    path: PathBuf,
}

impl JsonTableLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TableSource for JsonTableLoader {
    fn load_table(&self) -> Result<Table> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read table '{}'", self.path.display()))?;
        let table = parse_table(&text)
            .with_context(|| format!("Cannot parse table '{}'", self.path.display()))?;
        tracing::info!(
            "Loaded {} rows x {} columns from '{}'",
            table.len(),
            table.columns().len(),
            self.path.display()
        );
        Ok(table)
    }
}

/// Parse a JSON array or JSON-lines document into a Table.
pub fn parse_table(text: &str) -> Result<Table> {
    let trimmed = text.trim_start();
    let objects: Vec<Value> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).context("Invalid JSON array")?
    } else {
        trimmed
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).with_context(|| format!("Invalid JSON on line {}", n + 1))
            })
            .collect::<Result<_>>()?
    };

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(objects.len());

    for (i, value) in objects.iter().enumerate() {
        let map: &Map<String, Value> = value
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in map.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
        rows.push(Record::from_json_map(map).with_context(|| format!("Row {i}"))?);
    }

    Ok(Table::new(columns, rows))
}

/// Write a table as JSON lines, fields in table column order.
pub fn save_jsonl(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
    }

    let mut out = String::new();
    for record in table.rows() {
        let mut obj = Map::new();
        for column in table.columns() {
            if let Some(value) = record.get(column) {
                obj.insert(column.clone(), field_to_json(value));
            }
        }
        out.push_str(&serde_json::to_string(&Value::Object(obj))?);
        out.push('\n');
    }

    fs::write(path, out).with_context(|| format!("Cannot write table '{}'", path.display()))?;
    tracing::info!("Wrote {} rows to '{}'", table.len(), path.display());
    Ok(())
}

fn field_to_json(value: &FieldValue) -> Value {
    match value {
        // integral values are written as integers so the file reads naturally
        FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Value::from(*n as i64),
        FieldValue::Number(n) => Value::from(*n),
        FieldValue::Text(s)   => Value::from(s.clone()),
    }
}
