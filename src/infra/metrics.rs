// ============================================================
// Layer 6 — Training Metrics Logger
// ============================================================
// Appends one CSV row per training run to <artifact_dir>/metrics.csv.
//
// The file lives next to the bundle directory, not inside it,
// so it keeps its history when a new bundle is swapped in.
//
// Columns:
//   run_id      — matches the bundle manifest
//   train_rows  — rows the model was fitted on
//   eval_rows   — held-out rows it was scored on
//   churn_rate  — share of churned rows in the full table
//   accuracy    — held-out accuracy
//   f1_retained — F1 of class 0
//   f1_churned  — F1 of class 1
//
// Example:
//   run_id,train_rows,eval_rows,churn_rate,accuracy,f1_retained,f1_churned
//   4f0c…,800,200,0.337000,0.705000,0.781000,0.562000
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use uuid::Uuid;

use crate::ml::evaluation::EvaluationReport;

pub const METRICS_FILE: &str = "metrics.csv";

const HEADER: &str = "run_id,train_rows,eval_rows,churn_rate,accuracy,f1_retained,f1_churned";

/// One row of the metrics log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub run_id:      Uuid,
    pub train_rows:  usize,
    pub eval_rows:   usize,
    pub churn_rate:  f64,
    pub accuracy:    f64,
    pub f1_retained: f64,
    pub f1_churned:  f64,
}

impl RunMetrics {
    pub fn from_report(
        run_id:     Uuid,
        train_rows: usize,
        churn_rate: f64,
        report:     &EvaluationReport,
    ) -> Self {
        let f1 = |label| report.class(label).map(|c| c.f1).unwrap_or(0.0);
        Self {
            run_id,
            train_rows,
            eval_rows:   report.samples,
            churn_rate,
            accuracy:    report.accuracy,
            f1_retained: f1(0),
            f1_churned:  f1(1),
        }
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the logger, writing the header if the file is new.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join(METRICS_FILE);
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one run.
    pub fn log(&self, m: &RunMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{},{},{:.6},{:.6},{:.6},{:.6}",
            m.run_id,
            m.train_rows,
            m.eval_rows,
            m.churn_rate,
            m.accuracy,
            m.f1_retained,
            m.f1_churned,
        )?;
        tracing::debug!("Logged metrics for run {}: accuracy={:.4}", m.run_id, m.accuracy);
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
