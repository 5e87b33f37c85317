// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run:
//
//   Step 1: Load the customer table        (Layer 4 - data)
//   Step 2: Read and check target labels   (Layer 4 - data)
//   Step 3: Derive the Feature Schema      (Layer 4 - data)
//   Step 4: Stratified 80/20 split         (Layer 4 - data)
//   Step 5: Detect + fit encoders on 80%   (Layer 4 - data)
//   Step 6: Encode both subsets            (Layer 4 - data)
//   Step 7: Fit forest + evaluate          (Layer 5 - ml)
//   Step 8: Assemble the ArtifactBundle    (Layer 5 - ml)
//   Step 9: Persist bundle atomically      (Layer 6 - infra)
//   Step 10: Append run metrics            (Layer 6 - infra)
//
// Steps 2–8 live in `train` and touch no files. A failure in any
// step aborts the whole run and leaves the previous bundle as is.
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::data::{
    dataset::{target_label, EncodedDataset},
    encoder::EncoderRegistry,
    loader::JsonTableLoader,
    schema::FeatureSchema,
    splitter::{stratified_split, Split},
    synthetic::SyntheticCustomers,
};
use crate::domain::error::{ChurnError, ChurnResult};
use crate::domain::record::Table;
use crate::domain::traits::TableSource;
use crate::infra::{
    artifact_store::ArtifactStore,
    metrics::{MetricsLogger, RunMetrics},
};
use crate::ml::{
    bundle::ArtifactBundle,
    evaluation::EvaluationReport,
    forest::{ForestConfig, MaxFeatures},
    trainer::fit_and_evaluate,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything that shapes a training run. Saved inside the bundle
// as train_config.json so a bundle can be traced back to its run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// JSON / JSON-lines table; `None` trains on synthetic customers
    pub data_path:           Option<String>,
    pub synthetic_rows:      usize,
    pub artifact_dir:        String,
    pub id_column:           String,
    pub target_column:       String,
    /// Explicit categorical columns; `None` detects text-valued columns
    pub categorical_columns: Option<Vec<String>>,
    pub test_fraction:       f64,
    pub seed:                u64,
    pub n_estimators:        usize,
    pub max_depth:           usize,
    pub min_samples_split:   usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:           None,
            synthetic_rows:      1000,
            artifact_dir:        "models".to_string(),
            id_column:           "customer_id".to_string(),
            target_column:       "churn".to_string(),
            categorical_columns: None,
            test_fraction:       0.2,
            seed:                42,
            n_estimators:        100,
            max_depth:           10,
            min_samples_split:   2,
        }
    }
}

impl TrainConfig {
    pub fn forest_config(&self) -> ForestConfig {
        ForestConfig {
            n_estimators:      self.n_estimators,
            max_depth:         self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf:  1,
            max_features:      MaxFeatures::Sqrt,
            bootstrap:         true,
            seed:              self.seed,
        }
    }
}

/// Result of `train`: the bundle plus what was learned along the way.
pub struct TrainedRun {
    pub bundle:           ArtifactBundle,
    pub report:           EvaluationReport,
    pub split:            Split,
    pub churn_rate:       f64,
    pub train_churn_rate: f64,
    pub eval_churn_rate:  f64,
}

/// What `execute` hands back to the CLI.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub run_id:     Uuid,
    pub bundle_dir: PathBuf,
    pub accuracy:   f64,
    pub report:     EvaluationReport,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Full pipeline: load, train, persist, log metrics.
    pub fn execute(&self) -> Result<TrainSummary> {
        let cfg = &self.config;

        // ── Step 1: Load the table ────────────────────────────────────────────
        let table = self.source().load_table()?;
        tracing::info!("Training table: {} rows, {} columns", table.len(), table.columns().len());

        // ── Steps 2–8: Train in memory ────────────────────────────────────────
        let run = self.train(&table).context("Training run failed")?;

        // ── Step 9: Persist the bundle ────────────────────────────────────────
        let store      = ArtifactStore::new(&cfg.artifact_dir);
        let bundle_dir = store
            .save(&run.bundle, cfg)
            .context("Could not persist the artifact bundle; previous bundle left in place")?;

        // ── Step 10: Metrics log (reporting only) ─────────────────────────────
        let metrics = RunMetrics::from_report(
            run.bundle.run_id(),
            run.split.train.len(),
            run.churn_rate,
            &run.report,
        );
        if let Err(e) = MetricsLogger::new(&cfg.artifact_dir).and_then(|l| l.log(&metrics)) {
            tracing::warn!("Could not append training metrics: {e:#}");
        }

        Ok(TrainSummary {
            run_id: run.bundle.run_id(),
            bundle_dir,
            accuracy: run.report.accuracy,
            report: run.report,
        })
    }

    fn source(&self) -> Box<dyn TableSource> {
        match &self.config.data_path {
            Some(path) => Box::new(JsonTableLoader::new(path.clone())),
            None => Box::new(SyntheticCustomers::new(self.config.synthetic_rows, self.config.seed)),
        }
    }

    /// Steps 2–8. Produces a complete bundle or fails as a whole.
    pub fn train(&self, table: &Table) -> ChurnResult<TrainedRun> {
        let cfg = &self.config;

        // ── Step 2: Labels ────────────────────────────────────────────────────
        if table.is_empty() {
            return Err(ChurnError::training_data("training table is empty"));
        }
        if !table.columns().iter().any(|c| c == &cfg.target_column) {
            return Err(ChurnError::training_data(format!(
                "target column '{}' not found in table",
                cfg.target_column
            )));
        }
        let labels = table
            .rows()
            .iter()
            .enumerate()
            .map(|(i, r)| {
                target_label(r, &cfg.target_column)
                    .map_err(|e| ChurnError::training_data(format!("row {i}: {e}")))
            })
            .collect::<ChurnResult<Vec<u8>>>()?;

        let positives = labels.iter().filter(|&&l| l == 1).count();
        if positives == 0 || positives == labels.len() {
            return Err(ChurnError::training_data(format!(
                "target column '{}' has a single class",
                cfg.target_column
            )));
        }
        let churn_rate = positives as f64 / labels.len() as f64;

        // ── Step 3: Feature Schema ────────────────────────────────────────────
        let schema = FeatureSchema::derive(table.columns(), &cfg.id_column, &cfg.target_column)?;

        // ── Step 4: Stratified split ──────────────────────────────────────────
        let split       = stratified_split(&labels, cfg.test_fraction, cfg.seed)?;
        let train_table = table.select(&split.train);
        let eval_table  = table.select(&split.test);
        tracing::info!("Split: {} train, {} evaluation", split.train.len(), split.test.len());

        // ── Step 5: Encoders see training rows only ───────────────────────────
        let categorical = self.categorical_columns(&train_table, &schema)?;
        tracing::info!(
            "Feature schema: {} columns, categorical: {:?}",
            schema.len(),
            categorical
        );
        let encoders = EncoderRegistry::fit(&train_table, &categorical)?;

        // ── Step 6: Encode ────────────────────────────────────────────────────
        let train_ds = EncodedDataset::build(&train_table, &encoders, &schema, &cfg.target_column)?;
        let eval_ds  = EncodedDataset::build(&eval_table, &encoders, &schema, &cfg.target_column)?;

        // ── Step 7: Fit + evaluate ────────────────────────────────────────────
        let outcome = fit_and_evaluate(&cfg.forest_config(), &train_ds, &eval_ds)?;

        // ── Step 8: Bundle ────────────────────────────────────────────────────
        let bundle = ArtifactBundle::new(Uuid::new_v4(), outcome.model, encoders, schema)?;

        Ok(TrainedRun {
            bundle,
            report: outcome.report,
            split,
            churn_rate,
            train_churn_rate: train_ds.positive_rate(),
            eval_churn_rate: eval_ds.positive_rate(),
        })
    }

    /// Configured categorical columns, or every schema column holding
    /// text in `table` (the training subset).
    fn categorical_columns(&self, table: &Table, schema: &FeatureSchema) -> ChurnResult<Vec<String>> {
        match &self.config.categorical_columns {
            Some(columns) => {
                if let Some(missing) = columns.iter().find(|c| !schema.contains(c)) {
                    return Err(ChurnError::training_data(format!(
                        "categorical column '{missing}' is not a feature column"
                    )));
                }
                Ok(columns.clone())
            }
            None => Ok(schema
                .columns()
                .iter()
                .filter(|c| table.column_values(c).any(|v| v.is_text()))
                .cloned()
                .collect()),
        }
    }
}
