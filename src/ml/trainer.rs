// ============================================================
// Layer 5 — Model Fitting and Evaluation
// ============================================================
// Fits the forest on the encoded training subset, then scores
// it on the encoded evaluation subset.
//
// The evaluation result is logged and returned but never
// inspected here: a low accuracy still yields a model. Callers
// that want a quality gate apply it themselves.

use crate::data::dataset::EncodedDataset;
use crate::domain::error::ChurnResult;
use crate::domain::traits::Classifier;
use crate::ml::evaluation::EvaluationReport;
use crate::ml::forest::{ForestConfig, RandomForest};

pub struct TrainingOutcome {
    pub model:  RandomForest,
    pub report: EvaluationReport,
}

pub fn fit_and_evaluate(
    cfg:   &ForestConfig,
    train: &EncodedDataset,
    eval:  &EncodedDataset,
) -> ChurnResult<TrainingOutcome> {
    tracing::info!(
        "Fitting random forest: {} trees, max depth {}, seed {}",
        cfg.n_estimators,
        cfg.max_depth,
        cfg.seed
    );
    let model = RandomForest::fit(cfg, train.features(), train.labels())?;

    let y_pred = eval
        .features()
        .rows()
        .into_iter()
        .map(|row| model.predict(&row.to_vec()))
        .collect::<ChurnResult<Vec<u8>>>()?;

    let report = EvaluationReport::compute(eval.labels(), &y_pred)?;

    tracing::info!("Model Accuracy: {:.2}%", report.accuracy * 100.0);
    tracing::info!("Classification Report:\n{}", report);

    Ok(TrainingOutcome { model, report })
}
