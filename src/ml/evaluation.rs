// ============================================================
// Layer 5 — Evaluation Metrics
// ============================================================
// Scores predictions on the held-out subset:
//
//   accuracy  = correct / total
//   precision = TP / (TP + FP)       per class
//   recall    = TP / (TP + FN)       per class
//   f1        = 2·P·R / (P + R)      per class
//   support   = rows whose true label is the class
//
// plus macro (unweighted) and support-weighted averages.
// A metric whose denominator is zero is reported as 0.0.
//
// The report is informational. Nothing in training gates on it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::error::{ChurnError, ChurnResult};

/// Binary labels in report order.
pub const CLASSES: [u8; 2] = [0, 1];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label:     u8,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy:     f64,
    pub samples:      usize,
    pub classes:      Vec<ClassMetrics>,
    pub macro_avg:    AverageMetrics,
    pub weighted_avg: AverageMetrics,
}

impl EvaluationReport {
    pub fn compute(y_true: &[u8], y_pred: &[u8]) -> ChurnResult<Self> {
        if y_true.len() != y_pred.len() {
            return Err(ChurnError::classifier(format!(
                "{} true labels but {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }
        if y_true.is_empty() {
            return Err(ChurnError::training_data("evaluation subset is empty"));
        }

        let samples = y_true.len();
        let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();

        let classes: Vec<ClassMetrics> = CLASSES
            .iter()
            .map(|&label| {
                let pairs = || y_true.iter().zip(y_pred);
                let tp = pairs().filter(|(t, p)| **t == label && **p == label).count();
                let fp = pairs().filter(|(t, p)| **t != label && **p == label).count();
                let fn_ = pairs().filter(|(t, p)| **t == label && **p != label).count();

                let precision = ratio(tp, tp + fp);
                let recall    = ratio(tp, tp + fn_);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics { label, precision, recall, f1, support: tp + fn_ }
            })
            .collect();

        let k = classes.len() as f64;
        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / k,
            recall:    classes.iter().map(|c| c.recall).sum::<f64>() / k,
            f1:        classes.iter().map(|c| c.f1).sum::<f64>() / k,
        };

        let weight = |c: &ClassMetrics| c.support as f64 / samples as f64;
        let weighted_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision * weight(c)).sum(),
            recall:    classes.iter().map(|c| c.recall * weight(c)).sum(),
            f1:        classes.iter().map(|c| c.f1 * weight(c)).sum(),
        };

        Ok(Self {
            accuracy: correct as f64 / samples as f64,
            samples,
            classes,
            macro_avg,
            weighted_avg,
        })
    }

    pub fn class(&self, label: u8) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.label == label)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Plain-text classification report, one row per class plus summary rows.
impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>14} {:>10} {:>10} {:>10.2} {:>10}", "accuracy", "", "", self.accuracy, self.samples)?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, avg.precision, avg.recall, avg.f1, self.samples
            )?;
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_perfect_predictions() {
        let y = [0u8, 1, 0, 1];
        let r = EvaluationReport::compute(&y, &y).unwrap();
        assert_eq!(r.accuracy, 1.0);
        assert!(r.classes.iter().all(|c| c.f1 == 1.0));
    }

    #[test]
    fn test_known_confusion_matrix() {
        // TP(1)=2, FN(1)=1, FP(1)=1, TN=4
        let y_true = [1u8, 1, 1, 0, 0, 0, 0, 0];
        let y_pred = [1u8, 1, 0, 1, 0, 0, 0, 0];
        let r = EvaluationReport::compute(&y_true, &y_pred).unwrap();

        assert!(close(r.accuracy, 6.0 / 8.0));
        let pos = r.class(1).unwrap();
        assert!(close(pos.precision, 2.0 / 3.0));
        assert!(close(pos.recall, 2.0 / 3.0));
        assert_eq!(pos.support, 3);
        let neg = r.class(0).unwrap();
        assert!(close(neg.precision, 4.0 / 5.0));
        assert!(close(neg.recall, 4.0 / 5.0));
        assert_eq!(neg.support, 5);
        assert!(close(r.weighted_avg.recall, r.accuracy));
    }

    #[test]
    fn test_zero_division_reports_zero() {
        let y_true = [0u8, 0, 1];
        let y_pred = [0u8, 0, 0];
        let r = EvaluationReport::compute(&y_true, &y_pred).unwrap();
        let pos = r.class(1).unwrap();
        assert_eq!(pos.precision, 0.0);
        assert_eq!(pos.f1, 0.0);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(EvaluationReport::compute(&[0, 1], &[0]).is_err());
        assert!(EvaluationReport::compute(&[], &[]).is_err());
    }

    #[test]
    fn test_display_lists_every_row() {
        let r    = EvaluationReport::compute(&[0, 1, 1], &[0, 1, 0]).unwrap();
        let text = r.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("accuracy"));
        assert!(text.contains("macro avg"));
        assert!(text.contains("weighted avg"));
    }
}
