// ============================================================
// Layer 3 — Prediction Domain Type
// ============================================================
// The structured answer returned for one customer record:
//
//   {
//     "churn_prediction":  0 | 1,
//     "churn_probability": 0.0 ..= 1.0,
//     "churn_risk":        "High" | "Low"
//   }
//
// The risk tier is derived from the probability through a
// RiskPolicy. The threshold defaults to 0.5 and is strict:
// exactly 0.5 is still "Low".

use serde::{Deserialize, Serialize};

use crate::domain::error::{ChurnError, ChurnResult};

pub const DEFAULT_RISK_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    High,
    Low,
}

/// Maps a churn probability to a risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskPolicy {
    threshold: f64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self { threshold: DEFAULT_RISK_THRESHOLD }
    }
}

impl RiskPolicy {
    pub fn new(threshold: f64) -> ChurnResult<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ChurnError::config(format!(
                "risk threshold must be within [0, 1], got {threshold}"
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn tier(&self, probability: f64) -> RiskTier {
        if probability > self.threshold { RiskTier::High } else { RiskTier::Low }
    }
}

/// One prediction. Ephemeral, never persisted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub churn_prediction:  u8,
    pub churn_probability: f64,
    pub churn_risk:        RiskTier,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold_is_strict() {
        let policy = RiskPolicy::default();
        assert_eq!(policy.tier(0.5), RiskTier::Low);
        assert_eq!(policy.tier(0.51), RiskTier::High);
        assert_eq!(policy.tier(0.0), RiskTier::Low);
    }

    #[test]
    fn test_custom_threshold() {
        let policy = RiskPolicy::new(0.3).unwrap();
        assert_eq!(policy.tier(0.35), RiskTier::High);
    }

    #[test]
    fn test_threshold_out_of_range_is_config_error() {
        assert!(RiskPolicy::new(1.5).is_err());
        assert!(RiskPolicy::new(f64::NAN).is_err());
    }

    #[test]
    fn test_prediction_wire_format() {
        let p = Prediction {
            churn_prediction:  1,
            churn_probability: 0.8,
            churn_risk:        RiskTier::High,
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["churn_prediction"], 1);
        assert_eq!(json["churn_risk"], "High");
    }
}
