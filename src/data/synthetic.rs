// ============================================================
// Layer 4 — Synthetic Customer Generator
// ============================================================
// Produces a reproducible table of fake customers for demos and
// tests when no real export is available.
//
// Columns and distributions:
//   customer_id       0 .. n
//   tenure            integer  1 ..= 71   (months)
//   monthly_charges   uniform  20 .. 100
//   total_charges     uniform  50 .. 5000
//   contract_type     Month-to-month | One year | Two year
//   paperless_billing 0 | 1
//   payment_method    Electronic check | Mailed check |
//                     Bank transfer | Credit card
//   monthly_usage_gb  uniform  50 .. 500
//   support_calls     integer  0 ..= 9
//   account_age_days  integer  30 ..= 1094
//   churn             Bernoulli(p) with
//
//     p = 0.10
//       + 0.30 if tenure < 12
//       + 0.20 if monthly_charges > 70
//       + 0.15 if support_calls > 5
//       + 0.10 if contract is month-to-month
//       - 0.10 if tenure > 24

use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::record::{Record, Table};
use crate::domain::traits::TableSource;

pub const CONTRACT_TYPES: [&str; 3] = ["Month-to-month", "One year", "Two year"];

pub const PAYMENT_METHODS: [&str; 4] = [
    "Electronic check",
    "Mailed check",
    "Bank transfer",
    "Credit card",
];

pub const COLUMNS: [&str; 11] = [
    "customer_id",
    "tenure",
    "monthly_charges",
    "total_charges",
    "contract_type",
    "paperless_billing",
    "payment_method",
    "monthly_usage_gb",
    "support_calls",
    "account_age_days",
    "churn",
];

/// Seeded generator of fake customer tables.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticCustomers {
    rows: usize,
    seed: u64,
}

impl SyntheticCustomers {
    pub fn new(rows: usize, seed: u64) -> Self {
        Self { rows, seed }
    }

    pub fn generate(&self) -> Table {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let rows = (0..self.rows)
            .map(|id| {
                let tenure          = rng.gen_range(1..72) as f64;
                let monthly_charges = rng.gen_range(20.0..100.0);
                let total_charges   = rng.gen_range(50.0..5000.0);
                let contract_type   = CONTRACT_TYPES[rng.gen_range(0..CONTRACT_TYPES.len())];
                let paperless       = rng.gen_range(0..2) as f64;
                let payment_method  = PAYMENT_METHODS[rng.gen_range(0..PAYMENT_METHODS.len())];
                let usage_gb        = rng.gen_range(50.0..500.0);
                let support_calls   = rng.gen_range(0..10) as f64;
                let account_age     = rng.gen_range(30..365 * 3) as f64;

                let churn_prob = churn_probability(tenure, monthly_charges, support_calls, contract_type);
                let churn      = if rng.gen::<f64>() < churn_prob { 1.0 } else { 0.0 };

                Record::new()
                    .with("customer_id", id as f64)
                    .with("tenure", tenure)
                    .with("monthly_charges", monthly_charges)
                    .with("total_charges", total_charges)
                    .with("contract_type", contract_type)
                    .with("paperless_billing", paperless)
                    .with("payment_method", payment_method)
                    .with("monthly_usage_gb", usage_gb)
                    .with("support_calls", support_calls)
                    .with("account_age_days", account_age)
                    .with("churn", churn)
            })
            .collect();

        Table::new(COLUMNS.iter().map(|c| c.to_string()).collect(), rows)
    }
}

impl TableSource for SyntheticCustomers {
    fn load_table(&self) -> Result<Table> {
        tracing::info!("Generating {} synthetic customers (seed {})", self.rows, self.seed);
        Ok(self.generate())
    }
}

fn churn_probability(tenure: f64, monthly_charges: f64, support_calls: f64, contract: &str) -> f64 {
    let mut p = 0.1;
    if tenure < 12.0 { p += 0.3; }
    if monthly_charges > 70.0 { p += 0.2; }
    if support_calls > 5.0 { p += 0.15; }
    if contract == "Month-to-month" { p += 0.1; }
    if tenure > 24.0 { p -= 0.1; }
    p
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::FieldValue;

    #[test]
    fn test_generates_requested_rows_and_columns() {
        let table = SyntheticCustomers::new(250, 42).generate();
        assert_eq!(table.len(), 250);
        assert_eq!(table.columns().len(), COLUMNS.len());
        assert!(table.rows().iter().all(|r| r.len() == COLUMNS.len()));
    }

    #[test]
    fn test_same_seed_same_table() {
        let a = SyntheticCustomers::new(50, 7).generate();
        let b = SyntheticCustomers::new(50, 7).generate();
        assert_eq!(a.rows(), b.rows());
    }

    #[test]
    fn test_values_within_ranges() {
        let table = SyntheticCustomers::new(500, 42).generate();
        for r in table.rows() {
            let tenure = r.get("tenure").and_then(FieldValue::as_number).unwrap();
            assert!((1.0..72.0).contains(&tenure));
            let calls = r.get("support_calls").and_then(FieldValue::as_number).unwrap();
            assert!((0.0..10.0).contains(&calls));
            let churn = r.get("churn").and_then(FieldValue::as_number).unwrap();
            assert!(churn == 0.0 || churn == 1.0);
            assert!(r.get("contract_type").unwrap().is_text());
        }
    }

    #[test]
    fn test_both_classes_present() {
        let table = SyntheticCustomers::new(1000, 42).generate();
        let churned = table.column_values("churn").filter(|v| v.as_number() == Some(1.0)).count();
        assert!(churned > 100 && churned < 900);
    }

    #[test]
    fn test_churn_probability_formula() {
        assert!((churn_probability(5.0, 80.0, 7.0, "Month-to-month") - 0.85).abs() < 1e-9);
        assert!((churn_probability(30.0, 30.0, 0.0, "Two year") - 0.0).abs() < 1e-9);
    }
}
