// ============================================================
// Layer 4 — Stratified Train/Evaluation Splitter
// ============================================================
// Splits row indices into a training set and a held-out
// evaluation set while keeping the class ratio of each set close
// to the ratio of the full table.
//
// How it works:
//   1. Group row indices by label
//   2. Shuffle each group with a seeded RNG
//   3. Move round(group_len * test_fraction) rows of each group
//      (at least 1, never the whole group) into the evaluation set
//   4. Shuffle both sets so classes are interleaved
//
// The RNG is seeded, so the same table + seed always yields the
// same split.
//
// Reference: rand crate documentation (StdRng, SliceRandom)
//            Rust Book §8 (Vectors)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::collections::BTreeMap;

use crate::domain::error::{ChurnError, ChurnResult};

/// Row indices for the two halves of a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test:  Vec<usize>,
}

/// Stratified split of `labels` into (train, test) row indices.
///
/// # Arguments
/// * `labels`        - One label per row
/// * `test_fraction` - Proportion held out, e.g. 0.2 = 20%
/// * `seed`          - RNG seed; same inputs give the same split
pub fn stratified_split<L: Ord + Clone>(
    labels:        &[L],
    test_fraction: f64,
    seed:          u64,
) -> ChurnResult<Split> {
    if labels.is_empty() {
        return Err(ChurnError::training_data("cannot split an empty table"));
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ChurnError::training_data(format!(
            "test fraction must be within (0, 1), got {test_fraction}"
        )));
    }

    let mut groups: BTreeMap<L, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        groups.entry(label.clone()).or_default().push(i);
    }

    let mut rng   = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test  = Vec::new();

    for (_, mut indices) in groups {
        if indices.len() < 2 {
            return Err(ChurnError::training_data(
                "the least populated class has only 1 member, cannot stratify",
            ));
        }
        indices.shuffle(&mut rng);

        let wanted = ((indices.len() as f64) * test_fraction).round() as usize;
        let n_test = wanted.clamp(1, indices.len() - 1);

        // split_off leaves [0..n_test] in `indices`
        let rest = indices.split_off(n_test);
        test.extend(indices);
        train.extend(rest);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    tracing::debug!(
        "Stratified split: {} training, {} evaluation",
        train.len(),
        test.len(),
    );

    Ok(Split { train, test })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn rate(labels: &[u8], idx: &[usize]) -> f64 {
        idx.iter().filter(|&&i| labels[i] == 1).count() as f64 / idx.len() as f64
    }

    fn skewed_labels(n: usize) -> Vec<u8> {
        // roughly 27% positives in a non-trivial pattern
        (0..n).map(|i| u8::from((i * 7919) % 100 < 27)).collect()
    }

    #[test]
    fn test_correct_split_sizes() {
        let labels = skewed_labels(1000);
        let split  = stratified_split(&labels, 0.2, 42).unwrap();
        assert_eq!(split.train.len() + split.test.len(), 1000);
        assert!((199..=201).contains(&split.test.len()));
    }

    #[test]
    fn test_all_rows_assigned_exactly_once() {
        let labels = skewed_labels(137);
        let split  = stratified_split(&labels, 0.2, 7).unwrap();
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..137).collect::<Vec<_>>());
    }

    #[test]
    fn test_class_ratio_preserved() {
        for n in [50usize, 200, 1000] {
            let labels  = skewed_labels(n);
            let overall = labels.iter().filter(|&&l| l == 1).count() as f64 / n as f64;
            let split   = stratified_split(&labels, 0.2, 42).unwrap();
            assert!((rate(&labels, &split.train) - overall).abs() <= 0.05);
            assert!((rate(&labels, &split.test)  - overall).abs() <= 0.05);
        }
    }

    #[test]
    fn test_same_seed_same_split() {
        let labels = skewed_labels(300);
        assert_eq!(
            stratified_split(&labels, 0.2, 42).unwrap(),
            stratified_split(&labels, 0.2, 42).unwrap(),
        );
    }

    #[test]
    fn test_empty_dataset() {
        let labels: Vec<u8> = Vec::new();
        assert!(stratified_split(&labels, 0.2, 42).is_err());
    }

    #[test]
    fn test_singleton_class_cannot_stratify() {
        let labels = vec![0u8, 0, 0, 0, 1];
        assert!(stratified_split(&labels, 0.2, 42).is_err());
    }

    #[test]
    fn test_invalid_fraction() {
        let labels = skewed_labels(20);
        assert!(stratified_split(&labels, 0.0, 42).is_err());
        assert!(stratified_split(&labels, 1.0, 42).is_err());
    }
}
