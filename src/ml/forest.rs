// ============================================================
// Layer 5 — Random Forest Classifier
// ============================================================
// Bagged ensemble of CART trees (Breiman 2001):
//
//   for each of n_estimators trees:
//     draw a bootstrap sample (n rows with replacement)
//     grow a tree, evaluating sqrt(n_features) features per node
//
//   predict_proba(x) = mean of the trees' leaf churn rates
//   predict(x)       = 1 if predict_proba(x) > 0.5
//
// Every random draw comes from one StdRng seeded with
// `config.seed`, so a given table + config always grows the
// same forest.
//
// Reference: Breiman (2001) Random Forests, Machine Learning 45

use ndarray::ArrayView2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::error::{ChurnError, ChurnResult};
use crate::domain::traits::Classifier;
use crate::ml::tree::{DecisionTree, TreeParams};

/// How many features each tree node evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxFeatures {
    Sqrt,
    All,
    Fixed(usize),
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::Sqrt     => (n_features as f64).sqrt() as usize,
            MaxFeatures::All      => n_features,
            MaxFeatures::Fixed(k) => *k,
        };
        k.clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators:      usize,
    pub max_depth:         usize,
    pub min_samples_split: usize,
    pub min_samples_leaf:  usize,
    pub max_features:      MaxFeatures,
    pub bootstrap:         bool,
    pub seed:              u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators:      100,
            max_depth:         10,
            min_samples_split: 2,
            min_samples_leaf:  1,
            max_features:      MaxFeatures::Sqrt,
            bootstrap:         true,
            seed:              42,
        }
    }
}

/// A fitted forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees:      Vec<DecisionTree>,
    n_features: usize,
    config:     ForestConfig,
}

impl RandomForest {
    /// Fit the ensemble on a feature matrix and 0/1 labels.
    pub fn fit(config: &ForestConfig, x: ArrayView2<'_, f64>, y: &[u8]) -> ChurnResult<Self> {
        if config.n_estimators == 0 {
            return Err(ChurnError::config("random forest needs at least one tree"));
        }
        if config.max_depth == 0 {
            return Err(ChurnError::config("max_depth must be at least 1"));
        }
        if x.nrows() != y.len() {
            return Err(ChurnError::classifier(format!(
                "feature matrix has {} rows but {} labels were given",
                x.nrows(),
                y.len()
            )));
        }
        if y.is_empty() || x.ncols() == 0 {
            return Err(ChurnError::training_data("cannot fit a forest on an empty matrix"));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(ChurnError::training_data("feature matrix contains non-finite values"));
        }

        let n      = y.len();
        let params = TreeParams {
            max_depth:         config.max_depth,
            min_samples_split: config.min_samples_split.max(2),
            min_samples_leaf:  config.min_samples_leaf.max(1),
            max_features:      config.max_features.resolve(x.ncols()),
        };

        let mut rng   = StdRng::seed_from_u64(config.seed);
        let mut trees = Vec::with_capacity(config.n_estimators);

        for _ in 0..config.n_estimators {
            let tree_seed: u64 = rng.gen();
            let rows: Vec<usize> = if config.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            let mut tree_rng = StdRng::seed_from_u64(tree_seed);
            trees.push(DecisionTree::fit(x, y, rows, &params, &mut tree_rng));
        }

        tracing::debug!(
            "Grew {} trees (max depth {}, {} features per split)",
            trees.len(),
            params.max_depth,
            params.max_features,
        );

        Ok(Self { trees, n_features: x.ncols(), config: *config })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Structural check used after deserialising a model from disk.
    pub fn is_well_formed(&self) -> bool {
        !self.trees.is_empty() && self.trees.iter().all(|t| t.is_well_formed(self.n_features))
    }
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: &[f64]) -> ChurnResult<f64> {
        if features.len() != self.n_features {
            return Err(ChurnError::classifier(format!(
                "expected {} features, got {}",
                self.n_features,
                features.len()
            )));
        }
        if let Some(i) = features.iter().position(|v| !v.is_finite()) {
            return Err(ChurnError::classifier(format!("feature {i} is not finite")));
        }
        if self.trees.is_empty() {
            return Err(ChurnError::classifier("forest has no trees"));
        }

        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(features)).sum();
        Ok((sum / self.trees.len() as f64).clamp(0.0, 1.0))
    }
}
