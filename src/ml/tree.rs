// ============================================================
// Layer 5 — CART Decision Tree
// ============================================================
// Binary classification tree grown with the Gini criterion.
//
// Growing a node:
//   1. Stop (leaf) when the node is pure, too small to split,
//      or already at max_depth
//   2. Visit features in random order; evaluate every distinct
//      threshold of a feature by sorting its values and sweeping
//      left → right, keeping running class counts
//   3. Stop visiting once `max_features` non-constant features
//      have been evaluated
//   4. Keep the split with the lowest weighted child impurity,
//      provided it is strictly lower than the parent impurity
//
// Rows may appear several times in `rows` (bootstrap samples);
// duplicates simply count as extra weight.
//
// Leaves store the share of churned rows, which is the tree's
// probability estimate for that region.
//
// Reference: Breiman, Friedman, Olshen & Stone (1984) CART

use ndarray::ArrayView2;
use rand::{rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

const IMPURITY_EPSILON: f64 = 1e-12;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth:         usize,
    pub min_samples_split: usize,
    pub min_samples_leaf:  usize,
    /// Number of non-constant features evaluated per node
    pub max_features:      usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        positive_rate: f64,
        samples:       usize,
    },
    Split {
        feature:   usize,
        threshold: f64,
        left:      usize,
        right:     usize,
    },
}

/// A fitted tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

struct SplitCandidate {
    feature:   usize,
    threshold: f64,
}

struct Grower<'a, 'b> {
    x:      ArrayView2<'a, f64>,
    y:      &'b [u8],
    params: TreeParams,
    nodes:  Vec<TreeNode>,
}

impl DecisionTree {
    /// Grow a tree on the given (possibly repeated) row indices.
    pub fn fit(
        x:      ArrayView2<'_, f64>,
        y:      &[u8],
        rows:   Vec<usize>,
        params: &TreeParams,
        rng:    &mut StdRng,
    ) -> Self {
        let mut grower = Grower { x, y, params: *params, nodes: Vec::new() };
        grower.grow(rows, 0, rng);
        Self { nodes: grower.nodes }
    }

    /// Churn probability for one feature vector.
    /// The caller guarantees `features` has the training width.
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { positive_rate, .. } => return *positive_rate,
                TreeNode::Split { feature, threshold, left, right } => {
                    idx = if features[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Length of the longest root → leaf path (a lone leaf has depth 0).
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match &nodes[idx] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(&self.nodes, 0) }
    }

    /// Every split must use a feature below `n_features` and point at
    /// existing nodes further down the vector. Parents always precede
    /// their children, so a backward or self reference means a cycle.
    pub fn is_well_formed(&self, n_features: usize) -> bool {
        let n = self.nodes.len();
        n > 0
            && self.nodes.iter().enumerate().all(|(i, node)| match node {
                TreeNode::Leaf { positive_rate, .. } => (0.0..=1.0).contains(positive_rate),
                TreeNode::Split { feature, left, right, threshold } => {
                    *feature < n_features
                        && (i + 1..n).contains(left)
                        && (i + 1..n).contains(right)
                        && threshold.is_finite()
                }
            })
    }
}

impl Grower<'_, '_> {
    fn grow(&mut self, rows: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let n         = rows.len();
        let positives = rows.iter().filter(|&&r| self.y[r] == 1).count();
        let leaf      = TreeNode::Leaf {
            positive_rate: if n == 0 { 0.0 } else { positives as f64 / n as f64 },
            samples:       n,
        };

        let is_pure = positives == 0 || positives == n;
        if is_pure || depth >= self.params.max_depth || n < self.params.min_samples_split {
            return self.push(leaf);
        }

        let Some(split) = self.best_split(&rows, positives, rng) else {
            return self.push(leaf);
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&r| self.x[[r, split.feature]] <= split.threshold);

        // reserve the slot so the parent precedes its children
        let idx   = self.push(leaf);
        let left  = self.grow(left_rows, depth + 1, rng);
        let right = self.grow(right_rows, depth + 1, rng);
        self.nodes[idx] = TreeNode::Split {
            feature:   split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }

    fn push(&mut self, node: TreeNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn best_split(&self, rows: &[usize], positives: usize, rng: &mut StdRng) -> Option<SplitCandidate> {
        let n          = rows.len();
        let min_leaf   = self.params.min_samples_leaf.max(1);
        let mut best_score = gini(positives, n) - IMPURITY_EPSILON;
        let mut best: Option<SplitCandidate> = None;

        let mut features: Vec<usize> = (0..self.x.ncols()).collect();
        features.shuffle(rng);

        let mut visited = 0usize;
        for feature in features {
            if visited >= self.params.max_features {
                break;
            }

            let mut pairs: Vec<(f64, u8)> = rows
                .iter()
                .map(|&r| (self.x[[r, feature]], self.y[r]))
                .collect();
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            // constant features do not count towards max_features
            if pairs[0].0 >= pairs[n - 1].0 {
                continue;
            }
            visited += 1;

            let mut left_pos = 0usize;
            for i in 1..n {
                left_pos += usize::from(pairs[i - 1].1);
                let (lo, hi) = (pairs[i - 1].0, pairs[i].0);
                if hi <= lo {
                    continue;
                }
                let (n_left, n_right) = (i, n - i);
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let score = (n_left as f64 * gini(left_pos, n_left)
                    + n_right as f64 * gini(positives - left_pos, n_right))
                    / n as f64;
                if score < best_score {
                    best_score = score;
                    best = Some(SplitCandidate { feature, threshold: midpoint(lo, hi) });
                }
            }
        }
        best
    }
}

/// Gini impurity of a binary node: 2p(1 - p).
fn gini(positives: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

/// Threshold strictly below `hi` and at least `lo`.
fn midpoint(lo: f64, hi: f64) -> f64 {
    let mid = lo + (hi - lo) / 2.0;
    if mid >= hi { lo } else { mid }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    fn params(max_depth: usize, max_features: usize) -> TreeParams {
        TreeParams { max_depth, min_samples_split: 2, min_samples_leaf: 1, max_features }
    }

    #[test]
    fn test_gini_bounds() {
        assert_eq!(gini(0, 10), 0.0);
        assert_eq!(gini(10, 10), 0.0);
        assert!((gini(5, 10) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_learns_single_threshold() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = [0u8, 0, 0, 1, 1, 1];
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(x.view(), &y, (0..6).collect(), &params(5, 1), &mut rng);

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict_proba(&[0.0]), 0.0);
        assert_eq!(tree.predict_proba(&[2.5]), 0.0);
        assert_eq!(tree.predict_proba(&[100.0]), 1.0);
        assert!(tree.is_well_formed(1));
    }

    #[test]
    fn test_picks_informative_feature() {
        // feature 0 is noise, feature 1 separates the classes
        let x = array![[5.0, 0.0], [1.0, 0.0], [5.0, 1.0], [1.0, 1.0]];
        let y = [0u8, 0, 1, 1];
        let mut rng = StdRng::seed_from_u64(3);
        let tree = DecisionTree::fit(x.view(), &y, (0..4).collect(), &params(3, 2), &mut rng);
        assert_eq!(tree.predict_proba(&[5.0, 0.0]), 0.0);
        assert_eq!(tree.predict_proba(&[1.0, 1.0]), 1.0);
    }

    #[test]
    fn test_depth_limit_respected() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0]];
        let y = [0u8, 1, 0, 1, 0, 1, 0, 1];
        let mut rng = StdRng::seed_from_u64(9);
        let tree = DecisionTree::fit(x.view(), &y, (0..8).collect(), &params(2, 1), &mut rng);
        assert!(tree.depth() <= 2);
        let p = tree.predict_proba(&[4.5]);
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let x = array![[1.0], [2.0]];
        let y = [1u8, 1];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = DecisionTree::fit(x.view(), &y, vec![0, 1], &params(10, 1), &mut rng);
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_proba(&[7.0]), 1.0);
    }

    #[test]
    fn test_constant_features_give_leaf() {
        let x = array![[1.0], [1.0], [1.0], [1.0]];
        let y = [0u8, 1, 0, 1];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = DecisionTree::fit(x.view(), &y, (0..4).collect(), &params(10, 1), &mut rng);
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_proba(&[1.0]), 0.5);
    }

    #[test]
    fn test_self_referencing_split_is_malformed() {
        let tree: DecisionTree = serde_json::from_str(
            r#"{"nodes":[{"Split":{"feature":0,"threshold":0.5,"left":0,"right":0}}]}"#,
        )
        .unwrap();
        assert!(!tree.is_well_formed(1));
    }

    #[test]
    fn test_backward_reference_is_malformed() {
        let tree: DecisionTree = serde_json::from_str(
            r#"{"nodes":[
                {"Split":{"feature":0,"threshold":0.5,"left":1,"right":2}},
                {"Leaf":{"positive_rate":0.0,"samples":3}},
                {"Split":{"feature":0,"threshold":0.9,"left":1,"right":0}}
            ]}"#,
        )
        .unwrap();
        assert!(!tree.is_well_formed(1));
    }

    #[test]
    fn test_fitted_tree_round_trips_as_well_formed() {
        let x = array![[1.0, 4.0], [2.0, 3.0], [3.0, 2.0], [10.0, 1.0], [11.0, 0.0]];
        let y = [0u8, 0, 1, 1, 1];
        let mut rng = StdRng::seed_from_u64(5);
        let tree = DecisionTree::fit(x.view(), &y, (0..5).collect(), &params(4, 2), &mut rng);

        let json   = serde_json::to_string(&tree).unwrap();
        let loaded: DecisionTree = serde_json::from_str(&json).unwrap();
        assert!(loaded.is_well_formed(2));
        assert!(!loaded.is_well_formed(0));
    }

    #[test]
    fn test_midpoint_stays_below_upper_value() {
        assert_eq!(midpoint(1.0, 3.0), 2.0);
        let lo = 1.0f64;
        let hi = f64::from_bits(lo.to_bits() + 1);
        assert!(midpoint(lo, hi) < hi);
    }
}
