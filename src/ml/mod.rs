// ============================================================
// Layer 5 — ML / Model Layer
// ============================================================
// Everything that knows how the classifier works internally.
//
//   tree.rs       — CART decision tree (Gini, depth-bounded)
//   forest.rs     — bagged random forest over those trees,
//                   implements the domain Classifier trait
//   evaluation.rs — accuracy and per-class precision / recall / F1
//   trainer.rs    — fit on the training subset, score the
//                   held-out subset
//   bundle.rs     — model + encoders + schema from one run
//   inferencer.rs — record → feature vector → probability
//
// Reference: Breiman (2001) Random Forests
//            Rust Book §10 (Traits)

/// CART decision tree
pub mod tree;

/// Random forest ensemble
pub mod forest;

/// Classification metrics on held-out data
pub mod evaluation;

/// Fit + evaluate
pub mod trainer;

/// Co-versioned classifier, encoders and schema
pub mod bundle;

/// Scores single records against a bundle
pub mod inferencer;
