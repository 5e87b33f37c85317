// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Filesystem concerns shared by training and serving:
//
//   artifact_store.rs — atomic save and verified load of the
//                       artifact bundle (model + encoders +
//                       schema + manifest)
//
//   metrics.rs        — per-run evaluation metrics appended to
//                       a CSV file next to the bundle
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling)

/// Bundle persistence and startup verification
pub mod artifact_store;

/// Training metrics CSV logger
pub mod metrics;
