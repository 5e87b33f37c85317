// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one goal: train a bundle, or serve predictions from one.
//
// Rules for this layer:
//   - No tree growing or scoring math here (that's Layer 5)
//   - No printing here (that's Layer 1)
//   - No direct file access (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// The Inference Service and its Unready → Ready lifecycle
pub mod predict_use_case;

// JSON-lines request loop over the Inference Service
pub mod serve_use_case;
