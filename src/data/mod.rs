// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a raw customer table and the numeric
// matrix the classifier sees.
//
//   JSON file / synthetic generator
//       │
//       ▼
//   Table              → ordered columns + raw Records
//       │
//       ▼
//   stratified_split   → training rows / evaluation rows
//       │
//       ▼
//   EncoderRegistry    → categorical strings → integer codes
//       │                (fitted on training rows only)
//       ▼
//   FeatureSchema      → fixed column order, missing → 0
//       │
//       ▼
//   EncodedDataset     → ndarray feature matrix + labels
//
// Reference: Rust Book §7 (Modules), §13 (Iterators and Closures)

/// Reads training tables from JSON / JSON-lines files
pub mod loader;

/// Seeded generator of fake customer tables
pub mod synthetic;

/// Stratified train/evaluation split
pub mod splitter;

/// Per-column categorical encoders and their registry
pub mod encoder;

/// Ordered feature columns and record alignment
pub mod schema;

/// Record → feature vector, table → feature matrix
pub mod dataset;
