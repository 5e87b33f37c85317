// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing what the
// churn system works with: records, tables, predictions and
// the errors that can happen along the way.
//
// Rules for this layer:
//   - NO file I/O
//   - NO model internals (trees, splits, sampling)
//   - Only data types and the traits other layers implement
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

// Typed error taxonomy shared by every layer
pub mod error;

// Field values, customer records and training tables
pub mod record;

// The structured prediction returned to callers
pub mod prediction;

// Core abstractions (traits) that other layers implement
pub mod traits;
