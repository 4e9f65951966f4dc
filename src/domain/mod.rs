// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust types and traits describing what the system IS:
// training examples, bit-width metadata, serialised weights,
// the error taxonomy, and the model backend capability.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// The backend traits live here so the training and generation
// drivers can be tested against a fake backend without a GPU.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

/// Error taxonomy surfaced at user-action boundaries
pub mod error;

/// A single (input, next-token) training pair
pub mod example;

/// The reported bit-width setting (8 / 16 / 32)
pub mod bits;

/// Framework-neutral serialised layer weights
pub mod weights;

/// Model backend capability traits
pub mod traits;
