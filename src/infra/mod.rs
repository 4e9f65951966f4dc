// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by the application layer:
//
//   model_store.rs — Saving and loading a trained model
//                    One JSON document holds the vocabulary,
//                    the model config and every layer's weights.
//                    Writes are atomic (temp file + rename).
//
//   event_log.rs   — The session's severity-tagged event log
//                    Append-only; mirrored to tracing.
//
//   metrics.rs     — Training metrics logging
//                    Writes epoch-level loss/accuracy to a CSV
//                    file next to the saved model.
//
//   timestamp.rs   — UTC wall-clock formatting for the above
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling)

/// Model document persistence
pub mod model_store;

/// Session event log
pub mod event_log;

/// Training metrics CSV logger
pub mod metrics;

/// UTC timestamps
pub mod timestamp;
