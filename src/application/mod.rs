// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// user goal (train, chat, inspect a model).
//
// Rules for this layer:
//   - No tensor code here (that's Layer 5)
//   - No printing here (that's Layer 1)
//   - No direct file formats (that's Layer 4 and 6)
//   - Only workflow coordination
//
// session.rs holds the state a user works with; the use cases
// are thin workflows over one session each.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// One model, one tokenizer, one training flag
pub mod session;

// The training workflow
pub mod train_use_case;

// The chat workflow
pub mod chat_use_case;

// Model statistics
pub mod stats_use_case;
