// ============================================================
// Layer 5 — ML Layer
// ============================================================
// model.rs     — the Burn network: embedding → dense(ReLU) →
//                dropout → dense, one token in, vocab logits out
//
// backend.rs   — BurnBackend / BurnModel: the domain's backend
//                traits implemented on Burn (NdArray or WGPU),
//                plus the stand-in used when no device works
//
// trainer.rs   — the training driver: shuffle, batch, step,
//                report progress, enforce one run at a time
//
// generator.rs — greedy next-token decoding for chat replies
//
// Only model.rs and backend.rs import Burn. The drivers work on
// any LanguageModel, which keeps them testable with a fake.
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// Next-token network architecture
pub mod model;

/// Burn implementation of the model backend traits
pub mod backend;

/// Epoch/batch training loop
pub mod trainer;

/// Greedy response generation
pub mod generator;

#[cfg(test)]
pub mod testing;
