// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The training and generation drivers never talk to a tensor
// library directly. They program against these traits:
//
//   ModelBackend  → builds a fresh model for a vocabulary size
//   LanguageModel → one live model: train a batch, predict the
//                   next-token distribution, export/import weights
//
// Implementations:
//   - BurnBackend<B>      (ml::backend) on NdArray or Wgpu
//   - UnavailableBackend  (ml::backend) when no device works
//   - FakeBackend         (ml::testing) deterministic, tests only
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::bits::BitWidth;
use crate::domain::error::BackendError;
use crate::domain::weights::LayerWeights;

// ─── BatchOutcome ─────────────────────────────────────────────────────────────
/// What one gradient step reports back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchOutcome {
    pub loss:     f64,
    /// Not every backend can report accuracy for every batch
    pub accuracy: Option<f64>,
}

// ─── LanguageModel ────────────────────────────────────────────────────────────
/// A classifier mapping one token id to a probability
/// distribution over the whole vocabulary.
pub trait LanguageModel {
    /// One supervised update. Inputs and targets are parallel slices.
    /// Any tensors created for the batch are released before returning.
    fn train_on_batch(&mut self, inputs: &[u32], targets: &[u32])
        -> Result<BatchOutcome, BackendError>;

    /// Probability of each vocabulary id following `input`.
    /// Deterministic for fixed weights.
    fn predict(&self, input: u32) -> Result<Vec<f32>, BackendError>;

    /// Total trainable scalar count
    fn num_params(&self) -> usize;

    fn vocab_size(&self) -> usize;

    fn export_weights(&self) -> Result<LayerWeights, BackendError>;

    /// Replace the weights of every layer present in `weights`.
    /// Layers the model does not have are ignored; layers missing
    /// from `weights` keep their current values.
    fn import_weights(&mut self, weights: &LayerWeights) -> Result<(), BackendError>;
}

// ─── ModelBackend ─────────────────────────────────────────────────────────────
pub trait ModelBackend {
    type Model: LanguageModel;

    /// Human-readable device name for the stats panel
    fn device_label(&self) -> String;

    fn is_available(&self) -> bool {
        true
    }

    /// `bits` is recorded metadata only; it does not change precision.
    fn create_model(&self, vocab_size: usize, bits: BitWidth)
        -> Result<Self::Model, BackendError>;
}
