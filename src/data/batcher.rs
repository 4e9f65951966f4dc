// ============================================================
// Layer 4 — Next-Token Batcher
// ============================================================
// Converts one batch of (input, target) ids into tensors.
//
//   inputs:  N ids → Tensor [N, 1]   (one token per row)
//   targets: N ids → Tensor [N]      (class index per row)
//
// The embedding layer wants a [batch, seq_len] Int tensor, so
// inputs get a sequence axis of length 1. Burn uses i32 for Int
// tensor data, hence the casts.
//
// Tensors built here live only for one training step; they are
// dropped when the batch goes out of scope.

use burn::prelude::*;

#[derive(Debug, Clone)]
pub struct NextTokenBatch<B: Backend> {
    /// Shape: [batch_size, 1]
    pub inputs: Tensor<B, 2, Int>,

    /// Shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Holds the device so tensors are created on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct NextTokenBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> NextTokenBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// `inputs` and `targets` must be the same length.
    pub fn batch(&self, inputs: &[u32], targets: &[u32]) -> NextTokenBatch<B> {
        let batch_size = inputs.len();

        let input_flat: Vec<i32>  = inputs.iter().map(|&id| id as i32).collect();
        let target_flat: Vec<i32> = targets.iter().map(|&id| id as i32).collect();

        let inputs = Tensor::<B, 1, Int>::from_ints(input_flat.as_slice(), &self.device)
            .reshape([batch_size, 1]);
        let targets = Tensor::<B, 1, Int>::from_ints(target_flat.as_slice(), &self.device);

        NextTokenBatch { inputs, targets }
    }
}
