// ============================================================
// Layer 3 — Serialised Weights
// ============================================================
// A framework-neutral snapshot of model parameters:
//
//   layer name → [ {shape, data}, ... ]
//
// e.g. "hidden" → [ weight {shape: [128, 256]}, bias {shape: [256]} ]
//
// `data` is the row-major flattening of the tensor. This is the
// exact shape of the "weights" object in the saved JSON document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::error::BackendError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTensor {
    pub shape: Vec<usize>,
    pub data:  Vec<f32>,
}

impl WeightTensor {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self { shape, data }
    }

    /// Number of elements implied by `shape`
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Check that the flat data matches the declared shape, and
    /// optionally that the shape matches what a layer expects.
    pub fn validate(&self, layer: &str, expected: &[usize]) -> Result<(), BackendError> {
        if self.shape != expected {
            return Err(BackendError::ShapeMismatch {
                layer:    layer.to_string(),
                expected: expected.to_vec(),
                found:    self.shape.clone(),
            });
        }
        if self.data.len() != self.numel() {
            return Err(BackendError::Tensor(format!(
                "layer '{layer}': shape {:?} needs {} values, found {}",
                self.shape,
                self.numel(),
                self.data.len()
            )));
        }
        Ok(())
    }
}

/// Ordered by layer name so saved documents are stable across runs.
pub type LayerWeights = BTreeMap<String, Vec<WeightTensor>>;
