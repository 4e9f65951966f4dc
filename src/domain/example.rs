// ============================================================
// Layer 3 — Training Example
// ============================================================
// "Given this one token, predict the next one."
//
// Each example is taken from two neighbouring positions of
// a fixed-length encoded sentence:
//
//   encoded: [the, cat, sat, PAD, PAD]
//   pairs:   (the→cat) (cat→sat) (sat→PAD) (PAD→PAD)
//
// Padding positions are kept on purpose; see data::dataset.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrainingExample {
    /// Token id the model sees
    pub input: u32,

    /// Token id the model should predict
    pub target: u32,
}

impl TrainingExample {
    pub fn new(input: u32, target: u32) -> Self {
        Self { input, target }
    }
}
