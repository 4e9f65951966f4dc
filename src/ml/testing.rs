// Deterministic in-memory backend for driver and session tests.
//
// FakeModel records every batch it is given and predicts from
// a fixed transition table: input id → next id (END by default).

use std::collections::BTreeMap;

use crate::data::tokenizer::END_ID;
use crate::domain::bits::BitWidth;
use crate::domain::error::BackendError;
use crate::domain::traits::{BatchOutcome, LanguageModel, ModelBackend};
use crate::domain::weights::{LayerWeights, WeightTensor};

#[derive(Debug, Clone)]
pub struct FakeModel {
    pub vocab_size:    usize,
    pub bits:          BitWidth,
    pub batches:       Vec<(Vec<u32>, Vec<u32>)>,
    /// Loss reported for batch k is losses[k % len]; 1.0 when empty
    pub losses:        Vec<f64>,
    pub accuracies:    Vec<Option<f64>>,
    /// Fail once this many batches have been applied
    pub fail_on_batch: Option<usize>,
    pub next:          BTreeMap<u32, u32>,
}

impl FakeModel {
    pub fn new(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            bits:          BitWidth::default(),
            batches:       Vec::new(),
            losses:        Vec::new(),
            accuracies:    Vec::new(),
            fail_on_batch: None,
            next:          BTreeMap::new(),
        }
    }

    pub fn with_transitions(mut self, pairs: &[(u32, u32)]) -> Self {
        self.next.extend(pairs.iter().copied());
        self
    }

    fn check(&self, id: u32) -> Result<(), BackendError> {
        if id as usize >= self.vocab_size {
            return Err(BackendError::TokenOutOfRange { id, vocab_size: self.vocab_size });
        }
        Ok(())
    }
}

impl LanguageModel for FakeModel {
    fn train_on_batch(&mut self, inputs: &[u32], targets: &[u32]) -> Result<BatchOutcome, BackendError> {
        if self.fail_on_batch == Some(self.batches.len()) {
            return Err(BackendError::Tensor("injected failure".into()));
        }
        for &id in inputs.iter().chain(targets) {
            self.check(id)?;
        }
        let k = self.batches.len();
        self.batches.push((inputs.to_vec(), targets.to_vec()));

        // Learn the last transition seen for each input
        for (&i, &t) in inputs.iter().zip(targets) {
            self.next.insert(i, t);
        }

        let loss = if self.losses.is_empty() { 1.0 } else { self.losses[k % self.losses.len()] };
        let accuracy = if self.accuracies.is_empty() {
            Some(0.5)
        } else {
            self.accuracies[k % self.accuracies.len()]
        };
        Ok(BatchOutcome { loss, accuracy })
    }

    fn predict(&self, input: u32) -> Result<Vec<f32>, BackendError> {
        self.check(input)?;
        let next = self.next.get(&input).copied().unwrap_or(END_ID);
        let mut probs = vec![0.0f32; self.vocab_size];
        if let Some(p) = probs.get_mut(next as usize) {
            *p = 1.0;
        }
        Ok(probs)
    }

    fn num_params(&self) -> usize {
        self.vocab_size
    }

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn export_weights(&self) -> Result<LayerWeights, BackendError> {
        let table: Vec<f32> = (0..self.vocab_size as u32)
            .map(|i| self.next.get(&i).copied().unwrap_or(END_ID) as f32)
            .collect();
        let mut weights = LayerWeights::new();
        weights.insert("table".into(), vec![WeightTensor::new(vec![self.vocab_size], table)]);
        Ok(weights)
    }

    fn import_weights(&mut self, weights: &LayerWeights) -> Result<(), BackendError> {
        if let Some(tensors) = weights.get("table") {
            let t = tensors.first().ok_or_else(|| BackendError::TensorCount {
                layer:    "table".into(),
                expected: 1,
                found:    0,
            })?;
            t.validate("table", &[self.vocab_size])?;
            self.next = t.data.iter().enumerate().map(|(i, &n)| (i as u32, n as u32)).collect();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    pub unavailable: bool,
}

impl ModelBackend for FakeBackend {
    type Model = FakeModel;

    fn device_label(&self) -> String {
        if self.unavailable { "unavailable".into() } else { "fake".into() }
    }

    fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn create_model(&self, vocab_size: usize, bits: BitWidth) -> Result<FakeModel, BackendError> {
        if self.unavailable {
            return Err(BackendError::Unavailable("fake backend switched off".into()));
        }
        let mut model = FakeModel::new(vocab_size);
        model.bits = bits;
        Ok(model)
    }
}
