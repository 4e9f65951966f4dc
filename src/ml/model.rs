// ============================================================
// Layer 5 — Next-Token Network (Burn)
// ============================================================
// A deliberately tiny classifier: one token in, a distribution
// over the vocabulary out.
//
//   ids [batch, 1]
//     → Embedding(vocab → 128)        [batch, 1, 128]
//     → reshape                       [batch, 128]
//     → Linear(128 → 256) + ReLU      [batch, 256]
//     → Dropout(0.2)
//     → Linear(256 → vocab)           [batch, vocab]   (logits)
//
// Softmax is applied by the caller at inference time; training
// uses cross-entropy on the raw logits.

use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct NextTokenConfig {
    pub vocab_size: usize,
    #[config(default = 128)]
    pub embed_dim:  usize,
    #[config(default = 256)]
    pub hidden_dim: usize,
    #[config(default = 0.2)]
    pub dropout:    f64,
}

impl NextTokenConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> NextTokenModel<B> {
        NextTokenModel {
            embedding: EmbeddingConfig::new(self.vocab_size, self.embed_dim).init(device),
            hidden:    LinearConfig::new(self.embed_dim, self.hidden_dim).init(device),
            dropout:   DropoutConfig::new(self.dropout).init(),
            output:    LinearConfig::new(self.hidden_dim, self.vocab_size).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct NextTokenModel<B: Backend> {
    pub embedding: Embedding<B>,
    pub hidden:    Linear<B>,
    pub dropout:   Dropout,
    pub output:    Linear<B>,
}

/// Loss and accuracy of one forward pass over a batch.
pub struct StepOutput<B: Backend> {
    pub loss:     Tensor<B, 1>,
    pub accuracy: f64,
}

impl<B: Backend> NextTokenModel<B> {
    /// inputs: [batch, 1] → logits: [batch, vocab]
    pub fn forward(&self, inputs: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch_size, _] = inputs.dims();
        let embed_dim = self.embedding.weight.val().dims()[1];

        let x = self.embedding.forward(inputs).reshape([batch_size, embed_dim]);
        let x = relu(self.hidden.forward(x));
        let x = self.dropout.forward(x);
        self.output.forward(x)
    }

    /// Sparse categorical cross-entropy plus argmax accuracy.
    pub fn forward_step(&self, inputs: Tensor<B, 2, Int>, targets: Tensor<B, 1, Int>) -> StepOutput<B> {
        let batch_size = targets.dims()[0];
        let logits = self.forward(inputs);

        let loss = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), targets.clone());

        // argmax(1) returns [batch, 1]; flatten before comparing with [batch]
        let correct: i64 = logits
            .argmax(1)
            .flatten::<1>(0, 1)
            .equal(targets)
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();

        let accuracy = if batch_size > 0 { correct as f64 / batch_size as f64 } else { 0.0 };
        StepOutput { loss, accuracy }
    }

    pub fn vocab_size(&self) -> usize {
        self.embedding.weight.val().dims()[0]
    }
}
