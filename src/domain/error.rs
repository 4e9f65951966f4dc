// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every failure is caught at the boundary of the user action
// that triggered it. The categories map to how the caller
// should react:
//
//   UserInputError   → show a notice, change nothing
//   TrainingError    → abort the run, back to idle, keep
//                      whatever weights were already updated
//   PersistenceError → show a notice, keep the previous model
//   BackendError     → raised by the tensor backend; surfaces
//                      to the user wrapped in one of the above
//
// Reference: thiserror crate documentation

use thiserror::Error;

/// Problems with what the user asked for, detected before any work starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserInputError {
    #[error("no corpus loaded; load a text file first")]
    NoCorpus,

    #[error("message is empty")]
    EmptyMessage,

    #[error("no trained model yet; train or load a model first")]
    NoModel,

    #[error("epoch count must be at least 1")]
    InvalidEpochs,

    #[error("unsupported bit width {0}; expected one of 8, 16, 32")]
    InvalidBits(u32),
}

/// Errors raised by a model backend implementation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BackendError {
    /// No usable tensor device. The session keeps running in a
    /// reduced mode where every model call fails with this.
    #[error("tensor backend unavailable: {0}")]
    Unavailable(String),

    #[error("input and target batches differ in length ({inputs} vs {targets})")]
    BatchMismatch { inputs: usize, targets: usize },

    #[error("token id {id} is outside the vocabulary (size {vocab_size})")]
    TokenOutOfRange { id: u32, vocab_size: usize },

    #[error("layer '{layer}' expects {expected} tensors, got {found}")]
    TensorCount {
        layer:    String,
        expected: usize,
        found:    usize,
    },

    #[error("layer '{layer}' shape mismatch: expected {expected:?}, got {found:?}")]
    ShapeMismatch {
        layer:    String,
        expected: Vec<usize>,
        found:    Vec<usize>,
    },

    #[error("tensor data error: {0}")]
    Tensor(String),
}

/// Failures of a training run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrainingError {
    /// Rejected re-entrant start. The active run is not affected.
    #[error("a training run is already in progress")]
    AlreadyRunning,

    #[error("training dataset is empty")]
    EmptyDataset,

    #[error("backend failure during training: {0}")]
    Backend(#[from] BackendError),
}

/// Failures while saving or loading a model document.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path:   String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed model document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid vocabulary: {0}")]
    InvalidVocabulary(String),

    #[error("invalid model config: {0}")]
    InvalidConfig(String),

    #[error("cannot restore weights: {0}")]
    Weights(#[from] BackendError),
}

/// Union of everything a session action can fail with.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    UserInput(#[from] UserInputError),

    #[error(transparent)]
    Training(#[from] TrainingError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Raised outside training, e.g. while generating a reply
    #[error(transparent)]
    Backend(#[from] BackendError),
}
