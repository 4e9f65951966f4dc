// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a raw text file to tensor batches:
//
//   text file
//       │
//       ▼
//   TextFileLoader    → reads the file, splits into sentences
//       │
//       ▼
//   WordTokenizer     → builds the vocabulary, encodes to ids
//       │
//       ▼
//   prepare_dataset   → fixed-length encoding → (input, next) pairs
//       │
//       ▼
//   NextTokenBatcher  → stacks one batch of pairs into tensors
//
// Shuffling and batching order belong to the training driver
// (ml::trainer), not to this layer.

/// Reads a corpus file and splits it into sentences
pub mod corpus;

/// Whitespace tokenizer and vocabulary
pub mod tokenizer;

/// (input, next-token) dataset, implements Burn's Dataset trait
pub mod dataset;

/// Builds tensor batches for the Burn backend
pub mod batcher;
