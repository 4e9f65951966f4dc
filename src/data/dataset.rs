// ============================================================
// Layer 4 — Next-Token Dataset
// ============================================================
// Turns sentences into (input, target) pairs.
//
// Each sentence is encoded to a FIXED length first, then every
// neighbouring pair of positions becomes one example:
//
//   "the cat sat", sequence_length = 5
//   encoded: [4, 5, 6, 0, 0]
//   pairs:   (4→5) (5→6) (6→0) (0→0)
//
// Because the encoding is padded, every sentence contributes
// exactly sequence_length - 1 pairs no matter how many words it
// really has. Pairs ending in padding teach the model that a
// sentence is over. Saved models and reported example counts
// depend on this framing, so it stays.

use burn::data::dataset::Dataset;

use crate::data::tokenizer::WordTokenizer;
use crate::domain::example::TrainingExample;

/// Encoded length used for training sentences
pub const DEFAULT_SEQUENCE_LENGTH: usize = 20;

/// Build every (encoded[i], encoded[i+1]) pair for every text.
/// Texts that encode to a single id contribute nothing.
pub fn prepare_dataset<S: AsRef<str>>(
    tokenizer:       &WordTokenizer,
    texts:           &[S],
    sequence_length: usize,
) -> NextTokenDataset {
    let examples: Vec<TrainingExample> = texts
        .iter()
        .map(|text| tokenizer.encode(text.as_ref(), sequence_length))
        .filter(|encoded| encoded.len() > 1)
        .flat_map(|encoded| {
            encoded
                .windows(2)
                .map(|pair| TrainingExample::new(pair[0], pair[1]))
                .collect::<Vec<_>>()
        })
        .collect();

    tracing::debug!(
        "Prepared {} examples from {} texts (sequence_length={})",
        examples.len(),
        texts.len(),
        sequence_length
    );

    NextTokenDataset::new(examples)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NextTokenDataset {
    examples: Vec<TrainingExample>,
}

impl NextTokenDataset {
    pub fn new(examples: Vec<TrainingExample>) -> Self { Self { examples } }

    pub fn examples(&self) -> &[TrainingExample] { &self.examples }

    pub fn is_empty(&self) -> bool { self.examples.is_empty() }
}

impl Dataset<TrainingExample> for NextTokenDataset {
    fn get(&self, index: usize) -> Option<TrainingExample> {
        self.examples.get(index).copied()
    }

    fn len(&self) -> usize {
        self.examples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer(texts: &[&str]) -> WordTokenizer {
        let mut t = WordTokenizer::new();
        t.fit(texts, 1);
        t
    }

    #[test]
    fn test_size_is_texts_times_length_minus_one() {
        let texts = [
            "The cat sat on the mat",
            "A dog barked",
            "Completely unknown words here",
        ];
        let t  = tokenizer(&texts[..2]);
        let ds = prepare_dataset(&t, &texts, DEFAULT_SEQUENCE_LENGTH);
        assert_eq!(ds.len(), texts.len() * 19);
    }

    #[test]
    fn test_pairs_follow_encoded_positions() {
        let t  = tokenizer(&["the cat sat"]);
        let ds = prepare_dataset(&t, &["the cat sat"], 5);
        let pairs: Vec<(u32, u32)> = ds.examples().iter().map(|e| (e.input, e.target)).collect();
        assert_eq!(pairs, vec![(4, 5), (5, 6), (6, 0), (0, 0)]);
    }

    #[test]
    fn test_length_one_contributes_nothing() {
        let t  = tokenizer(&["the cat sat"]);
        let ds = prepare_dataset(&t, &["the cat sat"], 1);
        assert!(ds.is_empty());
    }

    #[test]
    fn test_dataset_trait_access() {
        let t  = tokenizer(&["a b"]);
        let ds = prepare_dataset(&t, &["a b"], 3);
        assert_eq!(ds.get(0), Some(TrainingExample::new(4, 5)));
        assert_eq!(ds.get(2), None);
    }
}
