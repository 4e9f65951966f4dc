// ============================================================
// Layer 5 — Generation Driver
// ============================================================
// Greedy autoregressive decoding, one token at a time:
//
//   1. Encode the prompt to PROMPT_LENGTH ids and take the
//      FIRST id as the seed token
//   2. Repeat up to max_length times:
//        probs = predict(current)
//        next  = argmax(probs)       (first maximum wins)
//        stop if next == END         (END is not kept)
//        keep next, feed it back in
//   3. Decode the kept ids; fall back to a fixed reply when
//      nothing printable came out
//
// Every step depends on the previous prediction, so there is
// nothing to batch or parallelise here.

use crate::data::tokenizer::{WordTokenizer, END_ID, PAD_ID};
use crate::domain::error::BackendError;
use crate::domain::traits::LanguageModel;

pub const DEFAULT_MAX_LENGTH: usize = 30;

/// Prompts are encoded at this fixed length before seeding
pub const PROMPT_LENGTH: usize = 20;

pub const FALLBACK_RESPONSE: &str = "Hmm, let me think...";

/// Index of the largest probability. Ties go to the lowest index;
/// NaN never wins. An empty slice yields PAD.
pub fn argmax(probs: &[f32]) -> u32 {
    let mut best      = PAD_ID;
    let mut best_prob = f32::NEG_INFINITY;
    for (i, &p) in probs.iter().enumerate() {
        if p > best_prob {
            best_prob = p;
            best      = i as u32;
        }
    }
    best
}

/// Generated ids following `seed`, at most `max_length` of them.
pub fn generate_ids<M: LanguageModel + ?Sized>(
    model:      &M,
    seed:       u32,
    max_length: usize,
) -> Result<Vec<u32>, BackendError> {
    let mut generated = Vec::with_capacity(max_length);
    let mut current   = seed;

    for _ in 0..max_length {
        let probs = model.predict(current)?;
        let next  = argmax(&probs);
        if next == END_ID {
            break;
        }
        generated.push(next);
        current = next;
    }

    Ok(generated)
}

/// Reply to `prompt` with greedy decoding.
pub fn generate_response<M: LanguageModel + ?Sized>(
    model:      &M,
    tokenizer:  &WordTokenizer,
    prompt:     &str,
    max_length: usize,
) -> Result<String, BackendError> {
    let seed = tokenizer
        .encode(prompt, PROMPT_LENGTH)
        .first()
        .copied()
        .unwrap_or(PAD_ID);

    let ids = generate_ids(model, seed, max_length)?;
    let response = tokenizer.decode(&ids);

    tracing::debug!("Generated {} ids from seed {} → '{}'", ids.len(), seed, response);

    if response.is_empty() {
        Ok(FALLBACK_RESPONSE.to_string())
    } else {
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::testing::FakeModel;

    fn tokenizer() -> WordTokenizer {
        let mut t = WordTokenizer::new();
        // the=4 cat=5 sat=6
        t.fit(&["the cat sat"], 1);
        t
    }

    #[test]
    fn test_argmax_first_maximum_wins() {
        assert_eq!(argmax(&[0.1, 0.4, 0.4, 0.1]), 1);
        assert_eq!(argmax(&[0.9, 0.05, 0.05]), 0);
        assert_eq!(argmax(&[f32::NAN, 0.2, 0.1]), 1);
        assert_eq!(argmax(&[]), PAD_ID);
    }

    #[test]
    fn test_follows_transitions_until_end() {
        let model = FakeModel::new(7).with_transitions(&[(4, 5), (5, 6), (6, END_ID)]);
        let reply = generate_response(&model, &tokenizer(), "The", DEFAULT_MAX_LENGTH).unwrap();
        assert_eq!(reply, "cat sat");
    }

    #[test]
    fn test_seeds_from_first_prompt_token_only() {
        let model = FakeModel::new(7).with_transitions(&[(4, 5), (5, END_ID), (6, 4)]);
        // "sat" would lead to "the cat"; the first token "the" leads to "cat"
        let reply = generate_response(&model, &tokenizer(), "the sat", DEFAULT_MAX_LENGTH).unwrap();
        assert_eq!(reply, "cat");
    }

    #[test]
    fn test_length_bounded_by_max_length() {
        // 4 → 5 → 4 → 5 ... never produces END
        let model = FakeModel::new(7).with_transitions(&[(4, 5), (5, 4)]);
        for max in [0, 1, 5, 30] {
            let ids = generate_ids(&model, 4, max).unwrap();
            assert_eq!(ids.len(), max);
        }
    }

    #[test]
    fn test_immediate_end_gives_fallback() {
        let model = FakeModel::new(7);
        let reply = generate_response(&model, &tokenizer(), "the", DEFAULT_MAX_LENGTH).unwrap();
        assert_eq!(reply, FALLBACK_RESPONSE);
    }

    #[test]
    fn test_only_padding_gives_fallback() {
        let model = FakeModel::new(7).with_transitions(&[(4, PAD_ID), (PAD_ID, PAD_ID)]);
        let ids   = generate_ids(&model, 4, 10).unwrap();
        assert_eq!(ids, vec![PAD_ID; 10]);
        let reply = generate_response(&model, &tokenizer(), "the", 10).unwrap();
        assert_eq!(reply, FALLBACK_RESPONSE);
    }

    #[test]
    fn test_unknown_prompt_seeds_from_unk() {
        let model = FakeModel::new(7).with_transitions(&[(1, 6), (6, END_ID)]);
        let reply = generate_response(&model, &tokenizer(), "zebra", 5).unwrap();
        assert_eq!(reply, "sat");
    }

    #[test]
    fn test_backend_error_propagates() {
        let model = FakeModel::new(3);
        // "the" encodes to 4, outside a 3-word model
        let err = generate_response(&model, &tokenizer(), "the", 5).unwrap_err();
        assert!(matches!(err, BackendError::TokenOutOfRange { id: 4, .. }));
    }
}
