// ============================================================
// Layer 4 — Word Tokenizer
// ============================================================
// A whitespace tokenizer with frequency-based pruning.
//
// Normalisation (shared by fit and encode):
//   1. Lowercase
//   2. Every char that is not a letter, digit, underscore or
//      whitespace becomes a single space
//   3. Split on runs of whitespace
//
//   "The cat's mat!" → ["the", "cat", "s", "mat"]
//
// Vocabulary layout:
//   0 = <PAD>   1 = <UNK>   2 = <START>   3 = <END>
//   4.. = corpus words, in the order they were first seen
//
// The vocabulary is append-only. A saved model's embedding
// rows are indexed by these ids, so an id must never move.
//
// Reference: Rust Book §8 (Strings, Hash Maps)

use std::collections::{BTreeMap, HashMap};

use crate::domain::error::PersistenceError;

pub const PAD_ID:   u32 = 0;
pub const UNK_ID:   u32 = 1;
pub const START_ID: u32 = 2;
pub const END_ID:   u32 = 3;

pub const PAD_TOKEN:   &str = "<PAD>";
pub const UNK_TOKEN:   &str = "<UNK>";
pub const START_TOKEN: &str = "<START>";
pub const END_TOKEN:   &str = "<END>";

const RESERVED: [(&str, u32); 4] = [
    (PAD_TOKEN,   PAD_ID),
    (UNK_TOKEN,   UNK_ID),
    (START_TOKEN, START_ID),
    (END_TOKEN,   END_ID),
];

/// Minimum corpus frequency for a word to enter the vocabulary
pub const DEFAULT_MIN_FREQ: usize = 2;

// ─── Vocabulary ───────────────────────────────────────────────────────────────
/// Bidirectional word ↔ id mapping. Both directions always
/// hold exactly the same set of (word, id) pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    word_to_id: HashMap<String, u32>,
    id_to_word: BTreeMap<u32, String>,
    next_id:    u32,
}

impl Vocabulary {
    /// A vocabulary holding only the four reserved tokens
    pub fn new() -> Self {
        let mut vocab = Self {
            word_to_id: HashMap::new(),
            id_to_word: BTreeMap::new(),
            next_id:    0,
        };
        for (word, id) in RESERVED {
            vocab.word_to_id.insert(word.to_string(), id);
            vocab.id_to_word.insert(id, word.to_string());
        }
        vocab.next_id = RESERVED.len() as u32;
        vocab
    }

    /// Rebuild from a saved word → id map by inverting it.
    ///
    /// Rejected when two words share an id, when a reserved token is
    /// missing or sits at the wrong id, or when the ids leave a gap.
    pub fn from_word_ids(map: &BTreeMap<String, u32>) -> Result<Self, PersistenceError> {
        for (word, id) in RESERVED {
            match map.get(word) {
                Some(&found) if found == id => {}
                Some(&found) => {
                    return Err(PersistenceError::InvalidVocabulary(format!(
                        "reserved token {word} must have id {id}, found {found}"
                    )))
                }
                None => {
                    return Err(PersistenceError::InvalidVocabulary(format!(
                        "reserved token {word} is missing"
                    )))
                }
            }
        }

        let mut id_to_word = BTreeMap::new();
        for (word, &id) in map {
            if let Some(other) = id_to_word.insert(id, word.clone()) {
                return Err(PersistenceError::InvalidVocabulary(format!(
                    "id {id} is assigned to both '{other}' and '{word}'"
                )));
            }
        }

        // ids must be exactly 0..len so the model's vocab size covers them
        for (want, &id) in (0u32..).zip(id_to_word.keys()) {
            if want != id {
                return Err(PersistenceError::InvalidVocabulary(format!("id {want} is missing")));
            }
        }

        let next_id = id_to_word.len() as u32;
        Ok(Self {
            word_to_id: map.iter().map(|(w, &id)| (w.clone(), id)).collect(),
            id_to_word,
            next_id,
        })
    }

    /// Add `word` if absent; returns its id either way.
    pub fn insert(&mut self, word: &str) -> u32 {
        if let Some(&id) = self.word_to_id.get(word) {
            return id;
        }
        let id = self.next_id;
        self.word_to_id.insert(word.to_string(), id);
        self.id_to_word.insert(id, word.to_string());
        self.next_id += 1;
        id
    }

    pub fn id(&self, word: &str) -> Option<u32> {
        self.word_to_id.get(word).copied()
    }

    pub fn word(&self, id: u32) -> Option<&str> {
        self.id_to_word.get(&id).map(String::as_str)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.word_to_id.contains_key(word)
    }

    /// Number of entries, reserved tokens included
    pub fn len(&self) -> usize {
        self.word_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_to_id.is_empty()
    }

    /// Largest id in use
    pub fn max_id(&self) -> u32 {
        self.id_to_word.keys().next_back().copied().unwrap_or(0)
    }

    /// Snapshot of the word → id direction, ordered by word
    pub fn word_ids(&self) -> BTreeMap<String, u32> {
        self.word_to_id.iter().map(|(w, &id)| (w.clone(), id)).collect()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

// ─── WordTokenizer ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordTokenizer {
    vocab: Vocabulary,
}

impl WordTokenizer {
    pub fn new() -> Self {
        Self { vocab: Vocabulary::new() }
    }

    pub fn from_vocabulary(vocab: Vocabulary) -> Self {
        Self { vocab }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Lowercase and replace everything except letters, digits,
    /// underscores and whitespace with a space.
    pub fn normalize(text: &str) -> String {
        text.to_lowercase()
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                    c
                } else {
                    ' '
                }
            })
            .collect()
    }

    /// Normalise then split into words
    pub fn tokenize(text: &str) -> Vec<String> {
        Self::normalize(text)
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Count words across `texts` and add every word seen at least
    /// `min_freq` times. Words are added in first-seen order.
    ///
    /// Calling fit again adds to the existing vocabulary; nothing
    /// already present is removed or renumbered.
    pub fn fit<S: AsRef<str>>(&mut self, texts: &[S], min_freq: usize) {
        let min_freq = min_freq.max(1);

        // Frequency table in first-occurrence order: `order` keeps
        // the sequence, `index` points into it for O(1) counting.
        let mut order: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for text in texts {
            for word in Self::tokenize(text.as_ref()) {
                match index.get(&word) {
                    Some(&slot) => order[slot].1 += 1,
                    None => {
                        index.insert(word.clone(), order.len());
                        order.push((word, 1));
                    }
                }
            }
        }

        let before = self.vocab.len();
        for (word, count) in &order {
            if *count >= min_freq && !self.vocab.contains(word) {
                self.vocab.insert(word);
            }
        }

        tracing::debug!(
            "Tokenizer fit: {} distinct words, {} added (min_freq={}), vocab size {}",
            order.len(),
            self.vocab.len() - before,
            min_freq,
            self.vocab.len()
        );
    }

    /// Exactly `max_len` ids: unknown words become UNK, short
    /// sequences are padded with PAD, long ones keep their prefix.
    pub fn encode(&self, text: &str, max_len: usize) -> Vec<u32> {
        let mut ids: Vec<u32> = Self::tokenize(text)
            .iter()
            .map(|w| self.vocab.id(w).unwrap_or(UNK_ID))
            .collect();
        ids.resize(max_len, PAD_ID);
        ids
    }

    /// Skip PAD, stop at the first END, join the rest with spaces.
    /// Ids missing from the vocabulary decode to the UNK marker.
    pub fn decode(&self, ids: &[u32]) -> String {
        ids.iter()
            .copied()
            .filter(|&id| id != PAD_ID)
            .take_while(|&id| id != END_ID)
            .map(|id| self.vocab.word(id).unwrap_or(UNK_TOKEN))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
