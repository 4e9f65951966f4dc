// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Reads a plain-text file and cuts it into sentences.
//
// Sentence splitting rule:
//   - split on runs of '.', '!' or '?'
//   - keep a fragment only if its trimmed length is more
//     than 10 characters (drops headings, initials, "Hi!")
//
//   "Hi! The cat sat on the mat. Dr. Who?"
//     → ["The cat sat on the mat"]
//
// Every kept sentence becomes one training text.
//
// Reference: Rust Book §9 (Error Handling), §12 (Reading a File)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

/// Fragments must be strictly longer than this after trimming
pub const MIN_SENTENCE_CHARS: usize = 10;

/// A loaded corpus plus the facts the log reports about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    /// File name the text came from
    pub source:     String,
    pub size_bytes: u64,
    pub sentences:  Vec<String>,
}

impl Corpus {
    /// Build a corpus from text already in memory
    pub fn from_text(source: impl Into<String>, text: &str) -> Self {
        Self {
            source:     source.into(),
            size_bytes: text.len() as u64,
            sentences:  split_sentences(text),
        }
    }

    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

/// Split on runs of sentence terminators, keeping fragments whose
/// trimmed length exceeds [`MIN_SENTENCE_CHARS`].
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        // Unicode scalars, not UTF-16 units: an emoji counts once
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .map(str::to_string)
        .collect()
}

// ─── TextFileLoader ───────────────────────────────────────────────────────────
pub struct TextFileLoader {
    path: PathBuf,
}

impl TextFileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Corpus> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read corpus file '{}'", self.path.display()))?;

        let source = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let corpus = Corpus::from_text(source, &text);
        tracing::info!(
            "Loaded corpus '{}' ({:.1} KB, {} sentences)",
            corpus.source,
            corpus.size_kb(),
            corpus.sentences.len()
        );
        Ok(corpus)
    }
}
