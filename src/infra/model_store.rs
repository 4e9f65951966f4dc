// ============================================================
// Layer 6 — Model Store
// ============================================================
// Saves and restores a trained model as ONE JSON document:
//
//   {
//     "tokenizer": { "<PAD>": 0, "<UNK>": 1, ..., "cat": 5 },
//     "config":    { "vocabSize": 312, "bits": 32 },
//     "weights":   { "embedding": [ {"shape": [312,128], "data": [...]} ],
//                    "hidden":    [ {...weight...}, {...bias...} ],
//                    "output":    [ {...weight...}, {...bias...} ] }
//   }
//
// Restoring a document:
//   1. Invert the tokenizer map, check reserved ids and uniqueness
//   2. Check config.vocabSize covers every token id
//   3. Ask the backend for a fresh model of that size
//   4. Overwrite the layers the document carries; unknown layer
//      names are ignored, missing layers keep fresh init
//
// Nothing is handed back until every step succeeded, so a bad
// document can never replace a working model.
//
// Writes go to a temp file in the target directory and are then
// renamed over the destination, so an interrupted save never
// leaves a half-written model behind.
//
// Reference: serde_json documentation, tempfile::NamedTempFile

use std::{
    collections::BTreeMap,
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::data::tokenizer::{Vocabulary, WordTokenizer};
use crate::domain::bits::BitWidth;
use crate::domain::error::{BackendError, PersistenceError};
use crate::domain::traits::{LanguageModel, ModelBackend};
use crate::domain::weights::LayerWeights;
use crate::infra::timestamp::Timestamp;

// ─── Document Schema ─────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentConfig {
    pub vocab_size: usize,
    pub bits:       BitWidth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    pub tokenizer: BTreeMap<String, u32>,
    pub config:    DocumentConfig,
    #[serde(default)]
    pub weights:   LayerWeights,
}

/// A document turned back into live objects.
pub struct RestoredModel<M> {
    pub tokenizer: WordTokenizer,
    pub model:     M,
    pub bits:      BitWidth,
}

impl ModelDocument {
    /// Snapshot a tokenizer and model into a saveable document.
    pub fn capture<M: LanguageModel + ?Sized>(
        tokenizer: &WordTokenizer,
        model:     &M,
        bits:      BitWidth,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            tokenizer: tokenizer.vocabulary().word_ids(),
            config:    DocumentConfig { vocab_size: model.vocab_size(), bits },
            weights:   model.export_weights()?,
        })
    }

    /// Rebuild the tokenizer and model on `backend`.
    pub fn restore<Bk: ModelBackend>(
        &self,
        backend: &Bk,
    ) -> Result<RestoredModel<Bk::Model>, PersistenceError> {
        let vocab = Vocabulary::from_word_ids(&self.tokenizer)?;

        let vocab_size = self.config.vocab_size;
        if vocab_size <= vocab.max_id() as usize {
            return Err(PersistenceError::InvalidConfig(format!(
                "vocabSize {} does not cover token id {}",
                vocab_size,
                vocab.max_id()
            )));
        }

        let mut model = backend.create_model(vocab_size, self.config.bits)?;
        model.import_weights(&self.weights)?;

        tracing::debug!(
            "Restored model: {} words, vocabSize {}, {} weight layers",
            vocab.len(),
            vocab_size,
            self.weights.len()
        );

        Ok(RestoredModel {
            tokenizer: WordTokenizer::from_vocabulary(vocab),
            model,
            bits: self.config.bits,
        })
    }
}

// ─── File Naming ─────────────────────────────────────────────────────────────
/// `ai-model-<YYYY-MM-DD>.json` for today's UTC date
pub fn default_model_filename() -> String {
    model_filename_for(Timestamp::now())
}

pub fn model_filename_for(ts: Timestamp) -> String {
    format!("ai-model-{}.json", ts.date())
}

// ─── ModelStore ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `ai-model-<today>.json` inside `dir`
    pub fn dated_in(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(default_model_filename()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, doc: &ModelDocument) -> Result<(), PersistenceError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_error(dir))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_error(dir))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, doc)?;
            writer.flush().map_err(io_error(&self.path))?;
        }
        tmp.persist(&self.path).map_err(|e| io_error(&self.path)(e.error))?;

        tracing::info!("Saved model to '{}'", self.path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<ModelDocument, PersistenceError> {
        let json = fs::read_to_string(&self.path).map_err(io_error(&self.path))?;
        let doc: ModelDocument = serde_json::from_str(&json)?;

        tracing::info!(
            "Read model document '{}' ({} tokens, {})",
            self.path.display(),
            doc.tokenizer.len(),
            doc.config.bits
        );
        Ok(doc)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PersistenceError + '_ {
    move |source| PersistenceError::Io { path: path.display().to_string(), source }
}
