// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run end to end:
//
//   Step 1: Validate epochs / bit width     (Layer 3 - domain)
//   Step 2: Load and split the corpus       (Layer 4 - data)
//   Step 3: Fit tokenizer, build dataset,
//           create model, run the epochs    (session → Layer 5)
//   Step 4: Save the model document         (Layer 6 - infra)
//   Step 5: Append per-epoch metrics CSV    (Layer 6 - infra)
//
// The backend is injected, so the same workflow runs on the CPU
// backend, the GPU backend or a test fake.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::application::session::{ChatSession, ModelStats, SessionSettings};
use crate::data::corpus::TextFileLoader;
use crate::data::dataset::DEFAULT_SEQUENCE_LENGTH;
use crate::data::tokenizer::DEFAULT_MIN_FREQ;
use crate::domain::traits::ModelBackend;
use crate::infra::{metrics::MetricsLogger, model_store::ModelStore};
use crate::ml::generator::DEFAULT_MAX_LENGTH;
use crate::ml::trainer::{TrainingObserver, TrainingReport, DEFAULT_BATCH_SIZE};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a training run needs besides the backend.
// Serialisable so a run can be described in a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub corpus_path: String,
    /// None → `ai-model-<YYYY-MM-DD>.json` in the working directory
    pub output:      Option<String>,
    pub epochs:      usize,
    pub bits:        u32,
    pub min_freq:    usize,
    pub batch_size:  usize,
    pub seq_len:     usize,
    /// Fixed shuffle seed; None draws one from the OS
    pub seed:        Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            corpus_path: "corpus.txt".to_string(),
            output:      None,
            epochs:      10,
            bits:        32,
            min_freq:    DEFAULT_MIN_FREQ,
            batch_size:  DEFAULT_BATCH_SIZE,
            seq_len:     DEFAULT_SEQUENCE_LENGTH,
            seed:        None,
        }
    }
}

impl TrainConfig {
    pub fn model_store(&self) -> ModelStore {
        match &self.output {
            Some(path) => ModelStore::new(path),
            None       => ModelStore::dated_in("."),
        }
    }
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub model_path:   PathBuf,
    pub metrics_path: PathBuf,
    pub report:       TrainingReport,
    pub stats:        Option<ModelStats>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute<Bk, O>(&self, backend: Bk, observer: &mut O) -> Result<TrainOutcome>
    where
        Bk: ModelBackend,
        O: TrainingObserver + ?Sized,
    {
        let cfg = &self.config;

        // ── Step 1: Build the session and validate settings ───────────────────
        let settings = SessionSettings {
            min_freq:            cfg.min_freq,
            batch_size:          cfg.batch_size,
            sequence_length:     cfg.seq_len,
            max_response_length: DEFAULT_MAX_LENGTH,
            ..SessionSettings::default()
        };
        let mut session = match cfg.seed {
            Some(seed) => ChatSession::with_seed(backend, settings, seed),
            None       => ChatSession::new(backend, settings),
        };
        session.set_epochs(cfg.epochs)?;
        session.set_bits(cfg.bits)?;

        // ── Step 2: Load the corpus ───────────────────────────────────────────
        let corpus = TextFileLoader::new(&cfg.corpus_path).load()?;
        session.load_corpus(corpus);

        // ── Step 3: Train ─────────────────────────────────────────────────────
        let report = session
            .train(observer)
            .with_context(|| format!("Training on '{}' failed", cfg.corpus_path))?;

        // ── Step 4: Save the model document ───────────────────────────────────
        let store = cfg.model_store();
        session
            .save_model(&store)
            .with_context(|| format!("Cannot save model to '{}'", store.path().display()))?;

        // ── Step 5: Metrics next to the model ─────────────────────────────────
        let metrics = MetricsLogger::new(metrics_dir_for(store.path()))?;
        metrics.log_all(&report.epochs)?;

        tracing::info!(
            "Run finished: {} epochs, model '{}', metrics '{}'",
            report.epochs.len(),
            store.path().display(),
            metrics.csv_path().display()
        );

        Ok(TrainOutcome {
            model_path:   store.path().to_path_buf(),
            metrics_path: metrics.csv_path().to_path_buf(),
            stats:        session.stats(),
            report,
        })
    }
}

/// Where the metrics CSV for a model saved at `model_path` goes
pub fn metrics_dir_for(model_path: &Path) -> PathBuf {
    match model_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::chat_use_case::ChatUseCase;
    use crate::domain::error::{SessionError, UserInputError};
    use crate::ml::testing::FakeBackend;
    use std::fs;

    const TEXT: &str = "The cat sat on the mat. The cat ate the fish! Where is the cat now?";

    fn config(dir: &Path) -> TrainConfig {
        let corpus = dir.join("cats.txt");
        fs::write(&corpus, TEXT).unwrap();
        TrainConfig {
            corpus_path: corpus.display().to_string(),
            output:      Some(dir.join("out/model.json").display().to_string()),
            epochs:      3,
            seed:        Some(11),
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_run_saves_model_and_metrics() {
        let dir     = tempfile::tempdir().unwrap();
        let outcome = TrainUseCase::new(config(dir.path()))
            .execute(FakeBackend::default(), &mut ())
            .unwrap();

        assert!(outcome.model_path.exists());
        assert_eq!(outcome.metrics_path, dir.path().join("out/metrics.csv"));
        assert_eq!(outcome.report.epochs.len(), 3);
        assert_eq!(outcome.stats.unwrap().vocab_size, 6);

        let csv = fs::read_to_string(&outcome.metrics_path).unwrap();
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.starts_with("epoch,loss,accuracy\n1,1.000000,0.500000"));

        // the saved model is usable for chat
        let mut chat = ChatUseCase::open(FakeBackend::default(), &outcome.model_path).unwrap();
        assert!(!chat.reply("the cat").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_bits_rejected_before_loading() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { bits: 4, ..config(dir.path()) };
        let err = TrainUseCase::new(cfg).execute(FakeBackend::default(), &mut ()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<UserInputError>(),
            Some(&UserInputError::InvalidBits(4))
        );
    }

    #[test]
    fn test_zero_epochs_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { epochs: 0, ..config(dir.path()) };
        let err = TrainUseCase::new(cfg).execute(FakeBackend::default(), &mut ()).unwrap_err();
        assert_eq!(err.downcast_ref::<UserInputError>(), Some(&UserInputError::InvalidEpochs));
    }

    #[test]
    fn test_missing_corpus_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            corpus_path: dir.path().join("nope.txt").display().to_string(),
            ..config(dir.path())
        };
        assert!(TrainUseCase::new(cfg).execute(FakeBackend::default(), &mut ()).is_err());
    }

    #[test]
    fn test_unavailable_backend_surfaces_training_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TrainUseCase::new(config(dir.path()))
            .execute(FakeBackend { unavailable: true }, &mut ())
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<SessionError>(), Some(SessionError::Training(_))));
        assert!(!dir.path().join("out/model.json").exists());
    }

    #[test]
    fn test_default_output_is_dated() {
        let store = TrainConfig::default().model_store();
        let name  = store.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("ai-model-") && name.ends_with(".json"));
    }

    #[test]
    fn test_metrics_dir_for() {
        assert_eq!(metrics_dir_for(Path::new("model.json")), PathBuf::from("."));
        assert_eq!(metrics_dir_for(Path::new("a/b/model.json")), PathBuf::from("a/b"));
    }
}
