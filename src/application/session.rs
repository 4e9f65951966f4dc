// ============================================================
// Layer 2 — Chat Session
// ============================================================
// One session owns everything a user works with:
//
//   corpus     — the sentences loaded from a text file
//   tokenizer  — the vocabulary the current model was built on
//   model      — at most one live model, replaced wholesale
//   driver     — the training flag (Idle / Training)
//   log        — severity-tagged event log
//   transcript — the chat so far
//
// Every public action validates its inputs first and returns a
// UserInputError without touching state when they are wrong.
//
// Training order:
//   1. Fit a COPY of the tokenizer on the corpus
//   2. Build the (input, next-token) dataset
//   3. Ask the backend for a fresh model
//   4. Commit tokenizer + model, then run the epochs
//
// A run that fails half way keeps the partially trained model,
// which always matches the committed tokenizer.
//
// Loading a saved model builds the new tokenizer and model off
// to the side and swaps them in only when both are complete.

use std::fmt;
use std::ops::ControlFlow;

use rand::{rngs::StdRng, SeedableRng};

use crate::data::corpus::Corpus;
use crate::data::dataset::{prepare_dataset, DEFAULT_SEQUENCE_LENGTH};
use crate::data::tokenizer::{WordTokenizer, DEFAULT_MIN_FREQ};
use crate::domain::bits::BitWidth;
use crate::domain::error::{PersistenceError, SessionError, TrainingError, UserInputError};
use crate::domain::traits::{LanguageModel, ModelBackend};
use crate::infra::event_log::EventLog;
use crate::infra::metrics::EpochMetrics;
use crate::infra::model_store::{ModelDocument, ModelStore};
use crate::infra::timestamp::Timestamp;
use crate::ml::generator::{generate_response, DEFAULT_MAX_LENGTH};
use crate::ml::trainer::{
    Progress, TrainingDriver, TrainingObserver, TrainingOptions, TrainingReport, DEFAULT_BATCH_SIZE,
};

pub const DEFAULT_EPOCHS: usize = 10;

// ─── Settings ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub epochs:              usize,
    pub bits:                BitWidth,
    pub min_freq:            usize,
    pub batch_size:          usize,
    pub sequence_length:     usize,
    pub max_response_length: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            epochs:              DEFAULT_EPOCHS,
            bits:                BitWidth::default(),
            min_freq:            DEFAULT_MIN_FREQ,
            batch_size:          DEFAULT_BATCH_SIZE,
            sequence_length:     DEFAULT_SEQUENCE_LENGTH,
            max_response_length: DEFAULT_MAX_LENGTH,
        }
    }
}

// ─── Transcript ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
    /// A failed reply, shown in place of the assistant's answer
    Error,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Speaker::User      => "You",
            Speaker::Assistant => "AI",
            Speaker::Error     => "Error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub text:    String,
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.speaker, self.text)
    }
}

// ─── Model Statistics ─────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct ModelStats {
    pub total_params: usize,
    pub vocab_size:   usize,
    pub bits:         BitWidth,
    pub device:       String,
    /// None for a model loaded from disk
    pub last_trained: Option<Timestamp>,
}

impl ModelStats {
    /// f32 storage size in MiB, whatever the reported bit width
    pub fn size_mb(&self) -> f64 {
        self.total_params as f64 * 4.0 / (1024.0 * 1024.0)
    }
}

impl fmt::Display for ModelStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trained = match self.last_trained {
            Some(ts) => ts.to_string(),
            None     => "not in this session".to_string(),
        };
        writeln!(f, "╔════════════════════════════════════════╗")?;
        writeln!(f, "║            MODEL STATISTICS            ║")?;
        writeln!(f, "╠════════════════════════════════════════╣")?;
        writeln!(f, "║ Total parameters: {}", group_thousands(self.total_params))?;
        writeln!(f, "║ Model size:       ~{:.2} MB", self.size_mb())?;
        writeln!(f, "║ Quantization:     {}", self.bits)?;
        writeln!(f, "║ Vocabulary:       {} words", self.vocab_size)?;
        writeln!(f, "║ Device:           {}", self.device)?;
        writeln!(f, "║ Last trained:     {}", trained)?;
        write!(f, "╚════════════════════════════════════════╝")
    }
}

/// 1234567 → "1,234,567"
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ─── Epoch Logging Observer ───────────────────────────────────────────────────
// Forwards progress to the caller's observer and writes each
// epoch summary into the session log.
struct EpochLogger<'a, O: ?Sized> {
    inner: &'a mut O,
    log:   &'a mut EventLog,
}

impl<O: TrainingObserver + ?Sized> TrainingObserver for EpochLogger<'_, O> {
    fn on_batch(&mut self, progress: &Progress) -> ControlFlow<()> {
        self.inner.on_batch(progress)
    }

    fn on_epoch(&mut self, metrics: &EpochMetrics) {
        let acc = metrics.accuracy.map_or_else(|| "n/a".to_string(), |a| format!("{a:.4}"));
        self.log.info(format!("Epoch {}: Loss = {:.4}, Acc = {}", metrics.epoch, metrics.loss, acc));
        self.inner.on_epoch(metrics);
    }
}

// ─── ChatSession ──────────────────────────────────────────────────────────────
pub struct ChatSession<Bk: ModelBackend> {
    backend:      Bk,
    settings:     SessionSettings,
    corpus:       Option<Corpus>,
    tokenizer:    WordTokenizer,
    model:        Option<Bk::Model>,
    model_bits:   BitWidth,
    driver:       TrainingDriver,
    rng:          StdRng,
    log:          EventLog,
    transcript:   Vec<ChatMessage>,
    last_trained: Option<Timestamp>,
}

impl<Bk: ModelBackend> ChatSession<Bk> {
    pub fn new(backend: Bk, settings: SessionSettings) -> Self {
        Self::with_rng(backend, settings, StdRng::from_entropy())
    }

    /// Same as `new` with a fixed shuffle seed, for reproducible runs
    pub fn with_seed(backend: Bk, settings: SessionSettings, seed: u64) -> Self {
        Self::with_rng(backend, settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(backend: Bk, settings: SessionSettings, rng: StdRng) -> Self {
        let mut log = EventLog::new();
        if backend.is_available() {
            log.info(format!("Tensor backend: {}", backend.device_label()));
        } else {
            log.warn("No tensor backend available; training and chat are disabled");
        }

        Self {
            model_bits: settings.bits,
            backend,
            settings,
            corpus: None,
            tokenizer: WordTokenizer::new(),
            model: None,
            driver: TrainingDriver::new(),
            rng,
            log,
            transcript: Vec::new(),
            last_trained: None,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────────
    pub fn settings(&self) -> &SessionSettings { &self.settings }
    pub fn tokenizer(&self) -> &WordTokenizer { &self.tokenizer }
    pub fn model(&self) -> Option<&Bk::Model> { self.model.as_ref() }
    pub fn corpus(&self) -> Option<&Corpus> { self.corpus.as_ref() }
    pub fn log(&self) -> &EventLog { &self.log }
    pub fn transcript(&self) -> &[ChatMessage] { &self.transcript }
    pub fn device_label(&self) -> String { self.backend.device_label() }
    pub fn is_training(&self) -> bool { self.driver.is_running() }

    // ── Settings ─────────────────────────────────────────────────────────────
    pub fn set_epochs(&mut self, epochs: usize) -> Result<(), UserInputError> {
        if epochs == 0 {
            return Err(UserInputError::InvalidEpochs);
        }
        self.settings.epochs = epochs;
        Ok(())
    }

    pub fn set_bits(&mut self, bits: u32) -> Result<(), UserInputError> {
        self.settings.bits = BitWidth::try_from(bits)?;
        Ok(())
    }

    // ── Corpus ───────────────────────────────────────────────────────────────
    /// Replace the loaded corpus. Returns its sentence count.
    pub fn load_corpus(&mut self, corpus: Corpus) -> usize {
        let count = corpus.sentences.len();
        self.log.info(format!("Loaded file: {} ({:.2} KB)", corpus.source, corpus.size_kb()));
        if count == 0 {
            self.log.warn("No sentences longer than 10 characters found");
        } else {
            self.log.info(format!("Found {count} sentences"));
        }
        self.corpus = Some(corpus);
        count
    }

    // ── Training ─────────────────────────────────────────────────────────────
    pub fn train<O>(&mut self, observer: &mut O) -> Result<TrainingReport, SessionError>
    where
        O: TrainingObserver + ?Sized,
    {
        let sentences = match &self.corpus {
            Some(c) if !c.is_empty() => c.sentences.clone(),
            _ => return Err(UserInputError::NoCorpus.into()),
        };
        if self.is_training() {
            return Err(TrainingError::AlreadyRunning.into());
        }

        let s = self.settings.clone();
        self.log.info("=".repeat(41));
        self.log.info("Training started");
        self.log.info(format!("Device: {}", self.backend.device_label()));
        self.log.info(format!("Bits: {}", s.bits.bits()));
        self.log.info(format!("Epochs: {}", s.epochs));

        let mut tokenizer = self.tokenizer.clone();
        tokenizer.fit(&sentences, s.min_freq);
        let vocab_size = tokenizer.vocab_size();
        self.log.info(format!("Vocabulary size: {vocab_size}"));

        let dataset = prepare_dataset(&tokenizer, &sentences, s.sequence_length);
        self.log.info(format!("Prepared {} training examples", dataset.examples().len()));

        let model = match self.backend.create_model(vocab_size, s.bits) {
            Ok(m) => m,
            Err(e) => {
                let err = TrainingError::from(e);
                self.log.error(format!("Training failed: {err}"));
                return Err(err.into());
            }
        };

        self.tokenizer  = tokenizer;
        self.model_bits = s.bits;
        let model = self.model.insert(model);

        let options = TrainingOptions { epochs: s.epochs, batch_size: s.batch_size };
        let mut logger = EpochLogger { inner: observer, log: &mut self.log };
        let result = self.driver.run(model, &dataset, options, &mut self.rng, &mut logger);

        match result {
            Ok(report) => {
                self.last_trained = Some(Timestamp::now());
                if report.cancelled {
                    self.log.warn(format!("Training cancelled after {} batches", report.batches_run));
                } else {
                    self.log.info("Training complete");
                }
                Ok(report)
            }
            Err(e) => {
                self.log.error(format!("Training failed: {e}"));
                Err(e.into())
            }
        }
    }

    // ── Chat ─────────────────────────────────────────────────────────────────
    /// Answer `message` and record both sides in the transcript.
    pub fn send_message(&mut self, message: &str) -> Result<String, SessionError> {
        let model = self.model.as_ref().ok_or(UserInputError::NoModel)?;
        let message = message.trim();
        if message.is_empty() {
            return Err(UserInputError::EmptyMessage.into());
        }

        self.transcript.push(ChatMessage { speaker: Speaker::User, text: message.to_string() });

        match generate_response(model, &self.tokenizer, message, self.settings.max_response_length) {
            Ok(reply) => {
                self.transcript.push(ChatMessage { speaker: Speaker::Assistant, text: reply.clone() });
                Ok(reply)
            }
            Err(e) => {
                self.transcript.push(ChatMessage { speaker: Speaker::Error, text: e.to_string() });
                self.log.error(format!("Reply failed: {e}"));
                Err(e.into())
            }
        }
    }

    // ── Persistence ──────────────────────────────────────────────────────────
    pub fn save_model(&mut self, store: &ModelStore) -> Result<(), SessionError> {
        let model = self.model.as_ref().ok_or(UserInputError::NoModel)?;
        let result = ModelDocument::capture(&self.tokenizer, model, self.model_bits)
            .map_err(PersistenceError::from)
            .and_then(|doc| store.save(&doc));

        match result {
            Ok(()) => {
                self.log.info(format!("Model saved: {}", store.path().display()));
                Ok(())
            }
            Err(e) => {
                self.log.error(format!("Saving model failed: {e}"));
                Err(e.into())
            }
        }
    }

    /// Replace the current model with a saved one. On any failure
    /// the current model and tokenizer stay as they were.
    pub fn load_model(&mut self, store: &ModelStore) -> Result<(), SessionError> {
        if self.is_training() {
            return Err(TrainingError::AlreadyRunning.into());
        }

        let restored = store.load().and_then(|doc| doc.restore(&self.backend));
        let restored = match restored {
            Ok(r) => r,
            Err(e) => {
                self.log.error(format!("Loading model failed: {e}"));
                return Err(e.into());
            }
        };

        self.tokenizer     = restored.tokenizer;
        self.model         = Some(restored.model);
        self.model_bits    = restored.bits;
        self.settings.bits = restored.bits;
        self.last_trained  = None;

        self.log.info(format!("Model loaded: {}", store.path().display()));
        Ok(())
    }

    // ── Statistics ───────────────────────────────────────────────────────────
    pub fn stats(&self) -> Option<ModelStats> {
        let model = self.model.as_ref()?;
        Some(ModelStats {
            total_params: model.num_params(),
            vocab_size:   self.tokenizer.vocab_size(),
            bits:         self.model_bits,
            device:       self.backend.device_label(),
            last_trained: self.last_trained,
        })
    }
}
