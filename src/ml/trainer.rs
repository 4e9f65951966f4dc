// ============================================================
// Layer 5 — Training Driver
// ============================================================
// Epoch/batch loop over any LanguageModel.
//
//   Idle ──run()──▶ Running ──▶ Idle   (finished, cancelled or failed)
//
// Only one run may be active per driver. A second run() while
// one is in progress returns AlreadyRunning immediately; it is
// rejected, not queued. Clones of a driver share the flag.
//
// Per epoch:
//   1. Fisher-Yates shuffle of the whole dataset
//   2. Split into batches of batch_size (the last may be short)
//   3. train_on_batch for each, accumulating loss / accuracy
//   4. Report progress after every batch, then yield
//
// Progress after a batch:
//   (epoch * total_batches + batch + 1) / (epochs * total_batches)
//
// Between batches the driver yields the thread and asks the
// observer whether to continue. Returning ControlFlow::Break
// cancels the run; weights already updated are kept.
//
// Reference: rand crate documentation (SliceRandom)

use rand::{seq::SliceRandom, Rng};
use std::{
    ops::ControlFlow,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::data::dataset::NextTokenDataset;
use crate::domain::error::TrainingError;
use crate::domain::example::TrainingExample;
use crate::domain::traits::LanguageModel;
use crate::infra::metrics::EpochMetrics;

pub const DEFAULT_BATCH_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingOptions {
    pub epochs:     usize,
    pub batch_size: usize,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self { epochs: 10, batch_size: DEFAULT_BATCH_SIZE }
    }
}

// ─── Progress ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// 0-based
    pub epoch:         usize,
    pub epochs:        usize,
    /// 0-based, within the epoch
    pub batch:         usize,
    pub total_batches: usize,
    /// In (0, 1]
    pub fraction:      f64,
}

impl Progress {
    /// e.g. "Epoch 2/10 - Batch 5/18"
    pub fn label(&self) -> String {
        format!(
            "Epoch {}/{} - Batch {}/{}",
            self.epoch + 1,
            self.epochs,
            self.batch + 1,
            self.total_batches
        )
    }
}

// ─── Observer ─────────────────────────────────────────────────────────────────
/// Receives progress from a running training loop.
pub trait TrainingObserver {
    /// Called after every batch. Break cancels the run.
    fn on_batch(&mut self, _progress: &Progress) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn on_epoch(&mut self, _metrics: &EpochMetrics) {}
}

/// No-op observer
impl TrainingObserver for () {}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub epochs:      Vec<EpochMetrics>,
    pub batches_run: usize,
    pub cancelled:   bool,
}

impl TrainingReport {
    pub fn final_metrics(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }
}

// ─── Run Guard ────────────────────────────────────────────────────────────────
// Sets the running flag on acquire and clears it on drop, so
// every exit path (success, error, cancel, panic) returns to Idle.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, TrainingError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| TrainingError::AlreadyRunning)?;
        Ok(Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ─── TrainingDriver ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Default)]
pub struct TrainingDriver {
    running: Arc<AtomicBool>,
}

impl TrainingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn run<M, R, O>(
        &self,
        model:    &mut M,
        dataset:  &NextTokenDataset,
        options:  TrainingOptions,
        rng:      &mut R,
        observer: &mut O,
    ) -> Result<TrainingReport, TrainingError>
    where
        M: LanguageModel + ?Sized,
        R: Rng + ?Sized,
        O: TrainingObserver + ?Sized,
    {
        let _guard = RunGuard::acquire(&self.running)?;

        if dataset.is_empty() {
            tracing::error!("Refusing to train: dataset is empty");
            return Err(TrainingError::EmptyDataset);
        }

        let epochs        = options.epochs;
        let batch_size    = options.batch_size.max(1);
        let mut examples: Vec<TrainingExample> = dataset.examples().to_vec();
        let total_batches = examples.len().div_ceil(batch_size);

        tracing::info!(
            "Training: {} examples, {} epochs, {} batches/epoch (batch_size={})",
            examples.len(),
            epochs,
            total_batches,
            batch_size
        );

        let mut report = TrainingReport::default();

        for epoch in 0..epochs {
            tracing::info!("Epoch {}/{} starting...", epoch + 1, epochs);
            examples.shuffle(rng);

            let mut loss_sum    = 0.0f64;
            let mut acc_sum     = 0.0f64;
            let mut acc_batches = 0usize;

            for (batch, chunk) in examples.chunks(batch_size).enumerate() {
                let inputs:  Vec<u32> = chunk.iter().map(|e| e.input).collect();
                let targets: Vec<u32> = chunk.iter().map(|e| e.target).collect();

                let outcome = model.train_on_batch(&inputs, &targets).map_err(|e| {
                    tracing::error!("Epoch {} batch {} failed: {}", epoch + 1, batch + 1, e);
                    TrainingError::from(e)
                })?;

                loss_sum += outcome.loss;
                if let Some(acc) = outcome.accuracy {
                    acc_sum     += acc;
                    acc_batches += 1;
                }
                report.batches_run += 1;

                let progress = Progress {
                    epoch,
                    epochs,
                    batch,
                    total_batches,
                    fraction: (epoch * total_batches + batch + 1) as f64
                        / (epochs * total_batches) as f64,
                };

                // Scheduling point: the batch's tensors are gone by now.
                std::thread::yield_now();
                if observer.on_batch(&progress).is_break() {
                    tracing::warn!("Training cancelled at {}", progress.label());
                    report.cancelled = true;
                    return Ok(report);
                }
            }

            let accuracy = (acc_batches > 0).then(|| acc_sum / acc_batches as f64);
            let metrics  = EpochMetrics::new(epoch + 1, loss_sum / total_batches as f64, accuracy);

            tracing::debug!(
                "Epoch {}: Loss = {:.4}, Acc = {}",
                metrics.epoch,
                metrics.loss,
                metrics.accuracy.map_or("n/a".to_string(), |a| format!("{a:.4}"))
            );
            observer.on_epoch(&metrics);
            report.epochs.push(metrics);
        }

        Ok(report)
    }
}
