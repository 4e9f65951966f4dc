// ============================================================
// Layer 1 — Training Progress Bar
// ============================================================
// Renders training progress on the terminal:
//
//   [##############>-------------------------] 35% Epoch 2/5 - Batch 4/9
//
// The bar is a TrainingObserver, so the training loop never
// knows it is talking to a terminal.

use indicatif::{ProgressBar, ProgressStyle};
use std::ops::ControlFlow;

use crate::infra::metrics::EpochMetrics;
use crate::ml::trainer::{Progress, TrainingObserver};

const BAR_TEMPLATE: &str = "[{bar:40.cyan/blue}] {percent:>3}% {msg}";

/// Positions are tracked in thousandths of the whole run
const BAR_LENGTH: u64 = 1000;

pub struct ProgressReporter {
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    /// `enabled = false` gives a silent observer (e.g. --no-progress)
    pub fn new(enabled: bool) -> Self {
        let bar = enabled.then(|| {
            let pb = ProgressBar::new(BAR_LENGTH);
            let style = ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            pb.set_style(style);
            pb.set_message("Ready");
            pb
        });
        Self { bar }
    }

    pub fn finish(&self, message: &str) {
        if let Some(pb) = &self.bar {
            pb.finish_with_message(message.to_string());
        }
    }

    pub fn abandon(&self) {
        if let Some(pb) = &self.bar {
            pb.abandon_with_message("stopped");
        }
    }
}

impl TrainingObserver for ProgressReporter {
    fn on_batch(&mut self, progress: &Progress) -> ControlFlow<()> {
        if let Some(pb) = &self.bar {
            pb.set_position((progress.fraction * BAR_LENGTH as f64).round() as u64);
            pb.set_message(progress.label());
        }
        ControlFlow::Continue(())
    }

    fn on_epoch(&mut self, metrics: &EpochMetrics) {
        if let Some(pb) = &self.bar {
            let acc = metrics.accuracy.map_or_else(|| "n/a".to_string(), |a| format!("{a:.4}"));
            pb.println(format!("Epoch {}: loss {:.4}, accuracy {}", metrics.epoch, metrics.loss, acc));
        }
    }
}
