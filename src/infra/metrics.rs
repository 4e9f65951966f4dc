// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records per-epoch training metrics to a CSV file.
//
// Metrics recorded per epoch:
//   - epoch:    the epoch number (1, 2, 3, ...)
//   - loss:     cross-entropy averaged over every batch
//   - accuracy: averaged over the batches that reported one;
//               left empty when none did
//
// Example CSV output:
//   epoch,loss,accuracy
//   1,4.812300,0.101000
//   2,3.990100,0.187500
//
// Loss should fall epoch over epoch. A flat loss usually means
// the corpus is too small for min_freq to keep enough words.

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch: usize,

    pub loss: f64,

    pub accuracy: Option<f64>,
}

impl EpochMetrics {
    pub fn new(epoch: usize, loss: f64, accuracy: Option<f64>) -> Self {
        Self { epoch, loss, accuracy }
    }
}

/// Appends epoch metrics to `<dir>/metrics.csv`.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so
    /// repeated runs append to the same log.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,loss,accuracy")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;

        let accuracy = m.accuracy.map(|a| format!("{a:.6}")).unwrap_or_default();
        writeln!(f, "{},{:.6},{}", m.epoch, m.loss, accuracy)?;

        tracing::debug!("Logged epoch {} metrics: loss={:.4}", m.epoch, m.loss);
        Ok(())
    }

    pub fn log_all(&self, metrics: &[EpochMetrics]) -> Result<()> {
        metrics.iter().try_for_each(|m| self.log(m))
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_rows_appended_after_header() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger
            .log_all(&[
                EpochMetrics::new(1, 4.5, Some(0.125)),
                EpochMetrics::new(2, 3.25, None),
            ])
            .unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(
            csv,
            "epoch,loss,accuracy\n1,4.500000,0.125000\n2,3.250000,\n"
        );
    }
}
