// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `chat` and `stats`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, u32, ...)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::TrainConfig;
use crate::data::dataset::DEFAULT_SEQUENCE_LENGTH;
use crate::data::tokenizer::DEFAULT_MIN_FREQ;
use crate::ml::backend::DEFAULT_LEARNING_RATE;
use crate::ml::generator::DEFAULT_MAX_LENGTH;
use crate::ml::trainer::DEFAULT_BATCH_SIZE;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a next-token model on a plain-text corpus and save it
    Train(TrainArgs),

    /// Chat with a saved model
    Chat(ChatArgs),

    /// Print statistics of a saved model
    Stats(StatsArgs),
}

/// Tensor device to run the model on
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Device {
    /// NdArray on the CPU; always available
    #[default]
    Cpu,
    /// WGPU; reported unavailable when no adapter initialises
    Gpu,
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Plain-text corpus to train on
    #[arg(long)]
    pub corpus: String,

    /// Where to save the model; defaults to ai-model-<YYYY-MM-DD>.json
    #[arg(long)]
    pub output: Option<String>,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Reported quantization bit width: 8, 16 or 32.
    /// Weights are always stored as f32.
    #[arg(long, default_value_t = 32)]
    pub bits: u32,

    /// Words seen fewer times than this map to <UNK>
    #[arg(long, default_value_t = DEFAULT_MIN_FREQ)]
    pub min_freq: usize,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Each sentence is padded or truncated to this many tokens
    #[arg(long, default_value_t = DEFAULT_SEQUENCE_LENGTH)]
    pub seq_len: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = DEFAULT_LEARNING_RATE)]
    pub lr: f64,

    /// Shuffle seed, for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Don't draw the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<&TrainArgs> for TrainConfig {
    fn from(a: &TrainArgs) -> Self {
        TrainConfig {
            corpus_path: a.corpus.clone(),
            output:      a.output.clone(),
            epochs:      a.epochs,
            bits:        a.bits,
            min_freq:    a.min_freq,
            batch_size:  a.batch_size,
            seq_len:     a.seq_len,
            seed:        a.seed,
        }
    }
}

/// All arguments for the `chat` command
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Saved model document
    #[arg(long)]
    pub model: String,

    /// Send one message and exit; without it, read messages from stdin
    #[arg(long)]
    pub message: Option<String>,

    /// Maximum words per reply
    #[arg(long, default_value_t = DEFAULT_MAX_LENGTH)]
    pub max_length: usize,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Saved model document
    #[arg(long)]
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["corpus-chat", "train", "--corpus", "notes.txt"]).unwrap();
        assert_eq!(cli.device, Device::Cpu);
        let Commands::Train(args) = cli.command else { panic!("expected train") };

        let cfg = TrainConfig::from(&args);
        assert_eq!(cfg.corpus_path, "notes.txt");
        assert_eq!(cfg.epochs, 10);
        assert_eq!(cfg.bits, 32);
        assert_eq!(cfg.min_freq, 2);
        assert_eq!(cfg.batch_size, 32);
        assert_eq!(cfg.seq_len, 20);
        assert_eq!(cfg.output, None);
        assert!(!args.no_progress);
    }

    #[test]
    fn test_chat_with_gpu_flag_after_subcommand() {
        let cli = Cli::try_parse_from([
            "corpus-chat", "chat", "--model", "m.json", "--message", "hi", "--device", "gpu",
        ])
        .unwrap();
        assert_eq!(cli.device, Device::Gpu);
        let Commands::Chat(args) = cli.command else { panic!("expected chat") };
        assert_eq!(args.message.as_deref(), Some("hi"));
        assert_eq!(args.max_length, 30);
    }

    #[test]
    fn test_train_requires_corpus() {
        assert!(Cli::try_parse_from(["corpus-chat", "train"]).is_err());
    }
}
