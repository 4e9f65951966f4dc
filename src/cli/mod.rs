// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train` — trains a model on a text corpus and saves it
//   2. `chat`  — loads a saved model and answers messages
//   3. `stats` — prints a saved model's statistics
//
// The use cases are generic over the tensor backend. Each
// command is a BackendTask, and `dispatch` picks the concrete
// backend from --device and runs the task on it.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

/// indicatif progress bar observer
pub mod progress;

use anyhow::Result;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::Path;

use commands::{ChatArgs, Commands, Device, StatsArgs, TrainArgs};
use progress::ProgressReporter;

use crate::application::{
    chat_use_case::ChatUseCase,
    session::SessionSettings,
    stats_use_case::model_stats,
    train_use_case::{TrainConfig, TrainUseCase},
};
use crate::domain::error::{SessionError, UserInputError};
use crate::domain::traits::ModelBackend;
use crate::ml::backend::{probe_gpu, BurnBackend, UnavailableBackend, DEFAULT_LEARNING_RATE};

#[derive(Parser, Debug)]
#[command(
    name = "corpus-chat",
    version = "0.1.0",
    about = "Train a tiny next-word model on a text file, then chat with it."
)]
pub struct Cli {
    /// Tensor device
    #[arg(long, value_enum, default_value_t = Device::Cpu, global = true)]
    pub device: Device,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match &self.command {
            Commands::Train(args) => dispatch(self.device, args.lr, TrainTask(args)),
            Commands::Chat(args)  => dispatch(self.device, DEFAULT_LEARNING_RATE, ChatTask(args)),
            Commands::Stats(args) => dispatch(self.device, DEFAULT_LEARNING_RATE, StatsTask(args)),
        }
    }
}

// ─── Backend Dispatch ─────────────────────────────────────────────────────────
/// A command body that works with any backend.
trait BackendTask {
    fn run<Bk: ModelBackend>(self, backend: Bk) -> Result<()>;
}

fn dispatch<T: BackendTask>(device: Device, lr: f64, task: T) -> Result<()> {
    match device {
        Device::Cpu => task.run(BurnBackend::cpu().with_learning_rate(lr)),
        Device::Gpu if probe_gpu() => task.run(BurnBackend::gpu().with_learning_rate(lr)),
        Device::Gpu => task.run(UnavailableBackend::new("no usable WGPU adapter")),
    }
}

// ─── train ────────────────────────────────────────────────────────────────────
struct TrainTask<'a>(&'a TrainArgs);

impl BackendTask for TrainTask<'_> {
    fn run<Bk: ModelBackend>(self, backend: Bk) -> Result<()> {
        let args = self.0;
        tracing::info!("Training on '{}' with {}", args.corpus, backend.device_label());

        let mut progress = ProgressReporter::new(!args.no_progress);
        let outcome = match TrainUseCase::new(TrainConfig::from(args)).execute(backend, &mut progress) {
            Ok(o) => o,
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        };

        if outcome.report.cancelled {
            progress.abandon();
        } else {
            progress.finish("Training complete");
        }

        if let Some(last) = outcome.report.final_metrics() {
            let acc = last.accuracy.map_or_else(|| "n/a".to_string(), |a| format!("{a:.4}"));
            println!("Final loss {:.4}, accuracy {}", last.loss, acc);
        }
        if let Some(stats) = &outcome.stats {
            println!("{stats}");
        }
        println!("Model saved to '{}'", outcome.model_path.display());
        println!("Metrics written to '{}'", outcome.metrics_path.display());
        Ok(())
    }
}

// ─── chat ─────────────────────────────────────────────────────────────────────
struct ChatTask<'a>(&'a ChatArgs);

impl BackendTask for ChatTask<'_> {
    fn run<Bk: ModelBackend>(self, backend: Bk) -> Result<()> {
        let args = self.0;
        let settings = SessionSettings {
            max_response_length: args.max_length,
            ..SessionSettings::default()
        };
        let mut chat = ChatUseCase::open_with(backend, Path::new(&args.model), settings)?;

        if let Some(message) = &args.message {
            println!("{}", chat.reply(message)?);
            return Ok(());
        }

        println!("Chatting with '{}'. Type /quit or press Ctrl-D to leave.", args.model);
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();
        loop {
            print!("> ");
            io::stdout().flush()?;

            let Some(line) = lines.next() else { break };
            let line = line?;
            if matches!(line.trim(), "/quit" | "/exit") {
                break;
            }

            match chat.reply(&line) {
                Ok(reply) => println!("AI: {reply}"),
                Err(e) if is_empty_message(&e) => continue,
                Err(e) => eprintln!("Error: {e:#}"),
            }
        }
        Ok(())
    }
}

fn is_empty_message(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<SessionError>(),
        Some(SessionError::UserInput(UserInputError::EmptyMessage))
    )
}

// ─── stats ────────────────────────────────────────────────────────────────────
struct StatsTask<'a>(&'a StatsArgs);

impl BackendTask for StatsTask<'_> {
    fn run<Bk: ModelBackend>(self, backend: Bk) -> Result<()> {
        let stats = model_stats(backend, Path::new(&self.0.model))?;
        println!("{stats}");
        Ok(())
    }
}
