// ============================================================
// Layer 6 — Session Event Log
// ============================================================
// Append-only record of what a session did, kept so an
// interactive surface can print it back:
//
//   [12:03:44] Loaded corpus 'notes.txt': 42 sentences
//   [12:03:45] Vocabulary size: 311
//   [12:04:10] Training failed: training dataset is empty   (error)
//
// Every entry is also forwarded to `tracing` at the matching
// level, so the log and the process log never disagree.

use std::fmt;

use crate::infra::timestamp::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info    => "info",
            Severity::Warning => "warning",
            Severity::Error   => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: Timestamp,
    pub severity:  Severity,
    pub message:   String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.time_of_day(), self.message)?;
        if self.severity != Severity::Info {
            write!(f, " ({})", self.severity)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Info    => tracing::info!("{message}"),
            Severity::Warning => tracing::warn!("{message}"),
            Severity::Error   => tracing::error!("{message}"),
        }
        self.entries.push(LogEntry { timestamp: Timestamp::now(), severity, message });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
