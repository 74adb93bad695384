//! Logging collaborators
//!
//! The listener and its sessions log through an injected [`Logger`] so that
//! embedding applications and tests decide where the lines go. The binary
//! uses [`TracingLogger`], which forwards to `tracing`.

use std::fmt::Debug;
use std::sync::{Arc, Mutex};

/// Sink for proxy log lines
pub trait Logger: Send + Sync + Debug {
    /// Lifecycle events (accept, session result, shutdown)
    fn info(&self, message: &str);
    /// Per-step protocol detail
    fn debug(&self, message: &str);
    /// Failures
    fn error(&self, message: &str);
}

/// Forwards to the `tracing` macros under the `sockrelay` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "sockrelay", "{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: "sockrelay", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "sockrelay", "{}", message);
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn info(&self, _message: &str) {}
    fn debug(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Level of a captured line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// [`Logger::info`]
    Info,
    /// [`Logger::debug`]
    Debug,
    /// [`Logger::error`]
    Error,
}

/// A captured log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Level the line was logged at
    pub level: LogLevel,
    /// Formatted message
    pub message: String,
}

/// Keeps every line in memory, for assertions in tests
#[derive(Debug, Default, Clone)]
pub struct RecordingLogger {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl RecordingLogger {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines captured so far
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Whether any line at `level` contains `needle`
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records()
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }

    fn push(&self, level: LogLevel, message: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push(LogRecord {
                level,
                message: message.to_string(),
            });
        }
    }
}

impl Logger for RecordingLogger {
    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn debug(&self, message: &str) {
        self.push(LogLevel::Debug, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_logger_captures_levels() {
        let logger = RecordingLogger::new();
        logger.info("accepted");
        logger.debug("negotiated");
        logger.error("dial failed");

        let records = logger.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].level, LogLevel::Info);
        assert_eq!(records[2].message, "dial failed");
        assert!(logger.contains(LogLevel::Error, "dial"));
        assert!(!logger.contains(LogLevel::Info, "dial"));
    }

    #[test]
    fn test_recording_logger_clones_share_records() {
        let logger = RecordingLogger::new();
        let shared: Arc<dyn Logger> = Arc::new(logger.clone());
        shared.info("from trait object");
        assert!(logger.contains(LogLevel::Info, "trait object"));
    }

    #[test]
    fn test_null_and_tracing_loggers_accept_lines() {
        NullLogger.info("ignored");
        TracingLogger.debug("forwarded");
    }
}
