//! Logging collaborator used by sources and the aggregator.
//!
//! Sources never print directly. They report degraded conditions through
//! [`Logger::warn`] and the aggregator reports unrecoverable ones through
//! [`Logger::fatal`]. [`TracingLogger`] forwards to `tracing`, leaving output
//! formatting to whichever subscriber the host installs.

use crate::error::ConfigError;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Structured key/value fields attached to a log entry.
pub type Fields = BTreeMap<&'static str, String>;

/// Sink for configuration diagnostics.
pub trait Logger: Send + Sync {
    /// Record a degraded-but-continuing condition.
    fn warn(&self, message: &str, fields: &Fields);

    /// Record an unrecoverable condition.
    ///
    /// Implementations only record the condition. Callers that need the
    /// process to stop use
    /// [`ConfigAggregator::initialize_or_exit`](crate::core::ConfigAggregator::initialize_or_exit)
    /// or [`AggregatorBuilder::build_or_exit`](crate::core::AggregatorBuilder::build_or_exit),
    /// which exit with status 1 once this call has returned.
    fn fatal(&self, message: &str, error: &ConfigError, fields: &Fields);
}

/// Default logger, emitting `tracing` events under the `priority_config` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn warn(&self, message: &str, fields: &Fields) {
        tracing::warn!(fields = ?fields, "{}", message);
    }

    fn fatal(&self, message: &str, error: &ConfigError, fields: &Fields) {
        let code = error.code();
        tracing::error!(
            fatal = true,
            code = code.as_str(),
            code_description = code.description(),
            component = error.component(),
            error = %error,
            fields = ?fields,
            "{}",
            message
        );
    }
}

/// Shared handle to the default logger.
pub fn default_logger() -> Arc<dyn Logger> {
    Arc::new(TracingLogger)
}

/// Severity of a recorded entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// [`Logger::warn`]
    Warn,
    /// [`Logger::fatal`]
    Fatal,
}

/// One entry captured by [`MemoryLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity
    pub level: LogLevel,
    /// Message text
    pub message: String,
    /// Attached fields; fatal entries also carry `code` and `error`
    pub fields: Fields,
}

/// Logger that keeps every entry in memory.
///
/// Useful for hosts that want to surface startup diagnostics themselves, and
/// for tests asserting on what was logged.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
    /// Create an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries in the order they were logged.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Entries logged through [`Logger::warn`].
    pub fn warnings(&self) -> Vec<LogRecord> {
        self.by_level(LogLevel::Warn)
    }

    /// Entries logged through [`Logger::fatal`].
    pub fn fatals(&self) -> Vec<LogRecord> {
        self.by_level(LogLevel::Fatal)
    }

    fn by_level(&self, level: LogLevel) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.level == level)
            .collect()
    }

    fn push(&self, record: LogRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

impl Logger for MemoryLogger {
    fn warn(&self, message: &str, fields: &Fields) {
        self.push(LogRecord {
            level: LogLevel::Warn,
            message: message.to_string(),
            fields: fields.clone(),
        });
    }

    fn fatal(&self, message: &str, error: &ConfigError, fields: &Fields) {
        let mut fields = fields.clone();
        fields.insert("code", error.code().to_string());
        fields.insert("component", error.component().to_string());
        fields.insert("error", error.to_string());
        self.push(LogRecord {
            level: LogLevel::Fatal,
            message: message.to_string(),
            fields,
        });
    }
}
