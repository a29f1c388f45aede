//! Per-run state threaded through every lifecycle call
//!
//! [`RunContext`] carries the write-once "publishing disabled" flag and the
//! [`RunLog`] that collects human-readable lines until the run ends.

use std::fmt;

use crate::error::RoxError;
use crate::utils::terminal;

/// Severity of a run log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARNING"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// One line of the run log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.level, self.message)
    }
}

/// Accumulating log, flushed once for the human running the suite
#[derive(Debug, Default)]
pub struct RunLog {
    verbose: bool,
    entries: Vec<LogEntry>,
}

impl RunLog {
    /// Create a new log
    pub fn new(verbose: bool) -> Self {
        let mut log = Self {
            verbose,
            entries: Vec::new(),
        };
        if verbose {
            log.info("ROX client is verbose.");
        }
        log
    }

    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        self.entries.push(LogEntry {
            level,
            message: message.into(),
        });
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Debug, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message);
    }

    /// Record a line only when running verbose
    pub fn verbose(&mut self, level: LogLevel, message: impl Into<String>) {
        if self.verbose {
            self.push(level, message);
        }
    }

    /// Record an error at the level its kind deserves
    pub fn record(&mut self, err: &RoxError) {
        match err {
            RoxError::Validation { .. } => self.warn(err.to_string()),
            _ => self.error(err.to_string()),
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any line of the given level contains `needle`
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.level == level && e.message.contains(needle))
    }

    /// Render every line, one per row
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.to_string());
            out.push('\n');
        }
        out
    }

    /// Print and drain the log to stderr
    pub fn flush(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        eprintln!();
        for entry in self.entries.drain(..) {
            match entry.level {
                LogLevel::Debug => terminal::print_debug(&entry.message),
                LogLevel::Info => terminal::print_info(&entry.message),
                LogLevel::Warning => terminal::print_warning(&entry.message),
                LogLevel::Error => terminal::print_error(&entry.message),
            }
        }
        eprintln!();
    }
}

/// State shared by all lifecycle callbacks of one run
#[derive(Debug, Default)]
pub struct RunContext {
    publishing_disabled: bool,
    pub log: RunLog,
}

impl RunContext {
    pub fn new(verbose: bool) -> Self {
        Self {
            publishing_disabled: false,
            log: RunLog::new(verbose),
        }
    }

    /// Whether an earlier configuration failure suppressed reporting
    pub fn publishing_disabled(&self) -> bool {
        self.publishing_disabled
    }

    /// Log the error and, for configuration errors, disable publishing for good
    pub fn fail(&mut self, err: &RoxError) {
        self.log.record(err);
        if err.is_fatal_to_publishing() {
            self.publishing_disabled = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_log_announces_itself() {
        let log = RunLog::new(true);
        assert_eq!(log.render(), "INFO ROX client is verbose.\n");
        assert!(RunLog::new(false).is_empty());
    }

    #[test]
    fn test_verbose_lines_are_dropped_when_quiet() {
        let mut log = RunLog::new(false);
        log.verbose(LogLevel::Warning, "test foo is not roxable.");
        assert!(log.is_empty());
    }

    #[test]
    fn test_configuration_failure_is_sticky() {
        let mut ctx = RunContext::new(false);
        ctx.fail(&RoxError::config_error("ERROR: no ROX server defined"));
        assert!(ctx.publishing_disabled());

        ctx.fail(&RoxError::validation_error("bad key"));
        assert!(ctx.publishing_disabled());
        assert!(ctx.log.contains(LogLevel::Error, "no ROX server"));
        assert!(ctx.log.contains(LogLevel::Warning, "bad key"));
    }

    #[test]
    fn test_step_failures_do_not_disable_publishing() {
        let mut ctx = RunContext::new(false);
        ctx.fail(&RoxError::http_status("HTTP 500", 500, "server error"));
        assert!(!ctx.publishing_disabled());
    }
}
