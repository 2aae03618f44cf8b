//! Leveled diagnostics sink injected into the components that report progress.

use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

pub trait Logger: Send + Sync {
    fn log(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }
}

/// Writes colored, prefixed lines to stderr. Debug lines only when verbose.
pub struct ConsoleLogger {
    verbose: bool,
}

impl ConsoleLogger {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::Debug if self.verbose => eprintln!("  {} {}", "·".dimmed(), message.dimmed()),
            Level::Debug => {}
            Level::Info => eprintln!("  {} {}", "→".cyan(), message),
            Level::Warn => eprintln!("  {} {}", "⚠".yellow(), message),
            Level::Error => eprintln!("  {} {}", "✗".red(), message.red()),
        }
    }
}

/// Discards everything.
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: Level, _message: &str) {}
}
