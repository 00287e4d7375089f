//! Structured logging with visual formatting.
//!
//! Every line written by shabbat-alert goes through [`Log`]. Plain messages get a
//! level prefix; status output uses the box drawing structure (`┏ ┣ ┃ ╹`) so a
//! daemon session reads as one continuous block in the terminal or journal.
//!
//! Output can be silenced globally, and debug lines are only shown when
//! `--debug` was given.

use std::sync::atomic::{AtomicBool, Ordering};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Log level enumeration for categorizing message importance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Log,  // Debug/operational detail, only with --debug
    Warn, // Non-fatal issues
    Err,  // Recoverable failures
    Info, // Status updates
}

impl LogLevel {
    fn prefix(self) -> &'static str {
        match self {
            LogLevel::Log => "[LOG]",
            LogLevel::Warn => "[WARN]",
            LogLevel::Err => "[ERR]",
            LogLevel::Info => "[INFO]",
        }
    }
}

/// Main logging interface providing structured output formatting.
pub struct Log;

impl Log {
    /// Enable or disable all output.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Enable or disable `[LOG]` debug lines.
    pub fn set_debug(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_debug() -> bool {
        DEBUG_ENABLED.load(Ordering::SeqCst)
    }

    /// Main log function with level-based prefixes.
    pub fn log(level: LogLevel, message: &str) {
        if !Self::is_enabled() {
            return;
        }
        if level == LogLevel::Log && !Self::is_debug() {
            return;
        }
        println!("{} {}", level.prefix(), message);
    }

    // ═══ Convenience Methods for Common Log Levels ═══

    pub fn log_error(message: &str) {
        Self::log(LogLevel::Err, message);
    }

    pub fn log_warning(message: &str) {
        Self::log(LogLevel::Warn, message);
    }

    pub fn log_info(message: &str) {
        Self::log(LogLevel::Info, message);
    }

    pub fn log_debug(message: &str) {
        Self::log(LogLevel::Log, message);
    }

    // ═══ Visual Formatting Functions ═══

    /// Main status line with a branch marker.
    pub fn log_decorated(message: &str) {
        if !Self::is_enabled() {
            return;
        }
        println!("┣ {}", message);
    }

    /// Detail line nested under the previous status line.
    pub fn log_indented(message: &str) {
        if !Self::is_enabled() {
            return;
        }
        println!("┃   {}", message);
    }

    pub fn log_pipe() {
        if !Self::is_enabled() {
            return;
        }
        println!("┃");
    }

    /// Start a new visual block, used for each refresh cycle.
    pub fn log_block_start(message: &str) {
        if !Self::is_enabled() {
            return;
        }
        println!("┃");
        println!("┣ {}", message);
    }

    /// A fired alert, highlighted so it stands out in long daemon logs.
    pub fn log_alert(title: &str, body: &str) {
        if !Self::is_enabled() {
            return;
        }
        println!("┃");
        println!("┣━ {}", title);
        println!("┃   {}", body);
    }

    pub fn log_version() {
        if !Self::is_enabled() {
            return;
        }
        println!("┏ shabbat-alert v{} ━━╸", env!("CARGO_PKG_VERSION"));
        println!("┃");
    }

    pub fn log_end() {
        if !Self::is_enabled() {
            return;
        }
        println!("╹");
    }
}
