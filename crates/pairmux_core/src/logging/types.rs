//! Logger configuration and message decoration.

use crate::config::LoggingSettings;

/// Minimum severity written by a [`RunLogger`](super::RunLogger).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    /// Tool output stays in the tail buffer and only reaches the log
    /// when a tool fails.
    pub compact: bool,
    /// Tool output lines kept per pair for failure diagnosis.
    pub error_tail: usize,
    /// Write `$ program args` before each external tool run.
    pub show_commands: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            error_tail: 20,
            show_commands: true,
        }
    }
}

impl LogConfig {
    /// Build from the `[logging]` settings section.
    pub fn from_settings(settings: &LoggingSettings, level: LogLevel) -> Self {
        Self {
            level,
            compact: settings.compact,
            error_tail: settings.error_tail.max(1) as usize,
            show_commands: settings.show_commands,
        }
    }
}

/// Receives every formatted log line.
pub type LineCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Marker placed in front of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePrefix {
    /// `$ rclone copy ...`
    Command,
    /// `=== Concatenating ===`
    Phase,
    /// `--- Normalize ---`
    Stage,
    Success,
    Warning,
    Error,
}

impl MessagePrefix {
    pub fn format(&self, message: &str) -> String {
        match self {
            MessagePrefix::Command => format!("$ {}", message),
            MessagePrefix::Phase => format!("=== {} ===", message),
            MessagePrefix::Stage => format!("--- {} ---", message),
            MessagePrefix::Success => format!("[SUCCESS] {}", message),
            MessagePrefix::Warning => format!("[WARNING] {}", message),
            MessagePrefix::Error => format!("[ERROR] {}", message),
        }
    }
}
