//! Per-run logger with file and callback output.
//!
//! One `RunLogger` exists per batch run. It:
//! - Writes to a dedicated log file
//! - Sends lines to an optional callback
//! - Mirrors every message into `tracing`
//!
//! Pairs log through a [`ScopedLogger`], which prefixes messages with the
//! pair identity and keeps its own tail buffer of external tool output so
//! concurrent pairs never mix their diagnostics.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LineCallback, LogConfig, LogLevel, MessagePrefix};

/// Run-wide logger with dual output (file + callback).
pub struct RunLogger {
    run_name: String,
    log_path: Option<PathBuf>,
    file_writer: Mutex<Option<BufWriter<File>>>,
    callback: Mutex<Option<LineCallback>>,
    config: LogConfig,
}

impl RunLogger {
    /// Create a logger writing to `<log_dir>/<run_name>.log`.
    pub fn new(
        run_name: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        callback: Option<LineCallback>,
    ) -> std::io::Result<Self> {
        let run_name = run_name.into();
        let log_dir = log_dir.as_ref();

        fs::create_dir_all(log_dir)?;

        let log_path = log_dir.join(format!("{}.log", sanitize_filename(&run_name)));
        let file = File::create(&log_path)?;

        Ok(Self {
            run_name,
            log_path: Some(log_path),
            file_writer: Mutex::new(Some(BufWriter::new(file))),
            callback: Mutex::new(callback),
            config,
        })
    }

    /// Logger without a backing file; messages only reach `tracing` and the
    /// callback.
    pub fn detached(run_name: impl Into<String>, config: LogConfig) -> Self {
        Self {
            run_name: run_name.into(),
            log_path: None,
            file_writer: Mutex::new(None),
            callback: Mutex::new(None),
            config,
        }
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Create a logger scoped to one pair.
    pub fn scope(self: &Arc<Self>, scope: impl Into<String>) -> ScopedLogger {
        ScopedLogger {
            run: Arc::clone(self),
            scope: scope.into(),
            tail: Mutex::new(VecDeque::with_capacity(self.config.error_tail)),
        }
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }

        match level {
            LogLevel::Trace => tracing::trace!(run = %self.run_name, "{}", message),
            LogLevel::Debug => tracing::debug!(run = %self.run_name, "{}", message),
            LogLevel::Info => tracing::info!(run = %self.run_name, "{}", message),
            LogLevel::Warn => tracing::warn!(run = %self.run_name, "{}", message),
            LogLevel::Error => tracing::error!(run = %self.run_name, "{}", message),
        }

        let formatted = self.format_message(message);
        self.output(&formatted);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &MessagePrefix::Warning.format(message));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &MessagePrefix::Error.format(message));
    }

    pub fn phase(&self, phase_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Phase.format(phase_name));
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// Log a command line (suppressed when `show_commands` is off).
    pub fn command(&self, command: &str) {
        if self.config.show_commands {
            self.log(LogLevel::Info, &MessagePrefix::Command.format(command));
        }
    }

    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    /// Flush and release the log file.
    pub fn close(&self) {
        self.flush();
        *self.file_writer.lock() = None;
    }

    fn format_message(&self, message: &str) -> String {
        format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
    }

    fn output(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }

        if let Some(ref callback) = *self.callback.lock() {
            callback(formatted);
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Logger view for a single pair.
pub struct ScopedLogger {
    run: Arc<RunLogger>,
    scope: String,
    tail: Mutex<VecDeque<String>>,
}

impl ScopedLogger {
    pub fn scope(&self) -> &str {
        &self.scope
    }

    fn scoped(&self, message: &str) -> String {
        format!("[{}] {}", self.scope, message)
    }

    pub fn info(&self, message: &str) {
        self.run.info(&self.scoped(message));
    }

    pub fn debug(&self, message: &str) {
        self.run.debug(&self.scoped(message));
    }

    pub fn warn(&self, message: &str) {
        self.run.warn(&self.scoped(message));
    }

    pub fn error(&self, message: &str) {
        self.run.error(&self.scoped(message));
    }

    pub fn success(&self, message: &str) {
        self.run.success(&self.scoped(message));
    }

    pub fn command(&self, command: &str) {
        self.run.command(&self.scoped(command));
    }

    /// Stage marker.
    pub fn stage(&self, stage_name: &str) {
        self.run
            .log(LogLevel::Info, &self.scoped(&MessagePrefix::Stage.format(stage_name)));
    }

    /// Record one line of external tool output.
    ///
    /// Always kept in the tail buffer; echoed to the log only when compact
    /// mode is off.
    pub fn output_line(&self, line: &str, is_stderr: bool) {
        {
            let limit = self.run.config.error_tail.max(1);
            let mut buffer = self.tail.lock();
            while buffer.len() >= limit {
                buffer.pop_front();
            }
            buffer.push_back(line.to_string());
        }

        if self.run.config.compact {
            return;
        }

        let prefix = if is_stderr { "[stderr] " } else { "" };
        self.run
            .log(LogLevel::Debug, &self.scoped(&format!("{}{}", prefix, line)));
    }

    /// Dump the tail buffer, typically right after a failure.
    pub fn show_tail(&self, header: &str) {
        let buffer = self.tail.lock();
        if buffer.is_empty() {
            return;
        }

        self.run.log(
            LogLevel::Error,
            &self.scoped(&format!("[{}/tail]", header)),
        );
        for line in buffer.iter() {
            self.run.log(LogLevel::Error, &self.scoped(line));
        }
    }

    pub fn clear_tail(&self) {
        self.tail.lock().clear();
    }

    pub fn get_tail(&self) -> Vec<String> {
        self.tail.lock().iter().cloned().collect()
    }
}

/// Sanitize a string to be safe for use as a filename.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    #[test]
    fn writes_to_file() {
        let dir = tempdir().unwrap();
        let logger = RunLogger::new("batch_1", dir.path(), LogConfig::default(), None).unwrap();

        logger.info("Test message");
        logger.flush();

        let path = logger.log_path().unwrap();
        assert!(path.to_string_lossy().ends_with("batch_1.log"));
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("Test message"));
    }

    #[test]
    fn level_filter_drops_debug() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        let callback: LineCallback = Box::new(move |_line| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        let dir = tempdir().unwrap();
        let logger = RunLogger::new("run", dir.path(), LogConfig::default(), Some(callback)).unwrap();

        logger.debug("hidden");
        logger.info("shown");
        logger.error("shown too");

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn scoped_messages_carry_pair_id() {
        let dir = tempdir().unwrap();
        let logger =
            Arc::new(RunLogger::new("run", dir.path(), LogConfig::default(), None).unwrap());
        let scoped = logger.scope("001_clip_abcd1234");
        scoped.stage("Normalize");
        logger.flush();

        let content = fs::read_to_string(logger.log_path().unwrap()).unwrap();
        assert!(content.contains("[001_clip_abcd1234] --- Normalize ---"));
    }

    #[test]
    fn tail_buffer_maintains_limit_per_scope() {
        let mut config = LogConfig::default();
        config.error_tail = 5;
        let logger = Arc::new(RunLogger::detached("run", config));

        let a = logger.scope("a");
        let b = logger.scope("b");
        for i in 0..10 {
            a.output_line(&format!("Line {}", i), false);
        }
        b.output_line("other", true);

        let tail = a.get_tail();
        assert_eq!(tail.len(), 5);
        assert_eq!(tail[0], "Line 5");
        assert_eq!(tail[4], "Line 9");
        assert_eq!(b.get_tail(), vec!["other".to_string()]);
    }

    #[test]
    fn sanitizes_filename() {
        assert_eq!(sanitize_filename("normal_name"), "normal_name");
        assert_eq!(sanitize_filename("has/slash"), "has_slash");
        assert_eq!(sanitize_filename("a<b>c"), "a_b_c");
    }
}
