//! In-memory stand-in for the external tools, used by unit tests.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::encode::FfmpegJob;
use crate::logging::{LogConfig, RunLogger, ScopedLogger};
use crate::tools::{MediaTools, ToolError, ToolResult};

const PAYLOAD_SIZE: usize = 1100;

fn padded(mut bytes: Vec<u8>) -> Vec<u8> {
    bytes.resize(PAYLOAD_SIZE, b'.');
    bytes
}

/// Video payload whose first line is `video:<name>`.
pub fn video_bytes(name: &str) -> Vec<u8> {
    padded(format!("video:{}\n", name).into_bytes())
}

pub fn png_bytes() -> Vec<u8> {
    padded(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
}

pub fn jpeg_bytes() -> Vec<u8> {
    padded(vec![0xFF, 0xD8, 0xFF, 0xE0])
}

pub fn gif_bytes() -> Vec<u8> {
    padded(b"GIF89a".to_vec())
}

pub fn test_logger() -> ScopedLogger {
    Arc::new(RunLogger::detached("test", LogConfig::default())).scope("test")
}

/// Fake remote store plus fake ffmpeg.
///
/// - `remote_copy` writes the stored object to `landing/<basename>`
/// - `transcode` copies its input
/// - `composite` writes `segment:<first line of the video>\n`
/// - `concat` joins the listed files byte for byte
#[derive(Default)]
pub struct FakeTools {
    remote: HashMap<String, Vec<u8>>,
    fail_transfer: HashSet<String>,
    skip_landing: HashSet<String>,
    fail_transcode: Vec<String>,
    fail_composite: Vec<String>,
    fail_concat: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeTools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, remote_ref: &str, bytes: Vec<u8>) -> Self {
        self.remote.insert(remote_ref.to_string(), bytes);
        self
    }

    /// Make the transfer of `remote_ref` exit non-zero.
    pub fn failing_transfer(mut self, remote_ref: &str) -> Self {
        self.fail_transfer.insert(remote_ref.to_string());
        self
    }

    /// Report success for `remote_ref` without writing anything.
    pub fn skipping_landing(mut self, remote_ref: &str) -> Self {
        self.skip_landing.insert(remote_ref.to_string());
        self
    }

    /// Fail any transcode whose input path contains `needle`.
    pub fn failing_transcode(mut self, needle: &str) -> Self {
        self.fail_transcode.push(needle.to_string());
        self
    }

    /// Fail any composite whose video input path contains `needle`, after
    /// writing a truncated file to the job's output like a crashed encoder.
    pub fn failing_composite(mut self, needle: &str) -> Self {
        self.fail_composite.push(needle.to_string());
        self
    }

    pub fn failing_concat(mut self) -> Self {
        self.fail_concat = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of recorded calls of one capability.
    pub fn count(&self, capability: &str) -> usize {
        let prefix = format!("{}:", capability);
        self.calls
            .lock()
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    fn record(&self, capability: &str, detail: impl AsRef<str>) {
        self.calls
            .lock()
            .push(format!("{}:{}", capability, detail.as_ref()));
    }

    fn matches(needles: &[String], path: &Path) -> bool {
        let text = path.to_string_lossy();
        needles.iter().any(|n| text.contains(n.as_str()))
    }
}

fn io_failure(tool: &str, e: std::io::Error) -> ToolError {
    ToolError::non_zero_exit(tool, 1, e.to_string())
}

fn first_line(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.lines().next().unwrap_or_default().to_string())
}

/// Parse `file '<path>'` lines back into paths.
pub fn parse_concat_list(content: &str) -> Vec<PathBuf> {
    content
        .lines()
        .filter_map(|line| line.strip_prefix("file '"))
        .filter_map(|rest| rest.strip_suffix('\''))
        .map(|quoted| PathBuf::from(quoted.replace(r"'\''", "'")))
        .collect()
}

impl MediaTools for FakeTools {
    fn remote_copy(
        &self,
        remote_ref: &str,
        landing_dir: &Path,
        _log: &ScopedLogger,
    ) -> ToolResult<()> {
        self.record("remote_copy", remote_ref);

        if self.fail_transfer.contains(remote_ref) {
            return Err(ToolError::non_zero_exit("rclone", 3, "directory not found"));
        }
        if self.skip_landing.contains(remote_ref) {
            return Ok(());
        }
        let Some(bytes) = self.remote.get(remote_ref) else {
            return Ok(());
        };

        let name = Path::new(remote_ref)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        fs::create_dir_all(landing_dir).map_err(|e| io_failure("rclone", e))?;
        fs::write(landing_dir.join(name), bytes).map_err(|e| io_failure("rclone", e))
    }

    fn transcode(&self, job: &FfmpegJob, _log: &ScopedLogger) -> ToolResult<()> {
        let src = &job.inputs()[0];
        self.record("transcode", job.output().to_string_lossy());

        if Self::matches(&self.fail_transcode, src) {
            return Err(ToolError::non_zero_exit("ffmpeg", 1, "Invalid data found when processing input"));
        }
        fs::copy(src, job.output()).map_err(|e| io_failure("ffmpeg", e))?;
        Ok(())
    }

    fn composite(&self, job: &FfmpegJob, _log: &ScopedLogger) -> ToolResult<()> {
        let video = &job.inputs()[0];
        self.record("composite", job.output().to_string_lossy());

        if Self::matches(&self.fail_composite, video) {
            fs::write(job.output(), b"partial mp4 header").map_err(|e| io_failure("ffmpeg", e))?;
            return Err(ToolError::non_zero_exit("ffmpeg", 1, "Error initializing complex filters"));
        }
        let line = first_line(video).map_err(|e| io_failure("ffmpeg", e))?;
        fs::write(job.output(), format!("segment:{}\n", line)).map_err(|e| io_failure("ffmpeg", e))
    }

    fn concat(&self, job: &FfmpegJob, _log: &ScopedLogger) -> ToolResult<()> {
        let list = &job.inputs()[0];
        self.record("concat", list.to_string_lossy());

        if self.fail_concat {
            return Err(ToolError::non_zero_exit("ffmpeg", 1, "Non-monotonous DTS"));
        }
        let content = fs::read_to_string(list).map_err(|e| io_failure("ffmpeg", e))?;
        let mut joined = Vec::new();
        for path in parse_concat_list(&content) {
            joined.extend(fs::read(&path).map_err(|e| io_failure("ffmpeg", e))?);
        }
        fs::write(job.output(), joined).map_err(|e| io_failure("ffmpeg", e))
    }
}
