//! External capabilities used by the pipeline.
//!
//! The pipeline never spawns processes directly. It goes through
//! [`MediaTools`], which has one method per external operation:
//!
//! ```text
//! remote_copy  rclone copy <remote>:<ref> <landing_dir>
//! transcode    ffmpeg <normalize args>
//! composite    ffmpeg <composite args>
//! concat       ffmpeg <concat args>
//! ```
//!
//! [`ProcessTools`] is the production adapter. Tests substitute their own
//! implementation.

mod runner;

pub use runner::{ProcessTools, ToolOutput};

use std::path::Path;

use thiserror::Error;

use crate::encode::FfmpegJob;
use crate::logging::ScopedLogger;

/// Failure of an external tool invocation.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The process could not be started at all.
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and reported failure.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    NonZeroExit {
        tool: String,
        exit_code: i32,
        message: String,
    },
}

impl ToolError {
    pub fn non_zero_exit(tool: impl Into<String>, exit_code: i32, message: impl Into<String>) -> Self {
        Self::NonZeroExit {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }
}

/// Result type for tool invocations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Blocking external capabilities. Each call returns only once the
/// underlying process has exited.
pub trait MediaTools: Send + Sync {
    /// Copy one remote object into `landing_dir`.
    ///
    /// The file appears under a name chosen by the transfer (normally the
    /// object's base name); the caller locates and renames it.
    fn remote_copy(&self, remote_ref: &str, landing_dir: &Path, log: &ScopedLogger)
        -> ToolResult<()>;

    /// Re-encode a video to canonical parameters.
    fn transcode(&self, job: &FfmpegJob, log: &ScopedLogger) -> ToolResult<()>;

    /// Overlay an image onto a video.
    fn composite(&self, job: &FfmpegJob, log: &ScopedLogger) -> ToolResult<()>;

    /// Stream-copy concatenate the segments of a list file.
    fn concat(&self, job: &FfmpegJob, log: &ScopedLogger) -> ToolResult<()>;
}
