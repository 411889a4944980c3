//! Error types for the pipeline.
//!
//! Errors carry context that chains through layers:
//! Batch → Pair → Step → Stage error → Tool

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::{BatchResult, PairStage};
use crate::tools::ToolError;

/// Failure while retrieving a remote object.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The transfer reported success but no file materialized.
    #[error("'{remote_ref}' not found after transfer (expected {})", .expected.display())]
    NotFound {
        remote_ref: String,
        expected: PathBuf,
    },

    /// The file is empty or below the minimum plausible size.
    #[error("'{remote_ref}' looks corrupt: {size} bytes (minimum {min_size})")]
    Corrupt {
        remote_ref: String,
        size: u64,
        min_size: u64,
    },

    /// Image payload matches neither PNG nor JPEG.
    #[error("'{remote_ref}' is not a PNG or JPEG image (leading bytes: {leading})")]
    InvalidFormat { remote_ref: String, leading: String },

    /// The transfer itself failed.
    #[error("Transfer of '{remote_ref}' failed: {source}")]
    TransferFailed {
        remote_ref: String,
        #[source]
        source: ToolError,
    },

    /// Local file handling around the transfer failed.
    #[error("Staging '{remote_ref}' at {} failed: {source}", .path.display())]
    Staging {
        remote_ref: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure while normalizing a video.
#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("Encoding {} failed: {reason}", .src.display())]
    EncodeFailed { src: PathBuf, reason: String },
}

impl TranscodeError {
    pub fn encode_failed(src: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::EncodeFailed {
            src: src.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failure while overlaying the image.
#[derive(Error, Debug)]
pub enum CompositeError {
    #[error("Overlay onto {} failed: {reason}", .video.display())]
    OverlayFailed { video: PathBuf, reason: String },
}

impl CompositeError {
    pub fn overlay_failed(video: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::OverlayFailed {
            video: video.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failure of the final concatenation. Fatal to the batch.
#[derive(Error, Debug)]
pub enum ConcatError {
    #[error("Assembly failed: {0}")]
    AssembleFailed(String),
}

impl ConcatError {
    pub fn assemble_failed(reason: impl ToString) -> Self {
        Self::AssembleFailed(reason.to_string())
    }
}

/// Error from a pipeline step.
#[derive(Error, Debug)]
pub enum StepError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error(transparent)]
    Composite(#[from] CompositeError),

    /// A previous step did not leave what this step needs.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// The step claims success but its output is missing.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl StepError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }
}

/// Error that ends processing of a single pair.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed.
    #[error("Pair '{pair_id}' failed at step '{step_name}': {source}")]
    StepFailed {
        pair_id: String,
        step_name: String,
        stage: PairStage,
        #[source]
        source: StepError,
    },

    /// Cancellation was requested before the next step started.
    #[error("Pair '{pair_id}' was cancelled before '{stage}'")]
    Cancelled { pair_id: String, stage: PairStage },

    /// The pair's working directories could not be prepared.
    #[error("Pair '{pair_id}' setup failed: {message}")]
    SetupFailed { pair_id: String, message: String },
}

impl PipelineError {
    pub fn step_failed(
        pair_id: impl Into<String>,
        step_name: impl Into<String>,
        stage: PairStage,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            pair_id: pair_id.into(),
            step_name: step_name.into(),
            stage,
            source,
        }
    }

    pub fn cancelled(pair_id: impl Into<String>, stage: PairStage) -> Self {
        Self::Cancelled {
            pair_id: pair_id.into(),
            stage,
        }
    }

    pub fn setup_failed(pair_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            pair_id: pair_id.into(),
            message: message.into(),
        }
    }

    /// The stage the pair was in when it stopped.
    pub fn stage(&self) -> PairStage {
        match self {
            PipelineError::StepFailed { stage, .. } => *stage,
            PipelineError::Cancelled { stage, .. } => *stage,
            PipelineError::SetupFailed { .. } => PairStage::Pending,
        }
    }
}

/// Batch-level failure. Only these reach the caller.
#[derive(Error, Debug)]
pub enum BatchError {
    /// Every pair failed; the concat capability was never invoked.
    #[error("Nothing to assemble: all {} pairs failed", .result.outcomes.len())]
    NothingToAssemble { result: BatchResult },

    /// Pairs succeeded but concatenation failed.
    #[error("{source}")]
    Assemble {
        #[source]
        source: ConcatError,
        result: BatchResult,
    },

    /// Cancelled before every pair reached a terminal state.
    #[error("Batch aborted after {completed} of {total} pairs")]
    Aborted {
        completed: usize,
        total: usize,
        result: BatchResult,
    },

    /// Base directories could not be prepared.
    #[error("Batch setup failed: {0}")]
    Setup(String),
}

impl BatchError {
    /// Per-pair outcomes gathered before the failure, if any.
    pub fn partial_result(&self) -> Option<&BatchResult> {
        match self {
            BatchError::NothingToAssemble { result }
            | BatchError::Assemble { result, .. }
            | BatchError::Aborted { result, .. } => Some(result),
            BatchError::Setup(_) => None,
        }
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for single-pair pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;
