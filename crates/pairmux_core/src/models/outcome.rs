//! Per-pair outcomes and the batch result.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::artifact::PairStage;
use super::manifest::{MediaPair, PairId};

/// How a single pair ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PairResult {
    /// Composited segment ready for concatenation.
    Success { final_path: PathBuf },
    /// The pair was dropped at `stage`.
    Failure { stage: PairStage, reason: String },
}

/// Result for one manifest entry, in manifest order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairOutcome {
    pub index: usize,
    pub pair_id: PairId,
    pub pair: MediaPair,
    pub result: PairResult,
}

impl PairOutcome {
    pub fn success(index: usize, pair_id: PairId, pair: MediaPair, final_path: PathBuf) -> Self {
        Self {
            index,
            pair_id,
            pair,
            result: PairResult::Success { final_path },
        }
    }

    pub fn failure(
        index: usize,
        pair_id: PairId,
        pair: MediaPair,
        stage: PairStage,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            index,
            pair_id,
            pair,
            result: PairResult::Failure {
                stage,
                reason: reason.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.result, PairResult::Success { .. })
    }

    /// Final composited path, if the pair succeeded.
    pub fn final_path(&self) -> Option<&Path> {
        match &self.result {
            PairResult::Success { final_path } => Some(final_path),
            PairResult::Failure { .. } => None,
        }
    }
}

/// Everything a batch run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// One outcome per manifest entry, same order.
    pub outcomes: Vec<PairOutcome>,
    /// Published artifact; set only when at least one pair succeeded and
    /// concatenation succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_artifact_path: Option<PathBuf>,
}

impl BatchResult {
    pub fn new(outcomes: Vec<PairOutcome>) -> Self {
        Self {
            outcomes,
            final_artifact_path: None,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Ordered subsequence of successful final paths (the concat input).
    pub fn success_paths(&self) -> Vec<PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|o| o.final_path().map(Path::to_path_buf))
            .collect()
    }
}
