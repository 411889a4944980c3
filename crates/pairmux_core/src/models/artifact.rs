//! Staged artifacts and the per-pair stage machine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What kind of media a staged file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Video,
    Image,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Video => write!(f, "video"),
            ArtifactKind::Image => write!(f, "image"),
        }
    }
}

/// Which stage produced a staged file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStage {
    /// Downloaded as-is from the remote.
    Raw,
    /// Re-encoded to canonical parameters.
    Normalized,
    /// Overlay applied, canonical parameters.
    Composited,
}

impl std::fmt::Display for ArtifactStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactStage::Raw => write!(f, "raw"),
            ArtifactStage::Normalized => write!(f, "normalized"),
            ArtifactStage::Composited => write!(f, "composited"),
        }
    }
}

/// A file produced by one stage and consumed by the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedArtifact {
    pub local_path: PathBuf,
    pub kind: ArtifactKind,
    pub stage: ArtifactStage,
}

impl StagedArtifact {
    pub fn new(local_path: impl Into<PathBuf>, kind: ArtifactKind, stage: ArtifactStage) -> Self {
        Self {
            local_path: local_path.into(),
            kind,
            stage,
        }
    }
}

/// Position of a pair in its processing state machine.
///
/// `Pending -> FetchingVideo -> FetchingImage -> Normalizing -> Compositing -> Done`,
/// with `Failed` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairStage {
    #[default]
    Pending,
    FetchingVideo,
    FetchingImage,
    Normalizing,
    Compositing,
    Done,
    Failed,
}

impl PairStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, PairStage::Done | PairStage::Failed)
    }
}

impl std::fmt::Display for PairStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PairStage::Pending => "pending",
            PairStage::FetchingVideo => "fetching video",
            PairStage::FetchingImage => "fetching image",
            PairStage::Normalizing => "normalizing",
            PairStage::Compositing => "compositing",
            PairStage::Done => "done",
            PairStage::Failed => "failed",
        };
        f.write_str(s)
    }
}
