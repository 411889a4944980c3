//! Core types for the per-pair pipeline.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::logging::ScopedLogger;
use crate::models::{MediaPair, PairId, PairStage, StagedArtifact};
use crate::staging::PathManager;
use crate::tools::MediaTools;

/// Read-only context passed to pipeline steps.
///
/// Mutable results go in [`PairState`].
pub struct PairContext {
    /// Position in the manifest.
    pub index: usize,
    pub pair: MediaPair,
    pub pair_id: PairId,
    pub paths: PathManager,
    pub settings: Arc<Settings>,
    pub tools: Arc<dyn MediaTools>,
    /// Logger scoped to this pair.
    pub logger: ScopedLogger,
}

impl PairContext {
    pub fn new(
        index: usize,
        pair: MediaPair,
        pair_id: PairId,
        paths: PathManager,
        settings: Arc<Settings>,
        tools: Arc<dyn MediaTools>,
        logger: ScopedLogger,
    ) -> Self {
        Self {
            index,
            pair,
            pair_id,
            paths,
            settings,
            tools,
            logger,
        }
    }
}

/// Mutable pair state accumulated by the steps.
///
/// Each slot is written by exactly one step and read by the next.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PairState {
    pub pair_id: String,
    pub stage: PairStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_video: Option<StagedArtifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_image: Option<StagedArtifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_video: Option<StagedArtifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composited: Option<StagedArtifact>,
}

impl PairState {
    pub fn new(pair_id: impl Into<String>) -> Self {
        Self {
            pair_id: pair_id.into(),
            ..Default::default()
        }
    }

    /// Advance to `stage`, refusing to leave a terminal state.
    pub fn enter(&mut self, stage: PairStage) {
        if !self.stage.is_terminal() {
            self.stage = stage;
        }
    }

    pub fn fail(&mut self) {
        self.stage = PairStage::Failed;
    }
}
