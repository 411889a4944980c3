//! Normalize step - re-encode the raw video to canonical parameters.

use crate::models::{ArtifactKind, ArtifactStage, PairStage, StagedArtifact};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{PairContext, PairState};
use crate::stages::VideoNormalizer;

use super::fetch::require_artifact;

pub struct NormalizeStep;

impl NormalizeStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NormalizeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for NormalizeStep {
    fn name(&self) -> &str {
        "Normalize"
    }

    fn stage(&self) -> PairStage {
        PairStage::Normalizing
    }

    fn description(&self) -> &str {
        "Re-encode the video to 1280x720 at 60 fps"
    }

    fn validate_input(&self, _ctx: &PairContext, state: &PairState) -> StepResult<()> {
        require_artifact(&state.raw_video, "raw video")
            .map_err(|e| StepError::invalid_input(e.to_string()))
    }

    fn execute(&self, ctx: &PairContext, state: &mut PairState) -> StepResult<()> {
        let raw = match state.raw_video.as_ref() {
            Some(raw) => raw.local_path.clone(),
            None => return Err(StepError::invalid_input("raw video was not recorded")),
        };
        let dst = ctx.paths.staging_path(
            &ctx.pair_id,
            ArtifactKind::Video,
            ArtifactStage::Normalized,
            &ctx.pair.video_ref,
        );

        let path = VideoNormalizer::new(ctx.tools.clone()).normalize(&raw, &dst, &ctx.logger)?;
        state.normalized_video = Some(StagedArtifact::new(
            path,
            ArtifactKind::Video,
            ArtifactStage::Normalized,
        ));
        Ok(())
    }

    fn validate_output(&self, _ctx: &PairContext, state: &PairState) -> StepResult<()> {
        require_artifact(&state.normalized_video, "normalized video")
    }
}
