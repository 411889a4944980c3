//! Composite step - overlay the image and write the pair's segment.

use crate::models::{ArtifactKind, ArtifactStage, PairStage, StagedArtifact};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{PairContext, PairState};
use crate::stages::Compositor;

use super::fetch::require_artifact;

pub struct CompositeStep;

impl CompositeStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CompositeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for CompositeStep {
    fn name(&self) -> &str {
        "Composite"
    }

    fn stage(&self) -> PairStage {
        PairStage::Compositing
    }

    fn description(&self) -> &str {
        "Overlay the footer image onto the normalized video"
    }

    fn validate_input(&self, _ctx: &PairContext, state: &PairState) -> StepResult<()> {
        require_artifact(&state.normalized_video, "normalized video")
            .and_then(|_| require_artifact(&state.raw_image, "raw image"))
            .map_err(|e| StepError::invalid_input(e.to_string()))
    }

    fn execute(&self, ctx: &PairContext, state: &mut PairState) -> StepResult<()> {
        let (video, image) = match (&state.normalized_video, &state.raw_image) {
            (Some(v), Some(i)) => (v.local_path.clone(), i.local_path.clone()),
            _ => return Err(StepError::invalid_input("inputs were not recorded")),
        };
        let dst = ctx.paths.staging_path(
            &ctx.pair_id,
            ArtifactKind::Video,
            ArtifactStage::Composited,
            &ctx.pair.video_ref,
        );
        let scratch = ctx.paths.segment_scratch_path(&ctx.pair_id);
        ctx.paths
            .ensure_parent(&dst)
            .map_err(|e| StepError::io_error("creating segments directory", e))?;

        let path = Compositor::new(ctx.tools.clone()).composite(
            &video,
            &image,
            &scratch,
            &dst,
            &ctx.logger,
        )?;
        state.composited = Some(StagedArtifact::new(
            path,
            ArtifactKind::Video,
            ArtifactStage::Composited,
        ));
        Ok(())
    }

    fn validate_output(&self, _ctx: &PairContext, state: &PairState) -> StepResult<()> {
        require_artifact(&state.composited, "composited segment")
    }
}
