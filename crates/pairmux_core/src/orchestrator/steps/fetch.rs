//! Fetch steps - copy the pair's video and image from the remote.
//!
//! Both land at deterministic, pair-scoped paths; see
//! [`PathManager::staging_path`](crate::staging::PathManager::staging_path).

use crate::models::{ArtifactKind, ArtifactStage, PairStage, StagedArtifact};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{PairContext, PairState};
use crate::stages::RemoteFetcher;

fn fetch_artifact(ctx: &PairContext, kind: ArtifactKind) -> StepResult<StagedArtifact> {
    let remote_ref = match kind {
        ArtifactKind::Video => ctx.pair.video_ref.as_str(),
        ArtifactKind::Image => ctx.pair.image_ref.as_str(),
    };
    let dest = ctx
        .paths
        .staging_path(&ctx.pair_id, kind, ArtifactStage::Raw, remote_ref);

    let validation = &ctx.settings.validation;
    let fetcher = RemoteFetcher::new(
        ctx.tools.clone(),
        validation.min_size_bytes,
        validation.verify_image_signature,
    );
    let path = fetcher.fetch(
        remote_ref,
        kind,
        &ctx.paths.landing_dir(&ctx.pair_id),
        &dest,
        &ctx.logger,
    )?;

    Ok(StagedArtifact::new(path, kind, ArtifactStage::Raw))
}

/// The recorded artifact exists on disk.
pub(super) fn require_artifact(slot: &Option<StagedArtifact>, what: &str) -> StepResult<()> {
    match slot {
        Some(artifact) if artifact.local_path.is_file() => Ok(()),
        Some(artifact) => Err(StepError::invalid_output(format!(
            "{} missing at {}",
            what,
            artifact.local_path.display()
        ))),
        None => Err(StepError::invalid_output(format!("{} was not recorded", what))),
    }
}

/// Fetches the pair's video.
pub struct FetchVideoStep;

impl FetchVideoStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FetchVideoStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for FetchVideoStep {
    fn name(&self) -> &str {
        "FetchVideo"
    }

    fn stage(&self) -> PairStage {
        PairStage::FetchingVideo
    }

    fn description(&self) -> &str {
        "Copy the video from the remote"
    }

    fn validate_input(&self, ctx: &PairContext, _state: &PairState) -> StepResult<()> {
        if ctx.pair.video_ref.is_empty() {
            return Err(StepError::invalid_input("video reference is empty"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &PairContext, state: &mut PairState) -> StepResult<()> {
        state.raw_video = Some(fetch_artifact(ctx, ArtifactKind::Video)?);
        Ok(())
    }

    fn validate_output(&self, _ctx: &PairContext, state: &PairState) -> StepResult<()> {
        require_artifact(&state.raw_video, "raw video")
    }
}

/// Fetches the pair's overlay image. Runs after the video, so a pair whose
/// video is missing never touches its image.
pub struct FetchImageStep;

impl FetchImageStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FetchImageStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for FetchImageStep {
    fn name(&self) -> &str {
        "FetchImage"
    }

    fn stage(&self) -> PairStage {
        PairStage::FetchingImage
    }

    fn description(&self) -> &str {
        "Copy the overlay image from the remote"
    }

    fn validate_input(&self, ctx: &PairContext, _state: &PairState) -> StepResult<()> {
        if ctx.pair.image_ref.is_empty() {
            return Err(StepError::invalid_input("image reference is empty"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &PairContext, state: &mut PairState) -> StepResult<()> {
        state.raw_image = Some(fetch_artifact(ctx, ArtifactKind::Image)?);
        Ok(())
    }

    fn validate_output(&self, _ctx: &PairContext, state: &PairState) -> StepResult<()> {
        require_artifact(&state.raw_image, "raw image")
    }
}
