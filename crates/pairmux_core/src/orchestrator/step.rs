//! Pipeline step trait definition.

use crate::models::PairStage;

use super::errors::StepResult;
use super::types::{PairContext, PairState};

/// One stage of the per-pair pipeline.
///
/// The pipeline runner calls, in order:
///
/// 1. `validate_input` - the previous step left what this one needs
/// 2. `execute` - do the work, record the produced artifact in `state`
/// 3. `validate_output` - the artifact really exists
///
/// # Example
///
/// ```ignore
/// struct NormalizeStep;
///
/// impl PipelineStep for NormalizeStep {
///     fn name(&self) -> &str { "Normalize" }
///     fn stage(&self) -> PairStage { PairStage::Normalizing }
///
///     fn validate_input(&self, _ctx: &PairContext, state: &PairState) -> StepResult<()> {
///         state.raw_video.as_ref().map(|_| ()).ok_or_else(|| StepError::invalid_input("no raw video"))
///     }
///
///     fn execute(&self, ctx: &PairContext, state: &mut PairState) -> StepResult<()> {
///         // run the transcoder, then:
///         state.normalized_video = Some(artifact);
///         Ok(())
///     }
///
///     fn validate_output(&self, _ctx: &PairContext, state: &PairState) -> StepResult<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait PipelineStep: Send + Sync {
    /// Step name for logging and error context.
    fn name(&self) -> &str;

    /// State the pair is in while this step runs.
    fn stage(&self) -> PairStage;

    fn validate_input(&self, ctx: &PairContext, state: &PairState) -> StepResult<()>;

    fn execute(&self, ctx: &PairContext, state: &mut PairState) -> StepResult<()>;

    /// Only called after `execute` succeeded.
    fn validate_output(&self, ctx: &PairContext, state: &PairState) -> StepResult<()>;

    fn description(&self) -> &str {
        self.name()
    }
}
