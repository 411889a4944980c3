//! Pipeline runner that executes steps in sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::models::PairStage;

use super::errors::{PipelineError, PipelineResult, StepError};
use super::step::PipelineStep;
use super::types::{PairContext, PairState};

/// Pipeline that runs a sequence of steps for one pair.
///
/// The pipeline executes steps in order, running validation before
/// and after each step. A failing step ends the pair; later steps are
/// never started.
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
    cancelled: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Share an existing cancellation flag, so one handle stops every
    /// pair of a batch.
    pub fn with_cancel_handle(mut self, handle: CancelHandle) -> Self {
        self.cancelled = handle.flag;
        self
    }

    /// Call `cancel()` on the returned handle to stop the pipeline
    /// at the next step boundary.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancelled),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Run every step against one pair.
    ///
    /// For each step:
    /// 1. Check for cancellation
    /// 2. Move `state` into the step's stage
    /// 3. Run `validate_input`, `execute`, then `validate_output`
    ///
    /// On error `state` is left in [`PairStage::Failed`]
    /// and the returned error records the stage that failed.
    pub fn run(&self, ctx: &PairContext, state: &mut PairState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            steps_completed: Vec::new(),
        };

        for step in &self.steps {
            let step_name = step.name();
            let stage = step.stage();

            if self.is_cancelled() {
                ctx.logger
                    .warn(&format!("Cancelled before step '{}'", step_name));
                return Err(PipelineError::cancelled(ctx.pair_id.as_str(), stage));
            }

            state.enter(stage);
            ctx.logger.stage(step_name);

            let fail = |state: &mut PairState, e: StepError| {
                state.fail();
                PipelineError::step_failed(ctx.pair_id.as_str(), step_name, stage, e)
            };

            ctx.logger.debug(&format!("Validating input for '{}'", step_name));
            if let Err(e) = step.validate_input(ctx, state) {
                ctx.logger.error(&format!("Input validation failed: {}", e));
                return Err(fail(state, e));
            }

            ctx.logger.debug(&format!("Executing '{}'", step_name));
            if let Err(e) = step.execute(ctx, state) {
                ctx.logger.error(&format!("{} failed: {}", step_name, e));
                return Err(fail(state, e));
            }

            if let Err(e) = step.validate_output(ctx, state) {
                ctx.logger.error(&format!("Output validation failed: {}", e));
                return Err(fail(state, e));
            }
            ctx.logger.debug(&format!("{} completed", step_name));
            result.steps_completed.push(step_name.to_string());
        }

        state.enter(PairStage::Done);
        Ok(result)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Step names in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for cancelling running pipelines.
#[derive(Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipelines stop at the next step boundary; a running tool is not
    /// interrupted.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    /// Names of the steps that ran, in order.
    pub steps_completed: Vec<String>,
}
