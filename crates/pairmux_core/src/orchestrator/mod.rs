//! Pipeline orchestrator for coordinating batch execution.
//!
//! Every manifest pair runs through its own pipeline; the batch then
//! concatenates the pairs that reached `Done`.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     ├── Pair 0: Pipeline
//!     │       ├── Step: FetchVideo
//!     │       ├── Step: FetchImage
//!     │       ├── Step: Normalize
//!     │       └── Step: Composite
//!     ├── Pair 1: Pipeline ...
//!     └── ConcatAssembler (successful segments, manifest order)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pairmux_core::orchestrator::BatchProcessor;
//!
//! let processor = BatchProcessor::new(settings, tools, logger);
//! match processor.run(&manifest) {
//!     Ok(result) => println!("Published {:?}", result.final_artifact_path),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

mod batch;
mod errors;
mod pipeline;
mod step;
pub mod steps;
mod types;

pub use batch::BatchProcessor;
pub use errors::{
    BatchError, CompositeError, ConcatError, FetchError, PipelineError, PipelineResult, StepError,
    StepResult, TranscodeError,
};
pub use pipeline::{CancelHandle, Pipeline, PipelineRunResult};
pub use step::PipelineStep;
pub use steps::{CompositeStep, FetchImageStep, FetchVideoStep, NormalizeStep};
pub use types::{PairContext, PairState};

/// Create the per-pair pipeline with all steps in order.
///
/// 1. FetchVideo - copy the video from the remote
/// 2. FetchImage - copy the overlay image from the remote
/// 3. Normalize - re-encode the video to canonical parameters
/// 4. Composite - overlay the image and write the segment
pub fn create_pair_pipeline(cancel: CancelHandle) -> Pipeline {
    Pipeline::new()
        .with_cancel_handle(cancel)
        .with_step(FetchVideoStep::new())
        .with_step(FetchImageStep::new())
        .with_step(NormalizeStep::new())
        .with_step(CompositeStep::new())
}
