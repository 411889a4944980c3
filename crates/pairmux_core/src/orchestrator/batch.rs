//! Batch processor: runs every manifest pair, then assembles the survivors.
//!
//! Pairs are independent. A failed pair is recorded and dropped; it never
//! stops the batch. Only the final concatenation, an abort, or a batch
//! with no surviving pairs fails the batch as a whole.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::config::Settings;
use crate::logging::RunLogger;
use crate::models::{BatchResult, Manifest, MediaPair, PairId, PairOutcome, PairResult, PairStage};
use crate::stages::ConcatAssembler;
use crate::staging::PathManager;
use crate::tools::MediaTools;

use super::errors::{BatchError, PipelineError};
use super::pipeline::CancelHandle;
use super::types::{PairContext, PairState};
use super::create_pair_pipeline;

/// Runs a manifest through the per-pair pipeline and the final concat.
///
/// # Example
///
/// ```ignore
/// let logger = Arc::new(RunLogger::new("batch", ".logs", LogConfig::default(), None)?);
/// let processor = BatchProcessor::new(settings, Arc::new(ProcessTools::from_settings(&settings)), logger);
/// let result = processor.run(&manifest)?;
/// println!("{:?}", result.final_artifact_path);
/// ```
pub struct BatchProcessor {
    settings: Arc<Settings>,
    tools: Arc<dyn MediaTools>,
    logger: Arc<RunLogger>,
    paths: PathManager,
    cancel: CancelHandle,
}

impl BatchProcessor {
    /// Staging and output directories come from `settings.paths`.
    pub fn new(settings: Settings, tools: Arc<dyn MediaTools>, logger: Arc<RunLogger>) -> Self {
        let paths = PathManager::new(&settings.paths.temp_root, &settings.paths.output_folder);
        Self {
            settings: Arc::new(settings),
            tools,
            logger,
            paths,
            cancel: CancelHandle::new(),
        }
    }

    /// Override the directories derived from settings.
    pub fn with_paths(mut self, paths: PathManager) -> Self {
        self.paths = paths;
        self
    }

    pub fn paths(&self) -> &PathManager {
        &self.paths
    }

    /// Cancelling stops every pair at its next step boundary and
    /// prevents pairs that have not started from starting.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run one pair to a terminal state.
    ///
    /// Never returns an error: failures become a failed [`PairOutcome`].
    pub fn process_pair(&self, index: usize, pair_id: PairId, pair: MediaPair) -> PairOutcome {
        self.run_pair(index, pair_id, pair).0
    }

    /// Like [`process_pair`](Self::process_pair), also reporting whether
    /// the pair was stopped by cancellation rather than by a failure.
    fn run_pair(&self, index: usize, pair_id: PairId, pair: MediaPair) -> (PairOutcome, bool) {
        let log = self.logger.scope(pair_id.as_str());
        log.info(&format!("Starting {}", pair));

        if let Err(e) = self.paths.reset_pair(&pair_id) {
            let err = PipelineError::setup_failed(
                pair_id.as_str(),
                format!("preparing working directory: {}", e),
            );
            log.error(&err.to_string());
            let outcome = PairOutcome::failure(index, pair_id, pair, err.stage(), err.to_string());
            return (outcome, false);
        }

        let ctx = PairContext::new(
            index,
            pair.clone(),
            pair_id.clone(),
            self.paths.clone(),
            Arc::clone(&self.settings),
            Arc::clone(&self.tools),
            log,
        );
        let mut state = PairState::new(pair_id.as_str());
        let pipeline = create_pair_pipeline(self.cancel.clone());

        let mut cancelled = false;
        let outcome = match pipeline.run(&ctx, &mut state) {
            Ok(_) => match state.composited.as_ref() {
                Some(segment) => {
                    ctx.logger.success("Segment ready");
                    PairOutcome::success(index, pair_id.clone(), pair, segment.local_path.clone())
                }
                None => PairOutcome::failure(
                    index,
                    pair_id.clone(),
                    pair,
                    PairStage::Compositing,
                    "pipeline finished without a segment",
                ),
            },
            Err(e) => {
                cancelled = matches!(e, PipelineError::Cancelled { .. });
                ctx.logger.warn(&format!("Dropped: {}", e));
                PairOutcome::failure(index, pair_id.clone(), pair, e.stage(), e.to_string())
            }
        };

        if !self.settings.pipeline.keep_intermediates {
            if let Err(e) = self.paths.cleanup_pair(&pair_id) {
                ctx.logger
                    .warn(&format!("Could not remove intermediates: {}", e));
            }
        }
        ctx.logger.clear_tail();

        (outcome, cancelled)
    }

    /// Process every pair, then concatenate the successful segments in
    /// manifest order and publish the result.
    ///
    /// With `workers > 1` pairs run concurrently; outcomes are still
    /// reported, and segments concatenated, in manifest order.
    pub fn run(&self, manifest: &Manifest) -> Result<BatchResult, BatchError> {
        for dir in [self.paths.temp_root(), self.paths.output_dir()] {
            self.paths
                .ensure_dir(dir)
                .map_err(|e| BatchError::Setup(format!("creating {}: {}", dir.display(), e)))?;
        }

        let entries: Vec<(usize, PairId, &MediaPair)> = manifest.identified().collect();
        let total = entries.len();
        let workers = self.settings.pipeline.workers.clamp(1, total.max(1));

        self.logger.phase(&format!(
            "Processing {} pair(s) with {} worker(s)",
            total, workers
        ));

        let slots: Mutex<Vec<Option<(PairOutcome, bool)>>> = Mutex::new(vec![None; total]);
        let next = AtomicUsize::new(0);

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    let slot = next.fetch_add(1, Ordering::SeqCst);
                    let Some((index, pair_id, pair)) = entries.get(slot) else {
                        break;
                    };
                    let run = self.run_pair(*index, pair_id.clone(), (*pair).clone());
                    slots.lock()[slot] = Some(run);
                });
            }
        });

        let slots = slots.into_inner();

        if self.cancel.is_cancelled() {
            let completed = slots
                .iter()
                .filter(|s| matches!(s, Some((_, false))))
                .count();
            let outcomes = slots
                .into_iter()
                .zip(entries)
                .map(|(slot, (index, pair_id, pair))| match slot {
                    Some((outcome, _)) => outcome,
                    None => PairOutcome::failure(
                        index,
                        pair_id,
                        pair.clone(),
                        PairStage::Pending,
                        "batch aborted before this pair started",
                    ),
                })
                .collect();
            let result = BatchResult::new(outcomes);
            self.logger
                .warn(&format!("Aborted after {} of {} pairs", completed, total));
            self.write_report(&result);
            return Err(BatchError::Aborted {
                completed,
                total,
                result,
            });
        }

        let mut result = BatchResult::new(
            slots
                .into_iter()
                .flatten()
                .map(|(outcome, _)| outcome)
                .collect(),
        );
        self.log_summary(&result);

        if result.succeeded() == 0 {
            self.logger.error("No pair succeeded; nothing to concatenate");
            self.write_report(&result);
            return Err(BatchError::NothingToAssemble { result });
        }

        self.logger.phase("Concatenating");
        let published = self
            .paths
            .published_path(&self.settings.paths.published_name);
        let assembler = ConcatAssembler::new(Arc::clone(&self.tools), self.paths.clone());

        match assembler.assemble(&result.success_paths(), &published, &self.logger.scope("concat")) {
            Ok(path) => {
                result.final_artifact_path = Some(path);
                self.write_report(&result);
                Ok(result)
            }
            Err(source) => {
                self.logger.error(&source.to_string());
                self.write_report(&result);
                Err(BatchError::Assemble { source, result })
            }
        }
    }

    fn log_summary(&self, result: &BatchResult) {
        for outcome in result.outcomes.iter().filter(|o| !o.is_success()) {
            if let PairResult::Failure { stage, reason } = &outcome.result {
                self.logger.warn(&format!(
                    "{} dropped at {}: {}",
                    outcome.pair_id, stage, reason
                ));
            }
        }
        self.logger.info(&format!(
            "{} succeeded, {} failed",
            result.succeeded(),
            result.failed()
        ));
    }

    /// Best effort; a report that cannot be written only warns.
    fn write_report(&self, result: &BatchResult) {
        if !self.settings.pipeline.write_report {
            return;
        }
        let path = self.paths.report_path();
        let written = serde_json::to_string_pretty(result)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(&path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => self.logger.debug(&format!("Report written to {}", path.display())),
            Err(e) => self.logger.warn(&format!("Could not write report: {}", e)),
        }
    }
}
