//! Final assembly of composited segments.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::encode::{ConcatList, FfmpegJob};
use crate::logging::ScopedLogger;
use crate::orchestrator::ConcatError;
use crate::staging::{move_file, remove_if_exists, PathManager};
use crate::tools::MediaTools;

/// Joins segments with a stream copy and publishes the result.
///
/// Segments must already share the canonical encoding; nothing is
/// re-encoded here.
pub struct ConcatAssembler {
    tools: Arc<dyn MediaTools>,
    paths: PathManager,
}

impl ConcatAssembler {
    pub fn new(tools: Arc<dyn MediaTools>, paths: PathManager) -> Self {
        Self { tools, paths }
    }

    /// Concatenate `segments` in the given order into `published`.
    ///
    /// The list file is written under the temp root and removed once the
    /// concat has run, whether it succeeded or not.
    pub fn assemble(
        &self,
        segments: &[PathBuf],
        published: &Path,
        log: &ScopedLogger,
    ) -> Result<PathBuf, ConcatError> {
        if segments.is_empty() {
            return Err(ConcatError::assemble_failed("no segments to concatenate"));
        }
        if let Some(missing) = segments.iter().find(|p| !p.is_file()) {
            return Err(ConcatError::assemble_failed(format!(
                "segment {} is missing",
                missing.display()
            )));
        }

        let list = ConcatList::new(segments);
        let list_path = self.paths.concat_list_path();
        let scratch = self.paths.concat_scratch_path();

        self.paths
            .ensure_parent(&list_path)
            .and_then(|_| list.write_to(&list_path))
            .map_err(|e| ConcatError::assemble_failed(format!("writing list file: {}", e)))?;
        remove_if_exists(&scratch).map_err(ConcatError::assemble_failed)?;

        log.info(&format!("Concatenating {} segment(s)", list.len()));
        let job = FfmpegJob::concat(&list_path, &scratch);
        let ran = self.tools.concat(&job, log);

        if let Err(e) = remove_if_exists(&list_path) {
            log.warn(&format!("Could not remove {}: {}", list_path.display(), e));
        }
        ran.map_err(ConcatError::assemble_failed)?;

        if !scratch.is_file() {
            return Err(ConcatError::assemble_failed("concat produced no output"));
        }

        self.paths
            .ensure_parent(published)
            .and_then(|_| move_file(&scratch, published))
            .map_err(|e| {
                ConcatError::assemble_failed(format!("publishing {}: {}", published.display(), e))
            })?;

        log.success(&format!("Published {}", published.display()));
        Ok(published.to_path_buf())
    }
}
