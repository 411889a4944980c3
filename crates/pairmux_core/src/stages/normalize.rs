//! Video normalization to the canonical encoding.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::encode::FfmpegJob;
use crate::logging::ScopedLogger;
use crate::orchestrator::TranscodeError;
use crate::staging::remove_if_exists;
use crate::tools::MediaTools;

pub struct VideoNormalizer {
    tools: Arc<dyn MediaTools>,
}

impl VideoNormalizer {
    pub fn new(tools: Arc<dyn MediaTools>) -> Self {
        Self { tools }
    }

    /// Re-encode `src` into `dst`. `dst` exists afterwards or an error is
    /// returned.
    pub fn normalize(&self, src: &Path, dst: &Path, log: &ScopedLogger) -> Result<PathBuf, TranscodeError> {
        if !src.is_file() {
            return Err(TranscodeError::encode_failed(src, "source file is missing"));
        }
        remove_if_exists(dst).map_err(|e| TranscodeError::encode_failed(src, e))?;

        let job = FfmpegJob::normalize(src, dst);
        log.info(&format!("Normalizing {}", src.display()));
        self.tools
            .transcode(&job, log)
            .map_err(|e| TranscodeError::encode_failed(src, e))?;

        if !dst.is_file() {
            return Err(TranscodeError::encode_failed(
                src,
                format!("encoder produced no output at {}", dst.display()),
            ));
        }
        Ok(dst.to_path_buf())
    }
}
