//! Image overlay onto a normalized video.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::encode::FfmpegJob;
use crate::logging::ScopedLogger;
use crate::orchestrator::CompositeError;
use crate::staging::{move_file, remove_if_exists};
use crate::tools::MediaTools;

/// Overlays the footer image using the fixed [`OVERLAY`](crate::encode::OVERLAY)
/// placement and re-encodes to canonical parameters.
pub struct Compositor {
    tools: Arc<dyn MediaTools>,
}

impl Compositor {
    pub fn new(tools: Arc<dyn MediaTools>) -> Self {
        Self { tools }
    }

    /// Encode into `scratch` and move the result to `dst` only once ffmpeg
    /// succeeded. On failure neither path holds a file.
    pub fn composite(
        &self,
        video: &Path,
        image: &Path,
        scratch: &Path,
        dst: &Path,
        log: &ScopedLogger,
    ) -> Result<PathBuf, CompositeError> {
        for input in [video, image] {
            if !input.is_file() {
                return Err(CompositeError::overlay_failed(
                    video,
                    format!("input {} is missing", input.display()),
                ));
            }
        }
        for stale in [scratch, dst] {
            remove_if_exists(stale).map_err(|e| CompositeError::overlay_failed(video, e))?;
        }

        let job = FfmpegJob::composite(video, image, scratch);
        log.info(&format!("Overlaying {} onto {}", image.display(), video.display()));
        let encoded = self
            .tools
            .composite(&job, log)
            .map_err(|e| CompositeError::overlay_failed(video, e))
            .and_then(|()| {
                if scratch.is_file() {
                    Ok(())
                } else {
                    Err(CompositeError::overlay_failed(
                        video,
                        format!("no output at {}", scratch.display()),
                    ))
                }
            })
            .and_then(|()| {
                move_file(scratch, dst).map_err(|e| CompositeError::overlay_failed(video, e))
            });

        if let Err(e) = encoded {
            for partial in [scratch, dst] {
                if let Err(rm) = remove_if_exists(partial) {
                    log.warn(&format!("Could not remove {}: {}", partial.display(), rm));
                }
            }
            return Err(e);
        }
        Ok(dst.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{png_bytes, test_logger, video_bytes, FakeTools};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn composite_writes_segment() {
        let dir = tempdir().unwrap();
        let video = dir.path().join("video.normalized.mp4");
        let image = dir.path().join("image.raw.png");
        let scratch = dir.path().join("segment.partial.mp4");
        let dst = dir.path().join("segments/seg.mp4");
        fs::create_dir_all(dst.parent().unwrap()).unwrap();
        fs::write(&video, video_bytes("a")).unwrap();
        fs::write(&image, png_bytes()).unwrap();

        Compositor::new(Arc::new(FakeTools::new()))
            .composite(&video, &image, &scratch, &dst, &test_logger())
            .unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "segment:video:a\n");
        assert!(!scratch.exists());
    }

    #[test]
    fn failed_overlay_leaves_no_partial_segment() {
        let dir = tempdir().unwrap();
        let video = dir.path().join("video.normalized.mp4");
        let image = dir.path().join("image.raw.png");
        let scratch = dir.path().join("segment.partial.mp4");
        let dst = dir.path().join("segments/seg.mp4");
        fs::create_dir_all(dst.parent().unwrap()).unwrap();
        fs::write(&video, video_bytes("a")).unwrap();
        fs::write(&image, png_bytes()).unwrap();
        fs::write(&dst, "segment:from an earlier run\n").unwrap();

        let tools = Arc::new(FakeTools::new().failing_composite("video.normalized"));
        let err = Compositor::new(tools.clone())
            .composite(&video, &image, &scratch, &dst, &test_logger())
            .unwrap_err();

        assert!(err.to_string().contains("complex filters"));
        assert_eq!(tools.count("composite"), 1);
        assert!(!scratch.exists());
        assert!(!dst.exists());
    }

    #[test]
    fn missing_image_is_overlay_failure() {
        let dir = tempdir().unwrap();
        let video = dir.path().join("v.mp4");
        fs::write(&video, video_bytes("a")).unwrap();

        let err = Compositor::new(Arc::new(FakeTools::new()))
            .composite(
                &video,
                &dir.path().join("i.png"),
                &dir.path().join("s.partial.mp4"),
                &dir.path().join("s.mp4"),
                &test_logger(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("i.png"));
    }
}
