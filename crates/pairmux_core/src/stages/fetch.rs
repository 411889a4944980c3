//! Remote retrieval with post-transfer checks.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::logging::ScopedLogger;
use crate::models::ArtifactKind;
use crate::orchestrator::FetchError;
use crate::staging::{move_file, remove_if_exists};
use crate::tools::MediaTools;

/// Image encodings accepted as overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

const PNG_MAGIC: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];
const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// Identify an image by its leading bytes.
pub fn sniff_image(leading: &[u8]) -> Option<ImageFormat> {
    if leading.starts_with(&PNG_MAGIC) {
        Some(ImageFormat::Png)
    } else if leading.starts_with(&JPEG_MAGIC) {
        Some(ImageFormat::Jpeg)
    } else {
        None
    }
}

/// Bytes needed to tell the accepted image formats apart.
const SIGNATURE_LEN: u64 = 8;

fn read_leading(path: &Path) -> io::Result<Vec<u8>> {
    let mut leading = Vec::with_capacity(SIGNATURE_LEN as usize);
    File::open(path)?
        .take(SIGNATURE_LEN)
        .read_to_end(&mut leading)?;
    Ok(leading)
}

fn hex_prefix(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take(8)
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Copies remote objects to an exact local path and refuses anything that
/// did not materialize, is implausibly small, or is not the expected kind.
pub struct RemoteFetcher {
    tools: Arc<dyn MediaTools>,
    min_size: u64,
    verify_signatures: bool,
}

impl RemoteFetcher {
    pub fn new(tools: Arc<dyn MediaTools>, min_size: u64, verify_signatures: bool) -> Self {
        Self {
            tools,
            min_size,
            verify_signatures,
        }
    }

    /// Fetch `remote_ref` so that it ends up at exactly `dest`.
    ///
    /// A stale file at `dest` is removed first, so a file left from an
    /// earlier run can never satisfy the existence check.
    pub fn fetch(
        &self,
        remote_ref: &str,
        kind: ArtifactKind,
        landing_dir: &Path,
        dest: &Path,
        log: &ScopedLogger,
    ) -> Result<PathBuf, FetchError> {
        let staging = |path: &Path, source: io::Error| FetchError::Staging {
            remote_ref: remote_ref.to_string(),
            path: path.to_path_buf(),
            source,
        };

        remove_if_exists(dest).map_err(|e| staging(dest, e))?;
        fs::create_dir_all(landing_dir).map_err(|e| staging(landing_dir, e))?;

        log.info(&format!("Fetching {} '{}'", kind, remote_ref));
        self.tools
            .remote_copy(remote_ref, landing_dir, log)
            .map_err(|source| FetchError::TransferFailed {
                remote_ref: remote_ref.to_string(),
                source,
            })?;

        let landed = match Path::new(remote_ref).file_name() {
            Some(name) => landing_dir.join(name),
            None => landing_dir.join(remote_ref),
        };
        if !landed.is_file() {
            return Err(FetchError::NotFound {
                remote_ref: remote_ref.to_string(),
                expected: landed,
            });
        }

        move_file(&landed, dest).map_err(|e| staging(dest, e))?;

        let size = fs::metadata(dest).map_err(|e| staging(dest, e))?.len();
        if size == 0 || size < self.min_size {
            return Err(FetchError::Corrupt {
                remote_ref: remote_ref.to_string(),
                size,
                min_size: self.min_size,
            });
        }

        if kind == ArtifactKind::Image && self.verify_signatures {
            let leading = read_leading(dest).map_err(|e| staging(dest, e))?;
            match sniff_image(&leading) {
                Some(format) => log.debug(&format!("Image format: {:?}", format)),
                None => {
                    return Err(FetchError::InvalidFormat {
                        remote_ref: remote_ref.to_string(),
                        leading: hex_prefix(&leading),
                    })
                }
            }
        }

        log.info(&format!("Fetched '{}' ({} bytes)", remote_ref, size));
        Ok(dest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{gif_bytes, jpeg_bytes, png_bytes, test_logger, video_bytes, FakeTools};
    use tempfile::tempdir;

    fn fetcher(tools: FakeTools) -> RemoteFetcher {
        RemoteFetcher::new(Arc::new(tools), 1024, true)
    }

    #[test]
    fn sniffs_png_and_jpeg() {
        assert_eq!(sniff_image(&png_bytes()), Some(ImageFormat::Png));
        assert_eq!(sniff_image(&jpeg_bytes()), Some(ImageFormat::Jpeg));
        assert_eq!(sniff_image(&gif_bytes()), None);
        assert_eq!(sniff_image(&[0x89]), None);
    }

    #[test]
    fn fetch_lands_at_exact_destination() {
        let dir = tempdir().unwrap();
        let f = fetcher(FakeTools::new().with_object("clips/a.mp4", video_bytes("a")));
        let dest = dir.path().join("video.raw.mp4");

        let path = f
            .fetch("clips/a.mp4", ArtifactKind::Video, &dir.path().join("landing"), &dest, &test_logger())
            .unwrap();

        assert_eq!(path, dest);
        assert_eq!(fs::read(&dest).unwrap(), video_bytes("a"));
        assert!(!dir.path().join("landing/a.mp4").exists());
    }

    #[test]
    fn missing_file_after_transfer_is_not_found() {
        let dir = tempdir().unwrap();
        let f = fetcher(FakeTools::new().skipping_landing("x.mp4"));
        let dest = dir.path().join("video.raw.mp4");
        fs::write(&dest, video_bytes("stale")).unwrap();

        let err = f
            .fetch("x.mp4", ArtifactKind::Video, &dir.path().join("landing"), &dest, &test_logger())
            .unwrap_err();

        assert!(matches!(err, FetchError::NotFound { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn transfer_failure_is_reported() {
        let dir = tempdir().unwrap();
        let f = fetcher(FakeTools::new().failing_transfer("x.mp4"));
        let err = f
            .fetch("x.mp4", ArtifactKind::Video, &dir.path().join("l"), &dir.path().join("d"), &test_logger())
            .unwrap_err();
        assert!(matches!(err, FetchError::TransferFailed { .. }));
    }

    #[test]
    fn small_file_is_corrupt() {
        let dir = tempdir().unwrap();
        let f = fetcher(FakeTools::new().with_object("tiny.mp4", b"abc".to_vec()));
        let err = f
            .fetch("tiny.mp4", ArtifactKind::Video, &dir.path().join("l"), &dir.path().join("d"), &test_logger())
            .unwrap_err();
        assert!(matches!(err, FetchError::Corrupt { size: 3, .. }));
    }

    #[test]
    fn non_image_payload_is_invalid_format() {
        let dir = tempdir().unwrap();
        let f = fetcher(FakeTools::new().with_object("bad.png", gif_bytes()));
        let err = f
            .fetch("bad.png", ArtifactKind::Image, &dir.path().join("l"), &dir.path().join("d"), &test_logger())
            .unwrap_err();
        match err {
            FetchError::InvalidFormat { leading, .. } => assert!(leading.starts_with("47 49 46")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn signature_check_reads_only_the_leading_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.png");
        let mut bytes = png_bytes();
        bytes.resize(64 * 1024, 0);
        fs::write(&path, &bytes).unwrap();

        let leading = read_leading(&path).unwrap();
        assert_eq!(leading.len(), SIGNATURE_LEN as usize);
        assert_eq!(sniff_image(&leading), Some(ImageFormat::Png));

        let short = dir.path().join("short.bin");
        fs::write(&short, [0xFF, 0xD8]).unwrap();
        assert_eq!(read_leading(&short).unwrap(), vec![0xFF, 0xD8]);
    }

    #[test]
    fn signature_check_can_be_disabled() {
        let dir = tempdir().unwrap();
        let f = RemoteFetcher::new(
            Arc::new(FakeTools::new().with_object("bad.png", gif_bytes())),
            1024,
            false,
        );
        assert!(f
            .fetch("bad.png", ArtifactKind::Image, &dir.path().join("l"), &dir.path().join("d"), &test_logger())
            .is_ok());
    }
}
