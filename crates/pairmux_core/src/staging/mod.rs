//! Deterministic staging and output paths.
//!
//! Layout (all under explicit base directories, never the CWD):
//!
//! ```text
//! <temp_root>/
//!     <pair_id>/
//!         landing/                 remote copy drops files here
//!         video.raw.<ext>
//!         image.raw.<ext>
//!         video.normalized.mp4
//!     concat_list.txt
//!     concat_output.mp4
//! <output>/
//!     segments/<pair_id>.mp4       composited, concat input
//!     <published_name>             final artifact
//! ```
//!
//! Every per-pair file lives under the pair's identity, so two manifest
//! entries sharing a base filename never touch each other's files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::models::{ArtifactKind, ArtifactStage, PairId};

/// Computes and prepares every path the pipeline writes to.
#[derive(Debug, Clone)]
pub struct PathManager {
    temp_root: PathBuf,
    output_dir: PathBuf,
}

impl PathManager {
    /// Relative base directories are resolved once, here.
    pub fn new(temp_root: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Self {
        Self {
            temp_root: absolutize(temp_root.as_ref()),
            output_dir: absolutize(output_dir.as_ref()),
        }
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Private working directory of one pair.
    pub fn pair_dir(&self, pair_id: &PairId) -> PathBuf {
        self.temp_root.join(pair_id.as_str())
    }

    /// Where the remote copy materializes files for this pair.
    pub fn landing_dir(&self, pair_id: &PairId) -> PathBuf {
        self.pair_dir(pair_id).join("landing")
    }

    /// Path of a staged artifact.
    ///
    /// Raw downloads keep the extension of `source_ref`; re-encoded
    /// files are always `.mp4`. Composited artifacts live in the output
    /// tree (see [`PathManager::output_path`]).
    pub fn staging_path(
        &self,
        pair_id: &PairId,
        kind: ArtifactKind,
        stage: ArtifactStage,
        source_ref: &str,
    ) -> PathBuf {
        match stage {
            ArtifactStage::Raw => {
                let ext = Path::new(source_ref)
                    .extension()
                    .map(|e| e.to_string_lossy().to_lowercase())
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| "bin".to_string());
                self.pair_dir(pair_id).join(format!("{}.raw.{}", kind, ext))
            }
            ArtifactStage::Normalized => self
                .pair_dir(pair_id)
                .join(format!("{}.normalized.mp4", kind)),
            ArtifactStage::Composited => self.output_path(pair_id),
        }
    }

    /// Where the compositor encodes before the segment is published to
    /// [`PathManager::output_path`].
    pub fn segment_scratch_path(&self, pair_id: &PairId) -> PathBuf {
        self.pair_dir(pair_id).join("segment.partial.mp4")
    }

    /// Composited per-pair segment.
    pub fn output_path(&self, pair_id: &PairId) -> PathBuf {
        self.segments_dir().join(format!("{}.mp4", pair_id))
    }

    pub fn segments_dir(&self) -> PathBuf {
        self.output_dir.join("segments")
    }

    pub fn concat_list_path(&self) -> PathBuf {
        self.temp_root.join("concat_list.txt")
    }

    /// Where the concat capability writes before publication.
    pub fn concat_scratch_path(&self) -> PathBuf {
        self.temp_root.join("concat_output.mp4")
    }

    pub fn published_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join("batch_report.json")
    }

    /// Create `path` and all missing ancestors. Idempotent.
    pub fn ensure_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    /// Create the parent directory of `path`.
    pub fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }

    /// Drop anything left from a previous run of this pair identity and
    /// recreate its working directories.
    pub fn reset_pair(&self, pair_id: &PairId) -> io::Result<()> {
        let dir = self.pair_dir(pair_id);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        remove_if_exists(&self.output_path(pair_id))?;
        self.ensure_dir(&self.landing_dir(pair_id))
    }

    /// Remove a pair's intermediates (raw and normalized files).
    pub fn cleanup_pair(&self, pair_id: &PairId) -> io::Result<()> {
        let dir = self.pair_dir(pair_id);
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Remove a file if present; absence is not an error.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Move a file, falling back to copy + delete across filesystems.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Manifest, MediaPair};
    use tempfile::tempdir;

    fn id(index: usize, video: &str, image: &str) -> PairId {
        PairId::for_pair(index, &MediaPair::new(index, video, image).unwrap())
    }

    #[test]
    fn paths_are_namespaced_by_pair() {
        let paths = PathManager::new("/work/temp", "/work/out");
        let m = Manifest::parse_entries("a/clip.mp4,a/f.png;b/clip.mp4,b/f.png").unwrap();
        let ids: Vec<PairId> = m.identified().map(|(_, id, _)| id).collect();

        let raw0 = paths.staging_path(&ids[0], ArtifactKind::Video, ArtifactStage::Raw, "a/clip.mp4");
        let raw1 = paths.staging_path(&ids[1], ArtifactKind::Video, ArtifactStage::Raw, "b/clip.mp4");
        assert_ne!(raw0, raw1);
        assert_ne!(paths.output_path(&ids[0]), paths.output_path(&ids[1]));
        assert!(raw0.starts_with("/work/temp"));
        assert!(raw0.to_string_lossy().ends_with("video.raw.mp4"));
    }

    #[test]
    fn raw_extension_follows_reference() {
        let paths = PathManager::new("/t", "/o");
        let pid = id(0, "v.MOV", "i.JPG");
        let image = paths.staging_path(&pid, ArtifactKind::Image, ArtifactStage::Raw, "i.JPG");
        assert!(image.to_string_lossy().ends_with("image.raw.jpg"));
        let norm = paths.staging_path(&pid, ArtifactKind::Video, ArtifactStage::Normalized, "v.MOV");
        assert!(norm.to_string_lossy().ends_with("video.normalized.mp4"));
        let comp = paths.staging_path(&pid, ArtifactKind::Video, ArtifactStage::Composited, "v.MOV");
        assert_eq!(comp, paths.output_path(&pid));
        let scratch = paths.segment_scratch_path(&pid);
        assert!(scratch.starts_with(paths.pair_dir(&pid)));
        assert!(!scratch.starts_with("/o"));
    }

    #[test]
    fn ensure_dir_is_idempotent() {
        let dir = tempdir().unwrap();
        let paths = PathManager::new(dir.path().join("t"), dir.path().join("o"));
        let deep = dir.path().join("t/x/y/z");
        paths.ensure_dir(&deep).unwrap();
        paths.ensure_dir(&deep).unwrap();
        assert!(deep.is_dir());
    }

    #[test]
    fn reset_pair_removes_stale_files() {
        let dir = tempdir().unwrap();
        let paths = PathManager::new(dir.path().join("t"), dir.path().join("o"));
        let pid = id(0, "v.mp4", "i.png");

        let stale = paths.pair_dir(&pid).join("video.raw.mp4");
        paths.ensure_parent(&stale).unwrap();
        fs::write(&stale, b"old").unwrap();
        let seg = paths.output_path(&pid);
        paths.ensure_parent(&seg).unwrap();
        fs::write(&seg, b"old segment").unwrap();

        paths.reset_pair(&pid).unwrap();

        assert!(!stale.exists());
        assert!(!seg.exists());
        assert!(paths.landing_dir(&pid).is_dir());
    }

    #[test]
    fn move_file_replaces_target() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("a");
        let to = dir.path().join("b");
        fs::write(&from, b"new").unwrap();
        fs::write(&to, b"old").unwrap();
        move_file(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"new");
    }

    #[test]
    fn remove_if_exists_tolerates_absence() {
        let dir = tempdir().unwrap();
        remove_if_exists(&dir.path().join("missing")).unwrap();
    }
}
