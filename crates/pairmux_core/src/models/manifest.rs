//! Manifest of (video, overlay image) pairs.
//!
//! The input record is a small JSON document:
//!
//! ```json
//! { "stream_url": "rtmp://...", "files": "clips/a.mp4,img/a.png; clips/b.mp4,img/b.png" }
//! ```
//!
//! Pairs are separated by `;`, the two references inside a pair by `,`.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Separator between pairs in the raw entry string.
pub const PAIR_DELIMITER: char = ';';

/// Separator between the video and image reference inside a pair.
pub const ITEM_DELIMITER: char = ',';

/// Errors raised while loading a manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Entry {index} is malformed (expected 'video,image'): '{entry}'")]
    MalformedEntry { index: usize, entry: String },

    #[error("Entry {index} has an empty {which} reference")]
    EmptyReference { index: usize, which: &'static str },

    #[error("Manifest contains no pairs")]
    Empty,
}

/// One manifest entry: a video and the image to overlay on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaPair {
    /// Remote reference of the video (relative to the configured remote).
    pub video_ref: String,
    /// Remote reference of the overlay image.
    pub image_ref: String,
}

impl MediaPair {
    /// Create a pair, trimming both references.
    ///
    /// `index` is only used for error context.
    pub fn new(
        index: usize,
        video_ref: impl AsRef<str>,
        image_ref: impl AsRef<str>,
    ) -> Result<Self, ManifestError> {
        let video_ref = video_ref.as_ref().trim();
        let image_ref = image_ref.as_ref().trim();

        if video_ref.is_empty() {
            return Err(ManifestError::EmptyReference {
                index,
                which: "video",
            });
        }
        if image_ref.is_empty() {
            return Err(ManifestError::EmptyReference {
                index,
                which: "image",
            });
        }

        Ok(Self {
            video_ref: video_ref.to_string(),
            image_ref: image_ref.to_string(),
        })
    }
}

impl fmt::Display for MediaPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.video_ref, self.image_ref)
    }
}

/// Raw input record as found on disk.
#[derive(Debug, Deserialize)]
struct ManifestRecord {
    #[serde(default)]
    stream_url: Option<String>,
    #[serde(alias = "arquivos")]
    files: String,
}

/// Ordered, immutable list of pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Stream identifier carried alongside the pairs (informational).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
    pairs: Vec<MediaPair>,
}

impl Manifest {
    /// Build a manifest from already-validated pairs.
    pub fn new(pairs: Vec<MediaPair>) -> Result<Self, ManifestError> {
        if pairs.is_empty() {
            return Err(ManifestError::Empty);
        }
        Ok(Self {
            stream_url: None,
            pairs,
        })
    }

    /// Parse the delimited entry string (`video,image;video,image`).
    ///
    /// Empty groups (e.g. a trailing `;`) are ignored.
    pub fn parse_entries(raw: &str) -> Result<Self, ManifestError> {
        let mut pairs = Vec::new();

        for group in raw
            .split(PAIR_DELIMITER)
            .map(str::trim)
            .filter(|g| !g.is_empty())
        {
            let index = pairs.len();
            let parts: Vec<&str> = group.split(ITEM_DELIMITER).collect();
            if parts.len() != 2 {
                return Err(ManifestError::MalformedEntry {
                    index,
                    entry: group.to_string(),
                });
            }
            pairs.push(MediaPair::new(index, parts[0], parts[1])?);
        }

        Self::new(pairs)
    }

    /// Parse a JSON input record.
    pub fn from_json_str(content: &str) -> Result<Self, ManifestError> {
        let record: ManifestRecord = serde_json::from_str(content)?;
        let mut manifest = Self::parse_entries(&record.files)?;
        manifest.stream_url = record.stream_url.filter(|s| !s.trim().is_empty());
        Ok(manifest)
    }

    /// Load a JSON input record from disk.
    pub fn from_json_file(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn pairs(&self) -> &[MediaPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate pairs together with their deterministic identity.
    pub fn identified(&self) -> impl Iterator<Item = (usize, PairId, &MediaPair)> {
        self.pairs
            .iter()
            .enumerate()
            .map(|(i, p)| (i, PairId::for_pair(i, p), p))
    }
}

/// Deterministic, collision-free identity of a manifest entry.
///
/// Format: `{index:03}_{stem}_{hash8}`. The hash covers both references so
/// two entries that share a base filename still get distinct working files,
/// while re-running the same manifest yields the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairId(String);

impl PairId {
    pub fn for_pair(index: usize, pair: &MediaPair) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(pair.video_ref.as_bytes());
        hasher.update(b"\n");
        hasher.update(pair.image_ref.as_bytes());
        let digest = hasher.finalize();
        let hash8: String = digest[..4].iter().map(|b| format!("{:02x}", b)).collect();

        let stem = Path::new(&pair.video_ref)
            .file_stem()
            .map(|s| sanitize_component(&s.to_string_lossy()))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "pair".to_string());

        Self(format!("{:03}_{}_{}", index, stem, hash8))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keep a path component to a conservative character set.
fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(48)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_delimited_pairs() {
        let m = Manifest::parse_entries(" a/v1.mp4 , a/i1.png ; b/v2.mp4,b/i2.jpg ;").unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.pairs()[0].video_ref, "a/v1.mp4");
        assert_eq!(m.pairs()[0].image_ref, "a/i1.png");
        assert_eq!(m.pairs()[1].image_ref, "b/i2.jpg");
    }

    #[test]
    fn rejects_malformed_entry() {
        let err = Manifest::parse_entries("a.mp4,a.png;lonely.mp4").unwrap_err();
        assert!(matches!(err, ManifestError::MalformedEntry { index: 1, .. }));
    }

    #[test]
    fn rejects_empty_reference() {
        let err = Manifest::parse_entries("a.mp4, ").unwrap_err();
        assert!(matches!(
            err,
            ManifestError::EmptyReference {
                index: 0,
                which: "image"
            }
        ));
    }

    #[test]
    fn rejects_empty_manifest() {
        assert!(matches!(
            Manifest::parse_entries(" ; ;").unwrap_err(),
            ManifestError::Empty
        ));
    }

    #[test]
    fn reads_json_record_with_legacy_key() {
        let json = r#"{"stream_url": "rtmp://live/x", "arquivos": "v.mp4,i.png"}"#;
        let m = Manifest::from_json_str(json).unwrap();
        assert_eq!(m.stream_url.as_deref(), Some("rtmp://live/x"));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn pair_id_is_deterministic() {
        let pair = MediaPair::new(0, "clips/intro.mp4", "img/intro.png").unwrap();
        let a = PairId::for_pair(0, &pair);
        let b = PairId::for_pair(0, &pair);
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("000_intro_"));
    }

    #[test]
    fn pair_id_distinguishes_shared_basenames() {
        let m = Manifest::parse_entries("day1/clip.mp4,day1/f.png;day2/clip.mp4,day2/f.png").unwrap();
        let ids: Vec<PairId> = m.identified().map(|(_, id, _)| id).collect();
        assert_ne!(ids[0], ids[1]);

        // Same references at a different index still hash the same.
        let suffix = |id: &PairId| id.as_str().rsplit('_').next().unwrap().to_string();
        let moved = PairId::for_pair(5, &m.pairs()[0]);
        assert_eq!(suffix(&moved), suffix(&ids[0]));
    }

    #[test]
    fn sanitizes_odd_stems() {
        let pair = MediaPair::new(0, "x/it's a clip!.mov", "i.png").unwrap();
        let id = PairId::for_pair(3, &pair);
        assert!(id.as_str().starts_with("003_it_s_a_clip__"));
    }
}
