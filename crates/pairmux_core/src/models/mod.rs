//! Data models for pairmux.
//!
//! - Manifest and pair identity
//! - Staged artifacts and the per-pair stage machine
//! - Per-pair outcomes and the batch result

mod artifact;
mod manifest;
mod outcome;

pub use artifact::{ArtifactKind, ArtifactStage, PairStage, StagedArtifact};
pub use manifest::{
    Manifest, ManifestError, MediaPair, PairId, ITEM_DELIMITER, PAIR_DELIMITER,
};
pub use outcome::{BatchResult, PairOutcome, PairResult};
