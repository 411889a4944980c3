//! The four media stages of the pipeline.
//!
//! Each stage wraps one [`MediaTools`](crate::tools::MediaTools) capability
//! with the checks around it:
//!
//! - **fetch**: remote copy to an exact path, existence, size and signature checks
//! - **normalize**: re-encode to canonical parameters
//! - **composite**: overlay the image, re-encode
//! - **concat**: stream-copy join and publication

mod composite;
mod concat;
mod fetch;
mod normalize;

pub use composite::Compositor;
pub use concat::ConcatAssembler;
pub use fetch::{sniff_image, ImageFormat, RemoteFetcher};
pub use normalize::VideoNormalizer;
