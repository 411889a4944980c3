//! Pipeline step implementations.
//!
//! Each step moves a pair through one stage of
//! `FetchVideo -> FetchImage -> Normalize -> Composite`.

mod composite;
mod fetch;
mod normalize;

pub use composite::CompositeStep;
pub use fetch::{FetchImageStep, FetchVideoStep};
pub use normalize::NormalizeStep;
