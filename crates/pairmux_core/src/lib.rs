//! pairmux core - fetch, normalize, overlay and concatenate media pairs.
//!
//! This crate contains all pipeline logic; the `pairmux` binary is a thin
//! CLI over [`orchestrator::BatchProcessor`].

pub mod config;
pub mod encode;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod stages;
pub mod staging;
pub mod tools;

#[cfg(test)]
mod test_support;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
