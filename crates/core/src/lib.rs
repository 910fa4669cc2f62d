//! binmap-core
//!
//! Core library for change-driven packaging: resolves changed source paths to
//! the deployable units ("binaries") they belong to, materializes those units
//! into an output tree, emits a binary manifest, and runs a bounded pool of
//! static-analysis workers over the changed files.
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! the CLI or any other frontend.

pub mod analysis;
pub mod changeset;
pub mod config;
pub mod error;
pub mod layout;
pub mod manifest;
pub mod mapping;
pub mod materialize;
pub mod model;
pub mod report;
pub mod resolver;
pub mod util;

pub use error::{BinmapError, Result};

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
