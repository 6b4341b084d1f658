//! sectionforge - installer sections from installed-package metadata
//!
//! This crate walks an installed package set, starting from a selected list
//! of top-level packages, and turns what it finds into NSIS section stubs,
//! per-package file manifests, and dependency edge lists.

pub mod core;
pub mod crawler;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities and mocks for sectionforge unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides an in-memory registry and a fake
/// installation prefix on disk.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{Manifest, Package, PackageName, Registry, Visibility};
pub use crate::crawler::{CrawlResult, Crawler};
pub use crate::util::config::Config;
