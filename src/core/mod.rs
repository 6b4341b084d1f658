//! Core data structures for sectionforge.
//!
//! This module contains the foundational types used throughout the crate:
//! - Package identity and visibility classification
//! - Include/exclude filter rules
//! - File manifests and their NSIS rendering
//! - The registry abstraction

pub mod filter;
pub mod manifest;
pub mod nsis;
pub mod package;
pub mod registry;

pub use filter::{FilterRule, FilterRules};
pub use manifest::{Directive, FileEntry, Manifest};
pub use package::{DependencyEdge, Package, PackageName, Visibility};
pub use registry::{EdgeRelation, Registry};
