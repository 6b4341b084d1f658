//! High-level operations.
//!
//! This module contains the implementation of sectionforge commands.

pub mod augment;
pub mod generate;
pub mod select;

pub use augment::{augment, AugmentError, AugmentPlan, DllScanner, LddScanner};
pub use generate::{crawl, generate, Artifacts, GenerateOptions, GenerateSummary};
pub use select::{select_top_level, SelectError, Selection};
