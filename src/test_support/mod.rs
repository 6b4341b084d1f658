//! Test utilities and mocks for sectionforge unit tests.
//!
//! This module provides an in-memory [`Registry`] implementation with
//! per-query counters, so tests can assert not only what the crawler found
//! but how often it asked for it.
//!
//! # Example
//!
//! ```rust,ignore
//! use sectionforge::test_support::{InstallTree, MockRegistry};
//!
//! #[test]
//! fn test_example() {
//!     let tree = InstallTree::new();
//!     let mut registry = MockRegistry::new()
//!         .with_installed_package(&tree, "app", &["bin/app.exe"])
//!         .with_required_by("app", &["lib"]);
//!
//!     // Crawl against `registry` and `tree.layout()`...
//! }
//! ```

pub mod fixtures;

use std::collections::{BTreeSet, HashMap};

use anyhow::{bail, Result};

use crate::core::{PackageName, Registry};

// Re-export fixtures for convenience
pub use fixtures::*;

#[derive(Debug, Clone, Default)]
struct MockPackage {
    files: Vec<String>,
    description: Option<String>,
    required_by: Vec<PackageName>,
    explicit: bool,
}

/// In-memory registry for testing without a package manager.
#[derive(Debug, Clone, Default)]
pub struct MockRegistry {
    packages: HashMap<PackageName, MockPackage>,
    order: Vec<PackageName>,
    files_queries: HashMap<PackageName, usize>,
    description_queries: HashMap<PackageName, usize>,
    related_queries: HashMap<PackageName, usize>,
}

impl MockRegistry {
    /// Create an empty mock registry.
    pub fn new() -> Self {
        MockRegistry::default()
    }

    /// Register a package with an empty inventory.
    pub fn with_package(mut self, name: &str) -> Self {
        self.entry(name);
        self
    }

    /// Register a package whose files are created inside `tree`.
    pub fn with_installed_package(mut self, tree: &InstallTree, name: &str, files: &[&str]) -> Self {
        let inventory = tree.install(files);
        self.entry(name).files = inventory;
        self
    }

    /// Register a package with an explicit inventory (paths need not exist).
    pub fn with_inventory(mut self, name: &str, files: &[String]) -> Self {
        self.entry(name).files = files.to_vec();
        self
    }

    /// Set the packages that require `name`.
    pub fn with_required_by(mut self, name: &str, required_by: &[&str]) -> Self {
        self.entry(name).required_by = required_by.iter().map(|n| PackageName::from(*n)).collect();
        self
    }

    pub fn with_description(mut self, name: &str, description: &str) -> Self {
        self.entry(name).description = Some(description.to_string());
        self
    }

    /// Mark packages as explicitly installed.
    pub fn with_explicit(mut self, names: &[&str]) -> Self {
        for name in names {
            self.entry(name).explicit = true;
        }
        self
    }

    /// Number of file inventory queries made for `name`.
    pub fn files_queries(&self, name: &str) -> usize {
        self.files_queries.get(&PackageName::from(name)).copied().unwrap_or(0)
    }

    /// Number of description queries made for `name`.
    pub fn description_queries(&self, name: &str) -> usize {
        self.description_queries
            .get(&PackageName::from(name))
            .copied()
            .unwrap_or(0)
    }

    /// Number of relation queries (either direction) made for `name`.
    pub fn related_queries(&self, name: &str) -> usize {
        self.related_queries.get(&PackageName::from(name)).copied().unwrap_or(0)
    }

    fn entry(&mut self, name: &str) -> &mut MockPackage {
        let key = PackageName::from(name);
        if !self.packages.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.packages.entry(key).or_default()
    }

    fn get(&self, name: &PackageName) -> Result<&MockPackage> {
        match self.packages.get(name) {
            Some(pkg) => Ok(pkg),
            None => bail!("package `{}` was not found", name),
        }
    }
}

impl Registry for MockRegistry {
    fn explicit_packages(&mut self) -> Result<Vec<PackageName>> {
        Ok(self
            .order
            .iter()
            .filter(|n| self.packages[*n].explicit)
            .cloned()
            .collect())
    }

    fn files(&mut self, name: &PackageName) -> Result<Vec<String>> {
        *self.files_queries.entry(name.clone()).or_default() += 1;
        Ok(self.get(name)?.files.clone())
    }

    fn description(&mut self, name: &PackageName) -> Result<String> {
        *self.description_queries.entry(name.clone()).or_default() += 1;
        let pkg = self.get(name)?;
        Ok(pkg
            .description
            .clone()
            .unwrap_or_else(|| format!("{} package", name)))
    }

    fn required_by(&mut self, name: &PackageName) -> Result<Vec<PackageName>> {
        *self.related_queries.entry(name.clone()).or_default() += 1;
        Ok(self.get(name)?.required_by.clone())
    }

    fn depends_on(&mut self, name: &PackageName) -> Result<Vec<PackageName>> {
        *self.related_queries.entry(name.clone()).or_default() += 1;
        self.get(name)?;
        Ok(self
            .order
            .iter()
            .filter(|other| self.packages[*other].required_by.contains(name))
            .cloned()
            .collect())
    }

    fn source_name(&self) -> &str {
        "mock"
    }
}

/// Build a name set from string literals.
pub fn names(list: &[&str]) -> BTreeSet<PackageName> {
    list.iter().map(|n| PackageName::from(*n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_registry_counts_queries() {
        let mut registry = MockRegistry::new().with_package("a");
        registry.files(&"a".into()).unwrap();
        registry.files(&"a".into()).unwrap();
        assert_eq!(registry.files_queries("a"), 2);
        assert!(registry.files(&"missing".into()).is_err());
    }

    #[test]
    fn test_mock_registry_explicit_order() {
        let mut registry = MockRegistry::new()
            .with_package("b")
            .with_package("a")
            .with_explicit(&["a", "b"]);
        let explicit = registry.explicit_packages().unwrap();
        assert_eq!(explicit, vec![PackageName::from("b"), PackageName::from("a")]);
    }
}
