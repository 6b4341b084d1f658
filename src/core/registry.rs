//! Registry trait - the installed-package data source.
//!
//! The crawler never talks to a package manager directly. Everything it
//! knows about the installation comes through this trait, which keeps the
//! traversal testable against in-memory data and lets a captured snapshot
//! stand in for a live system.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::PackageName;

/// Which registry relation the crawler follows from a package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeRelation {
    /// Packages that require this one (reverse dependencies).
    #[default]
    RequiredBy,
    /// Packages this one requires.
    DependsOn,
}

impl std::str::FromStr for EdgeRelation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "required-by" => Ok(EdgeRelation::RequiredBy),
            "depends-on" => Ok(EdgeRelation::DependsOn),
            _ => Err(format!(
                "invalid relation '{}'; expected 'required-by' or 'depends-on'",
                s
            )),
        }
    }
}

/// A read-only view of installed packages.
///
/// Every query is a blocking call. Implementations report errors for
/// unknown packages or malformed data; callers treat them as fatal.
pub trait Registry {
    /// Names of explicitly installed packages.
    fn explicit_packages(&mut self) -> Result<Vec<PackageName>>;

    /// Declared file inventory of a package, absolute paths in registry order.
    ///
    /// Directories may appear in the list.
    fn files(&mut self, name: &PackageName) -> Result<Vec<String>>;

    /// One-line description of a package.
    fn description(&mut self, name: &PackageName) -> Result<String>;

    /// Packages that require `name`, in registry order.
    fn required_by(&mut self, name: &PackageName) -> Result<Vec<PackageName>>;

    /// Packages that `name` requires, in registry order.
    fn depends_on(&mut self, name: &PackageName) -> Result<Vec<PackageName>>;

    /// Human-readable source name for logs.
    fn source_name(&self) -> &str;

    /// Follow the given relation from a package.
    fn related(&mut self, name: &PackageName, relation: EdgeRelation) -> Result<Vec<PackageName>> {
        match relation {
            EdgeRelation::RequiredBy => self.required_by(name),
            EdgeRelation::DependsOn => self.depends_on(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockRegistry;

    #[test]
    fn test_related_dispatches_on_relation() {
        let mut registry = MockRegistry::new()
            .with_package("a")
            .with_package("b")
            .with_required_by("a", &["b"]);

        let up = registry
            .related(&"a".into(), EdgeRelation::RequiredBy)
            .unwrap();
        assert_eq!(up, vec![PackageName::from("b")]);

        let down = registry
            .related(&"b".into(), EdgeRelation::DependsOn)
            .unwrap();
        assert_eq!(down, vec![PackageName::from("a")]);
    }

    #[test]
    fn test_relation_from_str() {
        assert_eq!(
            "depends-on".parse::<EdgeRelation>().unwrap(),
            EdgeRelation::DependsOn
        );
        assert!("sideways".parse::<EdgeRelation>().is_err());
    }
}
