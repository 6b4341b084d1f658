//! Package - a node discovered while crawling the registry.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::manifest::Manifest;

/// Name of an installed package. Unique within a run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageName(String);

impl PackageName {
    /// Create a package name.
    pub fn new(name: impl Into<String>) -> Self {
        PackageName(name.into())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        PackageName(s.to_string())
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        PackageName(s)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whether a package is user-selectable in the installer or pulled in silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Part of the top-level selection; gets a checkbox and a description.
    Visible,
    /// Reached only through the dependency graph; always installed.
    Hidden,
}

impl Visibility {
    /// Classify a package against the top-level selection.
    pub fn classify(is_top_level: bool) -> Self {
        if is_top_level {
            Visibility::Visible
        } else {
            Visibility::Hidden
        }
    }

    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Visible => write!(f, "visible"),
            Visibility::Hidden => write!(f, "hidden"),
        }
    }
}

/// An edge from a discovered package to one of its related packages.
///
/// Recorded once per `(dependent, dependency)` pair encountered during the
/// crawl, even when the dependency side was already discovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub dependent: PackageName,
    pub dependency: PackageName,
    /// Classification of the dependency side; selects the edge stream.
    pub visibility: Visibility,
}

/// A package discovered during the crawl.
///
/// Created on first discovery; the manifest and description are attached
/// at that point and never recomputed.
#[derive(Debug, Clone)]
pub struct Package {
    name: PackageName,
    visibility: Visibility,
    description: Option<String>,
    manifest: Manifest,
}

impl Package {
    /// Create a package record for a newly discovered node.
    pub fn new(
        name: PackageName,
        visibility: Visibility,
        description: Option<String>,
        manifest: Manifest,
    ) -> Self {
        Package {
            name,
            visibility,
            description,
            manifest,
        }
    }

    pub fn name(&self) -> &PackageName {
        &self.name
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Registry description; only fetched for visible packages.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Mutable access for post-crawl augmentation.
    pub fn manifest_mut(&mut self) -> &mut Manifest {
        &mut self.manifest
    }
}
