//! Registry snapshots - a captured registry stored as JSON.
//!
//! A snapshot freezes everything the crawler can ask a registry for, so a
//! run can be reproduced on a machine without the package manager, and
//! integration tests don't need one either.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::{PackageName, Registry};
use crate::util::fs::{read_to_string, write_string};

/// Registry data for a single package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotPackage {
    pub description: String,
    pub files: Vec<String>,
    pub required_by: Vec<PackageName>,
    pub depends_on: Vec<PackageName>,
}

/// A serialized registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub explicit: Vec<PackageName>,
    pub packages: BTreeMap<PackageName, SnapshotPackage>,
}

impl Snapshot {
    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse registry snapshot: {}", path.display()))
    }

    /// Save the snapshot as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(self).context("failed to serialize registry snapshot")?;
        write_string(path, &contents)
    }

    /// Capture the explicitly installed packages of `registry` and every
    /// package reachable from them through either relation.
    pub fn capture<R: Registry + ?Sized>(registry: &mut R) -> Result<Self> {
        let explicit = registry.explicit_packages()?;
        let mut packages = BTreeMap::new();
        let mut seen: BTreeSet<PackageName> = explicit.iter().cloned().collect();
        let mut queue: VecDeque<PackageName> = explicit.iter().cloned().collect();

        while let Some(name) = queue.pop_front() {
            let package = SnapshotPackage {
                description: registry.description(&name)?,
                files: registry.files(&name)?,
                required_by: registry.required_by(&name)?,
                depends_on: registry.depends_on(&name)?,
            };
            for related in package.required_by.iter().chain(&package.depends_on) {
                if seen.insert(related.clone()) {
                    queue.push_back(related.clone());
                }
            }
            tracing::debug!("captured {} ({} files)", name, package.files.len());
            packages.insert(name, package);
        }

        tracing::info!(
            "Captured {} packages ({} explicit) from `{}`",
            packages.len(),
            explicit.len(),
            registry.source_name()
        );
        Ok(Snapshot { explicit, packages })
    }
}

/// A [`Registry`] serving data from a [`Snapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotRegistry {
    name: String,
    snapshot: Snapshot,
}

impl SnapshotRegistry {
    /// Load a snapshot file.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(SnapshotRegistry {
            name: path.display().to_string(),
            snapshot: Snapshot::load(path)?,
        })
    }

    fn package(&self, name: &PackageName) -> Result<&SnapshotPackage> {
        self.snapshot
            .packages
            .get(name)
            .with_context(|| format!("package `{}` is not in the snapshot", name))
    }
}

impl Registry for SnapshotRegistry {
    fn explicit_packages(&mut self) -> Result<Vec<PackageName>> {
        Ok(self.snapshot.explicit.clone())
    }

    fn files(&mut self, name: &PackageName) -> Result<Vec<String>> {
        Ok(self.package(name)?.files.clone())
    }

    fn description(&mut self, name: &PackageName) -> Result<String> {
        Ok(self.package(name)?.description.clone())
    }

    fn required_by(&mut self, name: &PackageName) -> Result<Vec<PackageName>> {
        Ok(self.package(name)?.required_by.clone())
    }

    fn depends_on(&mut self, name: &PackageName) -> Result<Vec<PackageName>> {
        Ok(self.package(name)?.depends_on.clone())
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
