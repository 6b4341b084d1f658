//! Manifest building - filtered, directory-coalesced file lists.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::core::{FileEntry, FilterRules, Manifest, PackageName};
use crate::crawler::CrawlError;

/// Where inventory paths live and which prefix is stripped from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Prefix stripped from inventory paths to form output-relative paths.
    pub install_root: String,
    /// Prepended to inventory paths to find the files on disk.
    pub filesystem_root: Option<PathBuf>,
}

impl Layout {
    pub fn new(install_root: impl Into<String>) -> Self {
        Layout {
            install_root: install_root.into(),
            filesystem_root: None,
        }
    }

    pub fn with_filesystem_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.filesystem_root = Some(root.into());
        self
    }

    /// On-disk location of an inventory path.
    pub fn disk_path(&self, inventory_path: &str) -> PathBuf {
        match &self.filesystem_root {
            Some(root) => root.join(inventory_path.trim_start_matches('/')),
            None => PathBuf::from(inventory_path),
        }
    }

    /// Turn an inventory path into a manifest entry.
    pub fn entry(&self, inventory_path: &str) -> Option<FileEntry> {
        FileEntry::new(
            self.disk_path(inventory_path),
            inventory_path,
            &self.install_root,
        )
    }
}

/// Kind of an inventory path on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
    Missing,
}

/// Inspect an inventory path on disk.
pub fn path_kind(layout: &Layout, inventory_path: &str) -> io::Result<PathKind> {
    match fs::metadata(layout.disk_path(inventory_path)) {
        Ok(meta) if meta.is_dir() => Ok(PathKind::Directory),
        Ok(_) => Ok(PathKind::File),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(PathKind::Missing),
        Err(e) => Err(e),
    }
}

/// Builds a package's manifest from its declared inventory.
#[derive(Debug, Clone)]
pub struct ManifestBuilder<'a> {
    rules: &'a FilterRules,
    layout: &'a Layout,
}

impl<'a> ManifestBuilder<'a> {
    pub fn new(rules: &'a FilterRules, layout: &'a Layout) -> Self {
        ManifestBuilder { rules, layout }
    }

    /// Build the manifest for `name`.
    ///
    /// Every declared path must exist: directories are skipped, missing
    /// paths are an integrity error. Surviving files keep inventory order.
    pub fn build(&self, name: &PackageName, inventory: &[String]) -> Result<Manifest, CrawlError> {
        let rule = self.rules.lookup(name);
        let mut manifest = Manifest::new();

        for path in inventory {
            let kind = path_kind(self.layout, path).map_err(|e| CrawlError::Registry {
                package: name.to_string(),
                message: format!("failed to stat {}: {}", path, e),
            })?;

            match kind {
                PathKind::Directory => continue,
                PathKind::Missing => {
                    return Err(CrawlError::MissingFile {
                        package: name.to_string(),
                        path: self.layout.disk_path(path),
                    });
                }
                PathKind::File => {}
            }

            if !rule.keeps(path) {
                tracing::trace!("{}: filtered out {}", name, path);
                continue;
            }

            let entry = self
                .layout
                .entry(path)
                .ok_or_else(|| CrawlError::OutsideRoot {
                    package: name.to_string(),
                    path: path.clone(),
                    root: self.layout.install_root.clone(),
                })?;
            manifest.push(entry);
        }

        Ok(manifest)
    }
}
