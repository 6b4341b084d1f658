//! Test fixtures for common test scenarios.
//!
//! [`InstallTree`] lays out a fake installation prefix inside a temporary
//! directory so manifest building can stat real files.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::crawler::Layout;

/// Install root used by every fixture inventory.
pub const FIXTURE_ROOT: &str = "/inst";

/// A fake installation prefix on disk.
///
/// Inventory paths look like `/inst/bin/app.exe`; the files live under the
/// temporary directory, which serves as the layout's filesystem root.
#[derive(Debug)]
pub struct InstallTree {
    dir: TempDir,
}

impl InstallTree {
    /// Create an empty installation.
    pub fn new() -> Self {
        InstallTree {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Filesystem root of the installation.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Inventory path for a root-relative path.
    pub fn inventory_path(&self, relative: &str) -> String {
        format!("{}/{}", FIXTURE_ROOT, relative)
    }

    /// Create files (or directories, with a trailing `/`) and return their
    /// inventory paths in the given order.
    pub fn install(&self, relatives: &[&str]) -> Vec<String> {
        relatives
            .iter()
            .map(|rel| {
                let disk = self
                    .dir
                    .path()
                    .join(FIXTURE_ROOT.trim_start_matches('/'))
                    .join(rel.trim_end_matches('/'));
                if rel.ends_with('/') {
                    fs::create_dir_all(&disk).unwrap();
                } else {
                    fs::create_dir_all(disk.parent().unwrap()).unwrap();
                    fs::write(&disk, rel.as_bytes()).unwrap();
                }
                self.inventory_path(rel)
            })
            .collect()
    }

    /// Layout matching this installation.
    pub fn layout(&self) -> Layout {
        Layout::new(FIXTURE_ROOT).with_filesystem_root(self.dir.path())
    }
}

impl Default for InstallTree {
    fn default() -> Self {
        Self::new()
    }
}
