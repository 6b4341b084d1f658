//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// A directory whose contents replace a target directory only on commit.
///
/// The staging directory is created next to the target so the final rename
/// stays on one filesystem. Dropping it without committing removes it.
#[derive(Debug)]
pub struct StagingDir {
    dir: TempDir,
    target: PathBuf,
}

impl StagingDir {
    /// Create a staging directory for `target`.
    pub fn new(target: &Path) -> Result<Self> {
        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        ensure_dir(&parent)?;
        let dir = tempfile::Builder::new()
            .prefix(".sectionforge-")
            .tempdir_in(&parent)
            .with_context(|| format!("failed to create staging directory in {}", parent.display()))?;
        Ok(StagingDir {
            dir,
            target: target.to_path_buf(),
        })
    }

    /// Path to write staged files into.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Replace the target directory with the staged contents.
    pub fn commit(self) -> Result<PathBuf> {
        remove_dir_all_if_exists(&self.target)?;
        let staged = self.dir.keep();
        fs::rename(&staged, &self.target).with_context(|| {
            format!(
                "failed to move {} to {}",
                staged.display(),
                self.target.display()
            )
        })?;
        Ok(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_string_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a/b/c.txt");
        write_string(&path, "content").unwrap();
        assert_eq!(read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn test_staging_commit_replaces_target() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("out");
        write_string(&target.join("stale.txt"), "old").unwrap();

        let staging = StagingDir::new(&target).unwrap();
        write_string(&staging.path().join("fresh.txt"), "new").unwrap();
        staging.commit().unwrap();

        assert!(target.join("fresh.txt").exists());
        assert!(!target.join("stale.txt").exists());
    }

    #[test]
    fn test_staging_dropped_leaves_target_alone() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("out");

        let staging = StagingDir::new(&target).unwrap();
        let staged = staging.path().to_path_buf();
        write_string(&staged.join("partial.txt"), "x").unwrap();
        drop(staging);

        assert!(!staged.exists());
        assert!(!target.exists());
    }
}
