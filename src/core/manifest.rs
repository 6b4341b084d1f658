//! File manifests - ordered output-directory / copy-file directives.
//!
//! A manifest lists the files of one package in inventory order. Consecutive
//! files sharing an output directory are grouped under a single
//! [`Directive::SetOutPath`]; the grouping never reorders files.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// A file destined for the installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Path the installer builder copies from.
    source: PathBuf,
    /// Path below the installation root, `/`-separated.
    relative: String,
}

impl FileEntry {
    /// Create an entry from an inventory path by stripping `install_root`.
    ///
    /// `source` is the on-disk location to copy from; `inventory_path` is the
    /// registry's view of the same file. Returns `None` when the inventory
    /// path is not below the installation root.
    pub fn new(source: PathBuf, inventory_path: &str, install_root: &str) -> Option<Self> {
        let root = install_root.trim_end_matches('/');
        let rest = inventory_path.strip_prefix(root)?;
        // "/mingw64x/..." must not match root "/mingw64"
        if !root.is_empty() && !rest.starts_with('/') {
            return None;
        }
        let relative = rest.trim_start_matches('/');
        if relative.is_empty() {
            return None;
        }
        Some(FileEntry {
            source,
            relative: relative.to_string(),
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Output-relative path.
    pub fn relative(&self) -> &str {
        &self.relative
    }

    /// Output directory: the parent of the relative path, `""` for the root.
    pub fn output_dir(&self) -> &str {
        match self.relative.rfind('/') {
            Some(idx) => &self.relative[..idx],
            None => "",
        }
    }

    /// File name component of the relative path.
    pub fn file_name(&self) -> &str {
        match self.relative.rfind('/') {
            Some(idx) => &self.relative[idx + 1..],
            None => &self.relative,
        }
    }
}

/// A single manifest instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Directive {
    /// Change the output directory for the following files.
    SetOutPath { dir: String },
    /// Copy one file into the current output directory.
    File { entry: FileEntry },
}

/// Ordered directive list for one package.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Manifest {
    directives: Vec<Directive>,
    #[serde(skip)]
    current_dir: Option<String>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Manifest::default()
    }

    /// Build a manifest from entries in order.
    pub fn from_entries(entries: impl IntoIterator<Item = FileEntry>) -> Self {
        let mut manifest = Manifest::new();
        for entry in entries {
            manifest.push(entry);
        }
        manifest
    }

    /// Append a file, emitting a directory change only if needed.
    pub fn push(&mut self, entry: FileEntry) {
        let dir = entry.output_dir();
        if self.current_dir.as_deref() != Some(dir) {
            self.current_dir = Some(dir.to_string());
            self.directives.push(Directive::SetOutPath {
                dir: dir.to_string(),
            });
        }
        self.directives.push(Directive::File { entry });
    }

    /// Append a file unless the same output path is already listed.
    ///
    /// Returns whether the entry was appended.
    pub fn append_unique(&mut self, entry: FileEntry) -> bool {
        if self.contains(entry.relative()) {
            return false;
        }
        self.push(entry);
        true
    }

    /// Whether a file with this output-relative path is listed.
    pub fn contains(&self, relative: &str) -> bool {
        self.files().any(|f| f.relative() == relative)
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Files in manifest order.
    pub fn files(&self) -> impl Iterator<Item = &FileEntry> {
        self.directives.iter().filter_map(|d| match d {
            Directive::File { entry } => Some(entry),
            Directive::SetOutPath { .. } => None,
        })
    }

    pub fn file_count(&self) -> usize {
        self.files().count()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str) -> FileEntry {
        FileEntry::new(PathBuf::from(path), path, "/root").unwrap()
    }

    #[test]
    fn test_file_entry_paths() {
        let e = entry("/root/lib/ocaml/stdlib.cma");
        assert_eq!(e.relative(), "lib/ocaml/stdlib.cma");
        assert_eq!(e.output_dir(), "lib/ocaml");
        assert_eq!(e.file_name(), "stdlib.cma");

        let top = entry("/root/README");
        assert_eq!(top.output_dir(), "");
    }

    #[test]
    fn test_file_entry_outside_root() {
        assert!(FileEntry::new(PathBuf::from("/usr/bin/x"), "/usr/bin/x", "/root").is_none());
        assert!(FileEntry::new(PathBuf::from("/rootx/a"), "/rootx/a", "/root/").is_none());
        assert!(FileEntry::new(PathBuf::from("/root"), "/root", "/root").is_none());
    }

    #[test]
    fn test_coalesces_consecutive_dirs() {
        let manifest = Manifest::from_entries(vec![
            entry("/root/bin/p.exe"),
            entry("/root/bin/q.dll"),
            entry("/root/lib/p.cma"),
            entry("/root/bin/r.exe"),
        ]);

        let dirs: Vec<_> = manifest
            .directives()
            .iter()
            .filter_map(|d| match d {
                Directive::SetOutPath { dir } => Some(dir.as_str()),
                _ => None,
            })
            .collect();

        // a directory is re-entered when a later run returns to it
        assert_eq!(dirs, vec!["bin", "lib", "bin"]);
        assert_eq!(manifest.file_count(), 4);

        for pair in manifest.directives().windows(2) {
            let both_dirs = matches!(
                pair,
                [Directive::SetOutPath { .. }, Directive::SetOutPath { .. }]
            );
            assert!(!both_dirs);
        }
    }

    #[test]
    fn test_append_unique_keeps_coalescing() {
        let mut manifest = Manifest::from_entries(vec![entry("/root/bin/p.exe")]);

        assert!(manifest.append_unique(entry("/root/bin/libz.dll")));
        assert!(!manifest.append_unique(entry("/root/bin/p.exe")));

        assert_eq!(manifest.directives().len(), 3);
        assert_eq!(manifest.file_count(), 2);
    }
}
