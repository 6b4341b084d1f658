//! Post-crawl manifest augmentation.
//!
//! Two injectors append files to manifests the crawler already produced:
//! the dynamic-library closure of an executable, and a subset of a themed
//! icon package. Both only append, through [`Manifest::append_unique`], so
//! the directory grouping of the existing manifest is preserved.
//!
//! [`Manifest::append_unique`]: crate::core::Manifest::append_unique

use std::path::{Path, PathBuf};

use anyhow::Result;
use regex::Regex;
use thiserror::Error;

use crate::core::{PackageName, Registry};
use crate::crawler::manifest::{path_kind, PathKind};
use crate::crawler::{CrawlResult, Layout};
use crate::util::diagnostic::Diagnostic;
use crate::util::process::{find_executable, ProcessBuilder};

/// Error while augmenting manifests.
#[derive(Debug, Error)]
pub enum AugmentError {
    #[error("cannot augment `{package}`: it was not discovered by the crawl")]
    UnknownPackage { package: String },

    #[error("scanning `{}` failed: {message}", .executable.display())]
    Scan { executable: PathBuf, message: String },

    #[error("registry query for `{package}` failed: {message}")]
    Registry { package: String, message: String },

    #[error("`{path}` does not exist")]
    MissingFile { path: String },

    #[error("`{path}` is outside the install root `{root}`")]
    OutsideRoot { path: String, root: String },

    #[error("invalid augmentation pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl AugmentError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            AugmentError::UnknownPackage { .. } => diag.with_suggestion(
                "Point the augmentation at a package reached from the selection".to_string(),
            ),
            AugmentError::Scan { .. } => diag
                .with_suggestion("Check that the scanner tool is installed and on PATH".to_string()),
            AugmentError::OutsideRoot { .. } => {
                diag.with_suggestion("Narrow the augmentation `filter` pattern".to_string())
            }
            _ => diag,
        }
    }
}

/// Lists the dynamic libraries an executable loads.
pub trait DllScanner {
    /// Absolute paths (in the installation's view) of every library the
    /// executable loads, directly or transitively.
    fn scan(&mut self, executable: &Path) -> Result<Vec<String>>;
}

/// [`DllScanner`] backed by `ldd` (or a compatible tool).
#[derive(Debug, Clone)]
pub struct LddScanner {
    program: PathBuf,
}

impl LddScanner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        LddScanner {
            program: program.into(),
        }
    }

    /// Locate a scanner tool on PATH.
    pub fn find(name: &str) -> Option<Self> {
        find_executable(name).map(LddScanner::new)
    }
}

impl DllScanner for LddScanner {
    fn scan(&mut self, executable: &Path) -> Result<Vec<String>> {
        let output = ProcessBuilder::new(&self.program)
            .arg(executable)
            .exec_and_check()?;
        Ok(parse_ldd_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Extract resolved library paths from `ldd` output.
///
/// Lines look like `libz.dll => /mingw64/bin/libz.dll (0x7ff8a0000000)`.
/// Unresolved (`not found`) and virtual entries are dropped.
pub fn parse_ldd_output(stdout: &str) -> Vec<String> {
    let mut paths = Vec::new();
    for line in stdout.lines() {
        let line = line.trim();
        let target = match line.split_once("=>") {
            Some((_, rhs)) => rhs.trim(),
            None => line,
        };
        let path = match target.rfind(" (") {
            Some(idx) => target[..idx].trim(),
            None => target,
        };
        if path.starts_with('/') && !paths.iter().any(|p| p == path) {
            paths.push(path.to_string());
        }
    }
    paths
}

/// Append an executable's library closure to a package's manifest.
#[derive(Debug, Clone)]
pub struct DllInjection {
    pub package: PackageName,
    /// Inventory path of the executable to scan.
    pub executable: String,
    /// Only libraries whose path matches are appended.
    pub filter: Regex,
}

/// Append a subset of a themed icon package to a package's manifest.
#[derive(Debug, Clone)]
pub struct IconInjection {
    pub package: PackageName,
    pub theme_package: PackageName,
    /// Only icon paths that match are appended.
    pub filter: Regex,
}

/// All augmentation steps, run in order after the crawl.
#[derive(Debug, Clone, Default)]
pub struct AugmentPlan {
    pub dlls: Vec<DllInjection>,
    pub icons: Vec<IconInjection>,
}

impl AugmentPlan {
    pub fn is_empty(&self) -> bool {
        self.dlls.is_empty() && self.icons.is_empty()
    }
}

/// Run every step of `plan` against the crawl result.
///
/// Returns the number of files appended.
pub fn augment<R, S>(
    result: &mut CrawlResult,
    layout: &Layout,
    registry: &mut R,
    scanner: &mut S,
    plan: &AugmentPlan,
) -> Result<usize, AugmentError>
where
    R: Registry + ?Sized,
    S: DllScanner + ?Sized,
{
    let mut appended = 0;
    for step in &plan.dlls {
        appended += inject_dlls(result, layout, scanner, step)?;
    }
    for step in &plan.icons {
        appended += inject_icons(result, layout, registry, step)?;
    }
    Ok(appended)
}

/// Append the filtered library closure of `step.executable`.
pub fn inject_dlls<S: DllScanner + ?Sized>(
    result: &mut CrawlResult,
    layout: &Layout,
    scanner: &mut S,
    step: &DllInjection,
) -> Result<usize, AugmentError> {
    ensure_discovered(result, &step.package)?;

    let executable = layout.disk_path(&step.executable);
    let libraries = scanner
        .scan(&executable)
        .map_err(|e| AugmentError::Scan {
            executable: executable.clone(),
            message: format!("{:#}", e),
        })?;

    let selected: Vec<_> = libraries
        .into_iter()
        .filter(|p| step.filter.is_match(p))
        .collect();
    let appended = append_files(result, layout, &step.package, &selected)?;

    tracing::info!(
        "Added {} libraries of {} to `{}`",
        appended,
        step.executable,
        step.package
    );
    Ok(appended)
}

/// Append the filtered inventory of `step.theme_package`.
pub fn inject_icons<R: Registry + ?Sized>(
    result: &mut CrawlResult,
    layout: &Layout,
    registry: &mut R,
    step: &IconInjection,
) -> Result<usize, AugmentError> {
    ensure_discovered(result, &step.package)?;

    let inventory = registry
        .files(&step.theme_package)
        .map_err(|e| AugmentError::Registry {
            package: step.theme_package.to_string(),
            message: format!("{:#}", e),
        })?;

    let mut selected = Vec::new();
    for path in inventory {
        if !step.filter.is_match(&path) {
            continue;
        }
        match kind_of(layout, &path)? {
            PathKind::Directory => continue,
            PathKind::File => selected.push(path),
            PathKind::Missing => return Err(AugmentError::MissingFile { path }),
        }
    }
    let appended = append_files(result, layout, &step.package, &selected)?;

    tracing::info!(
        "Added {} icons from `{}` to `{}`",
        appended,
        step.theme_package,
        step.package
    );
    Ok(appended)
}

fn ensure_discovered(result: &CrawlResult, package: &PackageName) -> Result<(), AugmentError> {
    if result.contains(package) {
        Ok(())
    } else {
        Err(AugmentError::UnknownPackage {
            package: package.to_string(),
        })
    }
}

fn kind_of(layout: &Layout, path: &str) -> Result<PathKind, AugmentError> {
    path_kind(layout, path).map_err(|e| AugmentError::Scan {
        executable: layout.disk_path(path),
        message: e.to_string(),
    })
}

fn append_files(
    result: &mut CrawlResult,
    layout: &Layout,
    package: &PackageName,
    paths: &[String],
) -> Result<usize, AugmentError> {
    let mut entries = Vec::with_capacity(paths.len());
    for path in paths {
        if kind_of(layout, path)? != PathKind::File {
            return Err(AugmentError::MissingFile { path: path.clone() });
        }
        let entry = layout.entry(path).ok_or_else(|| AugmentError::OutsideRoot {
            path: path.clone(),
            root: layout.install_root.clone(),
        })?;
        entries.push(entry);
    }

    let manifest = result
        .package_mut(package)
        .ok_or_else(|| AugmentError::UnknownPackage {
            package: package.to_string(),
        })?
        .manifest_mut();

    let mut appended = 0;
    for entry in entries {
        let relative = entry.relative().to_string();
        if manifest.append_unique(entry) {
            appended += 1;
        } else {
            tracing::warn!("{} already lists {}, skipping", package, relative);
        }
    }
    Ok(appended)
}
