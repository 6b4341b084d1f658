//! Registry backed by the `pacman` command line.
//!
//! Queries used:
//! - `pacman -Qqe` for explicitly installed packages
//! - `pacman -Qql <pkg>` for file inventories
//! - `pacman -Qi <pkg>` for description and both relations
//!
//! `-Qi` output is parsed once per package and cached for the run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::{PackageName, Registry};
use crate::util::diagnostic::suggestions;
use crate::util::process::{find_executable, ProcessBuilder};

/// Fields of `pacman -Qi` the crawler needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: String,
    pub description: String,
    pub depends_on: Vec<PackageName>,
    pub required_by: Vec<PackageName>,
}

/// A [`Registry`] that shells out to pacman.
#[derive(Debug)]
pub struct PacmanRegistry {
    program: PathBuf,
    info: HashMap<PackageName, PackageInfo>,
}

impl PacmanRegistry {
    /// Use the given pacman executable.
    pub fn new(program: impl AsRef<Path>) -> Self {
        PacmanRegistry {
            program: program.as_ref().to_path_buf(),
            info: HashMap::new(),
        }
    }

    /// Locate pacman on PATH.
    pub fn find(name: &str) -> Result<Self> {
        let program = find_executable(name).with_context(|| {
            format!("`{}` was not found on PATH\n{}", name, suggestions::NO_PACMAN)
        })?;
        tracing::debug!("using pacman at {}", program.display());
        Ok(Self::new(program))
    }

    fn query(&self, args: &[&str]) -> Result<String> {
        ProcessBuilder::new(&self.program)
            .args(args)
            .env("LC_ALL", "C")
            .exec_stdout()
    }

    fn info(&mut self, name: &PackageName) -> Result<&PackageInfo> {
        if !self.info.contains_key(name) {
            let stdout = self.query(&["-Qi", name.as_str()])?;
            let info = parse_info(&stdout)
                .with_context(|| format!("malformed `pacman -Qi {}` output", name))?;
            self.info.insert(name.clone(), info);
        }
        Ok(&self.info[name])
    }
}

impl Registry for PacmanRegistry {
    fn explicit_packages(&mut self) -> Result<Vec<PackageName>> {
        let stdout = self.query(&["-Qqe"])?;
        Ok(lines(&stdout).map(PackageName::from).collect())
    }

    fn files(&mut self, name: &PackageName) -> Result<Vec<String>> {
        let stdout = self.query(&["-Qql", name.as_str()])?;
        Ok(lines(&stdout).map(str::to_string).collect())
    }

    fn description(&mut self, name: &PackageName) -> Result<String> {
        Ok(self.info(name)?.description.clone())
    }

    fn required_by(&mut self, name: &PackageName) -> Result<Vec<PackageName>> {
        Ok(self.info(name)?.required_by.clone())
    }

    fn depends_on(&mut self, name: &PackageName) -> Result<Vec<PackageName>> {
        Ok(self.info(name)?.depends_on.clone())
    }

    fn source_name(&self) -> &str {
        "pacman"
    }
}

fn lines(stdout: &str) -> impl Iterator<Item = &str> {
    stdout.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// Parse the output of `pacman -Qi` for a single package.
pub fn parse_info(stdout: &str) -> Result<PackageInfo> {
    let mut fields: Vec<(String, String)> = Vec::new();

    for line in stdout.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with(char::is_whitespace) {
            // wrapped value of the previous field
            match fields.last_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                None => bail!("continuation line before any field: {:?}", line),
            }
            continue;
        }
        match line.split_once(':') {
            Some((key, value)) => fields.push((key.trim().to_string(), value.trim().to_string())),
            None => bail!("unrecognized line: {:?}", line),
        }
    }

    let field = |key: &str| {
        fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    let name = match field("Name") {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => bail!("missing `Name` field"),
    };

    Ok(PackageInfo {
        name,
        description: field("Description").unwrap_or_default().to_string(),
        depends_on: name_list(field("Depends On")),
        required_by: name_list(field("Required By")),
    })
}

/// Split a whitespace-separated name list, dropping version constraints.
fn name_list(value: Option<&str>) -> Vec<PackageName> {
    match value {
        None | Some("None") => Vec::new(),
        Some(value) => value
            .split_whitespace()
            .map(|dep| {
                let end = dep.find(['<', '>', '=']).unwrap_or(dep.len());
                PackageName::from(&dep[..end])
            })
            .collect(),
    }
}
