//! Configuration file support for sectionforge.
//!
//! Configuration is looked up in this order:
//! - `--config <path>` on the command line
//! - `sectionforge.toml` in the current directory
//! - `config.toml` in the user config directory
//!
//! Relative paths inside a config file are resolved against the directory
//! containing that file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::filter::{DEFAULT_EXCLUDE, DEFAULT_INCLUDE};
use crate::core::{EdgeRelation, FilterRule, FilterRules};
use crate::crawler::{CrawlError, Layout};
use crate::ops::augment::{AugmentError, AugmentPlan, DllInjection, IconInjection};
use crate::util::diagnostic::suggestions;

/// File name looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "sectionforge.toml";

/// sectionforge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where package data comes from
    pub registry: RegistryConfig,

    /// Install root and output locations
    pub layout: LayoutConfig,

    /// Top-level package selection
    pub selection: SelectionConfig,

    /// Include/exclude rules for file inventories
    pub filters: FiltersConfig,

    /// Post-crawl manifest additions
    pub augment: AugmentConfig,
}

/// Registry backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    #[default]
    Pacman,
    Snapshot,
}

/// Registry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub kind: RegistryKind,

    /// Snapshot file, required when `kind = "snapshot"`
    pub snapshot: Option<PathBuf>,

    /// pacman executable name or path
    pub pacman: String,

    /// Relation followed from each discovered package
    pub relation: EdgeRelation,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            kind: RegistryKind::default(),
            snapshot: None,
            pacman: "pacman".to_string(),
            relation: EdgeRelation::default(),
        }
    }
}

/// Filesystem layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Prefix stripped from inventory paths (e.g. `/mingw64`)
    pub install_root: String,

    /// Prepended to inventory paths to locate files on disk (e.g. `C:/msys64`)
    pub filesystem_root: Option<PathBuf>,

    /// Directory receiving the generated artifacts
    pub output_dir: PathBuf,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            install_root: "/mingw64".to_string(),
            filesystem_root: None,
            output_dir: PathBuf::from("installer"),
        }
    }
}

/// Two independent derivations of the top-level set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// A package is selected if its name matches any of these
    pub allow: Vec<String>,

    /// A package is selected if its name matches none of these
    pub deny: Vec<String>,
}

/// An include/exclude pair; a missing side falls back to the default rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub include: Option<String>,
    pub exclude: Option<String>,
}

/// Filter rule settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FiltersConfig {
    /// Overrides for the process-wide default rule
    pub default: RuleConfig,

    /// Per-package rules keyed by package name
    pub rules: BTreeMap<String, RuleConfig>,
}

/// Library closure to add to a package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DllConfig {
    pub package: String,
    pub executable: String,
    #[serde(default = "match_all")]
    pub filter: String,
}

/// Icon theme subset to add to a package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IconConfig {
    pub package: String,
    pub theme_package: String,
    #[serde(default = "match_all")]
    pub filter: String,
}

/// Augmentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    /// Tool listing an executable's libraries
    pub scanner: String,
    pub dlls: Vec<DllConfig>,
    pub icons: Vec<IconConfig>,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        AugmentConfig {
            scanner: "ldd".to_string(),
            dlls: Vec::new(),
            icons: Vec::new(),
        }
    }
}

fn match_all() -> String {
    ".*".to_string()
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Locate and load the configuration.
    ///
    /// Returns the config together with the file it came from.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<(Self, PathBuf)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, path.to_path_buf()));
        }

        let local = cwd.join(CONFIG_FILE_NAME);
        if local.exists() {
            return Ok((Self::load(&local)?, local));
        }

        if let Some(global) = global_config_path() {
            if global.exists() {
                tracing::debug!("using global config {}", global.display());
                return Ok((Self::load(&global)?, global));
            }
        }

        bail!(
            "could not find {} in {}\n{}",
            CONFIG_FILE_NAME,
            cwd.display(),
            suggestions::NO_CONFIG
        )
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(ref mut snapshot) = self.registry.snapshot {
            resolve(snapshot);
        }
        if let Some(ref mut root) = self.layout.filesystem_root {
            resolve(root);
        }
        resolve(&mut self.layout.output_dir);
    }

    /// Filesystem layout for manifest building.
    pub fn layout(&self) -> Layout {
        let layout = Layout::new(self.layout.install_root.clone());
        match &self.layout.filesystem_root {
            Some(root) => layout.with_filesystem_root(root),
            None => layout,
        }
    }

    /// Compile the filter table.
    pub fn filter_rules(&self) -> Result<FilterRules> {
        let default = &self.filters.default;
        let include = default.include.as_deref().unwrap_or(DEFAULT_INCLUDE);
        let exclude = default.exclude.as_deref().unwrap_or(DEFAULT_EXCLUDE);
        let fallback = FilterRule::new(include, exclude)
            .map_err(CrawlError::from)
            .context("invalid pattern in [filters.default]")?;

        let mut rules = FilterRules::new(fallback);
        for (name, rule) in &self.filters.rules {
            let compiled = FilterRule::new(
                rule.include.as_deref().unwrap_or(include),
                rule.exclude.as_deref().unwrap_or(exclude),
            )
            .map_err(CrawlError::from)
            .with_context(|| format!("invalid pattern in [filters.rules.\"{}\"]", name))?;
            rules = rules.with_rule(name.as_str(), compiled);
        }
        Ok(rules)
    }

    /// Compile the augmentation steps.
    pub fn augment_plan(&self) -> Result<AugmentPlan> {
        let mut plan = AugmentPlan::default();

        for dll in &self.augment.dlls {
            plan.dlls.push(DllInjection {
                package: dll.package.as_str().into(),
                executable: dll.executable.clone(),
                filter: Regex::new(&dll.filter)
                    .map_err(AugmentError::from)
                    .with_context(|| format!("invalid dll filter for `{}`", dll.package))?,
            });
        }
        for icons in &self.augment.icons {
            plan.icons.push(IconInjection {
                package: icons.package.as_str().into(),
                theme_package: icons.theme_package.as_str().into(),
                filter: Regex::new(&icons.filter)
                    .map_err(AugmentError::from)
                    .with_context(|| format!("invalid icon filter for `{}`", icons.package))?,
            });
        }

        Ok(plan)
    }
}

/// Get the user config path (e.g. `~/.config/sectionforge/config.toml`).
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "sectionforge")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
