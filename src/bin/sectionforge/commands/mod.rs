//! Command implementations

pub mod completions;
pub mod generate;
pub mod select;
pub mod snapshot;
pub mod tree;

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::RegistryArgs;
use sectionforge::core::Registry;
use sectionforge::sources::open_registry;
use sectionforge::util::config::{Config, RegistryKind};

/// Options shared by every command.
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub color: bool,
}

/// Locate and load the configuration file.
pub fn load_config(global: &GlobalArgs) -> Result<Config> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let (config, path) = Config::discover(global.config.as_deref(), &cwd)?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(config)
}

/// Apply `--registry-snapshot` and open the registry.
pub fn registry(config: &mut Config, args: &RegistryArgs) -> Result<Box<dyn Registry>> {
    if let Some(ref snapshot) = args.registry_snapshot {
        config.registry.kind = RegistryKind::Snapshot;
        config.registry.snapshot = Some(snapshot.clone());
    }
    open_registry(config)
}
