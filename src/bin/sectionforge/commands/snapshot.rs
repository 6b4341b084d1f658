//! `sectionforge snapshot` command
//!
//! Captures the live registry so later runs (and other machines) can use
//! `--registry-snapshot` instead of pacman.

use anyhow::Result;

use crate::cli::SnapshotArgs;
use crate::commands::{load_config, GlobalArgs};
use sectionforge::sources::{PacmanRegistry, Snapshot};
use sectionforge::util::config::Config;

pub fn execute(args: SnapshotArgs, global: &GlobalArgs) -> Result<()> {
    // A config file is optional here; only the pacman path is read from it.
    let config = match load_config(global) {
        Ok(config) => config,
        Err(e) if global.config.is_none() => {
            tracing::debug!("no config: {:#}", e);
            Config::default()
        }
        Err(e) => return Err(e),
    };

    let mut registry = PacmanRegistry::find(&config.registry.pacman)?;
    let snapshot = Snapshot::capture(&mut registry)?;
    snapshot.save(&args.output)?;

    println!(
        "Captured {} packages to {}",
        snapshot.packages.len(),
        args.output.display()
    );
    Ok(())
}
