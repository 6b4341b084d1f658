//! Registry backends.
//!
//! A registry answers the crawler's questions about installed packages:
//! - `pacman` queries the live package database
//! - `snapshot` serves a previously captured JSON file

pub mod pacman;
pub mod snapshot;

pub use pacman::PacmanRegistry;
pub use snapshot::{Snapshot, SnapshotRegistry};

use anyhow::{Context, Result};

use crate::core::Registry;
use crate::util::config::{Config, RegistryKind};

/// Open the registry selected by the configuration.
pub fn open_registry(config: &Config) -> Result<Box<dyn Registry>> {
    match config.registry.kind {
        RegistryKind::Pacman => Ok(Box::new(PacmanRegistry::find(&config.registry.pacman)?)),
        RegistryKind::Snapshot => {
            let path = config
                .registry
                .snapshot
                .as_deref()
                .context("`registry.kind = \"snapshot\"` requires `registry.snapshot`")?;
            Ok(Box::new(SnapshotRegistry::open(path)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_kind_requires_path() {
        let mut config = Config::default();
        config.registry.kind = RegistryKind::Snapshot;

        let err = open_registry(&config).err().unwrap();
        assert!(err.to_string().contains("registry.snapshot"));
    }
}
