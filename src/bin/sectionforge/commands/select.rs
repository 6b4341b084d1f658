//! `sectionforge select` command

use anyhow::Result;

use crate::cli::SelectArgs;
use crate::commands::{load_config, registry, GlobalArgs};
use sectionforge::ops::generate::select;

pub fn execute(args: SelectArgs, global: &GlobalArgs) -> Result<()> {
    let mut config = load_config(global)?;
    let mut registry = registry(&mut config, &args.registry)?;

    for name in select(&config, registry.as_mut())? {
        println!("{}", name);
    }

    Ok(())
}
