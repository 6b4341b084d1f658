//! `sectionforge generate` command

use anyhow::Result;

use crate::cli::GenerateArgs;
use crate::commands::{load_config, registry, GlobalArgs};
use sectionforge::ops::generate::{generate, GenerateOptions};
use sectionforge::ops::LddScanner;
use sectionforge::util::diagnostic::{emit, Diagnostic};

pub fn execute(args: GenerateArgs, global: &GlobalArgs) -> Result<()> {
    let mut config = load_config(global)?;
    if let Some(output) = args.output {
        config.layout.output_dir = output;
    }
    let mut registry = registry(&mut config, &args.registry)?;

    let mut scanner = LddScanner::find(&config.augment.scanner).unwrap_or_else(|| {
        tracing::debug!("`{}` not found on PATH", config.augment.scanner);
        LddScanner::new(&config.augment.scanner)
    });

    let opts = GenerateOptions::from_config(&config);
    let summary = generate(&config, registry.as_mut(), &mut scanner, &opts)?;

    let steps = config.augment.dlls.len() + config.augment.icons.len();
    if steps > 0 && summary.augmented == 0 {
        let diag = Diagnostic::warning(format!("{} augmentation steps added no files", steps))
            .with_suggestion("Check the `filter` patterns under `[augment]`");
        emit(&diag, global.color);
    }

    println!(
        "Generated {} visible and {} hidden sections ({} edges) in {}",
        summary.visible,
        summary.hidden,
        summary.edges,
        summary.output_dir.display()
    );
    Ok(())
}
