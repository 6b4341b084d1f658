//! `sectionforge completions` command

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::{Cli, CompletionsArgs};
use sectionforge::util::fs::write_string;

const BIN_NAME: &str = "sectionforge";

pub fn execute(args: CompletionsArgs) -> Result<()> {
    let script = render(args.shell)?;

    match args.output {
        Some(path) => {
            write_string(&path, &script)?;
            tracing::info!("Wrote {} completions to {}", args.shell, path.display());
        }
        None => io::stdout()
            .lock()
            .write_all(script.as_bytes())
            .context("failed to write completions to stdout")?,
    }

    Ok(())
}

fn render(shell: Shell) -> Result<String> {
    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut Cli::command(), BIN_NAME, &mut buf);
    String::from_utf8(buf).context("completion script is not valid UTF-8")
}
