//! sectionforge CLI - installer sections from installed-package metadata

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sectionforge::crawler::CrawlError;
use sectionforge::ops::{AugmentError, SelectError};
use sectionforge::util::diagnostic::{emit, suggestions, Diagnostic};

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();
    let verbose = cli.verbose;

    if let Err(e) = run(cli, color) {
        report(&e, color, verbose);
        std::process::exit(1);
    }
}

fn run(cli: Cli, color: bool) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("sectionforge=debug")
    } else {
        EnvFilter::new("sectionforge=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global = commands::GlobalArgs {
        config: cli.config,
        color,
    };

    match cli.command {
        Commands::Generate(args) => commands::generate::execute(args, &global),
        Commands::Select(args) => commands::select::execute(args, &global),
        Commands::Tree(args) => commands::tree::execute(args, &global),
        Commands::Snapshot(args) => commands::snapshot::execute(args, &global),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Print an error, as a diagnostic when its type has one.
fn report(err: &anyhow::Error, color: bool, verbose: bool) {
    let (diagnostic, crawl_failed) = if let Some(e) = err.downcast_ref::<SelectError>() {
        (e.to_diagnostic(), false)
    } else if let Some(e) = err.downcast_ref::<CrawlError>() {
        (e.to_diagnostic(), true)
    } else if let Some(e) = err.downcast_ref::<AugmentError>() {
        (e.to_diagnostic(), true)
    } else {
        (Diagnostic::error(format!("{:#}", err)), false)
    };

    emit(&diagnostic, color);
    if crawl_failed && !verbose {
        eprintln!("{}", suggestions::RUN_FAILED);
    }
}
