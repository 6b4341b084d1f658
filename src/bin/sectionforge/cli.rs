//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// sectionforge - NSIS installer sections from installed-package metadata
#[derive(Parser)]
#[command(name = "sectionforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to the configuration file
    #[arg(long, global = true, env = "SECTIONFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl the registry and write installer artifacts
    Generate(GenerateArgs),

    /// Print the top-level package selection
    Select(SelectArgs),

    /// Display the crawled dependency tree
    Tree(TreeArgs),

    /// Capture the registry into a JSON snapshot
    Snapshot(SnapshotArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Registry override shared by commands that read the registry.
#[derive(Args, Clone)]
pub struct RegistryArgs {
    /// Read the registry from a snapshot instead of pacman
    #[arg(long, value_name = "PATH")]
    pub registry_snapshot: Option<PathBuf>,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Output directory (overrides `layout.output_dir`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub registry: RegistryArgs,
}

#[derive(Args)]
pub struct SelectArgs {
    #[command(flatten)]
    pub registry: RegistryArgs,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Maximum depth to display
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Expand packages every time they are reached
    #[arg(long)]
    pub duplicates: bool,

    #[command(flatten)]
    pub registry: RegistryArgs,
}

#[derive(Args)]
pub struct SnapshotArgs {
    /// File to write the snapshot to
    #[arg(short, long, default_value = "registry.json")]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}
