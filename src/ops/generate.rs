//! Implementation of `sectionforge generate`.
//!
//! The pipeline runs in four phases:
//! 1. select the top-level packages
//! 2. crawl the registry from them
//! 3. augment the resulting manifests
//! 4. render and write every artifact
//!
//! Nothing touches the output directory until phase 4, and phase 4 writes
//! into a staging directory that only replaces the output once complete.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::nsis;
use crate::core::{PackageName, Registry, Visibility};
use crate::crawler::{CrawlResult, Crawler};
use crate::ops::augment::{augment, DllScanner};
use crate::ops::select::select_top_level;
use crate::util::config::Config;
use crate::util::fs::{write_string, StagingDir};

/// File marking a directory as sectionforge output.
pub const OUTPUT_MARKER: &str = ".sectionforge";

pub const SECTIONS_VISIBLE: &str = "sections-visible.nsh";
pub const SECTIONS_HIDDEN: &str = "sections-hidden.nsh";
pub const DEPS_VISIBLE: &str = "deps-visible.txt";
pub const DEPS_HIDDEN: &str = "deps-hidden.txt";
pub const DESCRIPTIONS: &str = "descriptions.nsh";
pub const DESCRIPTION_BINDINGS: &str = "description-bindings.nsh";
pub const CRAWL_REPORT: &str = "crawl-report.json";

/// Options for the generate command.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Directory receiving the artifacts
    pub output_dir: PathBuf,
}

impl GenerateOptions {
    pub fn from_config(config: &Config) -> Self {
        GenerateOptions {
            output_dir: config.layout.output_dir.clone(),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct GenerateSummary {
    pub output_dir: PathBuf,
    pub visible: usize,
    pub hidden: usize,
    pub edges: usize,
    pub augmented: usize,
}

/// Rendered artifacts, keyed by path relative to the output directory.
#[derive(Debug, Clone, Default)]
pub struct Artifacts {
    files: BTreeMap<String, String>,
}

impl Artifacts {
    /// Render every artifact for a crawl result.
    pub fn render(result: &CrawlResult) -> Result<Self> {
        let mut files = BTreeMap::new();

        let mut sections_visible = String::new();
        let mut sections_hidden = String::new();
        let mut descriptions = String::new();
        let mut bindings = String::new();

        for package in result.packages() {
            let name = package.name();
            files.insert(
                nsis::manifest_file(name),
                nsis::render_manifest(package.manifest()),
            );

            let section = nsis::render_section(name, package.visibility());
            match package.visibility() {
                Visibility::Visible => {
                    sections_visible.push_str(&section);
                    let description = package.description().unwrap_or_default();
                    descriptions.push_str(&nsis::render_description(name, description));
                    bindings.push_str(&nsis::render_description_binding(name));
                }
                Visibility::Hidden => sections_hidden.push_str(&section),
            }
        }

        let render_edges = |visibility| {
            result
                .edges_with(visibility)
                .map(nsis::render_edge)
                .collect::<String>()
        };

        files.insert(SECTIONS_VISIBLE.to_string(), sections_visible);
        files.insert(SECTIONS_HIDDEN.to_string(), sections_hidden);
        files.insert(DEPS_VISIBLE.to_string(), render_edges(Visibility::Visible));
        files.insert(DEPS_HIDDEN.to_string(), render_edges(Visibility::Hidden));
        files.insert(DESCRIPTIONS.to_string(), descriptions);
        files.insert(DESCRIPTION_BINDINGS.to_string(), bindings);

        let report = serde_json::to_string_pretty(&result.report())
            .context("failed to serialize crawl report")?;
        files.insert(CRAWL_REPORT.to_string(), report + "\n");

        Ok(Artifacts { files })
    }

    /// Contents of one artifact.
    pub fn get(&self, relative: &str) -> Option<&str> {
        self.files.get(relative).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write all artifacts, replacing `output_dir`.
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf> {
        check_output_dir(output_dir)?;

        let staging = StagingDir::new(output_dir)?;
        write_string(&staging.path().join(OUTPUT_MARKER), "")?;
        for (relative, contents) in &self.files {
            write_string(&staging.path().join(relative), contents)?;
        }
        let written = staging.commit()?;

        tracing::info!("Wrote {} artifacts to {}", self.files.len(), written.display());
        Ok(written)
    }
}

/// Refuse to replace a directory sectionforge did not create.
fn check_output_dir(output_dir: &Path) -> Result<()> {
    if !output_dir.exists() {
        return Ok(());
    }
    if !output_dir.is_dir() {
        bail!("output path {} is not a directory", output_dir.display());
    }
    if output_dir.join(OUTPUT_MARKER).exists() {
        return Ok(());
    }
    let mut entries = std::fs::read_dir(output_dir)
        .with_context(|| format!("failed to read {}", output_dir.display()))?;
    if entries.next().is_some() {
        bail!(
            "refusing to replace {}: it is not empty and was not created by sectionforge",
            output_dir.display()
        );
    }
    Ok(())
}

/// Select the top-level packages from the registry's explicit list.
pub fn select<R: Registry + ?Sized>(
    config: &Config,
    registry: &mut R,
) -> Result<BTreeSet<PackageName>> {
    let installed = registry
        .explicit_packages()
        .context("failed to list explicitly installed packages")?;
    tracing::debug!("{} explicitly installed packages", installed.len());

    Ok(select_top_level(
        &installed,
        &config.selection.allow,
        &config.selection.deny,
    )?)
}

/// Select and crawl, without augmenting or writing anything.
pub fn crawl<R: Registry + ?Sized>(config: &Config, registry: &mut R) -> Result<CrawlResult> {
    let top_level = select(config, registry)?;
    let rules = config.filter_rules()?;
    let layout = config.layout();

    let result = Crawler::new(registry, &rules, &layout)
        .with_relation(config.registry.relation)
        .crawl(&top_level)?;

    for cycle in result.cycles() {
        let names: Vec<_> = cycle.iter().map(|n| n.as_str()).collect();
        tracing::debug!("cycle: {}", names.join(" -> "));
    }
    Ok(result)
}

/// Run the full pipeline.
pub fn generate<R, S>(
    config: &Config,
    registry: &mut R,
    scanner: &mut S,
    opts: &GenerateOptions,
) -> Result<GenerateSummary>
where
    R: Registry + ?Sized,
    S: DllScanner + ?Sized,
{
    let mut result = crawl(config, registry)?;

    let plan = config.augment_plan()?;
    let augmented = if plan.is_empty() {
        0
    } else {
        augment(&mut result, &config.layout(), registry, scanner, &plan)?
    };

    let artifacts = Artifacts::render(&result)?;
    let output_dir = artifacts.write(&opts.output_dir)?;

    Ok(GenerateSummary {
        output_dir,
        visible: result.visible_packages().count(),
        hidden: result.hidden_packages().count(),
        edges: result.edges().len(),
        augmented,
    })
}
