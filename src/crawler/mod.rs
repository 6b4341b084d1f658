//! Dependency crawling.
//!
//! Starting from the top-level selection, the crawler walks the registry's
//! package relation depth-first. Every package is discovered at most once:
//! its file inventory and description are fetched on first discovery only,
//! while every edge leading to it is still recorded.

pub mod errors;
pub mod manifest;

pub use errors::CrawlError;
pub use manifest::{Layout, ManifestBuilder};

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use crate::core::{
    nsis, DependencyEdge, EdgeRelation, FilterRules, Package, PackageName, Registry, Visibility,
};

/// Walks the registry from a set of top-level packages.
pub struct Crawler<'a, R: Registry + ?Sized> {
    registry: &'a mut R,
    rules: &'a FilterRules,
    layout: &'a Layout,
    relation: EdgeRelation,
}

/// Pending relations of a package on the traversal stack.
struct Frame {
    name: PackageName,
    related: Vec<PackageName>,
    next: usize,
}

impl<'a, R: Registry + ?Sized> Crawler<'a, R> {
    pub fn new(registry: &'a mut R, rules: &'a FilterRules, layout: &'a Layout) -> Self {
        Crawler {
            registry,
            rules,
            layout,
            relation: EdgeRelation::default(),
        }
    }

    /// Choose which registry relation to follow.
    pub fn with_relation(mut self, relation: EdgeRelation) -> Self {
        self.relation = relation;
        self
    }

    /// Crawl the closure of `top_level`.
    ///
    /// Top-level packages are visited in name order; related packages in
    /// the order the registry reports them. A package's subtree is fully
    /// explored before the next related package of its parent is looked at.
    pub fn crawl(mut self, top_level: &BTreeSet<PackageName>) -> Result<CrawlResult, CrawlError> {
        tracing::info!(
            "Crawling {} top-level packages via `{}`",
            top_level.len(),
            self.registry.source_name()
        );

        let mut result = CrawlResult::new(top_level.clone());
        let mut stack: Vec<Frame> = Vec::new();

        for root in top_level {
            if result.contains(root) {
                continue;
            }
            let frame = self.discover(root, &mut result)?;
            stack.push(frame);

            loop {
                let Some(frame) = stack.last_mut() else {
                    break;
                };
                let Some(dep) = frame.related.get(frame.next).cloned() else {
                    stack.pop();
                    continue;
                };
                frame.next += 1;
                let dependent = frame.name.clone();

                let visibility = Visibility::classify(top_level.contains(&dep));
                tracing::debug!("edge {} -> {} ({})", dependent, dep, visibility);
                result.edges.push(DependencyEdge {
                    dependent,
                    dependency: dep.clone(),
                    visibility,
                });

                if !result.contains(&dep) {
                    let frame = self.discover(&dep, &mut result)?;
                    stack.push(frame);
                }
            }
        }

        tracing::info!(
            "Discovered {} packages ({} visible, {} hidden), {} edges",
            result.len(),
            result.visible_packages().count(),
            result.hidden_packages().count(),
            result.edges.len()
        );

        Ok(result)
    }

    /// First discovery of a package: classify, build its manifest, fetch
    /// its description, then query its relations.
    fn discover(
        &mut self,
        name: &PackageName,
        result: &mut CrawlResult,
    ) -> Result<Frame, CrawlError> {
        // Every artifact is keyed by the identifier, so it must be unique
        let ident = nsis::ident(name);
        if let Some(first) = result.idents.get(&ident) {
            return Err(CrawlError::IdentifierCollision {
                ident,
                first: first.to_string(),
                second: name.to_string(),
            });
        }

        let visibility = Visibility::classify(result.top_level.contains(name));

        let inventory = self
            .registry
            .files(name)
            .map_err(|e| CrawlError::registry(name, e))?;
        let manifest = ManifestBuilder::new(self.rules, self.layout).build(name, &inventory)?;

        let description = if visibility.is_visible() {
            Some(
                self.registry
                    .description(name)
                    .map_err(|e| CrawlError::registry(name, e))?,
            )
        } else {
            None
        };

        tracing::debug!(
            "discovered {} ({}, {} files)",
            name,
            visibility,
            manifest.file_count()
        );
        result.insert(Package::new(name.clone(), visibility, description, manifest));

        let related = self
            .registry
            .related(name, self.relation)
            .map_err(|e| CrawlError::registry(name, e))?;

        Ok(Frame {
            name: name.clone(),
            related,
            next: 0,
        })
    }
}

/// Everything the crawler found, in discovery order.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    top_level: BTreeSet<PackageName>,
    packages: Vec<Package>,
    index: HashMap<PackageName, usize>,
    idents: HashMap<String, PackageName>,
    edges: Vec<DependencyEdge>,
}

impl CrawlResult {
    fn new(top_level: BTreeSet<PackageName>) -> Self {
        CrawlResult {
            top_level,
            packages: Vec::new(),
            index: HashMap::new(),
            idents: HashMap::new(),
            edges: Vec::new(),
        }
    }

    fn insert(&mut self, package: Package) {
        self.idents
            .insert(nsis::ident(package.name()), package.name().clone());
        self.index
            .insert(package.name().clone(), self.packages.len());
        self.packages.push(package);
    }

    pub fn top_level(&self) -> &BTreeSet<PackageName> {
        &self.top_level
    }

    pub fn contains(&self, name: &PackageName) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Discovered packages in discovery order.
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn package(&self, name: &PackageName) -> Option<&Package> {
        self.index.get(name).map(|&i| &self.packages[i])
    }

    pub fn package_mut(&mut self, name: &PackageName) -> Option<&mut Package> {
        self.index.get(name).map(|&i| &mut self.packages[i])
    }

    pub fn visible_packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter().filter(|p| p.visibility().is_visible())
    }

    pub fn hidden_packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter().filter(|p| !p.visibility().is_visible())
    }

    /// All edges in the order they were encountered.
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Edges whose dependency side has the given visibility.
    pub fn edges_with(&self, visibility: Visibility) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.iter().filter(move |e| e.visibility == visibility)
    }

    /// Edges leaving `name`, in registry order.
    pub fn edges_from<'b>(
        &'b self,
        name: &'b PackageName,
    ) -> impl Iterator<Item = &'b DependencyEdge> + 'b {
        self.edges.iter().filter(move |e| &e.dependent == name)
    }

    /// The crawled relation as a directed graph.
    pub fn graph(&self) -> DiGraph<PackageName, Visibility> {
        let mut graph = DiGraph::new();
        let mut nodes: HashMap<&PackageName, NodeIndex> = HashMap::new();

        for package in &self.packages {
            let idx = graph.add_node(package.name().clone());
            nodes.insert(package.name(), idx);
        }
        for edge in &self.edges {
            if let (Some(&from), Some(&to)) =
                (nodes.get(&edge.dependent), nodes.get(&edge.dependency))
            {
                graph.add_edge(from, to, edge.visibility);
            }
        }

        graph
    }

    /// Groups of packages that reach each other through the crawled relation.
    pub fn cycles(&self) -> Vec<Vec<PackageName>> {
        let graph = self.graph();
        let self_loops: HashSet<NodeIndex> = graph
            .edge_indices()
            .filter_map(|e| graph.edge_endpoints(e))
            .filter(|(a, b)| a == b)
            .map(|(a, _)| a)
            .collect();

        let mut cycles: Vec<Vec<PackageName>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self_loops.contains(&scc[0]))
            .map(|scc| {
                let mut names: Vec<_> = scc.into_iter().map(|i| graph[i].clone()).collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Serializable overview of the crawl.
    pub fn report(&self) -> CrawlReport {
        CrawlReport {
            top_level: self.top_level.iter().cloned().collect(),
            packages: self
                .packages
                .iter()
                .map(|p| PackageReport {
                    name: p.name().clone(),
                    visibility: p.visibility(),
                    files: p.manifest().file_count(),
                })
                .collect(),
            edges: self.edges.clone(),
            cycles: self.cycles(),
        }
    }
}

/// Machine-readable crawl summary, written as `crawl-report.json`.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub top_level: Vec<PackageName>,
    pub packages: Vec<PackageReport>,
    pub edges: Vec<DependencyEdge>,
    pub cycles: Vec<Vec<PackageName>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    pub name: PackageName,
    pub visibility: Visibility,
    pub files: usize,
}
