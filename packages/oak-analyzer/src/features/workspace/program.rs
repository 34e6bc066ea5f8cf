//! Program - the files reachable from one entry file
//!
//! A program is a named root plus the import graph discovered while its
//! definitions were aggregated. Units themselves live in the shared
//! [`Workspace`]; a program only records which of them it reached and through
//! which import edges.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef, NodeFiltered, Walker};
use petgraph::Direction;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::Workspace;
use crate::errors::{AnalyzerError, Result};
use crate::features::parsing::SourceUnit;
use crate::shared::utils::normalize_path;

#[derive(Debug, Clone)]
pub struct Program {
    name: String,
    entry: PathBuf,
    workspace: Arc<Workspace>,
    graph: DiGraph<PathBuf, ()>,
    nodes: FxHashMap<PathBuf, NodeIndex>,
    generation: u64,
}

impl Program {
    /// Create a program rooted at `entry`.
    ///
    /// Fails when the entry file is missing or does not parse cleanly; that is
    /// the one condition under which a whole index stays uninitialized.
    pub fn create(
        name: impl Into<String>,
        entry: &Path,
        workspace: Arc<Workspace>,
    ) -> Result<Self> {
        let name = name.into();
        let entry = normalize_path(entry);
        let unit = workspace.load(&entry).map_err(|err| AnalyzerError::Entry {
            index: name.clone(),
            path: entry.clone(),
            reason: err.to_string(),
        })?;
        if unit.has_errors() {
            return Err(AnalyzerError::Entry {
                index: name,
                path: entry,
                reason: "syntax errors".to_string(),
            });
        }

        let mut program = Self {
            name,
            entry: entry.clone(),
            workspace,
            graph: DiGraph::new(),
            nodes: FxHashMap::default(),
            generation: 0,
        };
        program.node_for(&entry);
        Ok(program)
    }

    /// Derive the next program after one file changed.
    ///
    /// The import graph is carried over minus the changed file's own import
    /// edges, which the scoped re-run records again. The workspace entry for
    /// the changed path is replaced by `unit`; every other path keeps
    /// resolving to the unit the previous program saw.
    pub fn patched(&self, unit: SourceUnit) -> (Self, Arc<SourceUnit>) {
        let unit = self.workspace.insert(unit);
        let mut next = self.clone();
        next.generation += 1;
        let ix = next.node_for(unit.path());
        let mut outgoing: Vec<_> = next
            .graph
            .edges_directed(ix, Direction::Outgoing)
            .map(|edge| edge.id())
            .collect();
        // Removal moves the last edge into the freed slot; highest ids go first
        outgoing.sort_unstable_by(|a, b| b.cmp(a));
        for edge in outgoing {
            next.graph.remove_edge(edge);
        }
        (next, unit)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> &Path {
        &self.entry
    }

    pub fn workspace(&self) -> &Arc<Workspace> {
        &self.workspace
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn entry_unit(&self) -> Result<Arc<SourceUnit>> {
        self.workspace.load(&self.entry)
    }

    /// Load a unit through the shared workspace and record it as reached
    pub fn unit(&mut self, path: &Path) -> Result<Arc<SourceUnit>> {
        let unit = self.workspace.load(path)?;
        self.node_for(unit.path());
        Ok(unit)
    }

    /// Record an import edge `from -> to`
    pub fn record_import(&mut self, from: &Path, to: &Path) {
        let a = self.node_for(&normalize_path(from));
        let b = self.node_for(&normalize_path(to));
        if self.graph.find_edge(a, b).is_none() {
            self.graph.add_edge(a, b, ());
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.nodes.contains_key(&normalize_path(path))
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.graph.node_weights().map(|p| p.as_path())
    }

    pub fn file_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Files reached only through `via`: reachable from it, but not from the
    /// entry once `via` is taken out of the graph. Includes `via` itself.
    pub fn reached_only_through(&self, via: &Path) -> FxHashSet<PathBuf> {
        let via = normalize_path(via);
        let Some(&via_ix) = self.nodes.get(&via) else {
            return FxHashSet::from_iter([via]);
        };
        let from_via: Vec<NodeIndex> = Dfs::new(&self.graph, via_ix).iter(&self.graph).collect();

        let mut still_reached = FxHashSet::default();
        if let Some(&entry_ix) = self.nodes.get(&self.entry) {
            if entry_ix != via_ix {
                let without_via = NodeFiltered::from_fn(&self.graph, |ix| ix != via_ix);
                still_reached.extend(Dfs::new(&without_via, entry_ix).iter(&without_via));
            }
        }

        from_via
            .into_iter()
            .filter(|ix| !still_reached.contains(ix))
            .map(|ix| self.graph[ix].clone())
            .collect()
    }

    /// Groups of files that import each other (strongly connected components
    /// with more than one member, or a file importing itself)
    pub fn import_cycles(&self) -> Vec<Vec<PathBuf>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || (scc.len() == 1 && self.graph.find_edge(scc[0], scc[0]).is_some())
            })
            .map(|scc| scc.into_iter().map(|ix| self.graph[ix].clone()).collect())
            .collect()
    }

    fn node_for(&mut self, path: &Path) -> NodeIndex {
        if let Some(ix) = self.nodes.get(path) {
            return *ix;
        }
        let ix = self.graph.add_node(path.to_path_buf());
        self.nodes.insert(path.to_path_buf(), ix);
        ix
    }
}
