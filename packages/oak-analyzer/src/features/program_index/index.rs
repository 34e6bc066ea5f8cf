//! ProgramIndex - live definition list of one program
//!
//! States: `Uninitialized -> Ready -> (update) Patching -> Ready`, and back
//! through `Uninitialized` on every full rebuild.
//!
//! An update re-parses exactly the changed file, derives the next
//! [`Program`] from the previous one and re-runs the aggregator starting at
//! the export(s) the file was originally entered through. Every
//! `max_edits` updates the index throws the incremental state away and
//! rebuilds from the entry file.

use rustc_hash::FxHashSet;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::CheckSeverities;
use crate::errors::{AnalyzerError, Result};
use crate::features::consistency::check_definition;
use crate::features::cross_file::{BindingRecords, ImportBindingMeta};
use crate::features::definitions::{Aggregator, Checker, DefinitionKind, DefinitionObject, Trigger};
use crate::features::parsing::{Dialect, SourceUnit};
use crate::features::pubsub::InvalidationBus;
use crate::features::workspace::{Program, Workspace};
use crate::shared::models::DiagnosticsMap;
use crate::shared::utils::normalize_path;

pub type TriggerIndex = ProgramIndex<Trigger>;
pub type CheckerIndex = ProgramIndex<Checker>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexState {
    Uninitialized,
    Ready,
    Patching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RebuildReason {
    /// More incremental edits than the configured limit
    ThresholdExceeded,
    /// The changed file was never entered through an import binding
    MissingBindingMeta,
    /// A file of the program disappeared
    FileRemoved,
    /// The changed file only supplies folded field values
    ValueDependency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Patched { removed: usize, added: usize },
    Rebuilt(RebuildReason),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub definition_count: usize,
    pub file_count: usize,
    pub edit_count: usize,
    pub generation: u64,
    pub total_updates: u64,
    pub total_rebuilds: u64,
}

pub struct ProgramIndex<K: DefinitionKind> {
    entry: PathBuf,
    workspace: Arc<Workspace>,
    bus: Arc<InvalidationBus>,
    max_edits: usize,

    state: IndexState,
    program: Option<Program>,
    definitions: Vec<DefinitionObject<K>>,
    bindings: BindingRecords,
    value_bindings: BindingRecords,
    edit_count: usize,

    total_updates: u64,
    total_rebuilds: u64,
}

impl<K: DefinitionKind> ProgramIndex<K> {
    pub fn new(
        entry: &Path,
        workspace: Arc<Workspace>,
        bus: Arc<InvalidationBus>,
        max_edits: usize,
    ) -> Self {
        Self {
            entry: normalize_path(entry),
            workspace,
            bus,
            max_edits,
            state: IndexState::Uninitialized,
            program: None,
            definitions: Vec::new(),
            bindings: BindingRecords::default(),
            value_bindings: BindingRecords::default(),
            edit_count: 0,
            total_updates: 0,
            total_rebuilds: 0,
        }
    }

    /// Discard everything and aggregate the entry file's default export.
    ///
    /// Fails only when the entry file is missing or unparsable; the index
    /// is then left uninitialized.
    pub fn init_program(&mut self) -> Result<usize> {
        self.reset();

        let mut program = Program::create(K::INDEX_NAME, &self.entry, Arc::clone(&self.workspace))?;
        let entry = program.entry_unit()?;
        let mut aggregator = Aggregator::<K>::new(&mut program);
        aggregator.collect_export(entry, ImportBindingMeta::entry());
        let result = aggregator.finish();

        for cycle in program.import_cycles() {
            tracing::debug!("{}: import cycle through {} files", K::INDEX_NAME, cycle.len());
        }
        tracing::info!(
            "{}: {} definitions from {} files",
            K::INDEX_NAME,
            result.definitions.len(),
            program.file_count()
        );

        self.definitions = result.definitions;
        self.bindings = result.bindings;
        self.value_bindings = result.value_bindings;
        self.program = Some(program);
        self.state = IndexState::Ready;
        self.total_rebuilds += 1;
        self.bus.notify();
        Ok(self.definitions.len())
    }

    /// Apply an edit of `path`.
    ///
    /// Callers serialize updates per index.
    pub fn update_by_path(&mut self, path: &Path) -> Result<UpdateOutcome> {
        let path = normalize_path(path);
        self.edit_count += 1;
        self.total_updates += 1;

        if self.program.is_none() {
            tracing::error!(
                "{}: update of {} before initialization",
                K::INDEX_NAME,
                path.display()
            );
            return Err(AnalyzerError::not_initialized(K::INDEX_NAME));
        }
        if self.edit_count > self.max_edits {
            tracing::info!(
                "{}: {} edits since last rebuild, rebuilding",
                K::INDEX_NAME,
                self.max_edits
            );
            self.init_program()?;
            return Ok(UpdateOutcome::Rebuilt(RebuildReason::ThresholdExceeded));
        }

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return self.remove_path(&path),
            Err(source) => return Err(AnalyzerError::Read { path, source }),
        };
        let unit = SourceUnit::parse_text(&path, text, Dialect::from_path(&path))?;

        if self.value_bindings.contains_key(&path) {
            tracing::info!(
                "{}: {} supplies folded values, rebuilding",
                K::INDEX_NAME,
                path.display()
            );
            self.init_program()?;
            return Ok(UpdateOutcome::Rebuilt(RebuildReason::ValueDependency));
        }

        let Some(metas) = self.bindings.get(&path).cloned() else {
            tracing::info!(
                "{}: no import binding recorded for {}, rebuilding",
                K::INDEX_NAME,
                path.display()
            );
            self.init_program()?;
            return Ok(UpdateOutcome::Rebuilt(RebuildReason::MissingBindingMeta));
        };
        let Some(program) = self.program.as_ref() else {
            return Err(AnalyzerError::not_initialized(K::INDEX_NAME));
        };

        self.state = IndexState::Patching;
        // Everything the previous run reached only through this file is
        // re-derived by the scoped run or dropped
        let stale = program.reached_only_through(&path);
        let (mut next, unit) = program.patched(unit);
        let mut aggregator = Aggregator::<K>::new(&mut next);
        for meta in metas {
            aggregator.collect_export(Arc::clone(&unit), meta);
        }
        let result = aggregator.finish();

        let (removed, added) = self.splice(&stale, result.definitions);
        self.merge_bindings(&path, &stale, result.bindings, result.value_bindings);
        self.program = Some(next);
        self.state = IndexState::Ready;
        tracing::debug!(
            "{}: patched {} (-{} +{})",
            K::INDEX_NAME,
            path.display(),
            removed,
            added
        );
        self.bus.notify();
        Ok(UpdateOutcome::Patched { removed, added })
    }

    /// A file was deleted. Rebuilds when the program depended on it.
    pub fn remove_path(&mut self, path: &Path) -> Result<UpdateOutcome> {
        let path = normalize_path(path);
        let Some(program) = self.program.as_ref() else {
            return Err(AnalyzerError::not_initialized(K::INDEX_NAME));
        };
        self.workspace.evict(&path);
        if !program.contains(&path) && !self.tracks(&path) {
            return Ok(UpdateOutcome::Patched { removed: 0, added: 0 });
        }
        self.init_program()?;
        Ok(UpdateOutcome::Rebuilt(RebuildReason::FileRemoved))
    }

    /// Diagnostics for every definition, keyed by path
    pub fn check_all_definitions(&self, severities: &CheckSeverities) -> Result<DiagnosticsMap> {
        self.ensure_ready()?;
        let mut map = DiagnosticsMap::new();
        for definition in &self.definitions {
            map.entry(definition.path.clone())
                .or_default()
                .extend(check_definition(definition, severities));
        }
        Ok(map)
    }

    /// Diagnostics for the definitions declared in `path`. The path is
    /// always present in the result so stale diagnostics get cleared.
    pub fn check_by_path(
        &self,
        path: &Path,
        severities: &CheckSeverities,
    ) -> Result<DiagnosticsMap> {
        self.ensure_ready()?;
        let path = normalize_path(path);
        let diagnostics = self
            .definitions
            .iter()
            .filter(|definition| definition.path == path)
            .flat_map(|definition| check_definition(definition, severities))
            .collect();
        Ok(DiagnosticsMap::from([(path, diagnostics)]))
    }

    pub fn definitions(&self) -> &[DefinitionObject<K>] {
        &self.definitions
    }

    pub fn definitions_for_entity<'a>(
        &'a self,
        entity: &'a str,
    ) -> impl Iterator<Item = &'a DefinitionObject<K>> + 'a {
        self.definitions.iter().filter(move |d| d.entity == entity)
    }

    /// Whether an edit of `path` concerns this index
    pub fn owns(&self, path: &Path) -> bool {
        let path = normalize_path(path);
        self.tracks(&path)
            || self.program.as_ref().is_some_and(|program| program.contains(&path))
    }

    pub fn binding_meta(&self, path: &Path) -> Option<&[ImportBindingMeta]> {
        self.bindings.get(&normalize_path(path)).map(Vec::as_slice)
    }

    /// Bindings of a file entered only to fold field values
    pub fn value_binding_meta(&self, path: &Path) -> Option<&[ImportBindingMeta]> {
        self.value_bindings.get(&normalize_path(path)).map(Vec::as_slice)
    }

    pub fn entry(&self) -> &Path {
        &self.entry
    }

    pub fn state(&self) -> IndexState {
        self.state
    }

    pub fn edit_count(&self) -> usize {
        self.edit_count
    }

    pub fn max_edits(&self) -> usize {
        self.max_edits
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    pub fn bus(&self) -> &Arc<InvalidationBus> {
        &self.bus
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            definition_count: self.definitions.len(),
            file_count: self.program.as_ref().map_or(0, Program::file_count),
            edit_count: self.edit_count,
            generation: self.program.as_ref().map_or(0, Program::generation),
            total_updates: self.total_updates,
            total_rebuilds: self.total_rebuilds,
        }
    }

    fn tracks(&self, path: &Path) -> bool {
        self.bindings.contains_key(path) || self.value_bindings.contains_key(path)
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            IndexState::Uninitialized => Err(AnalyzerError::not_initialized(K::INDEX_NAME)),
            IndexState::Ready | IndexState::Patching => Ok(()),
        }
    }

    fn reset(&mut self) {
        if let Some(previous) = self.program.take() {
            // Files may have changed on disk without an event
            self.workspace.evict_all(previous.files());
        }
        self.workspace.evict(&self.entry);
        self.definitions.clear();
        self.bindings.clear();
        self.value_bindings.clear();
        self.edit_count = 0;
        self.state = IndexState::Uninitialized;
    }

    /// Drop the definitions of the `stale` files and of every file the
    /// scoped re-run produced, then insert `fresh` where the first dropped
    /// one was
    fn splice(
        &mut self,
        stale: &FxHashSet<PathBuf>,
        fresh: Vec<DefinitionObject<K>>,
    ) -> (usize, usize) {
        let mut dropped: FxHashSet<&Path> = stale.iter().map(PathBuf::as_path).collect();
        dropped.extend(fresh.iter().map(|d| d.path.as_path()));

        let position = self
            .definitions
            .iter()
            .position(|d| dropped.contains(d.path.as_path()))
            .unwrap_or(self.definitions.len());
        let before = self.definitions.len();
        self.definitions.retain(|d| !dropped.contains(d.path.as_path()));
        let removed = before - self.definitions.len();

        let added = fresh.len();
        self.definitions.splice(position..position, fresh);
        (removed, added)
    }

    /// Stale files lose the bindings of the previous run; everything else
    /// keeps its bindings and gains the new ones
    fn merge_bindings(
        &mut self,
        changed: &Path,
        stale: &FxHashSet<PathBuf>,
        fresh: BindingRecords,
        fresh_values: BindingRecords,
    ) {
        for path in stale.iter().filter(|p| p.as_path() != changed) {
            self.bindings.remove(path);
            self.value_bindings.remove(path);
        }
        merge_records(&mut self.bindings, fresh);
        merge_records(&mut self.value_bindings, fresh_values);
    }
}

fn merge_records(known: &mut BindingRecords, fresh: BindingRecords) {
    for (path, metas) in fresh {
        let entry = known.entry(path).or_default();
        for meta in metas {
            if !entry.contains(&meta) {
                entry.push(meta);
            }
        }
    }
}

impl<K: DefinitionKind> std::fmt::Debug for ProgramIndex<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramIndex")
            .field("name", &K::INDEX_NAME)
            .field("entry", &self.entry)
            .field("state", &self.state)
            .field("definitions", &self.definitions.len())
            .field("edit_count", &self.edit_count)
            .finish()
    }
}
