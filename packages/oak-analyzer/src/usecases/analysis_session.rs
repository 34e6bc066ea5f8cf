//! AnalysisSession - one analyzed Oak project
//!
//! Owns every piece of state for one project root: the shared workspace,
//! the trigger and checker indexes, the entity store, the component map and
//! the invalidation buses. Nothing is process-wide, so independent sessions
//! (multi-root workspaces, parallel tests) never see each other.
//!
//! ```text
//!   FileChangeEvent ──▶ handle_event ──┬─▶ domain dir      ─▶ DomainExtractor ─▶ entities
//!                                      ├─▶ component dirs  ─▶ ComponentMap    ─▶ components
//!                                      └─▶ program files   ─▶ TriggerIndex / CheckerIndex
//!                                                               │
//!                                      path -> diagnostics ◀────┘
//! ```

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{AnalyzerConfig, Validatable};
use crate::errors::{AnalyzerError, DomainError, Result};
use crate::features::components::{is_entry_file, validate_components, ComponentMap};
use crate::features::definitions::{Checker, DefinitionKind, Trigger};
use crate::features::domain_model::{
    resolve_projection_path, DomainExtractor, EntityDescriptor, EntityDict, PathResolution,
};
use crate::features::file_events::{FileChangeEvent, FileEventHandler};
use crate::features::program_index::{
    CheckerIndex, IndexState, IndexStats, ProgramIndex, TriggerIndex, UpdateOutcome,
};
use crate::features::pubsub::{InvalidationBus, NotifyingStore};
use crate::features::worker::DomainWorker;
use crate::features::workspace::Workspace;
use crate::shared::models::DiagnosticsMap;
use crate::shared::utils::{normalize_path, path_starts_with};

/// Invalidation topics of a session
#[derive(Debug, Clone)]
pub struct SessionBuses {
    pub entities: Arc<InvalidationBus>,
    pub triggers: Arc<InvalidationBus>,
    pub checkers: Arc<InvalidationBus>,
    pub components: Arc<InvalidationBus>,
}

impl SessionBuses {
    fn new(config: &AnalyzerConfig) -> Self {
        let window = config.limits.debounce();
        Self {
            entities: Arc::new(InvalidationBus::new("entities", window)),
            triggers: Arc::new(InvalidationBus::new(Trigger::TOPIC, window)),
            checkers: Arc::new(InvalidationBus::new(Checker::TOPIC, window)),
            components: Arc::new(InvalidationBus::new("components", window)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub entity_count: usize,
    pub component_count: usize,
    pub triggers: IndexStats,
    pub checkers: IndexStats,
    pub domain_error: Option<DomainError>,
}

pub struct AnalysisSession {
    root: PathBuf,
    config: AnalyzerConfig,
    workspace: Arc<Workspace>,
    buses: SessionBuses,

    extractor: Arc<DomainExtractor>,
    worker: Option<DomainWorker>,
    entities: NotifyingStore<EntityDescriptor>,
    domain_error: Option<DomainError>,

    components: ComponentMap,
    triggers: TriggerIndex,
    checkers: CheckerIndex,
}

impl AnalysisSession {
    pub fn new(root: impl AsRef<Path>, config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        let root = normalize_path(root);
        let workspace = Arc::new(Workspace::new());
        let buses = SessionBuses::new(&config);
        let layout = &config.layout;

        let triggers = ProgramIndex::new(
            &layout.triggers_entry(&root),
            Arc::clone(&workspace),
            Arc::clone(&buses.triggers),
            config.limits.trigger_max_edits,
        );
        let checkers = ProgramIndex::new(
            &layout.checkers_entry(&root),
            Arc::clone(&workspace),
            Arc::clone(&buses.checkers),
            config.limits.checker_max_edits,
        );

        Ok(Self {
            extractor: Arc::new(DomainExtractor::new(layout.clone())),
            entities: NotifyingStore::new(Arc::clone(&buses.entities)),
            root,
            workspace,
            buses,
            worker: None,
            domain_error: None,
            components: ComponentMap::new(),
            triggers,
            checkers,
            config,
        })
    }

    /// Run domain scans on a supervised background thread from now on
    pub fn enable_background_domain_scan(&mut self) -> Result<()> {
        if self.worker.is_none() {
            self.worker = Some(DomainWorker::spawn(Arc::clone(&self.extractor))?);
        }
        Ok(())
    }

    /// Domain scan, component scan and both index initializations.
    ///
    /// Failures stay local: a missing registry leaves the entity store
    /// empty, a missing entry file leaves its index uninitialized.
    pub fn initialize(&mut self) -> DiagnosticsMap {
        if let Err(err) = self.refresh_domain() {
            tracing::warn!("domain scan failed: {}", err);
        }

        self.components = ComponentMap::scan(&self.config.layout.component_dirs(&self.root));
        self.buses.components.notify();

        let mut diagnostics = self.component_diagnostics();
        merge(&mut diagnostics, self.init_index::<TriggerSlot>());
        merge(&mut diagnostics, self.init_index::<CheckerSlot>());
        tracing::info!(
            "session {} initialized: {} entities, {} components, {} triggers, {} checkers",
            self.root.display(),
            self.entities.len(),
            self.components.len(),
            self.triggers.definitions().len(),
            self.checkers.definitions().len()
        );
        diagnostics
    }

    /// Re-scan the domain and replace the entity store
    pub fn refresh_domain(&mut self) -> Result<usize> {
        let scanned = match &self.worker {
            Some(worker) => worker.scan(&self.root)?,
            None => self.extractor.analyze(&self.root),
        };
        match scanned {
            Ok(dict) => {
                let count = dict.len();
                self.entities.replace_all(dict);
                self.domain_error = None;
                Ok(count)
            }
            Err(err) => {
                self.domain_error = Some(err.clone());
                Err(AnalyzerError::Domain(err))
            }
        }
    }

    /// Apply one file change and return the diagnostics it affects
    pub fn handle_event(&mut self, event: &FileChangeEvent) -> Result<DiagnosticsMap> {
        let mut diagnostics = DiagnosticsMap::new();
        if !event.is_relevant() {
            return Ok(diagnostics);
        }
        let path = normalize_path(event.path());
        let deleted = event.is_deletion();
        tracing::debug!("{} {}", event.event_type(), path.display());

        let layout = &self.config.layout;
        if path_starts_with(&path, &layout.domain_dir(&self.root)) {
            if let Err(err) = self.refresh_domain() {
                tracing::warn!("domain rescan after {} failed: {}", path.display(), err);
            }
            return Ok(self.component_diagnostics());
        }

        let in_components = layout
            .component_dirs(&self.root)
            .iter()
            .any(|dir| path_starts_with(&path, dir));
        if in_components {
            merge(&mut diagnostics, self.update_components(&path, deleted));
        }

        let mut routed = in_components;
        if self.routes_to(&self.triggers, &path) {
            routed = true;
            merge(&mut diagnostics, self.update_index::<TriggerSlot>(&path, deleted)?);
        }
        if self.routes_to(&self.checkers, &path) {
            routed = true;
            merge(&mut diagnostics, self.update_index::<CheckerSlot>(&path, deleted)?);
        }
        if !routed {
            self.workspace.evict(&path);
        }
        Ok(diagnostics)
    }

    /// Diagnostics for everything the session knows about
    pub fn check_all(&self) -> DiagnosticsMap {
        let mut diagnostics = self.component_diagnostics();
        let severities = &self.config.checks;
        for checked in [
            self.triggers.check_all_definitions(severities),
            self.checkers.check_all_definitions(severities),
        ] {
            match checked {
                Ok(map) => merge(&mut diagnostics, map),
                Err(err) => tracing::debug!("{}", err),
            }
        }
        diagnostics
    }

    pub fn resolve_projection_path(&self, entity: &str, path: &str) -> PathResolution {
        resolve_projection_path(&self.entities.snapshot(), entity, path)
    }

    pub fn entity(&self, name: &str) -> Option<EntityDescriptor> {
        self.entities.read(name)
    }

    pub fn entities(&self) -> EntityDict {
        self.entities.snapshot()
    }

    pub fn components(&self) -> &ComponentMap {
        &self.components
    }

    pub fn triggers(&self) -> &TriggerIndex {
        &self.triggers
    }

    pub fn checkers(&self) -> &CheckerIndex {
        &self.checkers
    }

    pub fn buses(&self) -> &SessionBuses {
        &self.buses
    }

    pub fn workspace(&self) -> &Arc<Workspace> {
        &self.workspace
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn domain_error(&self) -> Option<&DomainError> {
        self.domain_error.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            entity_count: self.entities.len(),
            component_count: self.components.len(),
            triggers: self.triggers.stats(),
            checkers: self.checkers.stats(),
            domain_error: self.domain_error.clone(),
        }
    }

    fn component_diagnostics(&self) -> DiagnosticsMap {
        validate_components(&self.components, &self.entities.snapshot(), &self.config.checks)
    }

    fn update_components(&mut self, path: &Path, deleted: bool) -> DiagnosticsMap {
        // Entry files that may lose their component; their diagnostics get cleared
        let mut touched: BTreeSet<PathBuf> = self
            .components
            .all()
            .filter(|c| path_starts_with(&c.entry_file, path) || c.entry_file == path)
            .map(|c| c.entry_file.clone())
            .collect();
        if is_entry_file(path) {
            touched.insert(path.to_path_buf());
        }

        let changed = if deleted {
            self.components.remove_file(path)
        } else {
            self.components.rescan_file(path)
        };
        if changed {
            self.buses.components.notify();
        }

        let all = self.component_diagnostics();
        touched
            .into_iter()
            .map(|file| {
                let diagnostics = all.get(&file).cloned().unwrap_or_default();
                (file, diagnostics)
            })
            .collect()
    }

    fn routes_to<K: DefinitionKind>(&self, index: &ProgramIndex<K>, path: &Path) -> bool {
        if index.owns(path) {
            return true;
        }
        index
            .entry()
            .parent()
            .is_some_and(|dir| path_starts_with(path, dir))
    }

    fn init_index<S: IndexSelector>(&mut self) -> DiagnosticsMap {
        let severities = self.config.checks.clone();
        let index = S::index(self);
        if let Err(err) = index.init_program() {
            tracing::warn!("{}", err);
            return DiagnosticsMap::new();
        }
        index.check_all_definitions(&severities).unwrap_or_default()
    }

    fn update_index<S: IndexSelector>(
        &mut self,
        path: &Path,
        deleted: bool,
    ) -> Result<DiagnosticsMap> {
        let severities = self.config.checks.clone();
        let index = S::index(self);

        if index.state() == IndexState::Uninitialized {
            // The entry file may just have appeared
            return Ok(match index.init_program() {
                Ok(_) => index.check_all_definitions(&severities)?,
                Err(err) => {
                    tracing::debug!("{}", err);
                    DiagnosticsMap::new()
                }
            });
        }

        let before = definition_paths(index);
        let outcome = if deleted {
            index.remove_path(path)
        } else {
            index.update_by_path(path)
        };

        let mut diagnostics = match outcome {
            Ok(UpdateOutcome::Patched { .. }) => {
                let mut diagnostics = index.check_by_path(path, &severities)?;
                // Files first reached by the scoped re-run
                for reached in definition_paths(index).difference(&before) {
                    merge(&mut diagnostics, index.check_by_path(reached, &severities)?);
                }
                diagnostics
            }
            Ok(UpdateOutcome::Rebuilt(reason)) => {
                tracing::debug!("{} rebuilt: {:?}", index.entry().display(), reason);
                index.check_all_definitions(&severities)?
            }
            Err(err @ AnalyzerError::Entry { .. }) => {
                tracing::warn!("{}", err);
                DiagnosticsMap::new()
            }
            Err(err) => return Err(err),
        };
        let after = definition_paths(index);
        for gone in before.difference(&after) {
            diagnostics.entry(gone.clone()).or_default();
        }
        diagnostics.entry(path.to_path_buf()).or_default();
        Ok(diagnostics)
    }
}

impl FileEventHandler for AnalysisSession {
    fn handle_event(&mut self, event: FileChangeEvent) -> Result<DiagnosticsMap> {
        AnalysisSession::handle_event(self, &event)
    }
}

impl std::fmt::Debug for AnalysisSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisSession")
            .field("root", &self.root)
            .field("triggers", &self.triggers)
            .field("checkers", &self.checkers)
            .field("entities", &self.entities.len())
            .field("components", &self.components.len())
            .finish()
    }
}

/// Picks one of the session's two program indexes
trait IndexSelector {
    type Kind: DefinitionKind;
    fn index(session: &mut AnalysisSession) -> &mut ProgramIndex<Self::Kind>;
}

struct TriggerSlot;
struct CheckerSlot;

impl IndexSelector for TriggerSlot {
    type Kind = Trigger;
    fn index(session: &mut AnalysisSession) -> &mut TriggerIndex {
        &mut session.triggers
    }
}

impl IndexSelector for CheckerSlot {
    type Kind = Checker;
    fn index(session: &mut AnalysisSession) -> &mut CheckerIndex {
        &mut session.checkers
    }
}

fn definition_paths<K: DefinitionKind>(index: &ProgramIndex<K>) -> BTreeSet<PathBuf> {
    index.definitions().iter().map(|d| d.path.clone()).collect()
}

/// Append `from` into `into`, concatenating lists of shared paths
fn merge(into: &mut DiagnosticsMap, from: DiagnosticsMap) {
    for (path, diagnostics) in from {
        into.entry(path).or_default().extend(diagnostics);
    }
}
