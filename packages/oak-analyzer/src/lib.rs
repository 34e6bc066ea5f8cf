/*
 * Oak Analyzer - incremental static analysis for Oak projects
 *
 * Feature-First Architecture:
 * - shared/    : Common models (Range, Diagnostic) and utilities
 * - features/  : Vertical slices (parsing → workspace → cross_file → definitions
 *                → consistency → program_index; domain_model; components)
 * - usecases/  : AnalysisSession, the editor-facing entry point
 * - config/    : YAML configuration (layout, check severities, limits)
 *
 * Model:
 * - One shared Workspace parses every file once
 * - Trigger/checker indexes patch one file per edit, full rebuild every N edits
 * - Rayon for per-entity / per-component parallel parsing
 */

/// Shared models and utilities
pub mod shared;

/// Feature modules
pub mod features;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

/// Usecase layer (AnalysisSession)
pub mod usecases;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{AnalyzerConfig, CheckSeverities, IndexLimits, ProjectLayout, SeverityLevel};
pub use errors::{AnalyzerError, DomainError, Result};
pub use features::components::{ComponentDescriptor, ComponentMap};
pub use features::definitions::{Checker, DefinitionObject, Trigger};
pub use features::domain_model::{DomainExtractor, EntityDescriptor, EntityDict, PathResolution};
pub use features::file_events::{FileChangeEvent, FileEventHandler};
pub use features::program_index::{CheckerIndex, ProgramIndex, TriggerIndex, UpdateOutcome};
pub use features::pubsub::{InvalidationBus, SubscriptionId};
pub use shared::models::{Diagnostic, DiagnosticsMap, IssueCode, Range, Severity};
pub use usecases::AnalysisSession;
