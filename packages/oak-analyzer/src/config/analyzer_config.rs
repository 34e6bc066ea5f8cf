//! Analyzer configuration types
//!
//! Three groups, each validated on its own:
//! - [`ProjectLayout`]: where the analyzed Oak project keeps things
//! - [`CheckSeverities`]: severity per consistency rule
//! - [`IndexLimits`]: rebuild thresholds and the notification window

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::error::{ConfigError, ConfigResult};
use super::validation::Validatable;
use crate::shared::models::{IssueCode, Severity};

// ============================================================================
// Project layout
// ============================================================================

/// Locations inside an Oak project, relative to the project root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectLayout {
    /// Generated domain directory holding the schema registry and entities
    pub domain_dir: String,

    /// Schema registry file inside `domain_dir`
    pub registry_file: String,

    /// Name of the registry object exported by the registry file
    pub registry_export: String,

    /// Per-entity schema file, sibling of the entity description
    pub schema_file: String,

    /// Type alias whose first intersection member lists projectable fields
    pub projection_type: String,

    /// Per-entity locale directory, sibling of the entity description
    pub locales_dir: String,

    /// Trigger program entry file
    pub triggers_entry: String,

    /// Checker program entry file
    pub checkers_entry: String,

    /// Directories scanned for component declarations
    pub component_dirs: Vec<String>,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            domain_dir: "src/oak-app-domain".to_string(),
            registry_file: "Storage.ts".to_string(),
            registry_export: "storageSchema".to_string(),
            schema_file: "Schema.ts".to_string(),
            projection_type: "Projection".to_string(),
            locales_dir: "locales".to_string(),
            triggers_entry: "src/triggers/index.ts".to_string(),
            checkers_entry: "src/checkers/index.ts".to_string(),
            component_dirs: vec!["src/components".to_string(), "src/pages".to_string()],
        }
    }
}

impl ProjectLayout {
    pub fn domain_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.domain_dir)
    }

    pub fn registry_path(&self, root: &Path) -> PathBuf {
        self.domain_dir(root).join(&self.registry_file)
    }

    pub fn triggers_entry(&self, root: &Path) -> PathBuf {
        root.join(&self.triggers_entry)
    }

    pub fn checkers_entry(&self, root: &Path) -> PathBuf {
        root.join(&self.checkers_entry)
    }

    pub fn component_dirs(&self, root: &Path) -> Vec<PathBuf> {
        self.component_dirs.iter().map(|dir| root.join(dir)).collect()
    }

    fn relative_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![
            ("domain_dir", self.domain_dir.as_str()),
            ("triggers_entry", self.triggers_entry.as_str()),
            ("checkers_entry", self.checkers_entry.as_str()),
        ];
        fields.extend(self.component_dirs.iter().map(|d| ("component_dirs", d.as_str())));
        fields
    }
}

impl Validatable for ProjectLayout {
    fn validate(&self) -> ConfigResult<()> {
        for (field, value) in self.relative_fields() {
            if Path::new(value).is_absolute() {
                return Err(ConfigError::AbsoluteLayoutPath {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "ProjectLayout"
    }
}

// ============================================================================
// Check severities
// ============================================================================

/// Configured level of one rule; `ignore` suppresses it entirely
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    Ignore,
    Error,
    Warn,
    Info,
}

impl SeverityLevel {
    /// Diagnostic severity, or `None` when the rule is ignored
    pub fn to_severity(self) -> Option<Severity> {
        match self {
            Self::Ignore => None,
            Self::Error => Some(Severity::Error),
            Self::Warn => Some(Severity::Warning),
            Self::Info => Some(Severity::Info),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckSeverities {
    /// Handler is not declared `async`
    pub async_required: SeverityLevel,

    /// Handler returns a bare literal
    pub invalid_return: SeverityLevel,

    /// Bare `return;` where a value is required
    pub missing_return_value: SeverityLevel,

    /// Context call that is neither awaited nor returned
    pub invalid_context_call: SeverityLevel,

    /// Definition without its handler function
    pub missing_handler: SeverityLevel,

    /// Context call result bound without a promise guard
    pub unguarded_promise: SeverityLevel,

    /// Destructuring a context call result
    pub unsupported_destructure: SeverityLevel,

    /// Component bound to an entity the domain does not define
    pub unknown_entity: SeverityLevel,
}

impl Default for CheckSeverities {
    fn default() -> Self {
        Self {
            async_required: SeverityLevel::Error,
            invalid_return: SeverityLevel::Error,
            missing_return_value: SeverityLevel::Warn,
            invalid_context_call: SeverityLevel::Error,
            missing_handler: SeverityLevel::Error,
            unguarded_promise: SeverityLevel::Warn,
            unsupported_destructure: SeverityLevel::Error,
            unknown_entity: SeverityLevel::Warn,
        }
    }
}

impl CheckSeverities {
    /// Configured level of the rule reporting `code`
    pub fn level(&self, code: IssueCode) -> SeverityLevel {
        match code {
            IssueCode::TriggerAsyncRequired => self.async_required,
            IssueCode::TriggerInvalidReturn => self.invalid_return,
            IssueCode::TriggerMissingReturnValue => self.missing_return_value,
            IssueCode::TriggerInvalidContextCall | IssueCode::CheckerInvalidContextCall => {
                self.invalid_context_call
            }
            IssueCode::TriggerMissingHandler => self.missing_handler,
            IssueCode::CheckerUnguardedPromise => self.unguarded_promise,
            IssueCode::CheckerUnsupportedDestructure => self.unsupported_destructure,
            IssueCode::ComponentUnknownEntity => self.unknown_entity,
        }
    }

    /// Severity for `code`, `None` when ignored
    pub fn severity(&self, code: IssueCode) -> Option<Severity> {
        self.level(code).to_severity()
    }
}

// ============================================================================
// Index limits
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexLimits {
    /// Incremental edits of the trigger index before a full rebuild (1..=10000)
    pub trigger_max_edits: usize,

    /// Incremental edits of the checker index before a full rebuild (1..=10000)
    pub checker_max_edits: usize,

    /// Invalidation notification window in milliseconds (100..=2000)
    pub debounce_ms: u64,
}

impl Default for IndexLimits {
    fn default() -> Self {
        Self {
            trigger_max_edits: 30,
            checker_max_edits: 30,
            debounce_ms: 150,
        }
    }
}

impl IndexLimits {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Validatable for IndexLimits {
    fn validate(&self) -> ConfigResult<()> {
        for (field, value) in [
            ("trigger_max_edits", self.trigger_max_edits),
            ("checker_max_edits", self.checker_max_edits),
        ] {
            if !(1..=10_000).contains(&value) {
                return Err(ConfigError::range_with_hint(
                    field,
                    value,
                    1,
                    10_000,
                    "Use a small positive edit count; every rebuild re-parses the whole program",
                ));
            }
        }
        if !(100..=2_000).contains(&self.debounce_ms) {
            return Err(ConfigError::range_with_hint(
                "debounce_ms",
                self.debounce_ms,
                100,
                2_000,
                "Shorter windows stop coalescing editor bursts",
            ));
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "IndexLimits"
    }
}

// ============================================================================
// Top level
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub layout: ProjectLayout,
    pub checks: CheckSeverities,
    pub limits: IndexLimits,
}

impl Validatable for AnalyzerConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.layout.validate()?;
        self.limits.validate()
    }

    fn config_name(&self) -> &'static str {
        "AnalyzerConfig"
    }
}
