//! Rule sets applied to definition handlers

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

use crate::config::CheckSeverities;
use crate::shared::models::{Diagnostic, IssueCode, Range};

/// Context methods returning a promise that must not be left dangling
pub static CONTEXT_METHODS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "select", "operate", "commit", "rollback", "aggregate", "count", "exec", "begin", "on",
    ]
    .into_iter()
    .collect()
});

/// What happens when a context call result is bound with `const`/`let`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundResultPolicy {
    /// Binding without awaiting is an invalid context call
    Reject,
    /// Binding to an identifier needs an `instanceof Promise` guard in the
    /// same block; destructuring is never supported
    RequireGuard {
        unguarded: IssueCode,
        destructured: IssueCode,
    },
}

/// Which handler rules apply, and the code each one reports. `None`
/// disables the rule for the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSet {
    pub require_async: Option<IssueCode>,
    pub literal_return: Option<IssueCode>,
    pub missing_return_value: Option<IssueCode>,
    pub missing_handler: Option<IssueCode>,
    pub context_call: IssueCode,
    pub bound_result: BoundResultPolicy,
}

/// Collects diagnostics, applying configured severities
pub(crate) struct DiagnosticSink<'c> {
    severities: &'c CheckSeverities,
    diagnostics: Vec<Diagnostic>,
}

impl<'c> DiagnosticSink<'c> {
    pub(crate) fn new(severities: &'c CheckSeverities) -> Self {
        Self {
            severities,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, range: Range, code: IssueCode, message: impl Into<String>) {
        if let Some(severity) = self.severities.severity(code) {
            self.diagnostics.push(Diagnostic::new(range, code, severity, message));
        }
    }

    pub(crate) fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
