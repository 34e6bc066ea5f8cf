//! Diagnostic records handed to the editor layer

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use super::span::Range;

/// Severity of an emitted diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// Stable issue codes. The string form never depends on configured severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueCode {
    // Trigger handler rules
    TriggerAsyncRequired,
    TriggerInvalidReturn,
    TriggerMissingReturnValue,
    TriggerInvalidContextCall,
    TriggerMissingHandler,

    // Checker handler rules
    CheckerInvalidContextCall,
    CheckerUnguardedPromise,
    CheckerUnsupportedDestructure,

    // Components
    ComponentUnknownEntity,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TriggerAsyncRequired => "trigger.asyncRequired",
            Self::TriggerInvalidReturn => "trigger.invalidReturn",
            Self::TriggerMissingReturnValue => "trigger.missingReturnValue",
            Self::TriggerInvalidContextCall => "trigger.invalidContextCall",
            Self::TriggerMissingHandler => "trigger.missingHandler",
            Self::CheckerInvalidContextCall => "checker.invalidContextCall",
            Self::CheckerUnguardedPromise => "checker.unguardedPromise",
            Self::CheckerUnsupportedDestructure => "checker.unsupportedDestructure",
            Self::ComponentUnknownEntity => "component.unknownEntity",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for IssueCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One diagnostic at one location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub range: Range,
    pub message: String,
    pub severity: Severity,
    pub code: IssueCode,
}

impl Diagnostic {
    pub fn new(
        range: Range,
        code: IssueCode,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            range,
            message: message.into(),
            severity,
            code,
        }
    }
}

/// Normalized file path -> diagnostics for that file, in source order.
///
/// A path with an empty list means "clear previous diagnostics".
pub type DiagnosticsMap = BTreeMap<PathBuf, Vec<Diagnostic>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::Position;

    #[test]
    fn test_diagnostic_wire_shape() {
        let diag = Diagnostic::new(
            Range::new(Position::new(1, 2), Position::new(1, 9)),
            IssueCode::TriggerInvalidReturn,
            Severity::Warning,
            "literal return",
        );
        let value = serde_json::to_value(&diag).unwrap();
        assert_eq!(value["code"], "trigger.invalidReturn");
        assert_eq!(value["severity"], "warning");
        assert_eq!(value["range"]["start"]["character"], 2);
    }
}
