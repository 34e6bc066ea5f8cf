//! Shared data models

pub mod diagnostic;
pub mod span;

pub use diagnostic::{Diagnostic, DiagnosticsMap, IssueCode, Severity};
pub use span::{Position, Range};
