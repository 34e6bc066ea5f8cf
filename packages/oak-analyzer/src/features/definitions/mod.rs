//! Trigger and checker definitions
//!
//! [`Aggregator`] walks a program's default export into a flat list of
//! [`DefinitionObject`]s; [`DefinitionKind`] parameterizes it over triggers
//! and checkers.

pub mod aggregator;
pub mod kind;
pub mod model;

pub use aggregator::{AggregationResult, Aggregator};
pub use kind::{Checker, CheckerExtra, DefinitionKind, Trigger, TriggerExtra, COMMIT_PHASE};
pub use model::{DefinitionObject, SyntaxRef};
