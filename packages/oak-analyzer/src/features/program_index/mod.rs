//! Program indexes
//!
//! [`TriggerIndex`] and [`CheckerIndex`] are the same [`ProgramIndex`]
//! over different [`DefinitionKind`](crate::features::definitions::DefinitionKind)s.

mod index;

pub use index::{
    CheckerIndex, IndexState, IndexStats, ProgramIndex, RebuildReason, TriggerIndex, UpdateOutcome,
};
