//! Literal evaluation
//!
//! Folds object/array/scalar literal expressions into `serde_json::Value`,
//! resolving identifiers through the [`ImportResolver`](crate::features::cross_file::ImportResolver).

mod evaluator;

pub use evaluator::{evaluate, GENERIC_ACTIONS, GENERIC_ACTIONS_SYMBOL};
