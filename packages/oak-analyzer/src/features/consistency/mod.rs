//! Consistency checks for trigger and checker handlers

pub mod checks;
pub mod handler;
pub mod rules;

pub use checks::check_definition;
pub use handler::find_handler;
pub use rules::{BoundResultPolicy, RuleSet, CONTEXT_METHODS};
