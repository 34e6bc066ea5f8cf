//! Feature modules
//!
//! Bottom-up: parsing -> workspace -> cross_file / literal_eval ->
//! definitions -> consistency -> program_index, plus the domain model,
//! component and eventing slices the session wires together.

pub mod components;
pub mod consistency;
pub mod cross_file;
pub mod definitions;
pub mod domain_model;
pub mod file_events;
pub mod literal_eval;
pub mod parsing;
pub mod program_index;
pub mod pubsub;
pub mod worker;
pub mod workspace;
