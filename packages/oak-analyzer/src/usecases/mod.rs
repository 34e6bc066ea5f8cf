//! Usecase layer
//!
//! [`AnalysisSession`] is the entry point the editor layer drives: one per
//! project root, fed with file change events, answering with diagnostics.

pub mod analysis_session;

pub use analysis_session::{AnalysisSession, SessionBuses, SessionStatus};
