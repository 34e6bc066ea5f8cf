//! Common test utilities for oak-analyzer
//!
//! Project trees are written into a temp directory laid out like a stock
//! Oak project (see `ProjectLayout::default`).

mod fixtures;

pub use fixtures::*;
