//! Configuration
//!
//! Defaults cover a stock Oak project; a YAML file (schema v1) overrides any
//! subset of them:
//!
//! ```yaml
//! version: 1
//! checks:
//!   missing_return_value: ignore
//! limits:
//!   trigger_max_edits: 50
//! ```

pub mod analyzer_config;
pub mod error;
pub mod io;
pub mod validation;

pub use analyzer_config::{
    AnalyzerConfig, CheckSeverities, IndexLimits, ProjectLayout, SeverityLevel,
};
pub use error::{ConfigError, ConfigResult};
pub use io::ConfigFileV1;
pub use validation::Validatable;
