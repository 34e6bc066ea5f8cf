//! Configuration I/O (YAML loading)

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::analyzer_config::{AnalyzerConfig, CheckSeverities, IndexLimits, ProjectLayout};
use super::error::{ConfigError, ConfigResult};
use super::validation::Validatable;

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileV1 {
    /// Schema version (always 1 for v1)
    pub version: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<ProjectLayout>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checks: Option<CheckSeverities>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<IndexLimits>,
}

impl AnalyzerConfig {
    /// Load and validate a YAML configuration file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let file: ConfigFileV1 = serde_yaml::from_str(content)?;
        if file.version != 1 {
            return Err(ConfigError::UnsupportedVersion {
                found: file.version,
                supported: vec![1],
            });
        }

        let config = AnalyzerConfig {
            layout: file.layout.unwrap_or_default(),
            checks: file.checks.unwrap_or_default(),
            limits: file.limits.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = ConfigFileV1 {
            version: 1,
            layout: Some(self.layout.clone()),
            checks: Some(self.checks.clone()),
            limits: Some(self.limits.clone()),
        };
        serde_yaml::to_string(&file).map_err(ConfigError::Yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeverityLevel;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
version: 1
checks:
  missing_return_value: ignore
limits:
  trigger_max_edits: 5
"#;
        let config = AnalyzerConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.checks.missing_return_value, SeverityLevel::Ignore);
        assert_eq!(config.checks.async_required, SeverityLevel::Error);
        assert_eq!(config.limits.trigger_max_edits, 5);
        assert_eq!(config.limits.checker_max_edits, 30);
        assert_eq!(config.layout, ProjectLayout::default());
    }

    #[test]
    fn test_version_and_unknown_fields() {
        assert!(matches!(
            AnalyzerConfig::from_yaml_str("version: 2"),
            Err(ConfigError::UnsupportedVersion { found: 2, .. })
        ));
        assert!(matches!(
            AnalyzerConfig::from_yaml_str("version: 1\nbogus: true"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_yaml_roundtrip_validates() {
        let config = AnalyzerConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert_eq!(AnalyzerConfig::from_yaml_str(&yaml).unwrap(), config);

        let invalid = "version: 1\nlimits:\n  debounce_ms: 1\n";
        assert!(matches!(
            AnalyzerConfig::from_yaml_str(invalid),
            Err(ConfigError::Range { .. })
        ));
    }
}
