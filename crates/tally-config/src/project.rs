//! Project Configuration (tally.toml)
//!
//! Handles project-level configuration stored in `tally.toml` at the project root.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration from tally.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Runner behaviour (sampling, discovery)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner: Option<RunnerConfig>,

    /// Result output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Runner configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Sampler poll period in milliseconds (default: 10)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,

    /// Namespace prefixes that discovery never descends into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// One line per test instead of progress dots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,

    /// Colorize console output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,

    /// Write structured results to this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<PathBuf>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(runner) = &self.runner {
            if runner.poll_interval_ms == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: "runner.poll_interval_ms".to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }

            for prefix in runner.exclude.iter().flatten() {
                validate_prefix("runner.exclude", prefix)?;
            }
        }

        if let Some(output) = &self.output {
            if let Some(json) = &output.json {
                if json.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "output.json".to_string(),
                        reason: "path cannot be empty".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Configured poll interval, if present
    pub fn poll_interval_ms(&self) -> Option<u64> {
        self.runner.as_ref().and_then(|r| r.poll_interval_ms)
    }

    /// Configured exclusion prefixes, if present
    pub fn excluded_prefixes(&self) -> Option<&[String]> {
        self.runner.as_ref().and_then(|r| r.exclude.as_deref())
    }

    /// Output section, created on demand
    pub fn output_mut(&mut self) -> &mut OutputConfig {
        self.output.get_or_insert_with(OutputConfig::default)
    }

    /// Runner section, created on demand
    pub fn runner_mut(&mut self) -> &mut RunnerConfig {
        self.runner.get_or_insert_with(RunnerConfig::default)
    }
}

/// Namespace prefixes are `::`-separated paths with no empty segments
pub(crate) fn validate_prefix(field: &str, prefix: &str) -> ConfigResult<()> {
    if prefix.is_empty() || prefix.split("::").any(str::is_empty) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}' is not a namespace path", prefix),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_minimal_project_config() {
        let toml = r#"
[runner]
poll_interval_ms = 25
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.poll_interval_ms(), Some(25));
        assert_eq!(config.excluded_prefixes(), None);
    }

    #[test]
    fn test_parse_full_project_config() {
        let toml = r#"
[runner]
poll_interval_ms = 5
exclude = ["std", "vendor::generated"]

[output]
verbose = true
color = false
json = "target/tally.json"
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.excluded_prefixes(),
            Some(&["std".to_string(), "vendor::generated".to_string()][..])
        );
        let output = config.output.unwrap();
        assert_eq!(output.verbose, Some(true));
        assert_eq!(output.json, Some(PathBuf::from("target/tally.json")));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let config = ProjectConfig {
            runner: Some(RunnerConfig {
                poll_interval_ms: Some(0),
                exclude: None,
            }),
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[rstest]
    #[case("std", true)]
    #[case("vendor::generated", true)]
    #[case("", false)]
    #[case("std::", false)]
    #[case("::std", false)]
    #[case("a::::b", false)]
    fn test_prefix_validation(#[case] prefix: &str, #[case] valid: bool) {
        assert_eq!(validate_prefix("runner.exclude", prefix).is_ok(), valid);
    }
}
