//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::ProjectConfig;
use crate::{ConfigError, ConfigResult, DEFAULT_POLL_INTERVAL_MS, PROJECT_CONFIG_FILE};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.tally/config.toml) - lowest priority
/// 2. Project config (./tally.toml) - overrides global
/// 3. Environment variables (TALLY_*, NO_COLOR) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Project configuration (environment overrides already applied)
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where tally.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Read global configuration from `path` instead of ~/.tally/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find tally.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;

        // Load global config (optional)
        let global_config = self.global_or_default();

        let project_config = self.apply_env_overrides(project_config)?;

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let global_config = self.global_or_default();
        let project_config = self.apply_env_overrides(project_config)?;

        let project_root = config_path.parent().map(|p| p.to_path_buf());

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); a default config with no root
    /// when no tally.toml exists up to the filesystem root.
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Global configuration, or defaults when it is missing or invalid
    ///
    /// An invalid global file never blocks a run; it is reported and skipped.
    fn global_or_default(&mut self) -> GlobalConfig {
        self.load_global_config().unwrap_or_else(|error| {
            tracing::warn!(%error, "ignoring invalid global config");
            GlobalConfig::default()
        })
    }

    /// Load global configuration from ~/.tally/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = GlobalConfig::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        // Global config is optional - if it doesn't exist, return default
        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides to project config
    ///
    /// Recognised: TALLY_POLL_INTERVAL_MS, TALLY_VERBOSE, TALLY_JSON, NO_COLOR
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Ok(interval) = env::var("TALLY_POLL_INTERVAL_MS") {
            let ms = interval
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: "TALLY_POLL_INTERVAL_MS".to_string(),
                    reason: format!("expected a positive integer, got '{}'", interval),
                })?;
            config.runner_mut().poll_interval_ms = Some(ms);
        }

        if let Ok(verbose) = env::var("TALLY_VERBOSE") {
            config.output_mut().verbose = Some(parse_bool(&verbose));
        }

        if let Ok(json) = env::var("TALLY_JSON") {
            if !json.is_empty() {
                config.output_mut().json = Some(PathBuf::from(json));
            }
        }

        // https://no-color.org: any non-empty value disables color
        if env::var("NO_COLOR").is_ok_and(|v| !v.is_empty()) {
            config.output_mut().color = Some(false);
        }

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

impl Config {
    /// Effective sampler poll period (project > global > 10 ms)
    pub fn poll_interval(&self) -> Duration {
        let ms = self
            .project
            .poll_interval_ms()
            .or_else(|| self.global.poll_interval_ms())
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        Duration::from_millis(ms)
    }

    /// Namespace prefixes excluded from discovery, if configured
    pub fn excluded_prefixes(&self) -> Option<&[String]> {
        self.project.excluded_prefixes()
    }

    /// Effective verbosity (project > global > false)
    pub fn verbose(&self) -> bool {
        self.project
            .output
            .as_ref()
            .and_then(|o| o.verbose)
            .or_else(|| self.global.verbose())
            .unwrap_or(false)
    }

    /// Effective color setting (project > global > true)
    pub fn color(&self) -> bool {
        self.project
            .output
            .as_ref()
            .and_then(|o| o.color)
            .or_else(|| self.global.color())
            .unwrap_or(true)
    }

    /// JSON output path, resolved against the project root when relative
    pub fn json_path(&self) -> Option<PathBuf> {
        let json = self.project.output.as_ref()?.json.as_ref()?;
        match &self.project_root {
            Some(root) if json.is_relative() => Some(root.join(json)),
            _ => Some(json.clone()),
        }
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if this is a project (has tally.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}
