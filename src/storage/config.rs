//! Configuration handling for embulk-plugins
//!
//! Configuration is stored in `embulk-plugin.toml` (project) and
//! `~/.config/embulk-plugins/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ProjectVersion, RawDescriptor};

/// File name of the project configuration
pub const CONFIG_FILE: &str = "embulk-plugin.toml";

/// Default name of the flattened runtime configuration, recorded in the lockfile
pub const DEFAULT_FLAT_RUNTIME_CONFIGURATION: &str = "embulkPluginFlatRuntime";

/// Default package classifier
pub const DEFAULT_CLASSIFIER: &str = "java";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// `[project]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    /// Project name, defaults to the directory name
    pub name: Option<String>,

    /// Maven-style version, `unspecified` when absent
    pub version: ProjectVersion,

    /// Build output directory, relative to the project root
    pub build_dir: PathBuf,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: None,
            version: ProjectVersion::Unspecified,
            build_dir: PathBuf::from("build"),
        }
    }
}

/// `[plugin]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSection {
    pub main_class: Option<String>,
    pub category: Option<String>,

    #[serde(rename = "type")]
    pub plugin_type: Option<String>,

    /// Primary jar; defaults to `<build_dir>/libs/<name>-<version>.jar`
    pub main_jar: Option<PathBuf>,
}

impl PluginSection {
    /// Returns the descriptor settings, not yet validated
    pub fn descriptor(&self) -> RawDescriptor {
        RawDescriptor {
            main_class: self.main_class.clone(),
            category: self.category.clone(),
            plugin_type: self.plugin_type.clone(),
        }
    }
}

/// `[dependencies]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DependenciesSection {
    /// Resolved runtime graph; defaults to `<build_dir>/embulk/runtime.json`
    pub runtime: Option<PathBuf>,

    /// Resolved provided (compile-only) graph; defaults to
    /// `<build_dir>/embulk/provided.json` when that file exists
    pub provided: Option<PathBuf>,

    /// Configuration name written into the lockfile
    pub flat_runtime_configuration: String,

    /// Verify the flattened selection against the lockfile
    pub locking: bool,
}

impl Default for DependenciesSection {
    fn default() -> Self {
        Self {
            runtime: None,
            provided: None,
            flat_runtime_configuration: DEFAULT_FLAT_RUNTIME_CONFIGURATION.to_string(),
            locking: true,
        }
    }
}

/// `[package]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageSection {
    pub classifier: String,

    /// Output directory; defaults to `<build_dir>/gems`
    pub destination: Option<PathBuf>,

    /// Also produce a `.tar.gz` of the package directory
    pub archive: bool,

    pub summary: String,
}

impl Default for PackageSection {
    fn default() -> Self {
        Self {
            classifier: DEFAULT_CLASSIFIER.to_string(),
            destination: None,
            archive: true,
            summary: String::new(),
        }
    }
}

/// Project-level configuration (`embulk-plugin.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub project: ProjectSection,
    pub plugin: PluginSection,
    pub dependencies: DependenciesSection,
    pub package: PackageSection,
}

impl ProjectConfig {
    /// Checks settings that cannot be expressed through serde defaults
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.package.classifier.trim().is_empty() {
            return Err(ConfigError::Invalid("'package.classifier' must not be empty".to_string()));
        }
        if self.dependencies.flat_runtime_configuration.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "'dependencies.flat_runtime_configuration' must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("org", "embulk", "embulk-plugins").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    pub fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse project config: {}", config_path.display()))?;

        config.check()?;
        Ok(config)
    }

    /// Finds the project root by looking for `embulk-plugin.toml`, walking up from `start`
    pub fn find_project_root(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(CONFIG_FILE).is_file() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}
