//! Project management
//!
//! Handles project initialization and resolves every path the packaging
//! pipeline needs from the project configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::{Config, CONFIG_FILE};
use crate::domain::{Category, ProjectVersion};

/// File name of the dependency lockfile
pub const LOCKFILE: &str = "embulk-plugin.lockfile";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Project already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("Not in an Embulk plugin project. Run 'embulk-plugins init' first.")]
    NotInProject,

    #[error("Cannot determine project name for {0}")]
    NoName(PathBuf),
}

/// Settings written by [`Project::init`]
#[derive(Debug, Clone)]
pub struct InitOptions {
    pub name: Option<String>,
    pub main_class: String,
    pub category: Category,
    pub plugin_type: String,
}

/// An Embulk plugin project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(CONFIG_FILE).is_file() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Self::discover(&cwd)
    }

    /// Opens the project at `start` or the nearest parent that has one
    pub fn discover(start: &Path) -> Result<Self> {
        let root = Config::find_project_root(start).ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>, options: &InitOptions) -> Result<Self> {
        let root = root.into();
        let config_path = root.join(CONFIG_FILE);

        if config_path.exists() {
            return Err(ProjectError::AlreadyExists(root).into());
        }

        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create project directory: {}", root.display()))?;

        let name_line = match &options.name {
            Some(name) => format!("name = {}", toml_string(name)),
            None => "# name = \"embulk-input-example\"   # defaults to the directory name".to_string(),
        };

        let content = format!(
            r#"# embulk-plugins configuration

[project]
{name_line}
# version = "0.1.0-SNAPSHOT"
build_dir = "build"

[plugin]
main_class = {main_class}
category = {category}
type = {plugin_type}
# main_jar = "build/libs/embulk-input-example-0.1.0.jar"

[dependencies]
# Resolved graphs exported by the build tool
# runtime = "build/embulk/runtime.json"
# provided = "build/embulk/provided.json"
flat_runtime_configuration = "embulkPluginFlatRuntime"
locking = true

[package]
classifier = "java"
# destination = "build/gems"
archive = true
"#,
            name_line = name_line,
            main_class = toml_string(&options.main_class),
            category = toml_string(options.category.as_str()),
            plugin_type = toml_string(&options.plugin_type),
        );

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a mutable reference to the configuration
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Returns the project name, falling back to the directory name
    pub fn name(&self) -> Result<String> {
        if let Some(name) = self.config.project.project.name.as_deref() {
            if !name.trim().is_empty() {
                return Ok(name.to_string());
            }
        }

        let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
        root.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ProjectError::NoName(self.root.clone()).into())
    }

    /// Returns the project version
    pub fn version(&self) -> &ProjectVersion {
        &self.config.project.project.version
    }

    /// Resolves a configured path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Returns the build directory
    pub fn build_dir(&self) -> PathBuf {
        self.resolve(&self.config.project.project.build_dir)
    }

    /// Returns the primary jar produced by the build
    pub fn main_jar(&self) -> Result<PathBuf> {
        if let Some(jar) = &self.config.project.plugin.main_jar {
            return Ok(self.resolve(jar));
        }

        let name = self.name()?;
        let file_name = match self.version() {
            ProjectVersion::Unspecified => format!("{}.jar", name),
            ProjectVersion::Specified(version) => format!("{}-{}.jar", name, version),
        };
        Ok(self.build_dir().join("libs").join(file_name))
    }

    /// Returns the resolved runtime graph document
    pub fn runtime_graph(&self) -> PathBuf {
        match &self.config.project.dependencies.runtime {
            Some(path) => self.resolve(path),
            None => self.build_dir().join("embulk").join("runtime.json"),
        }
    }

    /// Returns the resolved provided graph document, if any
    ///
    /// An explicitly configured path is always returned; the default location
    /// only when the file exists.
    pub fn provided_graph(&self) -> Option<PathBuf> {
        match &self.config.project.dependencies.provided {
            Some(path) => Some(self.resolve(path)),
            None => {
                let default = self.build_dir().join("embulk").join("provided.json");
                default.is_file().then_some(default)
            }
        }
    }

    /// Returns the directory packages are written to
    pub fn destination(&self) -> PathBuf {
        match &self.config.project.package.destination {
            Some(path) => self.resolve(path),
            None => self.build_dir().join("gems"),
        }
    }

    /// Returns the lockfile path
    pub fn lockfile(&self) -> PathBuf {
        self.root.join(LOCKFILE)
    }
}

/// Quotes a value as a TOML basic string
fn toml_string(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}
