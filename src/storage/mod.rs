//! # Storage Layer
//!
//! Everything that touches the filesystem before packaging starts.
//!
//! ## Files
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Project config | TOML | `embulk-plugin.toml` |
//! | Global config | TOML | `~/.config/embulk-plugins/config.toml` |
//! | Resolved graphs | JSON | `build/embulk/{runtime,provided}.json` |
//! | Lockfile | line-based text | `embulk-plugin.lockfile` |
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a plugin project
//! - [`JsonGraphSource`] - Reads a resolved graph document
//! - [`Lockfile`] - Locked flattened runtime selection
//! - [`Config`] - Project and global configuration

mod config;
mod graph_file;
mod lockfile;
mod project;

pub use config::{
    Config, ConfigError, DependenciesSection, GlobalConfig, OutputFormat, PackageSection, PluginSection,
    ProjectConfig, ProjectSection, CONFIG_FILE, DEFAULT_CLASSIFIER, DEFAULT_FLAT_RUNTIME_CONFIGURATION,
};
pub use graph_file::{FirstLevelEntry, GraphDocument, GraphFileError, JsonGraphSource, ModuleEntry};
pub use lockfile::{LockDiff, Lockfile, LockfileError};
pub use project::{InitOptions, Project, ProjectError, LOCKFILE};
