//! Resolved modules and their identities
//!
//! A module is identified by its `group:name` pair. The version is an
//! attribute, not part of the identity: two modules with the same key but
//! different versions are "the same module" as far as flattening goes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ModuleKeyError {
    #[error("Module has no group (name: '{0}')")]
    MissingGroup(String),

    #[error("Module has no name (group: '{0}')")]
    MissingName(String),

    #[error("Invalid module notation: expected 'group:name', got '{0}'")]
    InvalidNotation(String),
}

/// The `group:name` identity of a module
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleKey {
    group: String,
    name: String,
}

impl ModuleKey {
    /// Creates a key, rejecting an empty group or name
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Result<Self, ModuleKeyError> {
        let group = group.into();
        let name = name.into();

        if group.trim().is_empty() {
            return Err(ModuleKeyError::MissingGroup(name));
        }
        if name.trim().is_empty() {
            return Err(ModuleKeyError::MissingName(group));
        }

        Ok(Self { group, name })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

impl FromStr for ModuleKey {
    type Err = ModuleKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once(':') {
            Some((group, name)) if !name.contains(':') => Self::new(group, name),
            _ => Err(ModuleKeyError::InvalidNotation(s.to_string())),
        }
    }
}

impl TryFrom<String> for ModuleKey {
    type Error = ModuleKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModuleKey> for String {
    fn from(key: ModuleKey) -> Self {
        key.to_string()
    }
}

/// A module whose version has already been selected by the resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedModule {
    pub key: ModuleKey,
    pub version: String,

    /// Files delivered by this module (usually a single jar)
    #[serde(default)]
    pub artifacts: Vec<PathBuf>,
}

impl ResolvedModule {
    pub fn new(key: ModuleKey, version: impl Into<String>) -> Self {
        Self {
            key,
            version: version.into(),
            artifacts: Vec::new(),
        }
    }

    /// Adds an artifact file, builder style
    pub fn with_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifacts.push(path.into());
        self
    }

    /// Returns the `group:name:version` notation
    pub fn notation(&self) -> String {
        format!("{}:{}", self.key, self.version)
    }
}

impl fmt::Display for ResolvedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.version)
    }
}

/// A dependency on another build unit of the same workspace
///
/// These are not addressable as `group:name:version`, so they never take part
/// in key-based flattening. Only their own artifacts are delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDependency {
    /// Workspace path, e.g. `:subproject-a`
    pub path: String,

    #[serde(default)]
    pub artifacts: Vec<PathBuf>,
}

impl ProjectDependency {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            artifacts: Vec::new(),
        }
    }

    pub fn with_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifacts.push(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display() {
        let key = ModuleKey::new("javax.inject", "javax.inject").unwrap();
        assert_eq!(key.to_string(), "javax.inject:javax.inject");
    }

    #[test]
    fn key_rejects_empty_parts() {
        assert_eq!(
            ModuleKey::new("", "guava"),
            Err(ModuleKeyError::MissingGroup("guava".to_string()))
        );
        assert_eq!(
            ModuleKey::new("com.google.guava", "  "),
            Err(ModuleKeyError::MissingName("com.google.guava".to_string()))
        );
    }

    #[test]
    fn key_parse() {
        let key: ModuleKey = "com.google.guava:guava".parse().unwrap();
        assert_eq!(key.group(), "com.google.guava");
        assert_eq!(key.name(), "guava");

        assert!("guava".parse::<ModuleKey>().is_err());
        assert!("a:b:c".parse::<ModuleKey>().is_err());
        assert!(":guava".parse::<ModuleKey>().is_err());
    }

    #[test]
    fn module_notation() {
        let module = ResolvedModule::new(ModuleKey::new("g", "m").unwrap(), "1.0");
        assert_eq!(module.notation(), "g:m:1.0");
        assert_eq!(module.to_string(), "g:m:1.0");
    }
}
