//! Dependency lockfile
//!
//! Records the flattened runtime selection so that an unnoticed change in
//! resolution (a new transitive module, a bumped version) fails the build
//! instead of silently shipping different jars.
//!
//! ```text
//! # This is an embulk-plugins dependency lockfile.
//! # Regenerate with `embulk-plugins flatten --write-lock`.
//! javax.inject:javax.inject:1=embulkPluginFlatRuntime
//! org.glassfish.jersey.core:jersey-client:2.25.1=embulkPluginFlatRuntime
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{FlattenedSet, ModuleKey};

const HEADER: &str = "\
# This is an embulk-plugins dependency lockfile.
# Regenerate with `embulk-plugins flatten --write-lock`.
";

#[derive(Debug, Error, PartialEq)]
pub enum LockfileError {
    #[error("Malformed lockfile entry at line {line}: '{content}'")]
    Malformed { line: usize, content: String },

    #[error("Dependencies do not match the lockfile:\n{0}Run 'embulk-plugins flatten --write-lock' to update it.")]
    Mismatch(LockDiff),
}

/// Locked `group:name` → version entries for one configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Lockfile {
    configuration: String,
    entries: BTreeMap<ModuleKey, String>,
}

impl Lockfile {
    pub fn new(configuration: impl Into<String>) -> Self {
        Self {
            configuration: configuration.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Locks every module of a flattened set
    pub fn from_flattened(configuration: impl Into<String>, set: &FlattenedSet) -> Self {
        let mut lockfile = Self::new(configuration);
        for module in set.modules() {
            lockfile.entries.insert(module.key.clone(), module.version.clone());
        }
        lockfile
    }

    /// Parses lockfile text
    ///
    /// Only entries for `configuration` are kept; comment and blank lines
    /// are skipped.
    pub fn parse(configuration: impl Into<String>, content: &str) -> Result<Self, LockfileError> {
        let mut lockfile = Self::new(configuration);

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let malformed = || LockfileError::Malformed {
                line: idx + 1,
                content: raw.to_string(),
            };

            let (notation, configurations) = line.split_once('=').ok_or_else(malformed)?;
            if !configurations.split(',').any(|c| c.trim() == lockfile.configuration) {
                continue;
            }

            let (key, version) = notation.rsplit_once(':').ok_or_else(malformed)?;
            let key: ModuleKey = key.parse().map_err(|_| malformed())?;
            if version.trim().is_empty() {
                return Err(malformed());
            }

            lockfile.entries.insert(key, version.trim().to_string());
        }

        Ok(lockfile)
    }

    /// Reads the lockfile at `path`, or `None` if it does not exist
    pub fn read(path: &Path, configuration: &str) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read lockfile: {}", path.display()))?;

        let lockfile = Self::parse(configuration, &content)
            .with_context(|| format!("Failed to parse lockfile: {}", path.display()))?;
        Ok(Some(lockfile))
    }

    /// Writes the lockfile atomically (temp file + rename)
    pub fn write(&self, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;

        temp.write_all(self.render().as_bytes())
            .with_context(|| format!("Failed to write lockfile: {}", path.display()))?;

        temp.persist(path)
            .with_context(|| format!("Failed to replace lockfile: {}", path.display()))?;

        tracing::debug!(path = %path.display(), entries = self.len(), "wrote lockfile");
        Ok(())
    }

    /// Renders the lockfile text, entries sorted by key
    pub fn render(&self) -> String {
        let mut out = String::from(HEADER);
        for (key, version) in &self.entries {
            out.push_str(&format!("{}:{}={}\n", key, version, self.configuration));
        }
        out
    }

    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    pub fn version(&self, key: &ModuleKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compares the locked selection with a freshly flattened one
    pub fn diff(&self, actual: &Lockfile) -> LockDiff {
        let mut diff = LockDiff::default();

        for (key, version) in &actual.entries {
            match self.entries.get(key) {
                None => diff.added.push(format!("{}:{}", key, version)),
                Some(locked) if locked != version => {
                    diff.changed.push(format!("{}:{} -> {}", key, locked, version))
                }
                Some(_) => {}
            }
        }
        for (key, version) in &self.entries {
            if !actual.entries.contains_key(key) {
                diff.removed.push(format!("{}:{}", key, version));
            }
        }

        diff
    }

    /// Fails when the flattened set differs from the locked selection
    pub fn verify(&self, set: &FlattenedSet) -> Result<(), LockfileError> {
        let diff = self.diff(&Self::from_flattened(self.configuration.clone(), set));
        if diff.is_empty() {
            Ok(())
        } else {
            Err(LockfileError::Mismatch(diff))
        }
    }
}

/// Differences between a lockfile and the current selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LockDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}

impl LockDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

impl fmt::Display for LockDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.added {
            writeln!(f, "  + {}", entry)?;
        }
        for entry in &self.removed {
            writeln!(f, "  - {}", entry)?;
        }
        for entry in &self.changed {
            writeln!(f, "  ~ {}", entry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResolvedModule;
    use tempfile::TempDir;

    const CONF: &str = "embulkPluginFlatRuntime";

    fn set(modules: &[(&str, &str, &str)]) -> FlattenedSet {
        let mut set = FlattenedSet::new();
        for (group, name, version) in modules {
            set.insert(ResolvedModule::new(ModuleKey::new(*group, *name).unwrap(), *version));
        }
        set
    }

    #[test]
    fn render_is_sorted_with_header() {
        let lockfile = Lockfile::from_flattened(CONF, &set(&[("org.b", "b", "2"), ("org.a", "a", "1")]));

        assert_eq!(
            lockfile.render(),
            format!(
                "{}org.a:a:1=embulkPluginFlatRuntime\norg.b:b:2=embulkPluginFlatRuntime\n",
                HEADER
            )
        );
    }

    #[test]
    fn parse_reads_rendered_text() {
        let original = Lockfile::from_flattened(CONF, &set(&[("g", "m", "1.0"), ("h", "n", "2.0-rc")]));
        let parsed = Lockfile::parse(CONF, &original.render()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn parse_skips_other_configurations() {
        let content = "g:m:1.0=compileClasspath\ng:n:2.0=embulkPluginFlatRuntime,runtimeClasspath\n";
        let lockfile = Lockfile::parse(CONF, content).unwrap();

        assert_eq!(lockfile.len(), 1);
        assert_eq!(lockfile.version(&"g:n".parse().unwrap()), Some("2.0"));
    }

    #[test]
    fn parse_rejects_malformed_lines() {
        let err = Lockfile::parse(CONF, "# header\ng:m:1.0\n").unwrap_err();
        assert_eq!(
            err,
            LockfileError::Malformed {
                line: 2,
                content: "g:m:1.0".to_string()
            }
        );

        assert!(Lockfile::parse(CONF, "m:1.0=embulkPluginFlatRuntime").is_err());
    }

    #[test]
    fn verify_reports_every_difference() {
        let lockfile = Lockfile::from_flattened(CONF, &set(&[("g", "a", "1"), ("g", "b", "1")]));
        let current = set(&[("g", "a", "2"), ("g", "c", "1")]);

        let err = lockfile.verify(&current).unwrap_err();
        let LockfileError::Mismatch(diff) = &err else {
            panic!("expected mismatch, got {:?}", err);
        };
        assert_eq!(diff.added, vec!["g:c:1"]);
        assert_eq!(diff.removed, vec!["g:b:1"]);
        assert_eq!(diff.changed, vec!["g:a:1 -> 2"]);

        let message = err.to_string();
        assert!(message.contains("  + g:c:1"));
        assert!(message.contains("--write-lock"));
    }

    #[test]
    fn verify_accepts_same_selection() {
        let current = set(&[("g", "a", "1")]);
        let lockfile = Lockfile::from_flattened(CONF, &current);
        assert!(lockfile.verify(&current).is_ok());
    }

    #[test]
    fn write_and_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("embulk-plugin.lockfile");

        assert!(Lockfile::read(&path, CONF).unwrap().is_none());

        let lockfile = Lockfile::from_flattened(CONF, &set(&[("g", "m", "1.0")]));
        lockfile.write(&path).unwrap();

        let reloaded = Lockfile::read(&path, CONF).unwrap().unwrap();
        assert_eq!(reloaded, lockfile);
    }
}
