//! Plugin manifest attributes
//!
//! Embulk discovers a plugin jar through attributes in the main section of
//! its `META-INF/MANIFEST.MF`. [`build_manifest`] produces them in a fixed
//! order so the rendered manifest is byte-for-byte reproducible.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::descriptor::PluginDescriptor;

pub const MAIN_CLASS_KEY: &str = "Embulk-Plugin-Main-Class";
pub const CATEGORY_KEY: &str = "Embulk-Plugin-Category";
pub const TYPE_KEY: &str = "Embulk-Plugin-Type";
pub const SPI_VERSION_KEY: &str = "Embulk-Plugin-Spi-Version";
pub const IMPLEMENTATION_TITLE_KEY: &str = "Implementation-Title";
pub const IMPLEMENTATION_VERSION_KEY: &str = "Implementation-Version";

/// Plugin SPI version understood by Embulk
pub const SPI_VERSION: &str = "0";

/// Maximum physical line length in a jar manifest, in bytes, excluding the line break
const MAX_LINE_BYTES: usize = 72;

#[derive(Debug, Error, PartialEq)]
pub enum ManifestError {
    #[error("Duplicate manifest attribute: {0}")]
    DuplicateKey(String),

    #[error("Invalid manifest attribute name: '{0}'")]
    InvalidKey(String),

    #[error("Manifest attribute '{0}' contains a line break")]
    InvalidValue(String),
}

/// Ordered manifest attributes with unique keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestBlock {
    entries: Vec<(String, String)>,
}

impl ManifestBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute, rejecting duplicates and malformed names
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<(), ManifestError> {
        let key = key.into();
        let value = value.into();

        if !is_valid_key(&key) {
            return Err(ManifestError::InvalidKey(key));
        }
        if value.contains(['\r', '\n']) {
            return Err(ManifestError::InvalidValue(key));
        }
        if self.get(&key).is_some() {
            return Err(ManifestError::DuplicateKey(key));
        }

        self.entries.push((key, value));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the block as the main section of a jar manifest
    ///
    /// Starts with `Manifest-Version: 1.0`, uses CRLF line endings and wraps
    /// lines at 72 bytes with single-space continuation lines.
    pub fn render(&self) -> String {
        let mut out = String::new();
        write_attribute(&mut out, "Manifest-Version", "1.0");
        for (key, value) in &self.entries {
            write_attribute(&mut out, key, value);
        }
        out.push_str("\r\n");
        out
    }
}

impl fmt::Display for ManifestBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            writeln!(f, "{}: {}", key, value)?;
        }
        Ok(())
    }
}

/// Attribute names are alphanumerics, `-` and `_`, at most 70 bytes
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 70
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn write_attribute(out: &mut String, key: &str, value: &str) {
    let line = format!("{}: {}", key, value);
    let mut rest = line.as_str();
    let mut limit = MAX_LINE_BYTES;

    loop {
        if rest.len() <= limit {
            out.push_str(rest);
            out.push_str("\r\n");
            return;
        }

        let mut split = limit;
        while !rest.is_char_boundary(split) {
            split -= 1;
        }

        out.push_str(&rest[..split]);
        out.push_str("\r\n ");
        rest = &rest[split..];
        // Continuation lines spend one byte on the leading space
        limit = MAX_LINE_BYTES - 1;
    }
}

/// Facts about the build that end up in the manifest
#[derive(Debug, Clone, Copy)]
pub struct BuildFacts<'a> {
    pub project_name: &'a str,

    /// Raw project version, `unspecified` when not set
    pub version: &'a str,
}

/// Builds the plugin manifest attributes in their fixed order
///
/// Every attribute goes through [`ManifestBlock::insert`], so a value with a
/// line break can never smuggle in an extra attribute.
pub fn build_manifest(descriptor: &PluginDescriptor, facts: BuildFacts<'_>) -> Result<ManifestBlock, ManifestError> {
    let mut block = ManifestBlock::new();
    block.insert(MAIN_CLASS_KEY, descriptor.main_class())?;
    block.insert(CATEGORY_KEY, descriptor.category().as_str())?;
    block.insert(TYPE_KEY, descriptor.plugin_type())?;
    block.insert(SPI_VERSION_KEY, SPI_VERSION)?;
    block.insert(IMPLEMENTATION_TITLE_KEY, facts.project_name)?;
    block.insert(IMPLEMENTATION_VERSION_KEY, facts.version)?;
    Ok(block)
}
