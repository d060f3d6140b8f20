//! Version translation
//!
//! Embulk plugins are versioned the Maven way (`1.0.0-SNAPSHOT`) but
//! packaged as gems, whose pre-release segments are dot-separated and
//! lowercase (`1.0.0.snapshot`).
//!
//! Only a single `-` separated suffix is understood. Anything else is
//! rejected instead of being guessed at.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version reported when a project does not declare one
pub const UNSPECIFIED: &str = "unspecified";

#[derive(Debug, Error, PartialEq)]
pub enum VersionError {
    #[error("Failed to convert the version \"{0}\" to Gem-style: empty version")]
    Empty(String),

    #[error("Failed to convert the version \"{version}\" to Gem-style: expected at most one '-', found {separators}")]
    TooManySeparators { version: String, separators: usize },

    #[error("Failed to convert the version \"{0}\" to Gem-style: empty segment around '-'")]
    EmptySegment(String),

    #[error("Failed to convert the version \"{0}\" to Gem-style: pre-release suffix contains '.'")]
    DottedSuffix(String),
}

/// Converts a Maven-style version into a gem version
///
/// - `2.3.1` stays `2.3.1`
/// - `1.0.0-SNAPSHOT` becomes `1.0.0.snapshot`
/// - `1.0.0-beta-2` is rejected
pub fn to_gem_version(version: &str) -> Result<String, VersionError> {
    if version.is_empty() {
        return Err(VersionError::Empty(version.to_string()));
    }

    let separators = version.matches('-').count();
    match separators {
        0 => Ok(version.to_string()),
        1 => {
            let (release, suffix) = version
                .split_once('-')
                .ok_or_else(|| VersionError::EmptySegment(version.to_string()))?;

            if release.is_empty() || suffix.is_empty() {
                return Err(VersionError::EmptySegment(version.to_string()));
            }
            if suffix.contains('.') {
                return Err(VersionError::DottedSuffix(version.to_string()));
            }

            Ok(format!("{}.{}", release, suffix.to_lowercase()))
        }
        _ => Err(VersionError::TooManySeparators {
            version: version.to_string(),
            separators,
        }),
    }
}

/// A project version, which may be the "unspecified" sentinel
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProjectVersion {
    #[default]
    Unspecified,
    Specified(String),
}

impl ProjectVersion {
    pub fn new(version: impl Into<String>) -> Self {
        let version = version.into();
        if version.is_empty() || version == UNSPECIFIED {
            Self::Unspecified
        } else {
            Self::Specified(version)
        }
    }

    pub fn is_unspecified(&self) -> bool {
        matches!(self, Self::Unspecified)
    }

    /// Returns the raw version string, `unspecified` for the sentinel
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unspecified => UNSPECIFIED,
            Self::Specified(v) => v,
        }
    }

    /// Returns the gem version, or `None` for the sentinel
    pub fn gem_version(&self) -> Result<Option<String>, VersionError> {
        match self {
            Self::Unspecified => Ok(None),
            Self::Specified(v) => to_gem_version(v).map(Some),
        }
    }
}

impl fmt::Display for ProjectVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectVersion {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s.trim()))
    }
}

impl From<String> for ProjectVersion {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<ProjectVersion> for String {
    fn from(version: ProjectVersion) -> Self {
        version.as_str().to_string()
    }
}
