//! Package naming

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::domain::is_file_name;

/// Archive extension for packaged plugins
pub const ARCHIVE_EXTENSION: &str = "tar.gz";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid package name '{0}': it must be a single file name without path separators")]
pub struct InvalidPackageName(pub String);

/// `{name}-{version}-{classifier}`, or `{name}-{classifier}` without a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageName {
    name: String,
    version: Option<String>,
    classifier: String,
}

impl PackageName {
    /// `version` is the already-converted gem version, `None` when the
    /// project version is unspecified
    ///
    /// The rendered name becomes a directory under the destination, so it
    /// has to stay a single path component.
    pub fn new(
        name: impl Into<String>,
        version: Option<String>,
        classifier: impl Into<String>,
    ) -> Result<Self, InvalidPackageName> {
        let package = Self {
            name: name.into(),
            version,
            classifier: classifier.into(),
        };

        let rendered = package.to_string();
        if package.name.trim().is_empty() || package.classifier.is_empty() || !is_file_name(&rendered) {
            return Err(InvalidPackageName(rendered));
        }
        Ok(package)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn classifier(&self) -> &str {
        &self.classifier
    }

    pub fn archive_file_name(&self) -> String {
        format!("{}.{}", self, ARCHIVE_EXTENSION)
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}-{}-{}", self.name, version, self.classifier),
            None => write!(f, "{}-{}", self.name, self.classifier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versioned_name() {
        let name = PackageName::new("embulk-input-example", Some("0.1.0.snapshot".to_string()), "java").unwrap();
        assert_eq!(name.to_string(), "embulk-input-example-0.1.0.snapshot-java");
        assert_eq!(
            name.archive_file_name(),
            "embulk-input-example-0.1.0.snapshot-java.tar.gz"
        );
    }

    #[test]
    fn unspecified_version_is_omitted() {
        let name = PackageName::new("my-plugin", None, "java").unwrap();
        assert_eq!(name.to_string(), "my-plugin-java");
        assert_eq!(name.version(), None);
    }

    #[test]
    fn names_that_leave_the_destination_are_rejected() {
        for (name, version, classifier) in [
            ("../../outside", None, "java"),
            ("a/b", None, "java"),
            ("a\\b", None, "java"),
            ("p", Some("1.0/../../x".to_string()), "java"),
            ("p", None, "../java"),
            ("", None, "java"),
            ("p", None, ""),
        ] {
            assert!(
                PackageName::new(name, version.clone(), classifier).is_err(),
                "{:?} {:?} {:?}",
                name,
                version,
                classifier
            );
        }

        let err = PackageName::new("../x", None, "java").unwrap_err();
        assert_eq!(err, InvalidPackageName("../x-java".to_string()));
    }
}
