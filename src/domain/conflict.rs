//! Boundary conflict detection
//!
//! Finds modules that are both shipped with the plugin ("runtime") and
//! supplied by Embulk itself at run time ("provided", a.k.a. compile-only).
//! Shipping a second copy risks classpath and version skew, but some overlap
//! is intentional pinning, so this only informs and never fails.

use std::fmt;

use serde::Serialize;

use super::flatten::FlattenedSet;
use super::module::ModuleKey;

/// A module present on both sides of the boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundaryConflict {
    pub key: ModuleKey,
    pub runtime_version: String,
    pub provided_version: String,
}

impl BoundaryConflict {
    /// Returns the runtime-side `group:name:version`
    pub fn runtime_notation(&self) -> String {
        format!("{}:{}", self.key, self.runtime_version)
    }
}

/// The overlap between a runtime set and a provided set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConflictReport {
    conflicts: Vec<BoundaryConflict>,
}

impl ConflictReport {
    pub fn conflicts(&self) -> &[BoundaryConflict] {
        &self.conflicts
    }

    pub fn keys(&self) -> impl Iterator<Item = &ModuleKey> {
        self.conflicts.iter().map(|c| &c.key)
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    /// Emits the report on the warning log channel, if there is anything to say
    pub fn warn(&self) {
        if !self.is_empty() {
            tracing::warn!("\n{}", self);
        }
    }
}

const RULE: &str =
    "============================================ WARNING ============================================";
const RULE_END: &str =
    "=================================================================================================";

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }

        writeln!(f, "{}", RULE)?;
        writeln!(
            f,
            "Following \"runtime\" dependencies are included also in \"provided\" dependencies."
        )?;
        writeln!(f)?;
        for conflict in &self.conflicts {
            writeln!(f, "  \"{}\"", conflict.runtime_notation())?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "  \"provided\" dependencies represent Embulk's core, supplied at run time."
        )?;
        writeln!(
            f,
            "  Exclude them from the runtime dependencies of the plugin, for example:"
        )?;
        writeln!(f)?;
        writeln!(f, "    implementation(\"org.glassfish.jersey.core:jersey-client:2.25.1\") {{")?;
        writeln!(f, "      exclude group: \"javax.inject\", module: \"javax.inject\"")?;
        writeln!(f, "    }}")?;
        write!(f, "{}", RULE_END)
    }
}

/// Reports every runtime module whose key is also provided
///
/// Order follows the runtime set. Never fails: an overlap is a smell, not an
/// error.
pub fn detect_conflicts(runtime: &FlattenedSet, provided: &FlattenedSet) -> ConflictReport {
    let conflicts = runtime
        .modules()
        .iter()
        .filter_map(|module| {
            provided.get(&module.key).map(|other| BoundaryConflict {
                key: module.key.clone(),
                runtime_version: module.version.clone(),
                provided_version: other.version.clone(),
            })
        })
        .collect();

    ConflictReport { conflicts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::module::ResolvedModule;

    fn set(modules: &[(&str, &str, &str)]) -> FlattenedSet {
        let mut set = FlattenedSet::new();
        for (group, name, version) in modules {
            set.insert(ResolvedModule::new(ModuleKey::new(*group, *name).unwrap(), *version));
        }
        set
    }

    #[test]
    fn disjoint_sets_report_nothing() {
        let runtime = set(&[("g", "a", "1"), ("g", "b", "1")]);
        let provided = set(&[("org.embulk", "embulk-spi", "0.11")]);

        let report = detect_conflicts(&runtime, &provided);
        assert!(report.is_empty());
        assert_eq!(report.to_string(), "");
    }

    #[test]
    fn empty_provided_set_reports_nothing() {
        let runtime = set(&[("g", "a", "1")]);
        assert!(detect_conflicts(&runtime, &FlattenedSet::new()).is_empty());
    }

    #[test]
    fn overlap_names_exactly_the_shared_keys() {
        let runtime = set(&[
            ("g", "a", "1"),
            ("javax.inject", "javax.inject", "1"),
            ("g", "b", "1"),
            ("org.slf4j", "slf4j-api", "1.7.30"),
        ]);
        let provided = set(&[
            ("org.slf4j", "slf4j-api", "2.0.9"),
            ("org.embulk", "embulk-spi", "0.11"),
            ("javax.inject", "javax.inject", "1"),
        ]);

        let report = detect_conflicts(&runtime, &provided);

        let keys: Vec<_> = report.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["javax.inject:javax.inject", "org.slf4j:slf4j-api"]);

        let slf4j = &report.conflicts()[1];
        assert_eq!(slf4j.runtime_version, "1.7.30");
        assert_eq!(slf4j.provided_version, "2.0.9");
    }

    #[test]
    fn report_text_is_delimited_and_lists_modules() {
        let runtime = set(&[("javax.inject", "javax.inject", "1")]);
        let provided = set(&[("javax.inject", "javax.inject", "1")]);

        let text = detect_conflicts(&runtime, &provided).to_string();

        assert!(text.starts_with(RULE));
        assert!(text.ends_with(RULE_END));
        assert!(text.contains("  \"javax.inject:javax.inject:1\"\n"));
    }
}
