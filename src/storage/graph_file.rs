//! JSON graph documents
//!
//! The external resolver writes each resolved configuration (runtime,
//! provided) as a JSON document. [`JsonGraphSource`] turns one into a
//! [`DependencyGraph`].
//!
//! ```json
//! {
//!   "modules": [
//!     { "id": "jersey", "group": "org.glassfish.jersey.core", "name": "jersey-client",
//!       "version": "2.25.1", "artifacts": ["jars/jersey-client-2.25.1.jar"],
//!       "children": ["inject"] }
//!   ],
//!   "first_level": [
//!     { "module": "jersey" },
//!     { "project": ":subproject-a", "artifacts": ["subproject-a/build/libs/a.jar"] }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    DependencyGraph, GraphError, GraphSource, ModuleId, ModuleKey, ProjectDependency, ResolvedModule,
};

#[derive(Debug, Error)]
pub enum GraphFileError {
    #[error("Failed to read dependency graph {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse dependency graph {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid dependency graph {path}")]
    Graph {
        path: PathBuf,
        #[source]
        source: GraphError,
    },
}

/// Serialized form of a resolved graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphDocument {
    #[serde(default)]
    pub modules: Vec<ModuleEntry>,

    #[serde(default)]
    pub first_level: Vec<FirstLevelEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub id: String,
    pub group: String,
    pub name: String,
    pub version: String,

    #[serde(default)]
    pub artifacts: Vec<PathBuf>,

    #[serde(default)]
    pub children: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FirstLevelEntry {
    Module {
        module: String,
    },
    Project {
        project: String,
        #[serde(default)]
        artifacts: Vec<PathBuf>,
    },
}

impl GraphDocument {
    /// Parses a document from JSON text
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Builds the graph, resolving relative artifact paths against `base`
    pub fn into_graph(self, base: &Path) -> Result<DependencyGraph, GraphError> {
        let mut graph = DependencyGraph::new();
        let mut ids: HashMap<String, ModuleId> = HashMap::new();

        for entry in &self.modules {
            if ids.contains_key(&entry.id) {
                return Err(GraphError::DuplicateModule(entry.id.clone()));
            }

            let key = ModuleKey::new(entry.group.clone(), entry.name.clone())?;
            let module = entry
                .artifacts
                .iter()
                .fold(ResolvedModule::new(key, entry.version.clone()), |module, path| {
                    module.with_artifact(resolve(base, path))
                });

            ids.insert(entry.id.clone(), graph.add_module(module));
        }

        let lookup = |id: &str| {
            ids.get(id)
                .copied()
                .ok_or_else(|| GraphError::UnknownModule(id.to_string()))
        };

        for entry in &self.modules {
            let parent = lookup(&entry.id)?;
            for child in &entry.children {
                graph.add_child(parent, lookup(child)?)?;
            }
        }

        for entry in self.first_level {
            match entry {
                FirstLevelEntry::Module { module } => graph.add_first_level(lookup(&module)?)?,
                FirstLevelEntry::Project { project, artifacts } => {
                    let dependency = artifacts
                        .iter()
                        .fold(ProjectDependency::new(project), |dep, path| {
                            dep.with_artifact(resolve(base, path))
                        });
                    graph.add_project(dependency);
                }
            }
        }

        Ok(graph)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Reads a resolved graph from a JSON document on disk
#[derive(Debug, Clone)]
pub struct JsonGraphSource {
    path: PathBuf,
}

impl JsonGraphSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GraphSource for JsonGraphSource {
    type Error = GraphFileError;

    fn resolved_graph(&self) -> Result<DependencyGraph, Self::Error> {
        let content = fs::read_to_string(&self.path).map_err(|source| GraphFileError::Io {
            path: self.path.clone(),
            source,
        })?;

        let document = GraphDocument::from_json(&content).map_err(|source| GraphFileError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let base = self.path.parent().unwrap_or_else(|| Path::new("."));
        let graph = document
            .into_graph(base)
            .map_err(|source| GraphFileError::Graph {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(
            path = %self.path.display(),
            modules = graph.len(),
            first_level = graph.first_level().len(),
            "loaded dependency graph"
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{flatten, FirstLevel};
    use tempfile::TempDir;

    const DOCUMENT: &str = r#"{
  "modules": [
    { "id": "jersey", "group": "org.glassfish.jersey.core", "name": "jersey-client",
      "version": "2.25.1", "artifacts": ["jars/jersey-client-2.25.1.jar"],
      "children": ["inject"] },
    { "id": "inject", "group": "javax.inject", "name": "javax.inject",
      "version": "1", "artifacts": ["jars/javax.inject-1.jar"] }
  ],
  "first_level": [
    { "module": "jersey" },
    { "project": ":subproject-a", "artifacts": ["subproject-a/build/libs/subproject-a.jar"] }
  ]
}"#;

    #[test]
    fn builds_graph_from_document() {
        let graph = GraphDocument::from_json(DOCUMENT)
            .unwrap()
            .into_graph(Path::new("/deps"))
            .unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.first_level().len(), 2);
        assert!(matches!(graph.first_level()[1], FirstLevel::Project(ref p) if p.path == ":subproject-a"));

        let set = flatten(&graph);
        let notations: Vec<_> = set.modules().iter().map(|m| m.notation()).collect();
        assert_eq!(
            notations,
            vec!["org.glassfish.jersey.core:jersey-client:2.25.1", "javax.inject:javax.inject:1"]
        );

        let artifacts: Vec<_> = set.artifacts().map(Path::to_path_buf).collect();
        assert_eq!(
            artifacts,
            vec![
                PathBuf::from("/deps/jars/jersey-client-2.25.1.jar"),
                PathBuf::from("/deps/jars/javax.inject-1.jar"),
                PathBuf::from("/deps/subproject-a/build/libs/subproject-a.jar"),
            ]
        );
    }

    #[test]
    fn rejects_unknown_child() {
        let doc = r#"{"modules": [{"id": "a", "group": "g", "name": "a", "version": "1", "children": ["b"]}]}"#;
        let err = GraphDocument::from_json(doc)
            .unwrap()
            .into_graph(Path::new("."))
            .unwrap_err();
        assert_eq!(err, GraphError::UnknownModule("b".to_string()));
    }

    #[test]
    fn rejects_unknown_first_level() {
        let doc = r#"{"first_level": [{"module": "missing"}]}"#;
        let err = GraphDocument::from_json(doc)
            .unwrap()
            .into_graph(Path::new("."))
            .unwrap_err();
        assert_eq!(err, GraphError::UnknownModule("missing".to_string()));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let doc = r#"{"modules": [
            {"id": "a", "group": "g", "name": "a", "version": "1"},
            {"id": "a", "group": "g", "name": "b", "version": "1"}
        ]}"#;
        let err = GraphDocument::from_json(doc)
            .unwrap()
            .into_graph(Path::new("."))
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateModule("a".to_string()));
    }

    #[test]
    fn rejects_module_without_identity() {
        let doc = r#"{"modules": [{"id": "a", "group": "", "name": "a", "version": "1"}]}"#;
        let err = GraphDocument::from_json(doc)
            .unwrap()
            .into_graph(Path::new("."))
            .unwrap_err();
        assert!(matches!(err, GraphError::MissingIdentity(_)));
    }

    #[test]
    fn source_reads_relative_to_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("runtime.json");
        fs::write(&path, DOCUMENT).unwrap();

        let graph = JsonGraphSource::new(&path).resolved_graph().unwrap();
        let set = flatten(&graph);
        assert_eq!(
            set.modules()[0].artifacts,
            vec![dir.path().join("jars/jersey-client-2.25.1.jar")]
        );
    }

    #[test]
    fn source_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = JsonGraphSource::new(dir.path().join("nope.json"))
            .resolved_graph()
            .unwrap_err();
        assert!(matches!(err, GraphFileError::Io { .. }));
    }

    #[test]
    fn source_reports_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("runtime.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonGraphSource::new(&path).resolved_graph().unwrap_err();
        assert!(matches!(err, GraphFileError::Parse { .. }));
    }
}
