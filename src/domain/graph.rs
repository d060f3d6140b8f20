//! Resolved dependency graph
//!
//! A plain, immutable view of what an external resolver produced: modules
//! connected by child edges, plus the ordered list of first-level
//! dependencies. Uses petgraph for storage.
//!
//! The graph may contain diamonds (a module reachable through several
//! parents) and is not required to be acyclic. Consumers that walk it must
//! tolerate revisits.

use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

use super::module::{ModuleKeyError, ProjectDependency, ResolvedModule};

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Module without identity: {0}")]
    MissingIdentity(#[from] ModuleKeyError),

    #[error("Unknown module reference: {0}")]
    UnknownModule(String),

    #[error("Duplicate module reference: {0}")]
    DuplicateModule(String),
}

/// Handle to a module inside a [`DependencyGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(NodeIndex);

/// A first-level dependency of the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirstLevel {
    /// An externally published module, flattened by key
    Module(ModuleId),

    /// Another build unit of the same workspace
    Project(ProjectDependency),
}

/// Capability to produce a resolved graph at the system boundary
///
/// Implemented by adapters over whatever the resolver emits (see
/// `storage::JsonGraphSource`). Everything downstream works on the returned
/// [`DependencyGraph`] and never talks to the resolver again.
pub trait GraphSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Produces the resolved graph, whose [`DependencyGraph::first_level`]
    /// lists the first-level modules in declaration order
    fn resolved_graph(&self) -> Result<DependencyGraph, Self::Error>;
}

/// A resolved dependency graph
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Edges point from parent to child
    graph: DiGraph<ResolvedModule, ()>,

    /// First-level dependencies in declaration order
    first_level: Vec<FirstLevel>,
}

impl DependencyGraph {
    /// Creates an empty graph
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            first_level: Vec::new(),
        }
    }

    /// Adds a module node
    ///
    /// Two nodes may share a key (typically with different versions); that is
    /// exactly the situation flattening has to settle.
    pub fn add_module(&mut self, module: ResolvedModule) -> ModuleId {
        ModuleId(self.graph.add_node(module))
    }

    /// Adds a child edge: `parent` depends on `child`
    ///
    /// Children are walked in the order their edges were added.
    pub fn add_child(&mut self, parent: ModuleId, child: ModuleId) -> Result<(), GraphError> {
        self.require(parent)?;
        self.require(child)?;
        self.graph.add_edge(parent.0, child.0, ());
        Ok(())
    }

    /// Declares a module as a first-level dependency
    pub fn add_first_level(&mut self, module: ModuleId) -> Result<(), GraphError> {
        self.require(module)?;
        self.first_level.push(FirstLevel::Module(module));
        Ok(())
    }

    /// Declares a workspace project as a first-level dependency
    pub fn add_project(&mut self, project: ProjectDependency) {
        self.first_level.push(FirstLevel::Project(project));
    }

    fn require(&self, id: ModuleId) -> Result<(), GraphError> {
        if self.graph.node_weight(id.0).is_some() {
            Ok(())
        } else {
            Err(GraphError::UnknownModule(format!("#{}", id.0.index())))
        }
    }

    /// Returns the first-level dependencies in declaration order
    pub fn first_level(&self) -> &[FirstLevel] {
        &self.first_level
    }

    /// Returns the module behind a handle
    pub fn module(&self, id: ModuleId) -> Option<&ResolvedModule> {
        self.graph.node_weight(id.0)
    }

    /// Returns the direct children of a module, in edge insertion order
    pub fn children(&self, id: ModuleId) -> Vec<ModuleId> {
        // petgraph lists the most recently added edge first
        let mut children: Vec<_> = self.graph.neighbors(id.0).map(ModuleId).collect();
        children.reverse();
        children
    }

    /// Returns the number of module nodes
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns true if the graph has no module nodes and no first-level entries
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0 && self.first_level.is_empty()
    }
}

impl GraphSource for DependencyGraph {
    type Error = std::convert::Infallible;

    fn resolved_graph(&self) -> Result<DependencyGraph, Self::Error> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::module::ModuleKey;

    fn module(group: &str, name: &str, version: &str) -> ResolvedModule {
        ResolvedModule::new(ModuleKey::new(group, name).unwrap(), version)
    }

    #[test]
    fn empty_graph() {
        let graph = DependencyGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
        assert!(graph.first_level().is_empty());
    }

    #[test]
    fn add_modules_and_children() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_module(module("g", "a", "1"));
        let b = graph.add_module(module("g", "b", "1"));
        let c = graph.add_module(module("g", "c", "1"));

        graph.add_child(a, b).unwrap();
        graph.add_child(a, c).unwrap();
        graph.add_first_level(a).unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.children(a), vec![b, c]);
        assert!(graph.children(b).is_empty());
        assert_eq!(graph.first_level(), &[FirstLevel::Module(a)]);
    }

    #[test]
    fn cycles_are_representable() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_module(module("g", "a", "1"));
        let b = graph.add_module(module("g", "b", "1"));

        graph.add_child(a, b).unwrap();
        graph.add_child(b, a).unwrap();

        assert_eq!(graph.children(b), vec![a]);
    }

    #[test]
    fn unknown_module_rejected() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_module(module("g", "a", "1"));

        let mut other = DependencyGraph::new();
        other.add_module(module("g", "x", "1"));
        let stray = other.add_module(module("g", "y", "1"));

        assert!(matches!(
            graph.add_child(a, stray),
            Err(GraphError::UnknownModule(_))
        ));
        assert!(matches!(
            graph.add_first_level(stray),
            Err(GraphError::UnknownModule(_))
        ));
    }

    #[test]
    fn projects_keep_declaration_order() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_module(module("g", "a", "1"));

        graph.add_project(ProjectDependency::new(":sub"));
        graph.add_first_level(a).unwrap();

        assert!(matches!(graph.first_level()[0], FirstLevel::Project(_)));
        assert_eq!(graph.first_level()[1], FirstLevel::Module(a));
    }

    #[test]
    fn graph_is_its_own_source() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_module(module("g", "a", "1"));
        graph.add_first_level(a).unwrap();

        let resolved = graph.resolved_graph().unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.first_level().len(), 1);
    }
}
