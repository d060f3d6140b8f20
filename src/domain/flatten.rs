//! Dependency flattening
//!
//! Collapses a resolved dependency graph into a single-level list where
//! every `group:name` appears once. The result is what gets shipped in the
//! plugin's classpath and what is written to the lockfile.
//!
//! # Deduplication policy
//!
//! **The first module encountered for a key wins.** The walk is depth-first,
//! first-level dependencies in declaration order, children in declaration
//! order. When a key shows up again, possibly with another version, the later
//! occurrence is dropped together with its subtree. There is no version
//! reconciliation and no warning about the divergence.
//!
//! This mirrors what plugin builds have always produced, so it is kept as-is.
//! Changing it (e.g. to "highest version wins") changes which jars ship.
//!
//! # Workspace projects
//!
//! A first-level dependency on another project of the same workspace is not
//! addressable as `group:name:version`. Its artifacts are delivered directly
//! and its own transitive dependencies are **not** followed.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::graph::{DependencyGraph, FirstLevel, ModuleId};
use super::module::{ModuleKey, ProjectDependency, ResolvedModule};

/// A deduplicated, deterministic set of modules keyed by `group:name`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlattenedSet {
    /// Modules in first-visit order
    modules: Vec<ResolvedModule>,

    /// Workspace projects delivered as-is
    projects: Vec<ProjectDependency>,

    #[serde(skip)]
    index: HashMap<ModuleKey, usize>,
}

impl FlattenedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a module unless its key is already present
    ///
    /// Returns false (and keeps the existing entry) on a repeated key.
    pub fn insert(&mut self, module: ResolvedModule) -> bool {
        if self.index.contains_key(&module.key) {
            return false;
        }
        self.index.insert(module.key.clone(), self.modules.len());
        self.modules.push(module);
        true
    }

    /// Adds a workspace project's artifacts to the delivery list
    pub fn add_project(&mut self, project: ProjectDependency) {
        self.projects.push(project);
    }

    pub fn get(&self, key: &ModuleKey) -> Option<&ResolvedModule> {
        self.index.get(key).map(|&i| &self.modules[i])
    }

    pub fn contains(&self, key: &ModuleKey) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the modules in first-visit order
    pub fn modules(&self) -> &[ResolvedModule] {
        &self.modules
    }

    /// Returns the workspace projects delivered directly
    pub fn projects(&self) -> &[ProjectDependency] {
        &self.projects
    }

    pub fn keys(&self) -> impl Iterator<Item = &ModuleKey> {
        self.modules.iter().map(|m| &m.key)
    }

    /// Returns every artifact to deliver: modules first, then projects
    pub fn artifacts(&self) -> impl Iterator<Item = &Path> {
        self.modules
            .iter()
            .flat_map(|m| m.artifacts.iter())
            .chain(self.projects.iter().flat_map(|p| p.artifacts.iter()))
            .map(PathBuf::as_path)
    }

    /// Returns the number of modules (projects are not counted)
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty() && self.projects.is_empty()
    }
}

/// Flattens every module reachable from the graph's first-level dependencies
pub fn flatten(graph: &DependencyGraph) -> FlattenedSet {
    let mut flattener = Flattener::new(graph);

    for entry in graph.first_level() {
        match entry {
            FirstLevel::Module(id) => flattener.walk(*id),
            FirstLevel::Project(project) => {
                tracing::debug!(project = %project.path, "delivering workspace project artifacts directly");
                flattener.set.add_project(project.clone());
            }
        }
    }

    flattener.set
}

/// Traversal state for a single [`flatten`] call
struct Flattener<'g> {
    graph: &'g DependencyGraph,
    visited: HashSet<ModuleKey>,
    set: FlattenedSet,
}

impl<'g> Flattener<'g> {
    fn new(graph: &'g DependencyGraph) -> Self {
        Self {
            graph,
            visited: HashSet::new(),
            set: FlattenedSet::new(),
        }
    }

    /// Depth-first, pre-order walk from `root`
    ///
    /// Uses an explicit stack with the visited check on pop, which yields the
    /// same order as the recursive walk without bounding depth by the call
    /// stack.
    fn walk(&mut self, root: ModuleId) {
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            let Some(module) = self.graph.module(id) else {
                continue;
            };

            if !self.visited.insert(module.key.clone()) {
                tracing::trace!(module = %module, "key already flattened, skipping");
                continue;
            }

            self.set.insert(module.clone());
            stack.extend(self.graph.children(id).into_iter().rev());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn module(name: &str, version: &str) -> ResolvedModule {
        ResolvedModule::new(ModuleKey::new("g", name).unwrap(), version)
            .with_artifact(format!("{}-{}.jar", name, version))
    }

    fn key(name: &str) -> ModuleKey {
        ModuleKey::new("g", name).unwrap()
    }

    fn names(set: &FlattenedSet) -> Vec<String> {
        set.modules().iter().map(|m| m.notation()).collect()
    }

    #[test]
    fn empty_graph_flattens_to_empty_set() {
        let set = flatten(&DependencyGraph::new());
        assert!(set.is_empty());
    }

    #[test]
    fn transitive_modules_are_collected_depth_first() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_module(module("a", "1"));
        let b = graph.add_module(module("b", "1"));
        let c = graph.add_module(module("c", "1"));
        let d = graph.add_module(module("d", "1"));
        graph.add_child(a, b).unwrap();
        graph.add_child(b, c).unwrap();
        graph.add_child(a, d).unwrap();
        graph.add_first_level(a).unwrap();

        let set = flatten(&graph);
        assert_eq!(names(&set), vec!["g:a:1", "g:b:1", "g:c:1", "g:d:1"]);
    }

    #[test]
    fn diamond_keeps_first_visited_version() {
        // a -> x:1, b -> x:2; a is declared first so x:1 wins
        let mut graph = DependencyGraph::new();
        let a = graph.add_module(module("a", "1"));
        let b = graph.add_module(module("b", "1"));
        let x1 = graph.add_module(module("x", "1"));
        let x2 = graph.add_module(module("x", "2"));
        graph.add_child(a, x1).unwrap();
        graph.add_child(b, x2).unwrap();
        graph.add_first_level(a).unwrap();
        graph.add_first_level(b).unwrap();

        let set = flatten(&graph);
        assert_eq!(set.get(&key("x")).unwrap().version, "1");
        assert_eq!(set.len(), 3);

        // Swap the declaration order and the other version wins
        let mut graph = DependencyGraph::new();
        let a = graph.add_module(module("a", "1"));
        let b = graph.add_module(module("b", "1"));
        let x1 = graph.add_module(module("x", "1"));
        let x2 = graph.add_module(module("x", "2"));
        graph.add_child(a, x1).unwrap();
        graph.add_child(b, x2).unwrap();
        graph.add_first_level(b).unwrap();
        graph.add_first_level(a).unwrap();

        let set = flatten(&graph);
        assert_eq!(set.get(&key("x")).unwrap().version, "2");
    }

    #[test]
    fn superseded_module_subtree_is_not_walked() {
        // x:2 is superseded by x:1, so its child y is never reached
        let mut graph = DependencyGraph::new();
        let x1 = graph.add_module(module("x", "1"));
        let x2 = graph.add_module(module("x", "2"));
        let y = graph.add_module(module("y", "1"));
        graph.add_child(x2, y).unwrap();
        graph.add_first_level(x1).unwrap();
        graph.add_first_level(x2).unwrap();

        let set = flatten(&graph);
        assert_eq!(names(&set), vec!["g:x:1"]);
    }

    #[test]
    fn cycles_terminate() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_module(module("a", "1"));
        let b = graph.add_module(module("b", "1"));
        graph.add_child(a, b).unwrap();
        graph.add_child(b, a).unwrap();
        graph.add_child(b, b).unwrap();
        graph.add_first_level(a).unwrap();

        let set = flatten(&graph);
        assert_eq!(names(&set), vec!["g:a:1", "g:b:1"]);
    }

    #[test]
    fn workspace_project_delivers_own_artifacts_only() {
        let mut graph = DependencyGraph::new();
        let ext = graph.add_module(module("ext", "1"));
        graph.add_first_level(ext).unwrap();
        graph.add_project(ProjectDependency::new(":sub").with_artifact("sub/build/libs/sub.jar"));

        let set = flatten(&graph);

        assert_eq!(set.len(), 1);
        assert_eq!(set.projects().len(), 1);
        let artifacts: Vec<_> = set.artifacts().collect();
        assert_eq!(
            artifacts,
            vec![Path::new("ext-1.jar"), Path::new("sub/build/libs/sub.jar")]
        );
    }

    #[test]
    fn insert_rejects_repeated_key() {
        let mut set = FlattenedSet::new();
        assert!(set.insert(module("a", "1")));
        assert!(!set.insert(module("a", "2")));
        assert_eq!(set.get(&key("a")).unwrap().version, "1");
    }

    #[test]
    fn flattening_is_deterministic() {
        let mut graph = DependencyGraph::new();
        let ids: Vec<_> = (0..20)
            .map(|i| graph.add_module(module(&format!("m{}", i % 7), &i.to_string())))
            .collect();
        for i in 1..ids.len() {
            graph.add_child(ids[i / 2], ids[i]).unwrap();
        }
        graph.add_first_level(ids[0]).unwrap();

        assert_eq!(flatten(&graph), flatten(&graph));
    }

    proptest! {
        #[test]
        fn keys_are_unique(
            names in prop::collection::vec(0u8..6, 1..24),
            edges in prop::collection::vec((0usize..24, 0usize..24), 0..48),
            roots in prop::collection::vec(0usize..24, 1..4),
        ) {
            let mut graph = DependencyGraph::new();
            let ids: Vec<_> = names
                .iter()
                .enumerate()
                .map(|(i, n)| graph.add_module(module(&format!("m{}", n), &i.to_string())))
                .collect();
            for (from, to) in edges {
                graph.add_child(ids[from % ids.len()], ids[to % ids.len()]).unwrap();
            }
            for root in roots {
                graph.add_first_level(ids[root % ids.len()]).unwrap();
            }

            let set = flatten(&graph);

            let unique: HashSet<_> = set.keys().collect();
            prop_assert_eq!(unique.len(), set.len());
        }

        #[test]
        fn every_reachable_module_is_present_when_keys_are_distinct(
            size in 1usize..24,
            edges in prop::collection::vec((0usize..24, 0usize..24), 0..48),
            roots in prop::collection::vec(0usize..24, 1..4),
        ) {
            let mut graph = DependencyGraph::new();
            let ids: Vec<_> = (0..size)
                .map(|i| graph.add_module(module(&format!("m{}", i), "1")))
                .collect();
            for (from, to) in edges {
                graph.add_child(ids[from % size], ids[to % size]).unwrap();
            }
            for root in roots {
                graph.add_first_level(ids[root % size]).unwrap();
            }

            let set = flatten(&graph);

            let mut stack: Vec<_> = graph
                .first_level()
                .iter()
                .filter_map(|f| match f {
                    FirstLevel::Module(id) => Some(*id),
                    FirstLevel::Project(_) => None,
                })
                .collect();
            let mut seen = HashSet::new();
            while let Some(id) = stack.pop() {
                if !seen.insert(id) {
                    continue;
                }
                prop_assert!(set.contains(&graph.module(id).unwrap().key));
                stack.extend(graph.children(id));
            }
            prop_assert_eq!(seen.len(), set.len());
        }
    }
}
