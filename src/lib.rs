//! embulk-plugins - packages Java plugins for Embulk
//!
//! Flattens the resolved runtime dependency graph into a single classpath,
//! warns about modules Embulk already provides, derives the plugin manifest
//! and assembles a loadable package.

pub mod cli;
pub mod domain;
pub mod package;
pub mod pipeline;
pub mod storage;

pub use domain::{
    build_manifest, detect_conflicts, flatten, to_gem_version, Category, ConflictReport, DependencyGraph,
    FlattenedSet, GraphSource, ManifestBlock, ModuleKey, PluginDescriptor, ResolvedModule,
};
pub use pipeline::{Pipeline, PipelineError, PipelineOptions, PipelineOutcome};
