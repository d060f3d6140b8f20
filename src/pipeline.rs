//! The packaging pipeline
//!
//! validate descriptor → convert version → flatten runtime → flatten
//! provided → report conflicts → verify lockfile → build manifest →
//! assemble package.
//!
//! Every fatal check runs before the assembler writes anything. The
//! boundary conflict report is only logged.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{
    build_manifest, detect_conflicts, flatten, BuildFacts, ConflictReport, FlattenedSet, GraphSource,
    ManifestBlock, ManifestError, PluginDescriptor, ValidationError, VersionError,
};
use crate::package::{
    assemble, build_timestamp, InvalidPackageName, PackageError, PackageLayout, PackageName, PackageRequest,
};
use crate::storage::{GraphFileError, JsonGraphSource, Lockfile, LockfileError, Project};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Graph(#[from] GraphFileError),

    #[error(transparent)]
    Lockfile(#[from] LockfileError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Name(#[from] InvalidPackageName),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Project(#[from] anyhow::Error),
}

/// Switches for a pipeline run, defaulted from the project configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub archive: bool,
    pub verify_lock: bool,
}

impl PipelineOptions {
    pub fn for_project(project: &Project) -> Self {
        let config = &project.config().project;
        Self {
            archive: config.package.archive,
            verify_lock: config.dependencies.locking,
        }
    }
}

/// Everything a successful run produced
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub descriptor: PluginDescriptor,
    pub gem_version: Option<String>,
    pub runtime: FlattenedSet,
    pub conflicts: ConflictReport,
    pub manifest: ManifestBlock,
    pub package: PackageLayout,
}

/// Pipeline stages bound to one project
pub struct Pipeline<'a> {
    project: &'a Project,
}

impl<'a> Pipeline<'a> {
    pub fn new(project: &'a Project) -> Self {
        Self { project }
    }

    /// Validates the `[plugin]` settings
    pub fn descriptor(&self) -> Result<PluginDescriptor, PipelineError> {
        Ok(self.project.config().project.plugin.descriptor().validate()?)
    }

    /// Converts the project version, `None` when unspecified
    pub fn gem_version(&self) -> Result<Option<String>, PipelineError> {
        Ok(self.project.version().gem_version()?)
    }

    pub fn package_name(&self, gem_version: Option<String>) -> Result<PackageName, PipelineError> {
        Ok(PackageName::new(
            self.project.name()?,
            gem_version,
            self.project.config().project.package.classifier.clone(),
        )?)
    }

    /// Flattens the resolved runtime graph
    pub fn runtime(&self) -> Result<FlattenedSet, PipelineError> {
        let source = JsonGraphSource::new(self.project.runtime_graph());
        Ok(flatten(&source.resolved_graph()?))
    }

    /// Flattens the resolved provided graph, empty when there is none
    pub fn provided(&self) -> Result<FlattenedSet, PipelineError> {
        match self.project.provided_graph() {
            Some(path) => Ok(flatten(&JsonGraphSource::new(path).resolved_graph()?)),
            None => {
                tracing::debug!("no provided graph, skipping boundary check");
                Ok(FlattenedSet::new())
            }
        }
    }

    pub fn conflicts(&self, runtime: &FlattenedSet) -> Result<ConflictReport, PipelineError> {
        let provided = self.provided()?;
        Ok(detect_conflicts(runtime, &provided))
    }

    /// Returns the lockfile matching the current runtime selection
    pub fn lockfile(&self, runtime: &FlattenedSet) -> Lockfile {
        let configuration = &self.project.config().project.dependencies.flat_runtime_configuration;
        Lockfile::from_flattened(configuration.clone(), runtime)
    }

    /// Fails when an existing lockfile disagrees with `runtime`
    pub fn verify_lock(&self, runtime: &FlattenedSet) -> Result<(), PipelineError> {
        let path = self.project.lockfile();
        let configuration = &self.project.config().project.dependencies.flat_runtime_configuration;

        match Lockfile::read(&path, configuration)? {
            Some(locked) => {
                locked.verify(runtime)?;
                tracing::debug!(path = %path.display(), "lockfile matches");
            }
            None => tracing::debug!(path = %path.display(), "no lockfile, skipping verification"),
        }
        Ok(())
    }

    pub fn manifest(&self, descriptor: &PluginDescriptor) -> Result<ManifestBlock, PipelineError> {
        let name = self.project.name()?;
        Ok(build_manifest(
            descriptor,
            BuildFacts {
                project_name: &name,
                version: self.project.version().as_str(),
            },
        )?)
    }

    pub fn main_jar(&self) -> Result<PathBuf, PipelineError> {
        Ok(self.project.main_jar()?)
    }

    /// Runs every stage and assembles the package
    pub fn run(&self, options: PipelineOptions) -> Result<PipelineOutcome, PipelineError> {
        let descriptor = self.descriptor()?;
        let gem_version = self.gem_version()?;
        let name = self.package_name(gem_version.clone())?;

        let runtime = self.runtime()?;
        tracing::debug!(modules = runtime.len(), projects = runtime.projects().len(), "flattened runtime");

        let conflicts = self.conflicts(&runtime)?;
        conflicts.warn();

        if options.verify_lock {
            self.verify_lock(&runtime)?;
        }

        let manifest = self.manifest(&descriptor)?;
        let main_jar = self.main_jar()?;
        let destination = self.project.destination();
        let config = &self.project.config().project;

        let package = assemble(&PackageRequest {
            name,
            main_jar: &main_jar,
            runtime: &runtime,
            descriptor: &descriptor,
            summary: &config.package.summary,
            destination: &destination,
            archive: options.archive,
            built_at: build_timestamp(),
        })?;

        tracing::info!(package = %package.name, path = %package.root.display(), "assembled package");

        Ok(PipelineOutcome {
            descriptor,
            gem_version,
            runtime,
            conflicts,
            manifest,
            package,
        })
    }
}
