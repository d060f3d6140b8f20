//! Domain models for embulk-plugins
//!
//! Contains the packaging logic without any I/O concerns.

mod conflict;
mod descriptor;
mod flatten;
mod graph;
mod manifest;
mod module;
mod version;

pub use conflict::{detect_conflicts, BoundaryConflict, ConflictReport};
pub(crate) use descriptor::is_file_name;
pub use descriptor::{Category, PluginDescriptor, RawDescriptor, UnknownCategory, ValidationError, Violation};
pub use flatten::{flatten, FlattenedSet};
pub use graph::{DependencyGraph, FirstLevel, GraphError, GraphSource, ModuleId};
pub use manifest::{
    build_manifest, BuildFacts, ManifestBlock, ManifestError, CATEGORY_KEY, IMPLEMENTATION_TITLE_KEY,
    IMPLEMENTATION_VERSION_KEY, MAIN_CLASS_KEY, SPI_VERSION, SPI_VERSION_KEY, TYPE_KEY,
};
pub use module::{ModuleKey, ModuleKeyError, ProjectDependency, ResolvedModule};
pub use version::{to_gem_version, ProjectVersion, VersionError, UNSPECIFIED};
