//! Plugin package assembly
//!
//! Turns a flattened runtime selection plus the primary jar into a
//! directory Embulk can load, and optionally a `.tar.gz` of it.

mod archive;
mod assembler;
mod metadata;
mod naming;

pub use archive::create_archive;
pub use assembler::{assemble, PackageError, PackageLayout, PackageRequest, LOCK_FILE};
pub use metadata::{build_timestamp, ruby_stub, ruby_stub_path, PackageMetadata, PluginMetadata, PLATFORM};
pub use naming::{InvalidPackageName, PackageName, ARCHIVE_EXTENSION};
