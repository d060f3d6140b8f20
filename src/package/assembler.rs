//! Package assembly
//!
//! Lays out a plugin package:
//!
//! ```text
//! embulk-input-example-0.1.0-java/
//! ├── classpath/              # primary jar + every flattened artifact, flat
//! ├── lib/embulk/input/example.rb
//! └── metadata.yml
//! ```
//!
//! The package is built in a staging directory inside the destination and
//! renamed into place at the end, so a failure never leaves a half-written
//! package behind. Concurrent assemblies into one destination are
//! serialized with an exclusive lock on `.embulk-plugins.lock`.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

use super::archive::create_archive;
use super::metadata::{ruby_stub, ruby_stub_path, PackageMetadata};
use super::naming::PackageName;
use crate::domain::{FlattenedSet, PluginDescriptor};

/// Lock file guarding a destination directory
pub const LOCK_FILE: &str = ".embulk-plugins.lock";

const CLASSPATH_DIR: &str = "classpath";
const METADATA_FILE: &str = "metadata.yml";

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Artifact not found: {0}")]
    MissingArtifact(PathBuf),

    #[error("Artifact has no file name: {0}")]
    InvalidArtifact(PathBuf),

    #[error("Failed to lock destination {path}")]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize package metadata")]
    Metadata(#[from] serde_yaml::Error),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> PackageError + '_ {
    move |source| PackageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Everything needed to assemble one package
#[derive(Debug)]
pub struct PackageRequest<'a> {
    pub name: PackageName,
    pub main_jar: &'a Path,
    pub runtime: &'a FlattenedSet,
    pub descriptor: &'a PluginDescriptor,
    pub summary: &'a str,
    pub destination: &'a Path,
    pub archive: bool,
    pub built_at: DateTime<Utc>,
}

/// Where an assembled package ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageLayout {
    pub name: String,
    pub root: PathBuf,

    /// File names in `classpath/`, in copy order
    pub classpath: Vec<String>,

    pub ruby_stub: PathBuf,
    pub metadata: PathBuf,
    pub archive: Option<PathBuf>,
}

/// Assembles the package described by `request`
///
/// All inputs are checked before anything is written.
pub fn assemble(request: &PackageRequest<'_>) -> Result<PackageLayout, PackageError> {
    let sources: Vec<&Path> = std::iter::once(request.main_jar)
        .chain(request.runtime.artifacts())
        .collect();

    for source in &sources {
        if !source.is_file() {
            return Err(PackageError::MissingArtifact(source.to_path_buf()));
        }
        if source.file_name().is_none() {
            return Err(PackageError::InvalidArtifact(source.to_path_buf()));
        }
    }

    let destination = request.destination;
    fs::create_dir_all(destination).map_err(io_error(destination))?;

    let lock_path = destination.join(LOCK_FILE);
    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(io_error(&lock_path))?;
    lock.lock_exclusive().map_err(|source| PackageError::Lock {
        path: destination.to_path_buf(),
        source,
    })?;

    let package_name = request.name.to_string();
    tracing::debug!(package = %package_name, destination = %destination.display(), "assembling package");

    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(destination)
        .map_err(io_error(destination))?;

    let mut files = Vec::new();
    let classpath = copy_classpath(staging.path(), &sources)?;
    files.extend(classpath.iter().map(|name| format!("{}/{}", CLASSPATH_DIR, name)));

    let stub_path = ruby_stub_path(request.descriptor);
    let stub_file = staging.path().join(&stub_path);
    if let Some(parent) = stub_file.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    fs::write(&stub_file, ruby_stub(request.descriptor)).map_err(io_error(&stub_file))?;
    files.push(stub_path.clone());

    let metadata = PackageMetadata::new(
        &request.name,
        request.descriptor,
        request.summary,
        request.built_at,
        files,
    );
    let metadata_file = staging.path().join(METADATA_FILE);
    fs::write(&metadata_file, metadata.to_yaml()?).map_err(io_error(&metadata_file))?;

    // The archive is packed from staging, so a failure here leaves the
    // previous package untouched
    let staged_archive = if request.archive {
        Some(stage_archive(destination, &request.name, staging.path())?)
    } else {
        None
    };

    let root = destination.join(&package_name);
    if root.exists() {
        tracing::debug!(path = %root.display(), "replacing previous package");
        fs::remove_dir_all(&root).map_err(io_error(&root))?;
    }
    fs::rename(staging.path(), &root).map_err(io_error(&root))?;

    let archive = match staged_archive {
        Some(temp) => match persist_archive(destination, &request.name, temp) {
            Ok(path) => Some(path),
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&root) {
                    tracing::warn!(path = %root.display(), error = %cleanup, "failed to remove package");
                }
                return Err(e);
            }
        },
        None => None,
    };

    // Lock is released when the file is dropped
    drop(lock);

    Ok(PackageLayout {
        name: package_name,
        ruby_stub: root.join(&stub_path),
        metadata: root.join(METADATA_FILE),
        root,
        classpath,
        archive,
    })
}

/// Copies every source into `classpath/`; a later file of the same name
/// overwrites an earlier one
fn copy_classpath(staging: &Path, sources: &[&Path]) -> Result<Vec<String>, PackageError> {
    let dir = staging.join(CLASSPATH_DIR);
    fs::create_dir_all(&dir).map_err(io_error(&dir))?;

    let mut names: Vec<String> = Vec::new();
    for source in sources {
        let file_name = source
            .file_name()
            .ok_or_else(|| PackageError::InvalidArtifact(source.to_path_buf()))?;
        let target = dir.join(file_name);

        fs::copy(source, &target).map_err(io_error(source))?;
        tracing::trace!(from = %source.display(), "copied into classpath");

        let name = file_name.to_string_lossy().into_owned();
        if !names.contains(&name) {
            names.push(name);
        }
    }

    Ok(names)
}

/// Packs `dir` under the package name into a temp file in `destination`
fn stage_archive(destination: &Path, name: &PackageName, dir: &Path) -> Result<NamedTempFile, PackageError> {
    let temp = tempfile::Builder::new()
        .prefix(".archive-")
        .tempfile_in(destination)
        .map_err(io_error(destination))?;

    create_archive(temp.path(), dir, &name.to_string()).map_err(io_error(temp.path()))?;
    Ok(temp)
}

fn persist_archive(destination: &Path, name: &PackageName, temp: NamedTempFile) -> Result<PathBuf, PackageError> {
    let path = destination.join(name.archive_file_name());
    temp.persist(&path).map_err(|e| PackageError::Io {
        path: path.clone(),
        source: e.error,
    })?;

    tracing::debug!(path = %path.display(), "wrote package archive");
    Ok(path)
}
