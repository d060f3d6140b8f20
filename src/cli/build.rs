//! Build commands: manifest, version, package

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::app::open_project;
use super::output::Output;
use crate::domain::to_gem_version;
use crate::pipeline::{Pipeline, PipelineOptions};

pub fn manifest(output: &Output, project_dir: Option<&Path>, file: Option<&Path>) -> Result<()> {
    let project = open_project(project_dir)?;
    let pipeline = Pipeline::new(&project);

    let descriptor = pipeline.descriptor()?;
    let manifest = pipeline.manifest(&descriptor)?;

    if let Some(file) = file {
        if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(file, manifest.render())
            .with_context(|| format!("Failed to write manifest: {}", file.display()))?;
        output.success(&format!("Wrote {}", file.display()));
        return Ok(());
    }

    if output.is_json() {
        let attributes: serde_json::Map<String, serde_json::Value> = manifest
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        output.data(&attributes);
    } else {
        for (key, value) in manifest.iter() {
            output.line(&format!("{}: {}", key, value));
        }
    }
    Ok(())
}

pub fn version(output: &Output, version: &str) -> Result<()> {
    let gem_version = to_gem_version(version)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "version": version,
            "gem_version": gem_version,
        }));
    } else {
        output.line(&gem_version);
    }
    Ok(())
}

pub fn package(output: &Output, project_dir: Option<&Path>, no_archive: bool, no_lock: bool) -> Result<()> {
    let mut project = open_project(project_dir)?;

    // Flags override the loaded configuration for this run only
    let settings = &mut project.config_mut().project;
    if no_archive {
        settings.package.archive = false;
    }
    if no_lock {
        settings.dependencies.locking = false;
    }

    let outcome = Pipeline::new(&project).run(PipelineOptions::for_project(&project))?;

    if output.is_json() {
        output.data(&outcome);
        return Ok(());
    }

    output.success(&format!("Packaged {}", outcome.package.name));
    output.row(&["directory:", &outcome.package.root.display().to_string()]);
    if let Some(archive) = &outcome.package.archive {
        output.row(&["archive:", &archive.display().to_string()]);
    }
    output.row(&["classpath:", &outcome.package.classpath.len().to_string()]);
    Ok(())
}
