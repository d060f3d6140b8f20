//! Project commands: init, check

use std::path::Path;

use anyhow::Result;

use super::app::open_project;
use super::output::Output;
use crate::domain::{Category, PluginDescriptor};
use crate::pipeline::Pipeline;
use crate::storage::{InitOptions, Project};

pub fn init(
    output: &Output,
    path: &Path,
    main_class: String,
    category: Category,
    plugin_type: String,
    name: Option<String>,
) -> Result<()> {
    tracing::debug!(path = %path.display(), "initializing project");

    let options = InitOptions {
        name,
        main_class,
        category,
        plugin_type,
    };
    // Rejects bad settings before anything is written
    PluginDescriptor::new(
        options.main_class.clone(),
        options.category.as_str(),
        options.plugin_type.clone(),
    )?;

    let project = Project::init(path, &options)?;
    output.success(&format!(
        "Initialized Embulk plugin project at {}",
        project.root().display()
    ));
    Ok(())
}

pub fn check(output: &Output, project_dir: Option<&Path>) -> Result<()> {
    let project = open_project(project_dir)?;
    let pipeline = Pipeline::new(&project);

    let descriptor = pipeline.descriptor()?;
    let gem_version = pipeline.gem_version()?;
    let name = pipeline.package_name(gem_version)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "plugin": descriptor,
            "version": project.version().as_str(),
            "package": name.to_string(),
        }));
    } else {
        let name = name.to_string();
        output.row(&["main_class:", descriptor.main_class()]);
        output.row(&["category:", descriptor.category().as_str()]);
        output.row(&["type:", descriptor.plugin_type()]);
        output.row(&["version:", project.version().as_str()]);
        output.row(&["package:", name.as_str()]);
    }
    Ok(())
}
