//! Dependency commands: flatten, conflicts

use std::path::Path;

use anyhow::Result;

use super::app::open_project;
use super::output::Output;
use crate::domain::FlattenedSet;
use crate::pipeline::Pipeline;

pub fn flatten(output: &Output, project_dir: Option<&Path>, provided: bool, write_lock: bool) -> Result<()> {
    let project = open_project(project_dir)?;
    let pipeline = Pipeline::new(&project);

    let set = if provided {
        pipeline.provided()?
    } else {
        pipeline.runtime()?
    };

    if write_lock {
        let lockfile = pipeline.lockfile(&set);
        lockfile.write(&project.lockfile())?;
        tracing::info!(entries = lockfile.len(), "lockfile updated");
    }

    if output.is_json() {
        output.data(&set);
    } else {
        print_set(output, &set);
        if write_lock {
            output.blank();
            output.line(&format!("Wrote {}", project.lockfile().display()));
        }
    }
    Ok(())
}

fn print_set(output: &Output, set: &FlattenedSet) {
    for module in set.modules() {
        output.line(&module.notation());
    }
    for project in set.projects() {
        output.line(&format!("project {}", project.path));
        for artifact in &project.artifacts {
            output.line(&format!("  {}", artifact.display()));
        }
    }
}

pub fn conflicts(output: &Output, project_dir: Option<&Path>) -> Result<()> {
    let project = open_project(project_dir)?;
    let pipeline = Pipeline::new(&project);

    let runtime = pipeline.runtime()?;
    let report = pipeline.conflicts(&runtime)?;

    if output.is_json() {
        output.data(&report);
    } else if report.is_empty() {
        output.line("No boundary conflicts.");
    } else {
        output.line(&report.to_string());
    }
    Ok(())
}
