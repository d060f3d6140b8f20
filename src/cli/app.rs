//! Main CLI application structure

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{build, deps, logging, project_cmd};
use crate::domain::Category;
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "embulk-plugins")]
#[command(author, version, about = "Package Java plugins for Embulk")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project directory (defaults to the nearest directory with embulk-plugin.toml)
    #[arg(long, short = 'C', global = true, env = "EMBULK_PLUGINS_PROJECT_DIR")]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new plugin project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Fully-qualified Java class implementing the plugin
        #[arg(long)]
        main_class: String,

        /// Plugin category
        #[arg(long)]
        category: Category,

        /// Plugin type name, as written in Embulk configs
        #[arg(long = "type")]
        plugin_type: String,

        /// Project name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Validate the plugin settings
    Check,

    /// Show the flattened dependency set
    Flatten {
        /// Flatten the provided (compile-only) graph instead of the runtime one
        #[arg(long)]
        provided: bool,

        /// Write the runtime selection to the lockfile
        #[arg(long, conflicts_with = "provided")]
        write_lock: bool,
    },

    /// Report modules both shipped with the plugin and provided by Embulk
    Conflicts,

    /// Render the plugin manifest attributes
    Manifest {
        /// Write the MANIFEST.MF main section to this file
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Convert a Maven-style version to a gem version
    Version {
        /// Version to convert, e.g. 1.0.0-SNAPSHOT
        #[arg(id = "version_arg", value_name = "VERSION")]
        version: String,
    },

    /// Build the plugin package
    Package {
        /// Skip the .tar.gz archive
        #[arg(long)]
        no_archive: bool,

        /// Skip lockfile verification
        #[arg(long)]
        no_lock: bool,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let format = match cli.format {
        Some(format) => format,
        None => Config::load_global()?.default_format.into(),
    };
    let output = Output::new(format);
    let project_dir = cli.project_dir.as_deref();

    tracing::debug!("embulk-plugins starting");

    match cli.command {
        Commands::Init {
            path,
            main_class,
            category,
            plugin_type,
            name,
        } => project_cmd::init(&output, &path, main_class, category, plugin_type, name)?,
        Commands::Check => project_cmd::check(&output, project_dir)?,
        Commands::Flatten { provided, write_lock } => {
            deps::flatten(&output, project_dir, provided, write_lock)?
        }
        Commands::Conflicts => deps::conflicts(&output, project_dir)?,
        Commands::Manifest { output: file } => build::manifest(&output, project_dir, file.as_deref())?,
        Commands::Version { version } => build::version(&output, &version)?,
        Commands::Package { no_archive, no_lock } => {
            build::package(&output, project_dir, no_archive, no_lock)?
        }
    }

    Ok(())
}

/// Opens the project at `--project-dir`, or the one containing the current directory
pub(super) fn open_project(project_dir: Option<&Path>) -> Result<Project> {
    let project = match project_dir {
        Some(dir) => Project::discover(dir)?,
        None => Project::open_current()?,
    };
    tracing::debug!(root = %project.root().display(), "opened project");
    Ok(project)
}
