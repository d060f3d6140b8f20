//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Project | Setup and validation | `init`, `check` |
//! | Dependencies | Flattening and boundary checks | `flatten`, `flatten --write-lock`, `conflicts` |
//! | Build | Manifest, versions, packaging | `manifest`, `version 1.0.0-SNAPSHOT`, `package` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! The default can be changed with `default_format` in the global config.
//!
//! ## Logging
//!
//! Diagnostics go to stderr through `tracing`. Use `--verbose` (or `-v`)
//! for debug output, or set `EMBULK_PLUGINS_LOG`:
//! ```bash
//! EMBULK_PLUGINS_LOG=embulk_plugins=trace embulk-plugins flatten
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod build;
mod deps;
mod logging;
mod output;
mod project_cmd;

pub use app::{run, Cli, Commands};
pub use logging::LOG_ENV;
pub use output::{Output, OutputFormat};
