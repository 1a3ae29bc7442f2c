//! Utility functions for CLI operations.
//!
//! This module provides common utility functions used across CLI commands,
//! including path resolution, configuration loading and output helpers.

use crate::error::CliError;
use clap::ValueEnum;
use dircopy::config::Config;
use dircopy::path::normalize;
use dircopy::ConfigBuilder;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Replaces `~/.dircopy` as the user configuration directory.
    pub config_dir: Option<PathBuf>,

    /// Skip configuration files.
    pub no_config: bool,
}

/// Output format shared by the reporting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable lines
    Human,
    /// JSON document
    Json,
}

/// Normalize a path (make absolute, expand ~) without following symlinks.
///
/// The path does not need to exist.
pub fn resolve_path(path: &Path) -> Result<PathBuf, CliError> {
    normalize(path).map_err(CliError::from)
}

/// Load hierarchical configuration.
///
/// Configuration is merged from multiple sources with precedence:
/// 1. Command-line flags (`overrides`, highest priority)
/// 2. Environment variables
/// 3. Configuration files (unless `--no-config`)
/// 4. Built-in defaults (lowest priority)
pub fn load_configuration(global: &GlobalOptions, overrides: Config) -> Result<Config, CliError> {
    let mut builder = ConfigBuilder::new().with_config(overrides);

    if global.no_config {
        builder = builder.skip_files();
    }
    if let Some(ref dir) = global.config_dir {
        builder = builder.with_user_config_dir(dir);
    }

    builder.build().map_err(CliError::from)
}

/// `Some(true)` when a flag was given, so that an absent flag does not
/// override lower-precedence sources.
pub fn flag(set: bool) -> Option<bool> {
    set.then_some(true)
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
