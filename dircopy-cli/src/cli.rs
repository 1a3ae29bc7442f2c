//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{
    CompletionsCommand, DiffCommand, ListCommand, SyncCommand, ValidateCommand,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line tool for synchronizing a directory tree from a tar archive.
#[derive(Parser)]
#[command(name = "dircopy")]
#[command(
    version,
    about = "Synchronize a directory tree from a tar archive",
    long_about = None
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Override the user configuration directory (default: ~/.dircopy)
    #[arg(long, value_name = "PATH", global = true, env = "DIRCOPY_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Do not read configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Reconcile a destination directory with an archive
    Sync(SyncCommand),

    /// Show which archive entries differ from the destination
    Diff(DiffCommand),

    /// List the entries of an archive
    List(ListCommand),

    /// Validate configuration and show the resolved target
    Validate(ValidateCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}
