//! Diff command implementation.
//!
//! This module implements the `diff` command, which reports the archive
//! entries whose destination counterpart is missing or different.

use crate::error::CliError;
use crate::utils::{print_json, resolve_path, GlobalOptions, OutputFormat};
use clap::Args;
use dircopy::ContentDiffer;
use std::path::PathBuf;

/// Show which archive entries differ from the destination.
#[derive(Args)]
pub struct DiffCommand {
    /// Archive to compare (tar, optionally gzip-compressed)
    #[arg(long, value_name = "PATH")]
    pub archive: PathBuf,

    /// Destination directory
    #[arg(long, value_name = "PATH")]
    pub dest: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "human", ignore_case = true)]
    pub format: OutputFormat,
}

impl DiffCommand {
    /// Execute the diff command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let archive = resolve_path(&self.archive)?;
        let dest = resolve_path(&self.dest)?;

        let diff = ContentDiffer::compare(&archive, &dest)?;

        match self.format {
            OutputFormat::Json => print_json(&diff)?,
            OutputFormat::Human => {
                for difference in &diff.differences {
                    println!("{difference}");
                }
                if diff.is_empty() && !global.quiet {
                    eprintln!("No differences");
                }
            }
        }

        Ok(())
    }
}
