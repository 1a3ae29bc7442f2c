//! Validate command implementation.
//!
//! This module implements the `validate` command, which merges the
//! configuration sources and resolves the ownership and modes a sync would
//! apply, without touching any archive or destination.

use crate::error::CliError;
use crate::utils::{load_configuration, print_json, GlobalOptions, OutputFormat};
use clap::Args;
use dircopy::config::Config;
use dircopy::principal::{group_name, user_name};
use dircopy::{ModeString, TargetSpec};

/// Validate configuration and show the resolved target.
#[derive(Args)]
pub struct ValidateCommand {
    /// Owner to resolve instead of the configured one
    #[arg(long, value_name = "USER")]
    pub owner: Option<String>,

    /// Group to resolve instead of the configured one
    #[arg(long, value_name = "GROUP")]
    pub group: Option<String>,

    /// Mode to check instead of the configured one
    #[arg(long, value_name = "MODE")]
    pub mode: Option<ModeString>,

    /// Output format
    #[arg(long, value_enum, default_value = "human", ignore_case = true)]
    pub format: OutputFormat,
}

impl ValidateCommand {
    /// Execute the validate command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let overrides = Config {
            owner: self.owner,
            group: self.group,
            mode: self.mode,
            ..Config::default()
        };
        let options = load_configuration(global, overrides)?.to_options();
        let target = TargetSpec::resolve(&options)?;

        match self.format {
            OutputFormat::Json => print_json(&target)?,
            OutputFormat::Human => {
                let owner = user_name(target.uid).unwrap_or_else(|| "?".to_string());
                let group = group_name(target.gid).unwrap_or_else(|| "?".to_string());
                println!("owner:     {} ({owner})", target.uid);
                println!("group:     {} ({group})", target.gid);
                println!("file mode: {}", target.file_mode);
                println!("dir mode:  {}", target.dir_mode);
                if !global.quiet {
                    eprintln!("Configuration is valid");
                }
            }
        }

        Ok(())
    }
}
