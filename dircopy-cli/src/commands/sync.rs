//! Sync command implementation.
//!
//! This module implements the `sync` command, which reconciles a
//! destination directory with an archive.

use crate::error::CliError;
use crate::utils::{flag, load_configuration, print_json, resolve_path, GlobalOptions, OutputFormat};
use clap::Args;
use dircopy::config::Config;
use dircopy::operations::{DiffReport, PathState};
use dircopy::{ModeString, ReconcileRequest, ReconcileResult, Reconciler};
use std::path::PathBuf;

/// Reconcile a destination directory with an archive.
#[derive(Args)]
pub struct SyncCommand {
    /// Archive to reconcile from (tar, optionally gzip-compressed)
    #[arg(long, value_name = "PATH")]
    pub archive: PathBuf,

    /// Destination directory
    #[arg(long, value_name = "PATH")]
    pub dest: PathBuf,

    /// Owner of the destination tree (name or uid)
    #[arg(long, value_name = "USER")]
    pub owner: Option<String>,

    /// Group of the destination tree (name or gid)
    #[arg(long, value_name = "GROUP")]
    pub group: Option<String>,

    /// Octal mode for files, 3 or 4 digits
    #[arg(long, value_name = "MODE")]
    pub mode: Option<ModeString>,

    /// Remove destination entries that are not in the archive
    #[arg(long, visible_alias = "delete")]
    pub identical: bool,

    /// Force execute bits on directories
    #[arg(long, visible_alias = "x4dirs")]
    pub specialx: bool,

    /// Include the before/after report
    #[arg(long)]
    pub diff: bool,

    /// Report what would change without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "human", ignore_case = true)]
    pub format: OutputFormat,
}

impl SyncCommand {
    /// Execute the sync command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        // 1. Resolve paths
        let archive = resolve_path(&self.archive)?;
        let dest = resolve_path(&self.dest)?;

        // 2. Load configuration, command-line flags on top
        let overrides = Config {
            owner: self.owner,
            group: self.group,
            mode: self.mode,
            identical: flag(self.identical),
            specialx: flag(self.specialx),
            verbose: flag(global.verbose),
            diff: flag(self.diff),
            dry_run: flag(self.dry_run),
        };
        let options = load_configuration(global, overrides)?.to_options();
        // Pruning would remove the archive it is reading from.
        if options.identical && archive.starts_with(&dest) {
            return Err(CliError::InvalidArguments(format!(
                "archive {} lies inside the destination {}; --identical would remove it",
                archive.display(),
                dest.display()
            )));
        }
        log::debug!(
            "sync {} -> {} (identical={}, dry_run={})",
            archive.display(),
            dest.display(),
            options.identical,
            options.dry_run
        );

        // 3. Run
        let request = ReconcileRequest::new(archive, dest, options);
        let result = Reconciler::new(request).run()?;

        // 4. Report
        match self.format {
            OutputFormat::Json => print_json(&result)?,
            OutputFormat::Human => {
                if !global.quiet {
                    print_human(&result);
                }
            }
        }

        if result.failed {
            return Err(CliError::RunFailed(format!(
                "Reconciliation finished with {} failure(s)",
                result.failures.len()
            )));
        }
        Ok(())
    }
}

fn print_human(result: &ReconcileResult) {
    if result.dry_run {
        eprintln!("Dry run - no changes made");
    }
    for line in &result.msg {
        println!("{line}");
    }

    if let Some(ref details) = result.details {
        let verb = if result.dry_run { "would update" } else { "updated" };
        for path in &details.updated_files {
            println!("  {verb}: {}", path.display());
        }
        let verb = if result.dry_run { "would remove" } else { "removed" };
        for path in &details.removed {
            println!("  {verb}: {}", path.display());
        }
        for line in details.mode.iter().chain(&details.ownership) {
            println!("  {line}");
        }
    }

    if let Some(ref diff) = result.diff {
        print_diff_report(diff);
    }
}

fn print_diff_report(diff: &DiffReport) {
    let mut paths: Vec<&String> = diff.before.keys().chain(diff.after.keys()).collect();
    paths.sort();
    paths.dedup();

    for path in paths {
        println!("{path}");
        println!("  before: {}", describe(diff.before.get(path)));
        println!("  after:  {}", describe(diff.after.get(path)));
    }
}

fn describe(state: Option<&PathState>) -> String {
    match state {
        Some(s) => format!(
            "{} {} bytes {}:{} {} {}",
            format!("{:?}", s.kind).to_lowercase(),
            s.size,
            s.uid,
            s.gid,
            s.mode,
            s.mtime
        ),
        None => "(absent)".to_string(),
    }
}
