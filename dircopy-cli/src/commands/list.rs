//! List command implementation.
//!
//! This module implements the `list` command, which shows the entries of
//! an archive along with the directories their paths imply.

use crate::error::CliError;
use crate::utils::{print_json, resolve_path, GlobalOptions, OutputFormat};
use clap::Args;
use dircopy::archive::ArchiveEntryKind;
use dircopy::mode::format_mode;
use dircopy::ArchiveIndex;
use std::io::Write;
use std::path::PathBuf;

/// Column headers for the human-readable table.
const COLUMN_HEADERS: [&str; 4] = ["type", "mode", "size", "path"];

/// List the entries of an archive.
#[derive(Args)]
pub struct ListCommand {
    /// Archive to list (tar, optionally gzip-compressed)
    #[arg(long, value_name = "PATH")]
    pub archive: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "human", ignore_case = true)]
    pub format: OutputFormat,
}

impl ListCommand {
    /// Execute the list command.
    pub fn execute(self, _global: &GlobalOptions) -> Result<(), CliError> {
        let archive = resolve_path(&self.archive)?;
        let index = ArchiveIndex::list(&archive)?;

        match self.format {
            OutputFormat::Human => format_as_table(&index)?,
            OutputFormat::Json => {
                let implied: Vec<_> = index.dirs.iter().filter(|d| index.is_implicit(d)).collect();
                print_json(&serde_json::json!({
                    "entries": index.entries().collect::<Vec<_>>(),
                    "implied_dirs": implied,
                }))?;
            }
        }

        Ok(())
    }
}

fn kind_label(kind: ArchiveEntryKind) -> &'static str {
    match kind {
        ArchiveEntryKind::File => "file",
        ArchiveEntryKind::Directory => "dir",
        ArchiveEntryKind::Symlink => "link",
        ArchiveEntryKind::HardLink => "hardlink",
        ArchiveEntryKind::Other => "other",
    }
}

/// Files first, then directories; implied directories are marked.
fn format_as_table(index: &ArchiveIndex) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let header_line = COLUMN_HEADERS
        .iter()
        .map(|s| s.to_uppercase())
        .collect::<Vec<_>>()
        .join("\t");
    writeln!(handle, "{header_line}")?;

    for path in &index.files {
        if let Some(entry) = index.entry(path) {
            let shown = match entry.link_target {
                Some(ref target) => format!("{path} -> {target}"),
                None => path.to_string(),
            };
            writeln!(
                handle,
                "{}\t{}\t{}\t{shown}",
                kind_label(entry.kind),
                format_mode(entry.mode),
                entry.size,
            )?;
        }
    }

    for dir in &index.dirs {
        match index.entry(dir) {
            Some(entry) => writeln!(handle, "dir\t{}\t-\t{dir}/", format_mode(entry.mode))?,
            None => writeln!(handle, "dir\t-\t-\t{dir}/ (implied)")?,
        }
    }

    Ok(())
}
