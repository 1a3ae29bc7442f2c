//! Selective extraction.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::archive::{entry_path, open};
use crate::error::{Error, Failure, FailureKind, Result};
use crate::operations::FsExecutor;
use crate::path::{ArchivePath, DestinationEntry};
use crate::principal;

/// Outcome of a selective extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractResult {
    /// Entries extracted (or, in dry-run mode, that would be).
    pub extracted: BTreeSet<ArchivePath>,
    /// Entries that could not be extracted.
    pub failures: Vec<Failure>,
}

/// Extracts a chosen subset of archive entries.
///
/// Permissions and modification times recorded in the archive are kept;
/// ownership is kept only when running as root. Entries not named in the
/// subset are never touched.
pub struct SelectiveExtractor;

impl SelectiveExtractor {
    /// Extracts the entries named in `changed` below `destination`.
    ///
    /// Directories are applied after everything else, deepest first, so
    /// their archived permissions and times cannot interfere with the
    /// entries they contain. A destination entry whose type conflicts with the archive
    /// entry is removed first. Names in `changed` that the archive does not
    /// contain are reported as failures.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Archive`] if the archive cannot be read. Failures of
    /// individual entries are returned in [`ExtractResult::failures`].
    pub fn apply(
        archive: &Path,
        destination: &Path,
        changed: &BTreeSet<ArchivePath>,
        executor: &FsExecutor,
    ) -> Result<ExtractResult> {
        let mut result = ExtractResult::default();
        if changed.is_empty() {
            return Ok(result);
        }

        let mut tar = open(archive)?;
        tar.set_preserve_permissions(true);
        tar.set_preserve_mtime(true);
        tar.set_overwrite(true);
        tar.set_preserve_ownerships(principal::is_root());

        let mut directories = Vec::new();
        let entries = tar.entries().map_err(|e| Error::archive(archive, e))?;

        for entry in entries {
            let mut entry = entry.map_err(|e| Error::archive(archive, e))?;
            let Some(path) = entry_path(archive, &entry)? else {
                continue;
            };
            if !changed.contains(&path) {
                continue;
            }

            let is_dir = entry.header().entry_type().is_dir();
            let target = path.under(destination);
            if let Err(e) = clear_conflict(&target, is_dir, executor) {
                result.failures.push(failure(&target, &e));
                continue;
            }

            if is_dir {
                directories.push((path, entry));
                continue;
            }
            match executor.unpack(&mut entry, destination) {
                Ok(()) => {
                    result.extracted.insert(path);
                }
                Err(e) => result.failures.push(failure(&target, &e)),
            }
        }

        // Children first, so a read-only parent mode lands after its
        // subdirectories exist.
        directories.sort_by(|a, b| b.0.cmp(&a.0));
        for (path, mut entry) in directories {
            match executor.unpack(&mut entry, destination) {
                Ok(()) => {
                    result.extracted.insert(path);
                }
                Err(e) => result.failures.push(failure(&path.under(destination), &e)),
            }
        }

        for stale in changed.iter().filter(|p| !result.extracted.contains(*p)) {
            let target = stale.under(destination);
            if result.failures.iter().any(|f| f.path == target) {
                continue;
            }
            result.failures.push(Failure::new(
                FailureKind::Extraction,
                target,
                "not found in archive",
            ));
        }

        for f in &result.failures {
            log::warn!("{f}");
        }
        log::debug!("{} entr(ies) extracted", result.extracted.len());
        Ok(result)
    }
}

/// Removes a destination entry whose type does not match the archive entry.
fn clear_conflict(target: &Path, want_dir: bool, executor: &FsExecutor) -> io::Result<()> {
    let Some(existing) = DestinationEntry::stat(target)? else {
        return Ok(());
    };
    match (existing.kind.is_dir(), want_dir) {
        (true, false) => executor.remove_dir(target),
        (false, true) => executor.remove_file(target),
        _ => Ok(()),
    }
}

fn failure(target: &Path, e: &io::Error) -> Failure {
    Failure::new(FailureKind::Extraction, target, e.to_string())
}
