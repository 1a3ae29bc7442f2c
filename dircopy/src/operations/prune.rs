//! Removal of destination entries the archive does not contain.
//!
//! Pruning only runs in identical mode. Files go first, in any order; spare
//! directories follow deepest first, so a directory is attempted only after
//! everything nested in it has been handled in the same pass. Removal
//! failures are collected and the pass carries on: entries removed before a
//! failure stay removed.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::error::{Failure, FailureKind, Result};
use crate::operations::FsExecutor;
use crate::path::{ArchivePath, TreeSets};

/// Destination entries absent from the archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Spares {
    /// Spare files, symlinks and special files.
    pub files: BTreeSet<ArchivePath>,
    /// Spare directories. Never contains the destination root.
    pub dirs: BTreeSet<ArchivePath>,
}

impl Spares {
    /// Whether there is nothing to remove.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }
}

/// Outcome of a removal pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneResult {
    /// Files removed (or that would be).
    pub removed_files: Vec<ArchivePath>,
    /// Directories removed (or that would be), in removal order.
    pub removed_dirs: Vec<ArchivePath>,
    /// Removals that failed.
    pub failures: Vec<Failure>,
}

/// Computes and removes spare entries.
pub struct PruneEngine;

impl PruneEngine {
    /// Walks `destination` and subtracts the archive sets from its file and
    /// directory sets.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be walked.
    ///
    /// # Examples
    ///
    /// ```
    /// use dircopy::operations::PruneEngine;
    /// use dircopy::ArchivePath;
    /// use std::collections::BTreeSet;
    ///
    /// let dest = tempfile::tempdir().unwrap();
    /// std::fs::create_dir(dest.path().join("b")).unwrap();
    /// for f in ["a", "b/c", "b/d"] {
    ///     std::fs::write(dest.path().join(f), f).unwrap();
    /// }
    ///
    /// let files: BTreeSet<_> = ["a", "b/c"].iter().map(|p| ArchivePath::parse(p).unwrap()).collect();
    /// let dirs: BTreeSet<_> = [ArchivePath::parse("b").unwrap()].into_iter().collect();
    ///
    /// let spares = PruneEngine::compute_spares(&files, &dirs, dest.path()).unwrap();
    /// assert_eq!(spares.files.iter().map(|p| p.as_str()).collect::<Vec<_>>(), vec!["b/d"]);
    /// assert!(spares.dirs.is_empty());
    /// ```
    pub fn compute_spares(
        archive_files: &BTreeSet<ArchivePath>,
        archive_dirs: &BTreeSet<ArchivePath>,
        destination: &Path,
    ) -> Result<Spares> {
        let tree = TreeSets::read(destination)?;
        let spares = Spares {
            files: tree.files.difference(archive_files).cloned().collect(),
            dirs: tree.dirs.difference(archive_dirs).cloned().collect(),
        };
        log::debug!(
            "{} spare file(s), {} spare dir(s)",
            spares.files.len(),
            spares.dirs.len()
        );
        Ok(spares)
    }

    /// Orders directories deepest first; equal depths by path.
    #[must_use]
    pub fn removal_order(dirs: &BTreeSet<ArchivePath>) -> Vec<ArchivePath> {
        let mut ordered: Vec<ArchivePath> = dirs.iter().cloned().collect();
        ordered.sort_by(|a, b| b.depth().cmp(&a.depth()).then_with(|| a.cmp(b)));
        ordered
    }

    /// Removes spare files, then spare directories deepest first.
    ///
    /// Entries that have already vanished are skipped silently.
    pub fn remove_spares(
        spares: &Spares,
        destination: &Path,
        executor: &FsExecutor,
    ) -> PruneResult {
        let mut result = PruneResult::default();

        for file in &spares.files {
            let target = file.under(destination);
            match executor.remove_file(&target) {
                Ok(()) => result.removed_files.push(file.clone()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!("{} already gone", target.display());
                }
                Err(e) => result.failures.push(race(&target, &e)),
            }
        }

        for dir in Self::removal_order(&spares.dirs) {
            let target = dir.under(destination);
            match executor.remove_dir(&target) {
                Ok(()) => result.removed_dirs.push(dir),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!("{} already gone", target.display());
                }
                Err(e) => result.failures.push(race(&target, &e)),
            }
        }

        for f in &result.failures {
            log::warn!("{f}");
        }
        result
    }
}

fn race(target: &Path, e: &io::Error) -> Failure {
    Failure::new(FailureKind::PruneRace, target, e.to_string())
}

#[cfg(test)]
mod proptests;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn set(paths: &[&str]) -> BTreeSet<ArchivePath> {
        paths.iter().map(|p| ArchivePath::parse(p).unwrap()).collect()
    }

    fn strings(paths: &[ArchivePath]) -> Vec<&str> {
        paths.iter().map(ArchivePath::as_str).collect()
    }

    fn tree(root: &Path, dirs: &[&str], files: &[&str]) {
        for d in dirs {
            fs::create_dir_all(root.join(d)).unwrap();
        }
        for f in files {
            fs::write(root.join(f), f).unwrap();
        }
    }

    #[test]
    fn test_spare_files() {
        let dest = TempDir::new().unwrap();
        tree(dest.path(), &["b"], &["a", "b/c", "b/d"]);

        let spares =
            PruneEngine::compute_spares(&set(&["a", "b/c"]), &set(&["b"]), dest.path()).unwrap();
        assert_eq!(spares.files, set(&["b/d"]));
        assert!(spares.dirs.is_empty());
    }

    #[test]
    fn test_spare_dirs_never_include_root() {
        let dest = TempDir::new().unwrap();
        tree(dest.path(), &["x/y/z", "keep"], &["x/y/z/f"]);

        let spares = PruneEngine::compute_spares(&set(&[]), &set(&["keep"]), dest.path()).unwrap();
        assert_eq!(spares.dirs, set(&["x", "x/y", "x/y/z"]));
        assert_eq!(spares.files, set(&["x/y/z/f"]));
    }

    #[test]
    fn test_removal_order_deepest_first() {
        let order = PruneEngine::removal_order(&set(&["x", "x/y", "x/y/z", "w"]));
        assert_eq!(strings(&order), vec!["x/y/z", "x/y", "w", "x"]);
    }

    #[test]
    fn test_remove_spares() {
        let dest = TempDir::new().unwrap();
        tree(dest.path(), &["x/y/z", "keep"], &["x/y/z/f", "x/g", "keep/h"]);

        let spares = Spares {
            files: set(&["x/g", "x/y/z/f"]),
            dirs: set(&["x", "x/y", "x/y/z"]),
        };
        let result = PruneEngine::remove_spares(&spares, dest.path(), &FsExecutor::new(false));

        assert!(result.failures.is_empty());
        assert_eq!(strings(&result.removed_dirs), vec!["x/y/z", "x/y", "x"]);
        assert!(!dest.path().join("x").exists());
        assert!(dest.path().join("keep/h").exists());
    }

    #[test]
    fn test_dry_run_reports_without_removing() {
        let dest = TempDir::new().unwrap();
        tree(dest.path(), &["x"], &["x/f"]);

        let spares = Spares {
            files: set(&["x/f"]),
            dirs: set(&["x"]),
        };
        let result = PruneEngine::remove_spares(&spares, dest.path(), &FsExecutor::new(true));

        assert_eq!(strings(&result.removed_files), vec!["x/f"]);
        assert_eq!(strings(&result.removed_dirs), vec!["x"]);
        assert!(dest.path().join("x/f").exists());
    }

    #[test]
    fn test_non_empty_dir_is_a_race_failure() {
        let dest = TempDir::new().unwrap();
        tree(dest.path(), &["x/y"], &["x/y/late", "x/f"]);

        // `x/y/late` appeared after the spares were computed.
        let spares = Spares {
            files: set(&["x/f"]),
            dirs: set(&["x", "x/y"]),
        };
        let result = PruneEngine::remove_spares(&spares, dest.path(), &FsExecutor::new(false));

        assert_eq!(strings(&result.removed_files), vec!["x/f"]);
        assert!(result.removed_dirs.is_empty());
        assert_eq!(result.failures.len(), 2);
        assert!(result
            .failures
            .iter()
            .all(|f| f.kind == FailureKind::PruneRace));
        assert!(!dest.path().join("x/f").exists());
    }

    #[test]
    fn test_vanished_entries_are_skipped() {
        let dest = TempDir::new().unwrap();
        let spares = Spares {
            files: set(&["ghost"]),
            dirs: set(&["phantom"]),
        };
        let result = PruneEngine::remove_spares(&spares, dest.path(), &FsExecutor::new(false));
        assert!(result.failures.is_empty());
        assert!(result.removed_files.is_empty());
    }
}
