//! Ownership and mode repair.

use std::path::Path;

use serde::Serialize;

use crate::error::{Failure, FailureKind, Result};
use crate::operations::FsExecutor;
use crate::path::{walk_tree, DestinationEntry, EntryKind};
use crate::target::TargetSpec;

/// Entries whose ownership or mode did not match the target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionOutcome {
    /// Entries with the wrong owner or group, as found before repair.
    pub ownership_mismatches: Vec<DestinationEntry>,
    /// Entries with the wrong mode, as found before repair.
    pub mode_mismatches: Vec<DestinationEntry>,
    /// Changes that were refused.
    pub failures: Vec<Failure>,
}

impl PermissionOutcome {
    /// Whether every entry already matched.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.ownership_mismatches.is_empty() && self.mode_mismatches.is_empty()
    }
}

/// Brings the ownership and modes of a tree in line with a [`TargetSpec`].
pub struct PermissionReconciler;

impl PermissionReconciler {
    /// Walks `destination` (the root included) once and repairs every
    /// mismatching entry.
    ///
    /// Ownership is changed before mode. The two changes are independent:
    /// a refused `chown` does not prevent the `chmod`, and neither stops the
    /// walk. Symlinks are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only if the tree cannot be walked.
    pub fn reconcile(
        destination: &Path,
        target: &TargetSpec,
        executor: &FsExecutor,
    ) -> Result<PermissionOutcome> {
        let mut outcome = PermissionOutcome::default();

        for entry in walk_tree(destination, true)? {
            if entry.kind == EntryKind::Symlink {
                continue;
            }

            if entry.uid != target.uid || entry.gid != target.gid {
                if let Err(e) = executor.chown(&entry.path, target.uid, target.gid) {
                    outcome
                        .failures
                        .push(Failure::new(FailureKind::Permission, &entry.path, e.to_string()));
                }
                outcome.ownership_mismatches.push(entry.clone());
            }

            let wanted = target.mode_for(entry.kind).bits();
            if entry.mode != wanted {
                if let Err(e) = executor.chmod(&entry.path, wanted) {
                    outcome
                        .failures
                        .push(Failure::new(FailureKind::Permission, &entry.path, e.to_string()));
                }
                outcome.mode_mismatches.push(entry);
            }
        }

        for f in &outcome.failures {
            log::warn!("{f}");
        }
        log::debug!(
            "{} ownership and {} mode mismatch(es) in {}",
            outcome.ownership_mismatches.len(),
            outcome.mode_mismatches.len(),
            destination.display()
        );
        Ok(outcome)
    }
}
