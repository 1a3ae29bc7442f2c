//! The reconciliation plan: everything a run found to differ.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::path::{ArchivePath, DestinationEntry};

/// What a run updates (or, in dry-run mode, would update).
///
/// The plan is filled in as the run progresses and is returned whether or
/// not the changes were applied, so it doubles as the dry-run report.
///
/// # Examples
///
/// ```
/// use dircopy::operations::ReconciliationPlan;
///
/// let plan = ReconciliationPlan::default();
/// assert!(plan.is_empty());
/// assert_eq!(plan.len(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationPlan {
    /// Archive entries to extract.
    pub files_to_update: BTreeSet<ArchivePath>,
    /// Destination files absent from the archive.
    pub spare_files: BTreeSet<ArchivePath>,
    /// Destination directories absent from the archive.
    pub spare_dirs: BTreeSet<ArchivePath>,
    /// Entries with the wrong owner or group.
    pub ownership_mismatches: Vec<DestinationEntry>,
    /// Entries with the wrong mode.
    pub mode_mismatches: Vec<DestinationEntry>,
}

impl ReconciliationPlan {
    /// Whether the plan contains no action.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of actions in the plan.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files_to_update.len()
            + self.spare_files.len()
            + self.spare_dirs.len()
            + self.ownership_mismatches.len()
            + self.mode_mismatches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::EntryKind;
    use std::path::PathBuf;

    #[test]
    fn test_len_counts_every_action() {
        let entry = DestinationEntry {
            path: PathBuf::from("/dest/a"),
            kind: EntryKind::File,
            uid: 0,
            gid: 0,
            mode: 0o644,
            size: 1,
            mtime: 0,
        };
        let plan = ReconciliationPlan {
            files_to_update: [ArchivePath::parse("a").unwrap()].into_iter().collect(),
            spare_dirs: [ArchivePath::parse("x").unwrap()].into_iter().collect(),
            mode_mismatches: vec![entry.clone()],
            ownership_mismatches: vec![entry],
            ..ReconciliationPlan::default()
        };
        assert_eq!(plan.len(), 4);
        assert!(!plan.is_empty());
    }

    #[test]
    fn test_serializes_modes_as_octal_text() {
        let plan = ReconciliationPlan {
            mode_mismatches: vec![DestinationEntry {
                path: PathBuf::from("/dest"),
                kind: EntryKind::Directory,
                uid: 1,
                gid: 2,
                mode: 0o755,
                size: 0,
                mtime: 0,
            }],
            ..ReconciliationPlan::default()
        };
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["mode_mismatches"][0]["mode"], "0755");
        assert_eq!(json["mode_mismatches"][0]["kind"], "directory");
    }
}
