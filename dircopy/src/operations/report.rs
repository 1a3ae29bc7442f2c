//! Run results and the before/after report.
//!
//! A run produces one [`ReconcileResult`], assembled step by step through
//! [`ResultBuilder`] as each phase completes.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Failure};
use crate::mode::format_mode;
use crate::operations::permissions::PermissionOutcome;
use crate::operations::plan::ReconciliationPlan;
use crate::operations::prune::PruneResult;
use crate::path::{ArchivePath, DestinationEntry, EntryKind};

/// The message reported when a run had nothing to do.
pub const NO_UPDATE: &str = "No update needed.";

/// Recorded state of one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathState {
    /// Entry kind.
    pub kind: EntryKind,
    /// Size in bytes.
    pub size: u64,
    /// Owner.
    pub uid: u32,
    /// Group.
    pub gid: u32,
    /// Mode as four octal digits.
    pub mode: String,
    /// Modification time (RFC 3339).
    pub mtime: String,
}

impl PathState {
    /// Builds a state from its parts.
    #[must_use]
    pub fn new(kind: EntryKind, size: u64, uid: u32, gid: u32, mode: u32, mtime: i64) -> Self {
        Self {
            kind,
            size,
            uid,
            gid,
            mode: format_mode(mode),
            mtime: format_mtime(mtime),
        }
    }
}

impl From<&DestinationEntry> for PathState {
    fn from(entry: &DestinationEntry) -> Self {
        Self::new(
            entry.kind,
            entry.size,
            entry.uid,
            entry.gid,
            entry.mode,
            entry.mtime,
        )
    }
}

fn format_mtime(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_default()
}

/// Before/after states of every path a run touched, keyed by absolute path.
///
/// A path that did not exist before the run has no `before` entry; one that
/// does not exist afterwards has no `after` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    /// States before the first mutation.
    pub before: BTreeMap<String, PathState>,
    /// States at the end of the run (predicted in dry-run mode).
    pub after: BTreeMap<String, PathState>,
}

/// Collects [`DiffReport`] snapshots during a run.
///
/// A disabled recorder ignores every call.
#[derive(Debug, Default)]
pub struct DiffRecorder {
    enabled: bool,
    touched: BTreeSet<PathBuf>,
    before: BTreeMap<String, PathState>,
    predicted: BTreeMap<PathBuf, Option<PathState>>,
}

impl DiffRecorder {
    /// Creates a recorder.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    /// Whether snapshots are being taken.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Marks `path` as touched, reading its current state on first touch.
    pub fn touch(&mut self, path: &Path) {
        if !self.enabled || self.touched.contains(path) {
            return;
        }
        match DestinationEntry::stat(path) {
            Ok(Some(entry)) => self.touch_entry(&entry),
            Ok(None) => {
                self.touched.insert(path.to_path_buf());
            }
            Err(e) => {
                log::debug!("cannot snapshot {}: {e}", path.display());
                self.touched.insert(path.to_path_buf());
            }
        }
    }

    /// Marks an already-read entry as touched.
    pub fn touch_entry(&mut self, entry: &DestinationEntry) {
        if !self.enabled || !self.touched.insert(entry.path.clone()) {
            return;
        }
        self.before
            .insert(entry.path.display().to_string(), PathState::from(entry));
    }

    /// Records the predicted end state of a path (dry-run mode). `None`
    /// predicts that the path will not exist.
    pub fn predict(&mut self, path: &Path, state: Option<PathState>) {
        if !self.enabled {
            return;
        }
        self.touched.insert(path.to_path_buf());
        self.predicted.insert(path.to_path_buf(), state);
    }

    /// Whether an end state was already predicted for `path`.
    #[must_use]
    pub fn is_predicted(&self, path: &Path) -> bool {
        self.predicted.contains_key(path)
    }

    /// Finishes the report by reading every touched path from disk. In a
    /// dry run, predictions take the place of the disk state.
    #[must_use]
    pub fn finish(mut self, dry_run: bool) -> Option<DiffReport> {
        if !self.enabled {
            return None;
        }
        let mut after = BTreeMap::new();
        for path in &self.touched {
            let state = match self.predicted.remove(path) {
                Some(predicted) if dry_run => predicted,
                _ => DestinationEntry::stat(path)
                    .ok()
                    .flatten()
                    .map(|entry| PathState::from(&entry)),
            };
            if let Some(state) = state {
                after.insert(path.display().to_string(), state);
            }
        }
        Some(DiffReport {
            before: self.before,
            after,
        })
    }
}

/// Per-path detail lines, present in verbose mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerboseDetails {
    /// Extracted paths.
    pub updated_files: Vec<PathBuf>,
    /// Pruned paths.
    pub removed: Vec<PathBuf>,
    /// Mode change lines.
    pub mode: Vec<String>,
    /// Ownership change lines.
    pub ownership: Vec<String>,
}

/// The result of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileResult {
    /// Whether an error or a per-entry failure occurred.
    pub failed: bool,
    /// Whether anything was (or, in dry-run mode, would be) changed.
    pub changed: bool,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Summary lines.
    pub msg: Vec<String>,
    /// What was found to differ.
    pub plan: ReconciliationPlan,
    /// Per-entry failures.
    pub failures: Vec<Failure>,
    /// Per-path details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<VerboseDetails>,
    /// Before/after snapshots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffReport>,
}

impl ReconcileResult {
    /// A failed, unchanged result carrying a fatal error.
    ///
    /// # Examples
    ///
    /// ```
    /// use dircopy::{Error, ReconcileResult};
    ///
    /// let err = Error::Validation { field: "mode".into(), message: "bad".into() };
    /// let result = ReconcileResult::from_error(&err);
    /// assert!(result.failed);
    /// assert!(!result.changed);
    /// assert_eq!(result.msg.len(), 1);
    /// ```
    #[must_use]
    pub fn from_error(error: &Error) -> Self {
        Self {
            failed: true,
            msg: vec![error.to_string()],
            ..Self::default()
        }
    }
}

/// Assembles a [`ReconcileResult`] phase by phase.
#[derive(Debug)]
pub struct ResultBuilder {
    dry_run: bool,
    verbose: bool,
    changed: bool,
    msg: Vec<String>,
    created: Option<String>,
    failures: Vec<Failure>,
    details: VerboseDetails,
}

impl ResultBuilder {
    /// Starts an empty result.
    #[must_use]
    pub fn new(dry_run: bool, verbose: bool) -> Self {
        Self {
            dry_run,
            verbose,
            changed: false,
            msg: Vec::new(),
            created: None,
            failures: Vec::new(),
            details: VerboseDetails::default(),
        }
    }

    fn verb<'a>(&self, real: &'a str, dry: &'a str) -> &'a str {
        if self.dry_run {
            dry
        } else {
            real
        }
    }

    /// Records creation of a missing destination with the full archive.
    pub fn created(&mut self, archive: &Path, destination: &Path, entries: usize) {
        self.changed = true;
        self.created = Some(if self.dry_run {
            format!(
                "{} would be created and {entries} entries extracted",
                destination.display()
            )
        } else {
            format!("{} extracted to {}", archive.display(), destination.display())
        });
    }

    /// Records extracted entries. In the created-destination case the
    /// creation line replaces the count line.
    pub fn extracted(&mut self, destination: &Path, extracted: &BTreeSet<ArchivePath>) {
        if extracted.is_empty() {
            return;
        }
        self.changed = true;
        if self.created.is_none() {
            let verb = self.verb("updated", "differ");
            self.msg.push(format!("{} file(s) {verb}", extracted.len()));
        }
        if self.verbose {
            self.details
                .updated_files
                .extend(extracted.iter().map(|p| p.under(destination)));
        }
    }

    /// Records a removal pass.
    pub fn pruned(&mut self, destination: &Path, pruned: &PruneResult) {
        let (files, dirs) = (pruned.removed_files.len(), pruned.removed_dirs.len());
        if files + dirs > 0 {
            self.changed = true;
            let verb = self.verb("removed", "would be removed");
            self.msg
                .push(format!("{files} file(s) and {dirs} dir(s) {verb}"));
            if self.verbose {
                self.details.removed.extend(
                    pruned
                        .removed_files
                        .iter()
                        .chain(&pruned.removed_dirs)
                        .map(|p| p.under(destination)),
                );
            }
        }
        self.failures.extend(pruned.failures.iter().cloned());
    }

    /// Records permission repairs. Paths in `already_counted` (extracted
    /// entries) still flip `changed` but are left out of the counts.
    pub fn permissions(&mut self, outcome: &PermissionOutcome, already_counted: &BTreeSet<PathBuf>) {
        if !outcome.is_clean() {
            self.changed = true;
        }

        let modes: Vec<&DestinationEntry> = outcome
            .mode_mismatches
            .iter()
            .filter(|e| !already_counted.contains(&e.path))
            .collect();
        let owners: Vec<&DestinationEntry> = outcome
            .ownership_mismatches
            .iter()
            .filter(|e| !already_counted.contains(&e.path))
            .collect();

        if self.created.is_none() {
            if !modes.is_empty() {
                let verb = self.verb("updated", "differ");
                self.msg.push(format!("{} mode(s) {verb}", modes.len()));
            }
            if !owners.is_empty() {
                let verb = self.verb("updated", "differ");
                self.msg.push(format!("{} ownership(s) {verb}", owners.len()));
            }
        }

        if self.verbose {
            let mode_line = self.verb("mode updated.", "mode differs.");
            let owner_line = self.verb("owner/group updated.", "ownership (owner/group) differs.");
            self.details.mode.extend(
                modes
                    .iter()
                    .map(|e| format!("{} {mode_line}", e.path.display())),
            );
            self.details.ownership.extend(
                owners
                    .iter()
                    .map(|e| format!("{} {owner_line}", e.path.display())),
            );
        }

        self.failures.extend(outcome.failures.iter().cloned());
    }

    /// Records per-entry failures.
    pub fn failures(&mut self, failures: impl IntoIterator<Item = Failure>) {
        self.failures.extend(failures);
    }

    /// Finishes the result.
    #[must_use]
    pub fn build(self, plan: ReconciliationPlan, diff: Option<DiffReport>) -> ReconcileResult {
        let mut msg = self.msg;
        if let Some(created) = self.created {
            msg.push(created);
        }
        msg.extend(self.failures.iter().map(ToString::to_string));
        if msg.is_empty() {
            msg.push(NO_UPDATE.to_string());
        }

        ReconcileResult {
            failed: !self.failures.is_empty(),
            changed: self.changed,
            dry_run: self.dry_run,
            msg,
            plan,
            failures: self.failures,
            details: self.verbose.then_some(self.details),
            diff,
        }
    }
}
